mod block_cache;
mod file_reader;
mod range_reader;

pub use block_cache::{BlockCache, CacheStats, DEFAULT_BLOCK_CACHE_CAPACITY, DEFAULT_BLOCK_SIZE};
pub use file_reader::{FileRangeReader, MemoryRangeReader};
pub use range_reader::{
    read_f32_le, read_i32_le, read_i64_le, read_u16_le, read_u32_le, read_u64_le, RangeReader,
};

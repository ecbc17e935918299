//! CZI parsing tests over synthetic files.

use czi_skim::format::czi::{Compression, CziReader, PixelType};
use czi_skim::format::{detect_format, FileFormat};
use czi_skim::io::{BlockCache, MemoryRangeReader, RangeReader};
use czi_skim::{CziError, FileInfo};

use super::test_utils::{CziBuilder, PlaneSpec, TrackingMockReader, XmlDims};

fn gray16_stack() -> CziBuilder {
    CziBuilder::new(XmlDims::new(4, 3, 2, 2, PixelType::Gray16)).full_stack()
}

#[tokio::test]
async fn test_detect_built_file() {
    let built = gray16_stack().build();
    let reader = MemoryRangeReader::new(built.bytes, "stack.czi");
    assert_eq!(detect_format(&reader).await.unwrap(), FileFormat::Czi);
}

#[tokio::test]
async fn test_metadata_dims_from_distance_items() {
    let built = gray16_stack().build();
    let czi = CziReader::open(MemoryRangeReader::new(built.bytes, "stack.czi"))
        .await
        .unwrap();

    let metadata = czi.read_metadata().await.unwrap();
    let dims = &metadata.dims;
    assert_eq!((dims.size_x, dims.size_y, dims.size_z, dims.size_c), (4, 3, 2, 2));
    assert_eq!(dims.pixel_type, PixelType::Gray16);
    assert!((dims.scaling_x - 2.5e-7).abs() < 1e-15);
    assert!((dims.scaling_z - 1e-6).abs() < 1e-15);
    assert!(metadata.xml().starts_with("<?xml"));
}

#[tokio::test]
async fn test_scan_finds_every_plane_in_order() {
    let built = gray16_stack().build();
    let czi = CziReader::open(MemoryRangeReader::new(built.bytes.clone(), "stack.czi"))
        .await
        .unwrap();

    let blocks = czi.collect_subblocks().await.unwrap();
    assert_eq!(blocks.len(), 4);

    let offsets: Vec<u64> = blocks.iter().map(|b| b.data_offset).collect();
    assert_eq!(offsets, built.data_offsets);

    let indices: Vec<(i32, i32)> = blocks.iter().map(|b| b.header.entry.plane_index()).collect();
    assert_eq!(indices, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
}

#[tokio::test]
async fn test_data_offset_points_at_pixels() {
    let built = gray16_stack().subblock_metadata(40).build();
    let bytes = built.bytes.clone();
    let czi = CziReader::open(MemoryRangeReader::new(built.bytes, "stack.czi"))
        .await
        .unwrap();

    let blocks = czi.collect_subblocks().await.unwrap();
    // Plane c=1, z=1, pixel (0, 0) is 110
    let offset = blocks[3].data_offset as usize;
    assert_eq!(u16::from_le_bytes([bytes[offset], bytes[offset + 1]]), 110);

    let dims = czi.read_metadata().await.unwrap().dims;
    let plane = czi.read_plane(&blocks[3], &dims).await.unwrap();
    assert_eq!(plane.len(), 12);
    assert_eq!(plane[0], 110.0);
    // (x=3, y=2)
    assert_eq!(plane[11], 115.0);
}

#[tokio::test]
async fn test_leading_deleted_segment() {
    let built = gray16_stack().leading_deleted().build();
    let czi = CziReader::open(MemoryRangeReader::new(built.bytes, "stack.czi"))
        .await
        .unwrap();
    assert_eq!(czi.header_offset(), 64);
    assert_eq!(czi.collect_subblocks().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_directory_segment() {
    let built = gray16_stack().with_directory().build();
    assert!(built.directory_position > 0);

    let czi = CziReader::open(MemoryRangeReader::new(built.bytes, "stack.czi"))
        .await
        .unwrap();
    let directory = czi.directory().await.unwrap().unwrap();
    assert_eq!(directory.entries.len(), 4);

    let summary = directory.summary();
    assert_eq!(summary.pixel_types.get("Gray16"), Some(&4));
    assert_eq!(summary.axis_extents.get("C"), Some(&(0, 1)));
    assert_eq!(summary.axis_extents.get("Z"), Some(&(0, 1)));
    assert_eq!(directory.raw_planes(PixelType::Gray16).count(), 4);
}

#[tokio::test]
async fn test_no_directory() {
    let built = gray16_stack().build();
    let czi = CziReader::open(MemoryRangeReader::new(built.bytes, "stack.czi"))
        .await
        .unwrap();
    assert!(czi.directory().await.unwrap().is_none());
}

#[tokio::test]
async fn test_truncated_file_errors() {
    let mut built = gray16_stack().build();
    // Cut into the last sub-block header
    let cut = *built.data_offsets.last().unwrap() as usize - 200;
    built.bytes.truncate(cut);

    let czi = CziReader::open(MemoryRangeReader::new(built.bytes, "stack.czi"))
        .await
        .unwrap();
    let result = czi.collect_subblocks().await;
    assert!(matches!(result, Err(CziError::Io(_)) | Err(CziError::Truncated { .. })));
}

#[tokio::test]
async fn test_file_info_reports_planes() {
    let dims = XmlDims::new(2, 2, 2, 1, PixelType::Gray8);
    let built = CziBuilder::new(dims)
        .full_stack()
        .plane(PlaneSpec {
            c: 0,
            z: 1,
            pixels: vec![0; 4],
            pixel_type: PixelType::Gray8,
            compression: Compression::Lzw,
        })
        .with_directory()
        .build();

    let czi = CziReader::open(MemoryRangeReader::new(built.bytes, "mem.czi"))
        .await
        .unwrap();
    let info = FileInfo::collect(&czi).await.unwrap();

    assert_eq!(info.file, "mem.czi");
    assert_eq!(info.subblocks.entry_count, 3);
    assert_eq!(info.raw_planes, 2);
    assert_eq!(info.subblocks.compressions.get("Lzw"), Some(&1));
    assert_eq!(info.directory.as_ref().map(|d| d.entry_count), Some(3));

    let text = info.render_text();
    assert!(text.contains("SizeX: 2\n"));
    assert!(text.contains("PixelType: Gray8\n"));
    assert!(text.contains("Raw planes : 2 of 2 expected"));

    let json = serde_json::to_value(&info).unwrap();
    assert_eq!(json["dims"]["size_z"], 2);
    assert_eq!(json["header"]["major"], 1);
}

#[tokio::test]
async fn test_block_cache_reduces_reads() {
    let built = gray16_stack().build();
    let tracker = TrackingMockReader::new(built.bytes, "stack.czi");
    let cache = BlockCache::with_capacity(tracker.clone(), 4096, 16);

    let czi = CziReader::open(cache).await.unwrap();
    czi.read_metadata().await.unwrap();
    let blocks = czi.collect_subblocks().await.unwrap();
    assert_eq!(blocks.len(), 4);

    // The whole file fits in one 4 KiB block
    assert_eq!(tracker.request_count(), 1);
    assert_eq!(tracker.get_requests().await[0].0, 0);

    let stats = czi.inner().stats();
    assert_eq!(stats.misses, 1);
    assert!(stats.hits > 0);
    assert_eq!(czi.inner().size(), tracker.size());
}

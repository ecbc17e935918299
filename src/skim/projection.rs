//! Axis-aligned max and mean projections, accumulated one plane at a time.
//!
//! Three volumes are kept, each with a trailing `proj` axis of size 2
//! (slot 0 is the maximum, slot 1 the mean):
//!
//! - XY: `(x, y, c, proj)`, reduced over z
//! - XZ: `(x, z, c, proj)`, reduced over y
//! - YZ: `(y, z, c, proj)`, reduced over x
//!
//! Planes must arrive with `z == 0` first for each channel; that plane
//! resets the XY accumulators.

use crate::error::SkimError;
use crate::nrrd::NrrdVolume;

/// Number of projection kinds (max, mean).
pub const PROJECTION_KINDS: usize = 2;

#[derive(Debug, Clone)]
pub struct Projections {
    size_x: usize,
    size_y: usize,
    size_z: usize,
    size_c: usize,
    xy: NrrdVolume,
    xz: NrrdVolume,
    yz: NrrdVolume,
}

impl Projections {
    /// Allocate projection buffers. Zero `size_z` or `size_c` count as 1.
    pub fn new(
        size_x: usize,
        size_y: usize,
        size_z: usize,
        size_c: usize,
    ) -> Result<Self, SkimError> {
        let size_z = size_z.max(1);
        let size_c = size_c.max(1);
        Ok(Self {
            size_x,
            size_y,
            size_z,
            size_c,
            xy: NrrdVolume::zeros(
                vec![size_x, size_y, size_c, PROJECTION_KINDS],
                &["x", "y", "c", "proj"],
            )?,
            xz: NrrdVolume::zeros(
                vec![size_x, size_z, size_c, PROJECTION_KINDS],
                &["x", "z", "c", "proj"],
            )?,
            yz: NrrdVolume::zeros(
                vec![size_y, size_z, size_c, PROJECTION_KINDS],
                &["y", "z", "c", "proj"],
            )?,
        })
    }

    /// Fold one (x, y) plane at channel `c`, slice `z` into the projections.
    pub fn update(&mut self, plane: &[f32], c: i32, z: i32) -> Result<(), SkimError> {
        let (c, z) = match (usize::try_from(c), usize::try_from(z)) {
            (Ok(c), Ok(z)) if c < self.size_c && z < self.size_z => (c, z),
            _ => {
                return Err(SkimError::PlaneOutOfRange {
                    c,
                    z,
                    size_c: self.size_c,
                    size_z: self.size_z,
                })
            }
        };

        let (sx, sy, sz) = (self.size_x, self.size_y, self.size_z);
        if plane.len() != sx * sy {
            return Err(SkimError::InvalidDimensions(format!(
                "plane has {} pixels, expected {}x{}",
                plane.len(),
                sx,
                sy
            )));
        }

        let xy_slice = sx * sy * self.size_c;
        let xz_slice = sx * sz * self.size_c;
        let yz_slice = sy * sz * self.size_c;

        let off_xy = sx * sy * c;
        let off_xz = sx * (z + sz * c);
        let off_yz = sy * (z + sz * c);

        let (xy_max, xy_mean) = self.xy.data.split_at_mut(xy_slice);
        let (xz_max, xz_mean) = self.xz.data.split_at_mut(xz_slice);
        let (yz_max, yz_mean) = self.yz.data.split_at_mut(yz_slice);

        let xy_max = &mut xy_max[off_xy..off_xy + sx * sy];
        let xy_mean = &mut xy_mean[off_xy..off_xy + sx * sy];
        let xz_max = &mut xz_max[off_xz..off_xz + sx];
        let xz_mean = &mut xz_mean[off_xz..off_xz + sx];
        let yz_max = &mut yz_max[off_yz..off_yz + sy];
        let yz_mean = &mut yz_mean[off_yz..off_yz + sy];

        if z == 0 {
            xy_max.fill(f32::MIN);
            xy_mean.fill(0.0);
        }
        xz_max.fill(f32::MIN);
        xz_mean.fill(0.0);
        yz_max.fill(f32::MIN);
        yz_mean.fill(0.0);

        let (fx, fy, fz) = (sx as f32, sy as f32, sz as f32);
        for y in 0..sy {
            let row = &plane[y * sx..(y + 1) * sx];
            for (x, &v) in row.iter().enumerate() {
                let idx = x + sx * y;

                xy_max[idx] = xy_max[idx].max(v);
                xy_mean[idx] += v / fz;

                xz_max[x] = xz_max[x].max(v);
                xz_mean[x] += v / fy;

                yz_max[y] = yz_max[y].max(v);
                yz_mean[y] += v / fx;
            }
        }

        Ok(())
    }

    /// The XY, XZ and YZ volumes, in that order.
    pub fn into_volumes(self) -> [NrrdVolume; 3] {
        [self.xy, self.xz, self.yz]
    }

    pub fn xy(&self) -> &NrrdVolume {
        &self.xy
    }

    pub fn xz(&self) -> &NrrdVolume {
        &self.xz
    }

    pub fn yz(&self) -> &NrrdVolume {
        &self.yz
    }
}

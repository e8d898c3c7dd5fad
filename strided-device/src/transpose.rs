//! Block-transpose primitive.
//!
//! One call exchanges rows and lanes of a 16 x 16 tile resident in the
//! scratchpad. The tile is described by 16 source row addresses and 16
//! destination row addresses, each pointing at 16 consecutive lane elements:
//!
//! `dst_rows[j][i] = src_rows[i][j]` for `i, j` in `0..16`
//!
//! Row addresses are block-aligned. Narrow (1-byte) data is transposed
//! through a `u16` view, two elements per lane.

use bytemuck::Pod;

use crate::arch::TRANSPOSE_LANES;
use crate::scratch::Scratchpad;
use crate::Result;

/// Row addresses for one transpose call, in lane-type elements.
pub type LaneRows = [usize; TRANSPOSE_LANES];

/// A 16-lane transpose unit for lane type `L`.
pub trait MicroKernel<L: Pod> {
    /// Tile side length.
    const LANES: usize;

    /// Transpose one tile inside `scratch`.
    fn transpose(scratch: &mut Scratchpad, src_rows: &LaneRows, dst_rows: &LaneRows) -> Result<()>;
}

/// Scalar implementation of the transpose unit.
pub struct ScalarKernel;

impl<L: Pod> MicroKernel<L> for ScalarKernel {
    const LANES: usize = TRANSPOSE_LANES;

    fn transpose(
        scratch: &mut Scratchpad,
        src_rows: &LaneRows,
        dst_rows: &LaneRows,
    ) -> Result<()> {
        for (&s, &d) in src_rows.iter().zip(dst_rows.iter()) {
            scratch.check_aligned::<L>(s)?;
            scratch.check_aligned::<L>(d)?;
            scratch.check_range::<L>(s, TRANSPOSE_LANES)?;
            scratch.check_range::<L>(d, TRANSPOSE_LANES)?;
        }

        // Snapshot the source tile first: source and destination rows may
        // alias (in-place transpose).
        let mut tile = [[L::zeroed(); TRANSPOSE_LANES]; TRANSPOSE_LANES];
        let view = scratch.view::<L>();
        for (i, &s) in src_rows.iter().enumerate() {
            tile[i].copy_from_slice(&view[s..s + TRANSPOSE_LANES]);
        }

        let view = scratch.view_mut::<L>();
        for (j, &d) in dst_rows.iter().enumerate() {
            for (i, row) in tile.iter().enumerate() {
                view[d + i] = row[j];
            }
        }
        Ok(())
    }
}

/// Transpose one tile with the default kernel.
#[inline]
pub fn transpose_block<L: Pod>(
    scratch: &mut Scratchpad,
    src_rows: &LaneRows,
    dst_rows: &LaneRows,
) -> Result<()> {
    <ScalarKernel as MicroKernel<L>>::transpose(scratch, src_rows, dst_rows)
}

/// Row addresses `base + i * pitch` for `i` in `0..16`.
#[inline]
pub fn lane_rows(base: usize, pitch: usize) -> LaneRows {
    std::array::from_fn(|i| base + i * pitch)
}

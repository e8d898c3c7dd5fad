//! Second-to-last dim contiguous, last dim short and far apart.
//!
//! Line `j` holds the `n` contiguous source elements of output column `j`
//! for second-to-last indices `col..col + n`. One forward transpose turns
//! the `L` lines into `n` rows of 16 lanes, of which the first `L` lanes are
//! an output row.

use strided_device::{BurstShape, Element, WidthClass, TRANSPOSE_LANES};

use super::TileSpan;
use crate::context::CoreContext;
use crate::reorder::forward_transpose;
use crate::tail::move_out_region;
use crate::Result;

const LANES: usize = TRANSPOSE_LANES;

pub(super) fn transpose_rows<T: Element>(
    ctx: &mut CoreContext<'_, '_, T>,
    tile: TileSpan,
) -> Result<()> {
    let plan = ctx.plan;
    let (l, s) = (plan.last_dim_size, plan.last_dim_stride);
    let layout = ctx.layout;
    let v = layout.vnc_col_size;
    let n = tile.cols;

    for outer in tile.row..tile.row + tile.rows {
        let src = ctx.resolve(outer) + tile.col;
        ctx.mover.move_in(
            &mut ctx.scratch,
            &ctx.src,
            layout.lines,
            src,
            BurstShape {
                blocks: n.div_ceil(ctx.unit),
                rows: l,
                src_stride: s,
                dst_stride: v,
            },
        )?;

        match T::WIDTH {
            WidthClass::Wide => {
                forward_transpose::<T>(&mut ctx.scratch, layout.lines, v, layout.vnc, n)?;
                if l == LANES {
                    ctx.scratch
                        .copy_scalars::<T>(layout.dense, layout.vnc, n * l)?;
                } else {
                    for r in 0..n {
                        ctx.scratch
                            .copy_scalars::<T>(layout.dense + r * l, layout.vnc + r * LANES, l)?;
                    }
                }
            }
            WidthClass::Narrow => {
                forward_transpose::<u16>(
                    &mut ctx.scratch,
                    layout.lines / 2,
                    v / 2,
                    layout.vnc / 2,
                    n.div_ceil(2),
                )?;
                // Lane j of word w holds rows 2w and 2w + 1 of column j.
                for r in 0..n {
                    for j in 0..l {
                        let at = ((r / 2) * LANES + j) * 2 + r % 2;
                        let value = ctx.scratch.read_scalar::<T>(layout.vnc + at)?;
                        ctx.scratch
                            .write_scalar::<T>(layout.dense + r * l + j, value)?;
                    }
                }
            }
        }

        move_out_region(
            &mut ctx.mover,
            &mut ctx.dst,
            &mut ctx.scratch,
            outer * plan.out_lp_step + tile.col * l,
            layout.dense,
            n * l,
        )?;
    }
    Ok(())
}

//! Small last-dim stride: each line is read as one contiguous span covering
//! all of its strided elements, then reordered.

use strided_device::{BurstShape, Element};

use super::{reorder_packed, reorder_rows, TileSpan};
use crate::context::CoreContext;
use crate::Result;

/// Elements spanned by `n` items at `stride`.
#[inline]
fn span_len(n: usize, stride: usize) -> usize {
    (n - 1) * stride + 1
}

/// Large last dim: one span per row, rows written separately.
pub(super) fn span_rows<T: Element>(
    ctx: &mut CoreContext<'_, '_, T>,
    tile: TileSpan,
) -> Result<()> {
    let s = ctx.plan.last_dim_stride;
    let span = span_len(tile.cols, s);
    let blocks = span.div_ceil(ctx.unit);
    let (lines, v) = (ctx.layout.lines, ctx.layout.vnc_col_size);
    reorder_rows(ctx, tile, span, s, |ctx, first, count| {
        for i in 0..count {
            let src = ctx.resolve(first + i) + tile.col * s;
            ctx.mover.move_in(
                &mut ctx.scratch,
                &ctx.src,
                lines + i * v,
                src,
                BurstShape::contiguous(blocks),
            )?;
        }
        Ok(())
    })
}

/// Both trailing dims large: consecutive rows inside one second-to-last run
/// are `second_to_last_dim_stride` apart in the source, so a whole run of
/// lines is staged with a single strided move-in.
pub(super) fn run_rows<T: Element>(ctx: &mut CoreContext<'_, '_, T>, tile: TileSpan) -> Result<()> {
    let plan = ctx.plan;
    let (s, l2, s2) = (
        plan.last_dim_stride,
        plan.second_to_last_dim_size,
        plan.second_to_last_dim_stride,
    );
    let span = span_len(tile.cols, s);
    let blocks = span.div_ceil(ctx.unit);
    let (lines, v) = (ctx.layout.lines, ctx.layout.vnc_col_size);
    reorder_rows(ctx, tile, span, s, |ctx, first, count| {
        let mut i = 0;
        while i < count {
            let row = first + i;
            let run = (count - i).min(l2 - row % l2);
            let src = ctx.resolve(row) + tile.col * s;
            ctx.mover.move_in(
                &mut ctx.scratch,
                &ctx.src,
                lines + i * v,
                src,
                BurstShape {
                    blocks,
                    rows: run,
                    src_stride: s2,
                    dst_stride: v,
                },
            )?;
            i += run;
        }
        Ok(())
    })
}

/// Small last dim: one span per row, rows packed.
pub(super) fn span_packed<T: Element>(
    ctx: &mut CoreContext<'_, '_, T>,
    tile: TileSpan,
) -> Result<()> {
    let (l, s) = (ctx.plan.last_dim_size, ctx.plan.last_dim_stride);
    let span = span_len(l, s);
    let blocks = span.div_ceil(ctx.unit);
    let (lines, v) = (ctx.layout.lines, ctx.layout.vnc_col_size);
    reorder_packed(ctx, tile, span, s, |ctx, first, count| {
        for i in 0..count {
            let src = ctx.resolve(first + i);
            ctx.mover.move_in(
                &mut ctx.scratch,
                &ctx.src,
                lines + i * v,
                src,
                BurstShape::contiguous(blocks),
            )?;
        }
        Ok(())
    })
}

//! Large last-dim stride: one block per element, then reorder.
//!
//! Element `p` of a row lands at `p * u` in its line, so the reorder engine
//! runs with stride `u` over `(n - 1) * u + 1` elements.

use strided_device::{BurstShape, Element};

use super::{reorder_packed, reorder_rows, TileSpan};
use crate::context::CoreContext;
use crate::Result;

/// Stage `n` elements per line, one block each, for rows `first..first + count`.
fn load_elements<T: Element>(
    ctx: &mut CoreContext<'_, '_, T>,
    first: usize,
    count: usize,
    col: usize,
    n: usize,
) -> Result<()> {
    let (s, u) = (ctx.plan.last_dim_stride, ctx.unit);
    let (lines, v) = (ctx.layout.lines, ctx.layout.vnc_col_size);
    for i in 0..count {
        let src = ctx.resolve(first + i) + col * s;
        ctx.mover.move_in(
            &mut ctx.scratch,
            &ctx.src,
            lines + i * v,
            src,
            BurstShape {
                blocks: 1,
                rows: n,
                src_stride: s,
                dst_stride: u,
            },
        )?;
    }
    Ok(())
}

pub(super) fn element_rows<T: Element>(
    ctx: &mut CoreContext<'_, '_, T>,
    tile: TileSpan,
) -> Result<()> {
    let u = ctx.unit;
    let data_len = (tile.cols - 1) * u + 1;
    reorder_rows(ctx, tile, data_len, u, |ctx, first, count| {
        load_elements(ctx, first, count, tile.col, tile.cols)
    })
}

pub(super) fn element_packed<T: Element>(
    ctx: &mut CoreContext<'_, '_, T>,
    tile: TileSpan,
) -> Result<()> {
    let (u, l) = (ctx.unit, ctx.plan.last_dim_size);
    let data_len = (l - 1) * u + 1;
    reorder_packed(ctx, tile, data_len, u, |ctx, first, count| {
        load_elements(ctx, first, count, 0, l)
    })
}

//! Whole source footprint resident in the scratchpad: scalar gather.

use strided_device::{round_up, BurstShape, Element};

use super::TileSpan;
use crate::context::CoreContext;
use crate::tail::move_out_region;
use crate::Result;

/// Scratchpad offset of the packed output run, right after the footprint.
#[inline]
fn dense_base<T: Element>(ctx: &CoreContext<'_, '_, T>) -> usize {
    round_up(ctx.plan.src_footprint, ctx.unit)
}

/// Load the footprint once per core.
pub(super) fn prepare<T: Element>(ctx: &mut CoreContext<'_, '_, T>) -> Result<()> {
    let blocks = dense_base(ctx) / ctx.unit;
    let origin = ctx.plan.storage_offset;
    ctx.mover.move_in(
        &mut ctx.scratch,
        &ctx.src,
        0,
        origin,
        BurstShape::contiguous(blocks),
    )?;
    Ok(())
}

pub(super) fn gather_resident<T: Element>(
    ctx: &mut CoreContext<'_, '_, T>,
    tile: TileSpan,
) -> Result<()> {
    let (l, s) = (ctx.plan.last_dim_size, ctx.plan.last_dim_stride);
    let origin = ctx.plan.storage_offset;
    let dense = dense_base(ctx);
    for i in 0..tile.rows {
        let base = ctx.resolve(tile.row + i) - origin;
        let out = dense + i * l;
        for p in 0..l {
            let value = ctx.scratch.read_scalar::<T>(base + p * s)?;
            ctx.scratch.write_scalar::<T>(out + p, value)?;
        }
    }
    move_out_region(
        &mut ctx.mover,
        &mut ctx.dst,
        &mut ctx.scratch,
        tile.row * l,
        dense,
        tile.rows * l,
    )
}

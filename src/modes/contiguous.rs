//! Last dim contiguous: block copies straight through the scratchpad.

use strided_device::{round_up, BurstShape, Element};

use super::{write_rows, TileSpan};
use crate::context::CoreContext;
use crate::Result;

pub(super) fn copy_rows<T: Element>(
    ctx: &mut CoreContext<'_, '_, T>,
    tile: TileSpan,
) -> Result<()> {
    let u = ctx.unit;
    let l = ctx.plan.last_dim_size;
    let pitch = round_up(tile.cols, u);
    for i in 0..tile.rows {
        let src = ctx.resolve(tile.row + i) + tile.col;
        ctx.mover.move_in(
            &mut ctx.scratch,
            &ctx.src,
            i * pitch,
            src,
            BurstShape::contiguous(pitch / u),
        )?;
    }

    // Whole block-multiple rows are already one dense run.
    if tile.cols == l && l % u == 0 {
        ctx.mover.move_out(
            &mut ctx.dst,
            &ctx.scratch,
            tile.row * l,
            0,
            BurstShape::contiguous(tile.rows * l / u),
        )?;
        return Ok(());
    }
    write_rows(ctx, tile, 0, pitch)
}

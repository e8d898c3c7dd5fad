//! Last dim broadcast (stride 0).

use strided_device::{round_up, BurstShape, Element, WidthClass};

use super::{reorder_packed, write_rows, TileSpan};
use crate::context::CoreContext;
use crate::Result;

/// Large last dim: read one element per row and fill the row with a vector
/// dup. Narrow elements are dup'ed as `u16` words holding the byte twice.
pub(super) fn dup_rows<T: Element>(ctx: &mut CoreContext<'_, '_, T>, tile: TileSpan) -> Result<()> {
    let u = ctx.unit;
    let pitch = round_up(tile.cols, u);
    for i in 0..tile.rows {
        let row = i * pitch;
        let src = ctx.resolve(tile.row + i);
        ctx.mover.move_in(
            &mut ctx.scratch,
            &ctx.src,
            row,
            src,
            BurstShape::contiguous(1),
        )?;
        let value = ctx.scratch.read_scalar::<T>(row)?;
        match T::WIDTH {
            WidthClass::Narrow => {
                let b = u16::from(bytemuck::bytes_of(&value)[0]);
                ctx.scratch.dup::<u16>(row / 2, pitch / 2, b | (b << 8))?;
            }
            WidthClass::Wide => ctx.scratch.dup::<T>(row, pitch, value)?,
        }
    }
    write_rows(ctx, tile, 0, pitch)
}

/// Small last dim: every line holds one element, replicated `L` times by a
/// zero-stride reorder, then rows are packed.
pub(super) fn replicate_packed<T: Element>(
    ctx: &mut CoreContext<'_, '_, T>,
    tile: TileSpan,
) -> Result<()> {
    let v = ctx.layout.vnc_col_size;
    let lines = ctx.layout.lines;
    reorder_packed(ctx, tile, 1, 0, |ctx, first, count| {
        for i in 0..count {
            let src = ctx.resolve(first + i);
            ctx.mover.move_in(
                &mut ctx.scratch,
                &ctx.src,
                lines + i * v,
                src,
                BurstShape::contiguous(1),
            )?;
        }
        Ok(())
    })
}

//! Mode Dispatcher: one strategy per [`TilingMode`], one loop nest for all.
//!
//! Every core walks the same two-level nest over its work range (axis-0
//! tiles outside, axis-1 tiles inside) and hands each tile to the body of the
//! plan's mode. Bodies differ only in how they move data in, whether the
//! reorder engine runs, and the shape of the move-out.

mod broadcast;
mod contiguous;
mod first_stride;
mod gather;
mod resident;
mod span;

use strided_device::{Element, TRANSPOSE_LANES};
use strided_tiling::TilingMode;
use tracing::trace;

use crate::context::CoreContext;
use crate::reorder::gather_lines;
use crate::tail::move_out_region;
use crate::tiles::tiles;
use crate::Result;

/// A tile in absolute coordinates: `rows` axis-0 items from `row`, `cols`
/// axis-1 items from `col`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TileSpan {
    pub row: usize,
    pub rows: usize,
    pub col: usize,
    pub cols: usize,
}

/// Run every tile of `ctx.core_id`.
pub(crate) fn run_core<T: Element>(ctx: &mut CoreContext<'_, '_, T>) -> Result<()> {
    let plan = ctx.plan;
    let range = *plan.core_range(ctx.core_id);
    let (base0, base1) = plan.core_base(ctx.core_id);
    trace!(core = ctx.core_id, ?range, base0, base1, "core start");

    if plan.mode == TilingMode::FitsInScratch {
        resident::prepare(ctx)?;
    }

    for t0 in tiles(range.axis0, plan.axis0_step) {
        for t1 in tiles(range.axis1, plan.axis1_step) {
            let tile = TileSpan {
                row: base0 + t0.start,
                rows: t0.len,
                col: base1 + t1.start,
                cols: t1.len,
            };
            trace!(core = ctx.core_id, ?tile, "tile");
            match plan.mode {
                TilingMode::LastStrideOne => contiguous::copy_rows(ctx, tile)?,
                TilingMode::LastDimLarge => span::span_rows(ctx, tile)?,
                TilingMode::LastDimSmall => span::span_packed(ctx, tile)?,
                TilingMode::FitsInScratch => resident::gather_resident(ctx, tile)?,
                TilingMode::LastDimLargeStrideLarge => gather::element_rows(ctx, tile)?,
                TilingMode::LastDimSmallStrideLarge => gather::element_packed(ctx, tile)?,
                TilingMode::LastTwoDimsLarge => span::run_rows(ctx, tile)?,
                TilingMode::LastStrideZeroSizeLarge => broadcast::dup_rows(ctx, tile)?,
                TilingMode::LastStrideZeroSizeSmall => broadcast::replicate_packed(ctx, tile)?,
                TilingMode::FirstStrideSmall => first_stride::transpose_rows(ctx, tile)?,
            }
        }
    }
    Ok(())
}

/// Move `tile.rows` rows of `tile.cols` elements, row `i` staged at
/// `base + i * pitch`, to their output rows.
fn write_rows<T: Element>(
    ctx: &mut CoreContext<'_, '_, T>,
    tile: TileSpan,
    base: usize,
    pitch: usize,
) -> Result<()> {
    let l = ctx.plan.last_dim_size;
    for i in 0..tile.rows {
        move_out_region(
            &mut ctx.mover,
            &mut ctx.dst,
            &mut ctx.scratch,
            (tile.row + i) * l + tile.col,
            base + i * pitch,
            tile.cols,
        )?;
    }
    Ok(())
}

/// Reorder path for strategies writing each output row separately.
///
/// `load(ctx, first, count)` stages rows `first..first + count` as lines
/// `0..count`; each line is then reduced to `tile.cols` elements taken at
/// `stride` from its first `data_len`.
fn reorder_rows<'a, 'o, T, F>(
    ctx: &mut CoreContext<'a, 'o, T>,
    tile: TileSpan,
    data_len: usize,
    stride: usize,
    mut load: F,
) -> Result<()>
where
    T: Element,
    F: FnMut(&mut CoreContext<'a, 'o, T>, usize, usize) -> Result<()>,
{
    for g0 in (0..tile.rows).step_by(TRANSPOSE_LANES) {
        let count = TRANSPOSE_LANES.min(tile.rows - g0);
        load(ctx, tile.row + g0, count)?;
        let layout = ctx.layout;
        let pitch = gather_lines::<T>(&mut ctx.scratch, &layout, data_len, tile.cols, stride)?;
        let group = TileSpan {
            row: tile.row + g0,
            rows: count,
            ..tile
        };
        write_rows(ctx, group, layout.lines, pitch)?;
    }
    Ok(())
}

/// Reorder path for strategies packing whole short rows into one dense run.
///
/// Same staging contract as [`reorder_rows`]; reordered lines are compacted
/// with scalar copies into the dense region, which goes out in one region
/// write.
fn reorder_packed<'a, 'o, T, F>(
    ctx: &mut CoreContext<'a, 'o, T>,
    tile: TileSpan,
    data_len: usize,
    stride: usize,
    mut load: F,
) -> Result<()>
where
    T: Element,
    F: FnMut(&mut CoreContext<'a, 'o, T>, usize, usize) -> Result<()>,
{
    let l = ctx.plan.last_dim_size;
    let layout = ctx.layout;
    for g0 in (0..tile.rows).step_by(TRANSPOSE_LANES) {
        let count = TRANSPOSE_LANES.min(tile.rows - g0);
        load(ctx, tile.row + g0, count)?;
        let pitch = gather_lines::<T>(&mut ctx.scratch, &layout, data_len, l, stride)?;
        for i in 0..count {
            ctx.scratch
                .copy_scalars::<T>(layout.dense + (g0 + i) * l, layout.lines + i * pitch, l)?;
        }
    }
    move_out_region(
        &mut ctx.mover,
        &mut ctx.dst,
        &mut ctx.scratch,
        tile.row * l,
        layout.dense,
        tile.rows * l,
    )
}

//! Tile iteration along one axis, with borrow-back for the leftover tile.

use strided_tiling::AxisRange;

/// One tile along an axis, relative to the core's first item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Tile {
    pub start: usize,
    pub len: usize,
}

/// Tile `i` of `range`: full tiles first, then the leftover tile grown
/// backward by `backend` items.
#[inline]
pub(crate) fn plp_size(range: &AxisRange, step: usize, i: usize) -> Tile {
    if i < range.loop_count {
        Tile {
            start: i * step,
            len: step,
        }
    } else {
        Tile {
            start: range.loop_count * step - range.backend,
            len: range.leftover + range.backend,
        }
    }
}

/// All tiles of `range`.
pub(crate) fn tiles(range: AxisRange, step: usize) -> impl Iterator<Item = Tile> {
    (0..range.tiles()).map(move |i| plp_size(&range, step, i))
}

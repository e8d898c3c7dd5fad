//! Reorder Engine: strided lines in, dense lines out.
//!
//! Sixteen lines sit in the `lines` region at pitch `V`. Element `p` of the
//! output line `i` is element `p * stride` of input line `i`. The engine runs
//! three passes over the scratchpad:
//!
//! 1. forward transpose `lines -> vnc`, so column `c` of all sixteen lines is
//!    one 16-lane block: `vnc[c * 16 + i] = line_i[c]`
//! 2. middle pass `vnc -> target`, picking block `p * stride` for output
//!    column `p`
//! 3. backward transpose `target -> lines`, leaving output line `i` at
//!    `i * out_pitch`
//!
//! Narrow (1-byte) elements ride through the transposes as `u16` words, two
//! columns per lane. Their middle pass cannot move single columns with block
//! copies, so it rebuilds each target word from two source words with
//! shift-and-mask and OR.

use strided_device::{
    lane_rows, round_up, transpose_block, Element, Scratchpad, WidthClass, TRANSPOSE_LANES,
};
use strided_tiling::ScratchLayout;

use crate::Result;

const LANES: usize = TRANSPOSE_LANES;

/// Output line pitch granule, in elements. Keeps every output line start on
/// a block boundary for all element widths.
const OUT_PITCH_ALIGN: usize = 32;

/// Forward-transpose `cols` lane columns of the 16 rows at `rows`, pitch
/// `pitch`, into column-major blocks at `dst`. Offsets are in lane units.
pub(crate) fn forward_transpose<L: bytemuck::Pod>(
    scratch: &mut Scratchpad,
    rows: usize,
    pitch: usize,
    dst: usize,
    cols: usize,
) -> Result<()> {
    for c0 in (0..cols).step_by(LANES) {
        transpose_block::<L>(
            scratch,
            &lane_rows(rows + c0, pitch),
            &lane_rows(dst + c0 * LANES, LANES),
        )?;
    }
    Ok(())
}

/// Inverse of [`forward_transpose`]: `cols` column blocks at `src` back into
/// 16 rows at `rows` with pitch `pitch`.
fn backward_transpose<L: bytemuck::Pod>(
    scratch: &mut Scratchpad,
    src: usize,
    rows: usize,
    pitch: usize,
    cols: usize,
) -> Result<()> {
    for c0 in (0..cols).step_by(LANES) {
        transpose_block::<L>(
            scratch,
            &lane_rows(src + c0 * LANES, LANES),
            &lane_rows(rows + c0, pitch),
        )?;
    }
    Ok(())
}

/// Reorder the 16 lines of `layout`.
///
/// `data_len` elements of each line are significant; `valid` output elements
/// are produced per line, element `p` taken from `p * stride`
/// (`(valid - 1) * stride < data_len`). Returns the output line pitch.
pub(crate) fn gather_lines<T: Element>(
    scratch: &mut Scratchpad,
    layout: &ScratchLayout,
    data_len: usize,
    valid: usize,
    stride: usize,
) -> Result<usize> {
    let out_pitch = round_up(valid, OUT_PITCH_ALIGN);
    match T::WIDTH {
        WidthClass::Wide => gather_wide::<T>(scratch, layout, data_len, valid, stride, out_pitch)?,
        WidthClass::Narrow => gather_narrow(scratch, layout, data_len, valid, stride, out_pitch)?,
    }
    Ok(out_pitch)
}

fn gather_wide<T: Element>(
    scratch: &mut Scratchpad,
    layout: &ScratchLayout,
    data_len: usize,
    valid: usize,
    stride: usize,
    out_pitch: usize,
) -> Result<()> {
    forward_transpose::<T>(
        scratch,
        layout.lines,
        layout.vnc_col_size,
        layout.vnc,
        data_len,
    )?;
    scratch.copy_blocks::<T>(
        layout.target,
        layout.vnc,
        LANES,
        valid,
        LANES,
        stride * LANES,
    )?;
    backward_transpose::<T>(scratch, layout.target, layout.lines, out_pitch, valid)?;
    Ok(())
}

fn gather_narrow(
    scratch: &mut Scratchpad,
    layout: &ScratchLayout,
    data_len: usize,
    valid: usize,
    stride: usize,
    out_pitch: usize,
) -> Result<()> {
    // Word offsets: every region boundary is a multiple of 32 bytes.
    let (lines, vnc, target) = (layout.lines / 2, layout.vnc / 2, layout.target / 2);
    forward_transpose::<u16>(
        scratch,
        lines,
        layout.vnc_col_size / 2,
        vnc,
        data_len.div_ceil(2),
    )?;

    let out_words = valid.div_ceil(2);
    for q in 0..out_words {
        let lo = lane_bytes(scratch, vnc, 2 * q * stride, false)?;
        let hi = if 2 * q + 1 < valid {
            lane_bytes(scratch, vnc, (2 * q + 1) * stride, true)?
        } else {
            [0; LANES]
        };
        let block = scratch.region_mut::<u16>(target + q * LANES, LANES)?;
        for (w, (l, h)) in block.iter_mut().zip(lo.iter().zip(hi.iter())) {
            *w = (l | h).to_le();
        }
    }

    backward_transpose::<u16>(scratch, target, lines, out_pitch / 2, out_words)?;
    Ok(())
}

/// Column `pos` of all 16 lanes from the transposed words at `vnc`, moved
/// into the low (`high == false`) or high byte of a little-endian word.
fn lane_bytes(scratch: &Scratchpad, vnc: usize, pos: usize, high: bool) -> Result<[u16; LANES]> {
    let block = scratch.region::<u16>(vnc + (pos / 2) * LANES, LANES)?;
    let odd = pos % 2 == 1;
    Ok(std::array::from_fn(|i| {
        let w = u16::from_le(block[i]);
        match (odd, high) {
            (false, false) => w & 0x00ff,
            (true, false) => w >> 8,
            (false, true) => w << 8,
            (true, true) => w & 0xff00,
        }
    }))
}

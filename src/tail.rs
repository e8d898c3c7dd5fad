//! Tail Corrector: block-safe move-out of a region of any length.
//!
//! A region of `valid` elements whose length is not a whole number of blocks
//! is written as `floor(valid / u)` blocks plus one final block ending
//! exactly at `valid`. Before that, the last `u` elements of the region are
//! read into scalar registers and written back at the first unaligned block
//! position, so the final block leaves the scratchpad from an aligned
//! address and carries the true tail.

use smallvec::SmallVec;
use strided_device::{round_down, BlockMover, BurstShape, Element, GlobalOutput, Scratchpad};

use crate::Result;

/// Registers for one block of the widest-unit element type.
type TailRegs<T> = SmallVec<[T; 32]>;

/// Copy the last `unit` elements of the region at `row` (length `valid`) to
/// `row + floor(valid / unit) * unit`. Returns that aligned length.
///
/// Requires `valid > unit`.
pub(crate) fn correct_tail<T: Element>(
    scratch: &mut Scratchpad,
    row: usize,
    valid: usize,
    unit: usize,
) -> Result<usize> {
    let aligned = round_down(valid, unit);
    let tail = row + valid - unit;
    let mut regs = TailRegs::<T>::new();
    for k in 0..unit {
        regs.push(scratch.read_scalar::<T>(tail + k)?);
    }
    for (k, &v) in regs.iter().enumerate() {
        scratch.write_scalar::<T>(row + aligned + k, v)?;
    }
    Ok(aligned)
}

/// Write `valid` elements from scratchpad offset `src` (block-aligned) to
/// global offset `dst`, touching nothing outside `[dst, dst + valid)`.
///
/// Regions shorter than one block go out as a single partial burst; callers
/// only produce those when the region is everything left to write.
pub(crate) fn move_out_region<T: Element>(
    mover: &mut BlockMover,
    dst: &mut GlobalOutput<'_, T>,
    scratch: &mut Scratchpad,
    dst_offset: usize,
    src_offset: usize,
    valid: usize,
) -> Result<()> {
    let unit = mover.unit();
    if valid == 0 {
        return Ok(());
    }
    if valid < unit {
        mover.move_out_partial(dst, scratch, dst_offset, src_offset, valid)?;
        return Ok(());
    }
    if valid % unit == 0 {
        mover.move_out(
            dst,
            scratch,
            dst_offset,
            src_offset,
            BurstShape::contiguous(valid / unit),
        )?;
        return Ok(());
    }

    let aligned = correct_tail::<T>(scratch, src_offset, valid, unit)?;
    mover.move_out(
        dst,
        scratch,
        dst_offset,
        src_offset,
        BurstShape::contiguous(aligned / unit),
    )?;
    mover.move_out(
        dst,
        scratch,
        dst_offset + valid - unit,
        src_offset + aligned,
        BurstShape::contiguous(1),
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use strided_device::BurstKind;

    fn staged(len: usize) -> Scratchpad {
        let mut sp = Scratchpad::new(1024);
        for (k, v) in sp.view_mut::<f32>().iter_mut().enumerate().take(len) {
            *v = k as f32;
        }
        sp
    }

    #[test]
    fn test_correct_tail_moves_last_block() {
        let mut sp = staged(13);
        let aligned = correct_tail::<f32>(&mut sp, 0, 13, 8).unwrap();
        assert_eq!(aligned, 8);
        let expected: Vec<f32> = (5..13).map(|k| k as f32).collect();
        assert_eq!(&sp.view::<f32>()[8..16], expected.as_slice());
    }

    #[test]
    fn test_unaligned_region_writes_exactly() {
        let mut sp = staged(13);
        let mut out = vec![-1.0f32; 20];
        let mut mover = BlockMover::new::<f32>();
        {
            let mut dst = GlobalOutput::new(&mut out);
            move_out_region(&mut mover, &mut dst, &mut sp, 3, 0, 13).unwrap();
        }
        assert_eq!(out[2], -1.0);
        assert_eq!(out[16], -1.0);
        for k in 0..13 {
            assert_eq!(out[3 + k], k as f32);
        }
        let bursts = mover.bursts();
        assert_eq!(bursts.len(), 2);
        assert!(bursts
            .iter()
            .all(|b| b.kind == BurstKind::Full && b.len % 8 == 0));
        assert_eq!(bursts[1].dst, 3 + 13 - 8);
    }

    #[test]
    fn test_aligned_and_short_regions() {
        let mut sp = staged(16);
        let mut out = vec![0.0f32; 16];
        let mut mover = BlockMover::new::<f32>();
        {
            let mut dst = GlobalOutput::new(&mut out);
            move_out_region(&mut mover, &mut dst, &mut sp, 0, 0, 16).unwrap();
        }
        assert_eq!(mover.bursts().len(), 1);

        let mut out = vec![0.0f32; 5];
        let mut mover = BlockMover::new::<f32>();
        {
            let mut dst = GlobalOutput::new(&mut out);
            move_out_region(&mut mover, &mut dst, &mut sp, 0, 0, 5).unwrap();
        }
        assert_eq!(out, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        assert_eq!(mover.bursts()[0].kind, BurstKind::Partial);
    }
}

//! Block Mover: DMA between global memory and the scratchpad.
//!
//! Transfers move whole blocks of `unit` elements. Scratchpad addresses must
//! be block-aligned; global addresses are element-granular. Every move-out is
//! recorded so callers can audit alignment and partition properties.

use crate::element::{alignment_unit, Element};
use crate::global::{GlobalInput, GlobalOutput};
use crate::scratch::Scratchpad;
use crate::{DeviceFault, Result};

/// Shape of a strided block transfer.
///
/// `rows` bursts of `blocks` whole blocks each. Row `r` starts at
/// `r * src_stride` on the source side and `r * dst_stride` on the
/// destination side (row pitch = burst + row gap, in elements).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstShape {
    pub blocks: usize,
    pub rows: usize,
    pub src_stride: usize,
    pub dst_stride: usize,
}

impl BurstShape {
    /// One contiguous burst.
    pub fn contiguous(blocks: usize) -> Self {
        Self {
            blocks,
            rows: 1,
            src_stride: 0,
            dst_stride: 0,
        }
    }
}

/// Kind of a recorded move-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BurstKind {
    /// Whole blocks from a block-aligned scratchpad address.
    Full,
    /// A single whole-region write shorter than one block.
    Partial,
}

/// One recorded move-out burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Burst {
    /// Destination element offset in the output tensor.
    pub dst: usize,
    /// Source element offset in the scratchpad.
    pub src: usize,
    /// Elements written.
    pub len: usize,
    pub kind: BurstKind,
}

impl Burst {
    /// Half-open output range covered by this burst.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.dst..self.dst + self.len
    }
}

/// Per-core DMA engine.
#[derive(Debug)]
pub struct BlockMover {
    unit: usize,
    bursts: Vec<Burst>,
}

impl BlockMover {
    pub fn new<T: Element>() -> Self {
        Self {
            unit: alignment_unit::<T>(),
            bursts: Vec::new(),
        }
    }

    /// Elements per block for this mover's element type.
    #[inline]
    pub fn unit(&self) -> usize {
        self.unit
    }

    /// Move-out bursts issued so far.
    pub fn bursts(&self) -> &[Burst] {
        &self.bursts
    }

    pub fn into_bursts(self) -> Vec<Burst> {
        self.bursts
    }

    /// Global -> scratchpad.
    pub fn move_in<T: Element>(
        &mut self,
        scratch: &mut Scratchpad,
        src: &GlobalInput<'_, T>,
        dst_offset: usize,
        src_offset: usize,
        shape: BurstShape,
    ) -> Result<()> {
        if shape.blocks == 0 {
            return Err(DeviceFault::ZeroLengthBurst);
        }
        let burst = shape.blocks * self.unit;
        for r in 0..shape.rows {
            let d = dst_offset + r * shape.dst_stride;
            scratch.check_aligned::<T>(d)?;
            let region = scratch.region_mut::<T>(d, burst)?;
            src.read_into(src_offset + r * shape.src_stride, region);
        }
        Ok(())
    }

    /// Scratchpad -> global, whole blocks only.
    pub fn move_out<T: Element>(
        &mut self,
        dst: &mut GlobalOutput<'_, T>,
        scratch: &Scratchpad,
        dst_offset: usize,
        src_offset: usize,
        shape: BurstShape,
    ) -> Result<()> {
        if shape.blocks == 0 {
            return Err(DeviceFault::ZeroLengthBurst);
        }
        let burst = shape.blocks * self.unit;
        for r in 0..shape.rows {
            let s = src_offset + r * shape.src_stride;
            let d = dst_offset + r * shape.dst_stride;
            scratch.check_aligned::<T>(s)?;
            dst.write(d, scratch.region::<T>(s, burst)?)?;
            self.bursts.push(Burst {
                dst: d,
                src: s,
                len: burst,
                kind: BurstKind::Full,
            });
        }
        Ok(())
    }

    /// Scratchpad -> global for a whole region shorter than one block.
    ///
    /// Only valid when `len` elements are everything left to write, so the
    /// short write cannot overlap data owned by another row or core.
    pub fn move_out_partial<T: Element>(
        &mut self,
        dst: &mut GlobalOutput<'_, T>,
        scratch: &Scratchpad,
        dst_offset: usize,
        src_offset: usize,
        len: usize,
    ) -> Result<()> {
        if len == 0 {
            return Err(DeviceFault::ZeroLengthBurst);
        }
        if len > self.unit {
            return Err(DeviceFault::PartialBurstTooLong {
                len,
                unit: self.unit,
            });
        }
        scratch.check_aligned::<T>(src_offset)?;
        dst.write(dst_offset, scratch.region::<T>(src_offset, len)?)?;
        self.bursts.push(Burst {
            dst: dst_offset,
            src: src_offset,
            len,
            kind: BurstKind::Partial,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_in_strided_rows() {
        let data: Vec<f32> = (0..64).map(|i| i as f32).collect();
        let src = GlobalInput::new(&data);
        let mut sp = Scratchpad::new(1024);
        let mut mover = BlockMover::new::<f32>();
        let shape = BurstShape {
            blocks: 1,
            rows: 3,
            src_stride: 10,
            dst_stride: 16,
        };
        mover.move_in(&mut sp, &src, 8, 1, shape).unwrap();
        assert_eq!(sp.read_scalar::<f32>(8).unwrap(), 1.0);
        assert_eq!(sp.read_scalar::<f32>(15).unwrap(), 8.0);
        assert_eq!(sp.read_scalar::<f32>(24).unwrap(), 11.0);
        assert_eq!(sp.read_scalar::<f32>(40).unwrap(), 21.0);
    }

    #[test]
    fn test_move_in_rejects_unaligned_scratch() {
        let data = vec![0u8; 64];
        let src = GlobalInput::new(&data);
        let mut sp = Scratchpad::new(256);
        let mut mover = BlockMover::new::<u8>();
        let res = mover.move_in(&mut sp, &src, 3, 0, BurstShape::contiguous(1));
        assert!(matches!(res, Err(DeviceFault::UnalignedScratch { .. })));
    }

    #[test]
    fn test_move_out_writes_whole_blocks_and_records() {
        let mut sp = Scratchpad::new(256);
        for i in 0..16 {
            sp.write_scalar::<i16>(i, i as i16).unwrap();
        }
        let mut buf = vec![-1i16; 20];
        let mut out = GlobalOutput::new(&mut buf);
        let mut mover = BlockMover::new::<i16>();
        mover
            .move_out(&mut out, &sp, 4, 0, BurstShape::contiguous(1))
            .unwrap();
        assert_eq!(mover.bursts().len(), 1);
        assert_eq!(mover.bursts()[0].range(), 4..20);
        assert_eq!(buf[3], -1);
        assert_eq!(buf[4], 0);
        assert_eq!(buf[19], 15);
    }

    #[test]
    fn test_move_out_past_end_faults() {
        let sp = Scratchpad::new(256);
        let mut buf = vec![0f64; 6];
        let mut out = GlobalOutput::new(&mut buf);
        let mut mover = BlockMover::new::<f64>();
        let res = mover.move_out(&mut out, &sp, 4, 0, BurstShape::contiguous(1));
        assert!(matches!(
            res,
            Err(DeviceFault::GlobalWriteOutOfBounds { .. })
        ));
    }

    #[test]
    fn test_partial_burst_limits() {
        let sp = Scratchpad::new(256);
        let mut buf = vec![0f64; 3];
        let mut out = GlobalOutput::new(&mut buf);
        let mut mover = BlockMover::new::<f64>();
        mover.move_out_partial(&mut out, &sp, 0, 0, 3).unwrap();
        assert_eq!(mover.bursts()[0].kind, BurstKind::Partial);
        let res = mover.move_out_partial(&mut out, &sp, 0, 0, 5);
        assert!(matches!(
            res,
            Err(DeviceFault::PartialBurstTooLong { len: 5, unit: 4 })
        ));
    }
}

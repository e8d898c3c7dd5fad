//! Per-core scratchpad ("local buffer").
//!
//! Backed by `u64` words so that typed views of every supported element width
//! (and the 16-bit reinterpretation used for narrow elements) are aligned.
//! Offsets are expressed in elements of the view type.

use bytemuck::Pod;

use crate::arch::BLOCK_BYTES;
use crate::{DeviceFault, Result};

/// Software-managed on-chip buffer owned by exactly one core.
#[derive(Debug, Clone)]
pub struct Scratchpad {
    words: Vec<u64>,
}

impl Scratchpad {
    /// Allocate a zeroed scratchpad of `bytes`, rounded down to whole blocks.
    pub fn new(bytes: usize) -> Self {
        let bytes = bytes / BLOCK_BYTES * BLOCK_BYTES;
        Self {
            words: vec![0u64; bytes / 8],
        }
    }

    #[inline]
    pub fn capacity_bytes(&self) -> usize {
        self.words.len() * 8
    }

    /// Capacity in elements of `T`.
    #[inline]
    pub fn capacity<T: Pod>(&self) -> usize {
        self.capacity_bytes() / std::mem::size_of::<T>()
    }

    /// Whole-buffer typed view.
    #[inline]
    pub fn view<T: Pod>(&self) -> &[T] {
        bytemuck::cast_slice(&self.words)
    }

    /// Whole-buffer typed mutable view.
    #[inline]
    pub fn view_mut<T: Pod>(&mut self) -> &mut [T] {
        bytemuck::cast_slice_mut(&mut self.words)
    }

    /// Fail unless `offset` (in `T` elements) sits on a block boundary.
    pub fn check_aligned<T: Pod>(&self, offset: usize) -> Result<()> {
        let byte = offset * std::mem::size_of::<T>();
        if byte % BLOCK_BYTES != 0 {
            return Err(DeviceFault::UnalignedScratch { byte_offset: byte });
        }
        Ok(())
    }

    /// Fail unless `[offset, offset + len)` lies inside the scratchpad.
    pub fn check_range<T: Pod>(&self, offset: usize, len: usize) -> Result<()> {
        let end = offset
            .checked_add(len)
            .ok_or(DeviceFault::ScratchOutOfBounds {
                offset,
                len,
                capacity: self.capacity::<T>(),
            })?;
        if end > self.capacity::<T>() {
            return Err(DeviceFault::ScratchOutOfBounds {
                offset,
                len,
                capacity: self.capacity::<T>(),
            });
        }
        Ok(())
    }

    /// Bounds-checked typed region.
    pub fn region<T: Pod>(&self, offset: usize, len: usize) -> Result<&[T]> {
        self.check_range::<T>(offset, len)?;
        Ok(&self.view::<T>()[offset..offset + len])
    }

    /// Bounds-checked typed mutable region.
    pub fn region_mut<T: Pod>(&mut self, offset: usize, len: usize) -> Result<&mut [T]> {
        self.check_range::<T>(offset, len)?;
        Ok(&mut self.view_mut::<T>()[offset..offset + len])
    }

    /// Scalar register load from a scratchpad address (no alignment rule).
    #[inline]
    pub fn read_scalar<T: Pod>(&self, offset: usize) -> Result<T> {
        self.check_range::<T>(offset, 1)?;
        Ok(self.view::<T>()[offset])
    }

    /// Scalar register store to a scratchpad address (no alignment rule).
    #[inline]
    pub fn write_scalar<T: Pod>(&mut self, offset: usize, value: T) -> Result<()> {
        self.check_range::<T>(offset, 1)?;
        self.view_mut::<T>()[offset] = value;
        Ok(())
    }

    /// Element-by-element scalar copy inside the scratchpad.
    pub fn copy_scalars<T: Pod>(&mut self, dst: usize, src: usize, len: usize) -> Result<()> {
        self.check_range::<T>(src, len)?;
        self.check_range::<T>(dst, len)?;
        self.view_mut::<T>().copy_within(src..src + len, dst);
        Ok(())
    }

    /// Vector duplicate: fill `len` elements starting at a block-aligned
    /// `offset` with `value`.
    pub fn dup<T: Pod>(&mut self, offset: usize, len: usize, value: T) -> Result<()> {
        self.check_aligned::<T>(offset)?;
        self.region_mut::<T>(offset, len)?.fill(value);
        Ok(())
    }

    /// Vector block copy with repeat strides.
    ///
    /// Copies `repeat` blocks of `block_len` elements; block `k` is read from
    /// `src + k * src_stride` and written to `dst + k * dst_stride`. A zero
    /// `src_stride` replicates one source block. All block addresses must be
    /// aligned.
    pub fn copy_blocks<T: Pod>(
        &mut self,
        dst: usize,
        src: usize,
        block_len: usize,
        repeat: usize,
        dst_stride: usize,
        src_stride: usize,
    ) -> Result<()> {
        for k in 0..repeat {
            let s = src + k * src_stride;
            let d = dst + k * dst_stride;
            self.check_aligned::<T>(s)?;
            self.check_aligned::<T>(d)?;
            self.check_range::<T>(s, block_len)?;
            self.check_range::<T>(d, block_len)?;
            self.view_mut::<T>().copy_within(s..s + block_len, d);
        }
        Ok(())
    }
}

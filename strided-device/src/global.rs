//! Global-memory buffers as seen from one core.

use std::marker::PhantomData;

use crate::element::Element;
use crate::{DeviceFault, Result};

/// Read-only source tensor in global memory.
///
/// The tensor is addressed through computed flat offsets only. Block reads
/// that run past the end of the tensor return zeros, the way an allocation
/// padded to whole blocks would; those elements never reach the output.
#[derive(Debug, Clone, Copy)]
pub struct GlobalInput<'a, T> {
    data: &'a [T],
}

impl<'a, T: Element> GlobalInput<'a, T> {
    pub fn new(data: &'a [T]) -> Self {
        Self { data }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Fill `out` from `offset`, zero-padding anything past the end.
    pub fn read_into(&self, offset: usize, out: &mut [T]) {
        let avail = self.data.len().saturating_sub(offset).min(out.len());
        if avail > 0 {
            out[..avail].copy_from_slice(&self.data[offset..offset + avail]);
        }
        out[avail..].fill(T::zeroed());
    }
}

/// A raw pointer wrapper that is `Send` + `Sync`.
///
/// # Safety
/// The caller must guarantee that the pointed-to data outlives every use and
/// that concurrent users write disjoint regions.
#[derive(Debug)]
pub struct SendPtr<T>(*mut T);

impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}

unsafe impl<T> Send for SendPtr<T> {}
unsafe impl<T> Sync for SendPtr<T> {}

impl<T> SendPtr<T> {
    pub fn new(ptr: *mut T) -> Self {
        Self(ptr)
    }

    pub fn as_ptr(self) -> *mut T {
        self.0
    }
}

/// Dense output tensor in global memory, written by one core.
///
/// Writes are bounds-checked against the tensor length; a write that would
/// land outside the output is reported as a device fault instead of touching
/// memory.
#[derive(Debug)]
pub struct GlobalOutput<'a, T> {
    ptr: *mut T,
    len: usize,
    _marker: PhantomData<&'a mut [T]>,
}

impl<'a, T: Element> GlobalOutput<'a, T> {
    /// Exclusive handle over the whole output buffer.
    pub fn new(data: &'a mut [T]) -> Self {
        Self {
            ptr: data.as_mut_ptr(),
            len: data.len(),
            _marker: PhantomData,
        }
    }

    /// Handle over a buffer shared with other cores.
    ///
    /// # Safety
    /// `ptr` must be valid for writes of `len` elements for `'a`, and every
    /// handle created over the same buffer must write a disjoint set of
    /// elements while the handles are alive concurrently.
    pub unsafe fn from_raw_parts(ptr: *mut T, len: usize) -> Self {
        Self {
            ptr,
            len,
            _marker: PhantomData,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy `src` to `[offset, offset + src.len())`.
    pub fn write(&mut self, offset: usize, src: &[T]) -> Result<()> {
        let end = offset.saturating_add(src.len());
        if end > self.len {
            return Err(DeviceFault::GlobalWriteOutOfBounds {
                offset,
                len: src.len(),
                capacity: self.len,
            });
        }
        // SAFETY: range checked above; exclusivity per the constructor contract.
        unsafe { std::ptr::copy_nonoverlapping(src.as_ptr(), self.ptr.add(offset), src.len()) };
        Ok(())
    }
}

//! Element types the device can move.

use std::fmt::Debug;

use crate::arch::BLOCK_BYTES;

/// How an element maps onto the 16-lane transpose unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidthClass {
    /// 1-byte elements. Transposed through a 16-bit reinterpretation, two
    /// elements per lane.
    Narrow,
    /// Elements of 2 bytes or more. One element per lane.
    Wide,
}

/// A plain-old-data element that can live in global memory and scratchpad.
pub trait Element: bytemuck::Pod + PartialEq + Debug + Send + Sync + 'static {
    /// Width class, derived from the element size.
    const WIDTH: WidthClass = if std::mem::size_of::<Self>() == 1 {
        WidthClass::Narrow
    } else {
        WidthClass::Wide
    };
}

impl Element for u8 {}
impl Element for i8 {}
impl Element for u16 {}
impl Element for i16 {}
impl Element for u32 {}
impl Element for i32 {}
impl Element for f32 {}
impl Element for u64 {}
impl Element for i64 {}
impl Element for f64 {}

/// Elements per DMA block for `T` (the alignment unit).
#[inline]
pub const fn alignment_unit<T: Element>() -> usize {
    BLOCK_BYTES / std::mem::size_of::<T>()
}

/// Round `n` up to a multiple of `unit`.
#[inline]
pub const fn round_up(n: usize, unit: usize) -> usize {
    n.div_ceil(unit) * unit
}

/// Round `n` down to a multiple of `unit`.
#[inline]
pub const fn round_down(n: usize, unit: usize) -> usize {
    n / unit * unit
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_unit_per_width() {
        assert_eq!(alignment_unit::<u8>(), 32);
        assert_eq!(alignment_unit::<i16>(), 16);
        assert_eq!(alignment_unit::<f32>(), 8);
        assert_eq!(alignment_unit::<f64>(), 4);
    }

    #[test]
    fn test_width_class() {
        assert_eq!(<u8 as Element>::WIDTH, WidthClass::Narrow);
        assert_eq!(<i8 as Element>::WIDTH, WidthClass::Narrow);
        assert_eq!(<u16 as Element>::WIDTH, WidthClass::Wide);
        assert_eq!(<f64 as Element>::WIDTH, WidthClass::Wide);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(round_up(10, 8), 16);
        assert_eq!(round_up(16, 8), 16);
        assert_eq!(round_up(0, 8), 0);
        assert_eq!(round_down(10, 8), 8);
        assert_eq!(round_down(7, 8), 0);
    }
}

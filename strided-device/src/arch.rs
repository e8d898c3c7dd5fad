//! Hardware constants of the simulated device.
//!
//! Values follow the observed target: 32-byte DMA blocks, a 16-lane block
//! transpose unit, 32 vector cores and a 256 KiB scratchpad per core of which
//! a small prefix is reserved for the tiling parameter block.

// ============================================================================
// Memory transfer
// ============================================================================

/// Bytes per DMA-aligned block. Every scratchpad address touched by a block
/// transfer must be a multiple of this, and block transfers move whole
/// blocks only.
pub const BLOCK_BYTES: usize = 32;

/// Lanes of the block-transpose primitive (16 rows x 16 lanes per call).
pub const TRANSPOSE_LANES: usize = 16;

// ============================================================================
// Cores and scratchpad
// ============================================================================

/// Vector cores launched per kernel invocation.
pub const DEFAULT_CORE_NUM: usize = 32;

/// Scratchpad ("local buffer") bytes per core.
pub const DEFAULT_SCRATCH_BYTES: usize = 256 * 1024;

/// Scratchpad bytes held back for the tiling parameter block.
pub const TILING_RESERVE_BYTES: usize = 1024;

/// Smallest line pitch, in elements, of the transpose-based reorder path.
pub const MIN_LINE_PITCH: usize = 32;

/// Widest supported element, in bytes.
pub const MAX_ELEMENT_BYTES: usize = 8;

/// Smallest usable scratchpad: the reorder working set (three regions of 16
/// lines at the minimum pitch plus a dense quarter) for the widest element.
pub const MIN_SCRATCH_BYTES: usize = 4 * TRANSPOSE_LANES * MIN_LINE_PITCH * MAX_ELEMENT_BYTES;

//! Simulated two-level memory device for strided gather kernels.
//!
//! The device has a large global memory holding full tensors and, per core,
//! a small software-managed scratchpad reachable only through block-granular
//! transfers with strict alignment rules. This crate models exactly the
//! primitives a kernel may use:
//!
//! - [`BlockMover`]: global <-> scratchpad block DMA with per-row strides
//! - [`transpose_block`]: 16-lane block transpose inside the scratchpad
//! - [`Scratchpad`]: scalar register access, vector dup and block copies
//!
//! Violations of the transfer rules surface as [`DeviceFault`]s rather than
//! silent memory corruption.

pub mod arch;
pub mod config;
pub mod element;
pub mod global;
pub mod mover;
pub mod scratch;
pub mod transpose;

pub use arch::{BLOCK_BYTES, MIN_LINE_PITCH, MIN_SCRATCH_BYTES, TRANSPOSE_LANES};
pub use config::DeviceConfig;
pub use element::{alignment_unit, round_down, round_up, Element, WidthClass};
pub use global::{GlobalInput, GlobalOutput, SendPtr};
pub use mover::{BlockMover, Burst, BurstKind, BurstShape};
pub use scratch::Scratchpad;
pub use transpose::{lane_rows, transpose_block, LaneRows, MicroKernel, ScalarKernel};

/// Faults raised by the simulated device.
#[derive(Debug, thiserror::Error)]
pub enum DeviceFault {
    /// Scratchpad access outside the buffer.
    #[error("scratchpad access [{offset}, {offset}+{len}) exceeds capacity {capacity}")]
    ScratchOutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// Block transfer or vector op at a scratchpad address off a block boundary.
    #[error("scratchpad byte offset {byte_offset} is not block-aligned")]
    UnalignedScratch { byte_offset: usize },

    /// Move-out past the end of the output tensor.
    #[error("global write [{offset}, {offset}+{len}) exceeds output length {capacity}")]
    GlobalWriteOutOfBounds {
        offset: usize,
        len: usize,
        capacity: usize,
    },

    /// A partial move-out longer than one block.
    #[error("partial burst of {len} elements exceeds alignment unit {unit}")]
    PartialBurstTooLong { len: usize, unit: usize },

    /// A transfer of zero blocks.
    #[error("zero-length burst")]
    ZeroLengthBurst,

    /// Device configuration that no plan can run on.
    #[error("invalid device config: {0}")]
    InvalidConfig(String),
}

/// Result type for device operations.
pub type Result<T> = std::result::Result<T, DeviceFault>;

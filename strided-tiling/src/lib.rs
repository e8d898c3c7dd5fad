//! Tiling plans for strided gather kernels.
//!
//! A [`TilingPlan`] is the complete, precomputed description of how one
//! as-strided materialization is split across cores and tiles. The host
//! planner ([`plan_as_strided`]) produces it; the device engine only reads
//! it, through the flat parameter block of [`TilingPlan::from_words`].
//!
//! # Example
//!
//! ```
//! use strided_device::DeviceConfig;
//! use strided_tiling::{plan_as_strided, TilingMode};
//!
//! // Transposed view of a 4 x 1024 row-major f32 tensor.
//! let plan = plan_as_strided::<f32>(4096, &[1024, 4], &[1, 1024], 0, &DeviceConfig::default())
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(plan.mode, TilingMode::FirstStrideSmall);
//! ```

pub mod fuse;
pub mod mode;
pub mod plan;
pub mod planner;
pub mod resolver;

pub use mode::TilingMode;
pub use plan::{AxisRange, CoreWorkRange, DimTriple, TilingPlan, MAX_DIM_NUM, PARAM_WORDS};
pub use planner::{output_len, plan_as_strided, ScratchLayout, SPAN_STRIDE_LIMIT};
pub use resolver::{resolve_offset, resolver_for, Resolver};

use strided_device::DeviceFault;

/// Errors raised at the planner boundary.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("size has {size} dims but stride has {stride}")]
    RankMismatch { size: usize, stride: usize },

    #[error("negative stride {stride} on dim {dim}")]
    NegativeStride { dim: usize, stride: isize },

    #[error("negative storage offset {0}")]
    NegativeOffset(isize),

    #[error("{dims} dims after fusion, at most {max} supported")]
    TooManyDims { dims: usize, max: usize },

    #[error("view reaches element {required} but source has {available}")]
    SourceTooSmall { required: usize, available: usize },

    #[error("{0} overflows usize")]
    Overflow(&'static str),

    #[error("unknown tiling mode id {0}")]
    UnknownMode(i64),

    #[error("parameter block has {found} words, expected {expected}")]
    ParamBlockLength { expected: usize, found: usize },

    #[error("parameter word {index} is negative ({value})")]
    NegativeField { index: usize, value: i64 },

    #[error("{region} holds {available} elements, the chosen mode needs at least {required}")]
    ScratchTooSmall {
        region: &'static str,
        required: usize,
        available: usize,
    },

    #[error(transparent)]
    InvalidConfig(#[from] DeviceFault),
}

/// Result type for planning.
pub type Result<T> = std::result::Result<T, PlanError>;

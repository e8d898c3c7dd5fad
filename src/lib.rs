//! As-strided gather engine.
//!
//! Materializes a strided view of a flat source buffer into a dense,
//! row-major output on a device with a two-level memory: global memory plus a
//! small per-core scratchpad reachable only through block-aligned DMA.
//!
//! # Pipeline
//!
//! - [`plan_as_strided`] (host): validate the view, pick one of ten
//!   [`TilingMode`]s and split the work across cores
//! - [`launch`] / [`launch_par`] (device): the plan crosses over as its
//!   flat parameter block ([`launch_words`]) and every core walks its tiles,
//!   moving data in, reordering strided lines with the 16-lane transpose,
//!   fixing up sub-block tails and moving the dense result out
//!
//! [`as_strided`] and [`as_strided_into`] run both steps.
//!
//! # Example
//!
//! ```rust
//! use strided_gather::{as_strided, DeviceConfig};
//!
//! // Transpose a 2 x 3 row-major matrix.
//! let src = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let out = as_strided(&src, &[3, 2], &[1, 3], 0, &DeviceConfig::default()).unwrap();
//! assert_eq!(out, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
//! ```

mod context;
pub mod launch;
mod modes;
pub mod reference;
mod reorder;
mod tail;
mod tiles;

pub use launch::{launch, launch_words, CoreTrace, LaunchReport};
pub use strided_device::{Burst, BurstKind, DeviceConfig, DeviceFault, Element};
pub use strided_tiling::{output_len, plan_as_strided, PlanError, TilingMode, TilingPlan};

#[cfg(feature = "parallel")]
pub use launch::{launch_par, launch_words_par};

/// Errors from planning or executing a gather.
#[derive(Debug, thiserror::Error)]
pub enum GatherError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Device(#[from] DeviceFault),

    #[error("output buffer has {found} elements, view has {expected}")]
    OutputLength { expected: usize, found: usize },

    #[error("plan uses {used} cores but the device has {available}")]
    TooManyCores { used: usize, available: usize },
}

/// Result type for gather operations.
pub type Result<T> = std::result::Result<T, GatherError>;

/// Materialize `src` viewed with `size`, `stride` and `storage_offset` into a
/// new dense row-major buffer.
pub fn as_strided<T: Element>(
    src: &[T],
    size: &[usize],
    stride: &[isize],
    storage_offset: isize,
    config: &DeviceConfig,
) -> Result<Vec<T>> {
    let plan = plan_as_strided::<T>(src.len(), size, stride, storage_offset, config)?;
    let mut out = vec![T::zeroed(); output_len(size)?];
    if let Some(plan) = plan {
        execute(&plan, src, &mut out, config)?;
    }
    Ok(out)
}

/// Like [`as_strided`], writing into `dst` (length = product of `size`).
pub fn as_strided_into<T: Element>(
    dst: &mut [T],
    src: &[T],
    size: &[usize],
    stride: &[isize],
    storage_offset: isize,
    config: &DeviceConfig,
) -> Result<()> {
    let plan = plan_as_strided::<T>(src.len(), size, stride, storage_offset, config)?;
    let total = output_len(size)?;
    if dst.len() != total {
        return Err(GatherError::OutputLength {
            expected: total,
            found: dst.len(),
        });
    }
    match plan {
        Some(plan) => execute(&plan, src, dst, config).map(|_| ()),
        None => Ok(()),
    }
}

#[cfg(feature = "parallel")]
fn execute<T: Element>(
    plan: &TilingPlan,
    src: &[T],
    dst: &mut [T],
    config: &DeviceConfig,
) -> Result<LaunchReport> {
    // SAFETY: the block comes straight from the planner, whose core shares
    // are disjoint output ranges.
    unsafe { launch_words_par(&plan.to_words(), src, dst, config) }
}

#[cfg(not(feature = "parallel"))]
fn execute<T: Element>(
    plan: &TilingPlan,
    src: &[T],
    dst: &mut [T],
    config: &DeviceConfig,
) -> Result<LaunchReport> {
    launch_words(&plan.to_words(), src, dst, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let src: Vec<u32> = (0..100).collect();
        let out = as_strided(&src, &[100], &[1], 0, &DeviceConfig::default()).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn test_offset_and_empty() {
        let src: Vec<i16> = (0..50).collect();
        let out = as_strided(&src, &[5, 2], &[4, 1], 10, &DeviceConfig::default()).unwrap();
        assert_eq!(out, vec![10, 11, 14, 15, 18, 19, 22, 23, 26, 27]);
        let out = as_strided(&src, &[0, 4], &[1, 1], 0, &DeviceConfig::default()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_into_checks_length() {
        let src = [1u8; 16];
        let mut dst = [0u8; 3];
        let err = as_strided_into(&mut dst, &src, &[4], &[1], 0, &DeviceConfig::default());
        assert!(matches!(
            err,
            Err(GatherError::OutputLength {
                expected: 4,
                found: 3
            })
        ));
    }

    #[test]
    fn test_plan_errors_propagate() {
        let src = [0.0f64; 4];
        let err = as_strided(&src, &[8], &[1], 0, &DeviceConfig::default());
        assert!(matches!(
            err,
            Err(GatherError::Plan(PlanError::SourceTooSmall { .. }))
        ));
    }

    #[test]
    fn test_overflowing_view_is_rejected() {
        let src = [0u32; 16];
        let cfg = DeviceConfig::default();
        let err = as_strided(&src, &[3], &[isize::MAX], 5, &cfg);
        assert!(matches!(
            err,
            Err(GatherError::Plan(PlanError::Overflow(_)))
        ));
        let mut dst = [0u32; 4];
        let err = as_strided_into(&mut dst, &src, &[usize::MAX, 2], &[0, 0], 0, &cfg);
        assert!(matches!(
            err,
            Err(GatherError::Plan(PlanError::Overflow(_)))
        ));
    }
}

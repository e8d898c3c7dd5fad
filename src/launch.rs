//! Multi-core launch.
//!
//! Cores are independent: each one builds its own scratchpad and DMA engine,
//! runs its share of the plan and never talks to the others. Sequential
//! [`launch`] runs them one after another; [`launch_par`] runs them on rayon
//! workers writing through a shared output pointer. Both hand the plan to the
//! cores as its parameter block ([`launch_words`], [`launch_words_par`]).

use std::ops::Range;

use strided_device::{Burst, BurstKind, DeviceConfig, Element, GlobalOutput};
use strided_tiling::{TilingMode, TilingPlan};
use tracing::debug;

use crate::context::CoreContext;
use crate::modes::run_core;
use crate::{GatherError, Result};

/// Move-out bursts issued by one core, in issue order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreTrace {
    pub core_id: usize,
    pub bursts: Vec<Burst>,
}

impl CoreTrace {
    /// Smallest output range covering every burst of this core.
    pub fn span(&self) -> Option<Range<usize>> {
        let start = self.bursts.iter().map(|b| b.dst).min()?;
        let end = self.bursts.iter().map(|b| b.dst + b.len).max()?;
        Some(start..end)
    }
}

/// What a launch did, for auditing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    pub mode: TilingMode,
    /// Elements per DMA block.
    pub unit: usize,
    pub cores: Vec<CoreTrace>,
}

impl LaunchReport {
    /// All bursts of all cores.
    pub fn bursts(&self) -> impl Iterator<Item = &Burst> {
        self.cores.iter().flat_map(|c| c.bursts.iter())
    }

    /// Whether every burst is whole blocks from an aligned scratchpad
    /// address, except a lone partial burst covering an output shorter than
    /// one block.
    pub fn is_aligned(&self) -> bool {
        let total = self.bursts().count();
        self.bursts().all(|b| match b.kind {
            BurstKind::Full => b.src % self.unit == 0 && b.len % self.unit == 0 && b.len > 0,
            BurstKind::Partial => total == 1 && b.len < self.unit && b.src % self.unit == 0,
        })
    }
}

fn check_cores(plan: &TilingPlan, config: &DeviceConfig) -> Result<()> {
    config.validate()?;
    if plan.used_core_count > config.core_num {
        return Err(GatherError::TooManyCores {
            used: plan.used_core_count,
            available: config.core_num,
        });
    }
    Ok(())
}

/// One core: read the parameter block, then walk this core's tiles.
fn run_one<T: Element>(
    words: &[i64],
    core_id: usize,
    src: &[T],
    dst: GlobalOutput<'_, T>,
    config: &DeviceConfig,
) -> Result<CoreTrace> {
    let plan = TilingPlan::from_words(words)?;
    let mut ctx = CoreContext::new(&plan, core_id, src, dst, config);
    run_core(&mut ctx)?;
    Ok(ctx.into_trace())
}

fn report<T: Element>(plan: &TilingPlan, cores: Vec<CoreTrace>) -> LaunchReport {
    LaunchReport {
        mode: plan.mode,
        unit: strided_device::alignment_unit::<T>(),
        cores,
    }
}

/// Run every active core of `plan`, one after another.
pub fn launch<T: Element>(
    plan: &TilingPlan,
    src: &[T],
    dst: &mut [T],
    config: &DeviceConfig,
) -> Result<LaunchReport> {
    launch_words(&plan.to_words(), src, dst, config)
}

/// Run every active core of the plan encoded in `words`, one after another.
///
/// This is the device-side entry: the planner's output crosses over only as
/// the flat parameter block, and every core parses its own copy.
pub fn launch_words<T: Element>(
    words: &[i64],
    src: &[T],
    dst: &mut [T],
    config: &DeviceConfig,
) -> Result<LaunchReport> {
    let plan = TilingPlan::from_words(words)?;
    check_cores(&plan, config)?;
    debug!(mode = %plan.mode, cores = plan.used_core_count, "launch");
    let mut cores = Vec::with_capacity(plan.used_core_count);
    for core_id in 0..plan.used_core_count {
        let out = GlobalOutput::new(&mut *dst);
        cores.push(run_one(words, core_id, src, out, config)?);
    }
    Ok(report::<T>(&plan, cores))
}

/// Run every active core of `plan` in parallel.
///
/// # Safety
/// Cores write `dst` concurrently without synchronization. The caller must
/// guarantee that the output ranges of distinct cores are disjoint, which
/// holds for every plan produced by [`strided_tiling::plan_as_strided`].
#[cfg(feature = "parallel")]
pub unsafe fn launch_par<T: Element>(
    plan: &TilingPlan,
    src: &[T],
    dst: &mut [T],
    config: &DeviceConfig,
) -> Result<LaunchReport> {
    // SAFETY: forwarded to the caller.
    unsafe { launch_words_par(&plan.to_words(), src, dst, config) }
}

/// Parallel [`launch_words`].
///
/// # Safety
/// Same contract as [`launch_par`]: the encoded plan must give distinct
/// cores disjoint output ranges.
#[cfg(feature = "parallel")]
pub unsafe fn launch_words_par<T: Element>(
    words: &[i64],
    src: &[T],
    dst: &mut [T],
    config: &DeviceConfig,
) -> Result<LaunchReport> {
    use rayon::prelude::*;
    use strided_device::SendPtr;

    let plan = TilingPlan::from_words(words)?;
    check_cores(&plan, config)?;
    debug!(mode = %plan.mode, cores = plan.used_core_count, "parallel launch");
    let len = dst.len();
    let ptr = SendPtr::new(dst.as_mut_ptr());
    let cores = (0..plan.used_core_count)
        .into_par_iter()
        .map(|core_id| {
            // SAFETY: `dst` outlives the launch; disjointness per the caller.
            let out = unsafe { GlobalOutput::from_raw_parts(ptr.as_ptr(), len) };
            run_one(words, core_id, src, out, config)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(report::<T>(&plan, cores))
}

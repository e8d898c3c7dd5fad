//! Per-core execution state.

use strided_device::{BlockMover, DeviceConfig, Element, GlobalInput, GlobalOutput, Scratchpad};
use strided_tiling::{resolver_for, Resolver, ScratchLayout, TilingPlan};

use crate::launch::CoreTrace;

/// Everything one core owns while it runs: its scratchpad, its DMA engine and
/// its view of the two global tensors. The plan is shared and read-only.
pub(crate) struct CoreContext<'a, 'o, T: Element> {
    pub plan: &'a TilingPlan,
    pub core_id: usize,
    pub src: GlobalInput<'a, T>,
    pub dst: GlobalOutput<'o, T>,
    pub scratch: Scratchpad,
    pub mover: BlockMover,
    pub layout: ScratchLayout,
    /// Elements per DMA block.
    pub unit: usize,
    resolver: Resolver,
}

impl<'a, 'o, T: Element> CoreContext<'a, 'o, T> {
    pub fn new(
        plan: &'a TilingPlan,
        core_id: usize,
        src: &'a [T],
        dst: GlobalOutput<'o, T>,
        config: &DeviceConfig,
    ) -> Self {
        let scratch = Scratchpad::new(config.usable_scratch_bytes());
        let layout = ScratchLayout::new(scratch.capacity::<T>(), plan.vnc_col_size);
        let mover = BlockMover::new::<T>();
        Self {
            plan,
            core_id,
            src: GlobalInput::new(src),
            dst,
            scratch,
            unit: mover.unit(),
            mover,
            layout,
            resolver: resolver_for(plan.dim_num),
        }
    }

    /// Source offset of axis-0 item `idx`.
    #[inline]
    pub fn resolve(&self, idx: usize) -> usize {
        self.plan.storage_offset + (self.resolver)(&self.plan.dims, idx)
    }

    pub fn into_trace(self) -> CoreTrace {
        CoreTrace {
            core_id: self.core_id,
            bursts: self.mover.into_bursts(),
        }
    }
}

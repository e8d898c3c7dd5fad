//! Device configuration.

use crate::arch::{DEFAULT_CORE_NUM, DEFAULT_SCRATCH_BYTES, MIN_SCRATCH_BYTES, TILING_RESERVE_BYTES};
use crate::{DeviceFault, Result};

/// Shape of the device a plan is computed for and executed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Number of vector cores available to one launch.
    pub core_num: usize,
    /// Scratchpad bytes per core.
    pub scratch_bytes: usize,
    /// Scratchpad bytes reserved for the tiling parameter block.
    pub tiling_reserve_bytes: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            core_num: DEFAULT_CORE_NUM,
            scratch_bytes: DEFAULT_SCRATCH_BYTES,
            tiling_reserve_bytes: TILING_RESERVE_BYTES,
        }
    }
}

impl DeviceConfig {
    pub fn with_core_num(mut self, core_num: usize) -> Self {
        self.core_num = core_num;
        self
    }

    pub fn with_scratch_bytes(mut self, scratch_bytes: usize) -> Self {
        self.scratch_bytes = scratch_bytes;
        self
    }

    pub fn with_tiling_reserve_bytes(mut self, bytes: usize) -> Self {
        self.tiling_reserve_bytes = bytes;
        self
    }

    /// Scratchpad bytes usable for data.
    pub fn usable_scratch_bytes(&self) -> usize {
        self.scratch_bytes.saturating_sub(self.tiling_reserve_bytes)
    }

    /// Scratchpad capacity in elements of `elem_bytes` each:
    /// `(scratch_size - tiling_param_reserve) / element_size`.
    pub fn scratch_elems(&self, elem_bytes: usize) -> usize {
        self.usable_scratch_bytes() / elem_bytes
    }

    /// Reject configurations no plan can run on: no cores, or a scratchpad
    /// that cannot hold the reorder working set of every element width.
    pub fn validate(&self) -> Result<()> {
        if self.core_num == 0 {
            return Err(DeviceFault::InvalidConfig(
                "core_num must be positive".into(),
            ));
        }
        let usable = self.usable_scratch_bytes();
        if usable < MIN_SCRATCH_BYTES {
            return Err(DeviceFault::InvalidConfig(format!(
                "{usable} usable scratch bytes ({} minus the {}-byte tiling reserve), \
                 need at least {MIN_SCRATCH_BYTES}",
                self.scratch_bytes, self.tiling_reserve_bytes
            )));
        }
        Ok(())
    }
}

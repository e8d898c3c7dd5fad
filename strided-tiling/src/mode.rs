//! The ten data-movement strategies.

use std::fmt;

use crate::{PlanError, Result};

/// Execution strategy, fixed for a whole invocation.
///
/// Discriminants are the mode ids stored in the parameter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum TilingMode {
    /// Last dim contiguous: direct block move-in/out, no reorder.
    LastStrideOne = 1,
    /// Large last dim, small stride: read each strided span contiguously,
    /// full reorder per line.
    LastDimLarge = 2,
    /// Small last dim, small stride: one reorder line per output row, packed
    /// into a dense run.
    LastDimSmall = 3,
    /// Source footprint fits the scratchpad: resident buffer, scalar gather.
    FitsInScratch = 4,
    /// Large last dim, large stride: per-element gathered move-in, full reorder.
    LastDimLargeStrideLarge = 5,
    /// Small last dim, large stride: per-element gathered move-in, packed.
    LastDimSmallStrideLarge = 6,
    /// Both trailing dims large: one move-in per run of rows using the
    /// second-to-last stride as row pitch, full reorder.
    LastTwoDimsLarge = 7,
    /// Broadcast along a large last dim: vector dup, no reorder.
    LastStrideZeroSizeLarge = 8,
    /// Broadcast along a small last dim: reorder-based replication.
    LastStrideZeroSizeSmall = 9,
    /// Second-to-last dim contiguous: transpose-based gather of the trailing
    /// two dims.
    FirstStrideSmall = 10,
}

impl TilingMode {
    pub const ALL: [TilingMode; 10] = [
        TilingMode::LastStrideOne,
        TilingMode::LastDimLarge,
        TilingMode::LastDimSmall,
        TilingMode::FitsInScratch,
        TilingMode::LastDimLargeStrideLarge,
        TilingMode::LastDimSmallStrideLarge,
        TilingMode::LastTwoDimsLarge,
        TilingMode::LastStrideZeroSizeLarge,
        TilingMode::LastStrideZeroSizeSmall,
        TilingMode::FirstStrideSmall,
    ];

    #[inline]
    pub fn id(self) -> i64 {
        self as i64
    }

    /// Whether tiles pack several short output rows into one dense run
    /// (as opposed to writing each output row separately).
    pub fn packs_rows(self) -> bool {
        matches!(
            self,
            TilingMode::LastDimSmall
                | TilingMode::FitsInScratch
                | TilingMode::LastDimSmallStrideLarge
                | TilingMode::LastStrideZeroSizeSmall
        )
    }
}

impl TryFrom<i64> for TilingMode {
    type Error = PlanError;

    fn try_from(id: i64) -> Result<Self> {
        TilingMode::ALL
            .into_iter()
            .find(|m| m.id() == id)
            .ok_or(PlanError::UnknownMode(id))
    }
}

impl fmt::Display for TilingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TilingMode::LastStrideOne => "last-stride-1",
            TilingMode::LastDimLarge => "last-dim-large",
            TilingMode::LastDimSmall => "last-dim-small",
            TilingMode::FitsInScratch => "fits-in-scratch",
            TilingMode::LastDimLargeStrideLarge => "last-dim-large-stride-large",
            TilingMode::LastDimSmallStrideLarge => "last-dim-small-stride-large",
            TilingMode::LastTwoDimsLarge => "last-two-dims-large",
            TilingMode::LastStrideZeroSizeLarge => "last-stride-zero-size-large",
            TilingMode::LastStrideZeroSizeSmall => "last-stride-zero-size-small",
            TilingMode::FirstStrideSmall => "first-stride-small",
        };
        write!(f, "M{} {}", self.id(), name)
    }
}

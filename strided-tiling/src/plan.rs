//! Tiling plan and its flat parameter-block layout.
//!
//! The parameter block is a positional array of `i64` words written by the
//! host planner and read once per invocation by every core:
//!
//! ```text
//!  0     mode                    16  axis0_step
//!  1     used_core_count         17  axis1_step
//!  2     core_step_in            18  vnc_col_size
//!  3     mc_pos                  19  storage_offset
//!  4..9  non-last core ranges    20  last_dim_size
//!  10..15 last core ranges       21  last_dim_stride
//!                                22  second_to_last_dim_size
//!                                23  second_to_last_dim_stride
//!                                24  out_lp_step
//!                                25  src_footprint
//!                                26  dim_num
//!                                27..89 (reduced_size, size, stride) x 21
//! ```
//!
//! Each core range is axis-0 `loop, leftover, backend` then axis-1 the same.

use crate::mode::TilingMode;
use crate::{PlanError, Result};

/// Maximum number of decomposition triples.
pub const MAX_DIM_NUM: usize = 21;

const W_MODE: usize = 0;
const W_USED_CORES: usize = 1;
const W_CORE_STEP_IN: usize = 2;
const W_MC_POS: usize = 3;
const W_NON_LAST: usize = 4;
const W_LAST: usize = 10;
const W_AXIS0_STEP: usize = 16;
const W_AXIS1_STEP: usize = 17;
const W_VNC_COL_SIZE: usize = 18;
const W_STORAGE_OFFSET: usize = 19;
const W_LAST_DIM_SIZE: usize = 20;
const W_LAST_DIM_STRIDE: usize = 21;
const W_SECOND_SIZE: usize = 22;
const W_SECOND_STRIDE: usize = 23;
const W_OUT_LP_STEP: usize = 24;
const W_SRC_FOOTPRINT: usize = 25;
const W_DIM_NUM: usize = 26;
const W_TRIPLES: usize = 27;

/// Words in a parameter block.
pub const PARAM_WORDS: usize = W_TRIPLES + 3 * MAX_DIM_NUM;

/// Loop shape of one axis for one core class.
///
/// The axis is walked as `loop_count` full tiles followed by one tile of
/// `leftover` items when `leftover > 0`. A non-zero `backend` means the
/// leftover tile starts `backend` items early so its write stays
/// block-aligned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisRange {
    pub loop_count: usize,
    pub leftover: usize,
    pub backend: usize,
}

impl AxisRange {
    /// Split `items` into tiles of `step`, borrowing back when the leftover
    /// tile would write fewer than `unit` elements (`item_elems` per item).
    pub fn split(items: usize, step: usize, item_elems: usize, unit: usize) -> Self {
        let loop_count = items / step;
        let leftover = items % step;
        let backend = if loop_count > 0 && leftover > 0 && leftover * item_elems < unit {
            (unit - leftover * item_elems).div_ceil(item_elems)
        } else {
            0
        };
        Self {
            loop_count,
            leftover,
            backend,
        }
    }

    /// Whether the leftover tile borrows back.
    #[inline]
    pub fn is_back(&self) -> bool {
        self.backend > 0
    }

    /// Number of tiles along this axis.
    #[inline]
    pub fn tiles(&self) -> usize {
        self.loop_count + usize::from(self.leftover > 0)
    }

    /// Items covered.
    #[inline]
    pub fn items(&self, step: usize) -> usize {
        self.loop_count * step + self.leftover
    }
}

/// Work range of one core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoreWorkRange {
    pub axis0: AxisRange,
    pub axis1: AxisRange,
}

/// One `(reduced_size, size, stride)` decomposition triple.
///
/// Index `idx` along axis 0 contributes `((idx / reduced_size) % size) * stride`
/// to the source offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DimTriple {
    pub reduced_size: usize,
    pub size: usize,
    pub stride: usize,
}

/// Per-invocation tiling decision, read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TilingPlan {
    pub mode: TilingMode,
    pub used_core_count: usize,
    /// Items of the split axis owned by every non-last core.
    pub core_step_in: usize,
    /// Axis split across cores: 0 or 1.
    pub mc_pos: usize,
    pub non_last: CoreWorkRange,
    pub last: CoreWorkRange,
    /// Items per full tile along axis 0.
    pub axis0_step: usize,
    /// Items per full tile along axis 1.
    pub axis1_step: usize,
    /// Line pitch of the reorder engine, in elements.
    pub vnc_col_size: usize,
    pub storage_offset: usize,
    pub last_dim_size: usize,
    pub last_dim_stride: usize,
    pub second_to_last_dim_size: usize,
    pub second_to_last_dim_stride: usize,
    /// Output elements between consecutive axis-0 items.
    pub out_lp_step: usize,
    /// Source elements reachable from `storage_offset`.
    pub src_footprint: usize,
    pub dim_num: usize,
    pub dims: [DimTriple; MAX_DIM_NUM],
}

impl TilingPlan {
    /// Work range for `core_id`.
    #[inline]
    pub fn core_range(&self, core_id: usize) -> &CoreWorkRange {
        if core_id + 1 == self.used_core_count {
            &self.last
        } else {
            &self.non_last
        }
    }

    /// First `(axis0, axis1)` item owned by `core_id`.
    #[inline]
    pub fn core_base(&self, core_id: usize) -> (usize, usize) {
        let start = core_id * self.core_step_in;
        if self.mc_pos == 0 {
            (start, 0)
        } else {
            (0, start)
        }
    }

    /// Parse a parameter block.
    ///
    /// Field values are trusted: only the block length, the mode id, the
    /// triple count and word signs are checked, since an enum and unsigned
    /// sizes cannot hold anything else.
    pub fn from_words(words: &[i64]) -> Result<Self> {
        if words.len() != PARAM_WORDS {
            return Err(PlanError::ParamBlockLength {
                expected: PARAM_WORDS,
                found: words.len(),
            });
        }
        let field = |index: usize| -> Result<usize> {
            usize::try_from(words[index]).map_err(|_| PlanError::NegativeField {
                index,
                value: words[index],
            })
        };
        let range = |base: usize| -> Result<CoreWorkRange> {
            Ok(CoreWorkRange {
                axis0: AxisRange {
                    loop_count: field(base)?,
                    leftover: field(base + 1)?,
                    backend: field(base + 2)?,
                },
                axis1: AxisRange {
                    loop_count: field(base + 3)?,
                    leftover: field(base + 4)?,
                    backend: field(base + 5)?,
                },
            })
        };

        let dim_num = field(W_DIM_NUM)?;
        if !(1..=MAX_DIM_NUM).contains(&dim_num) {
            return Err(PlanError::TooManyDims {
                dims: dim_num,
                max: MAX_DIM_NUM,
            });
        }
        let mut dims = [DimTriple::default(); MAX_DIM_NUM];
        for (k, d) in dims.iter_mut().enumerate() {
            let base = W_TRIPLES + 3 * k;
            *d = DimTriple {
                reduced_size: field(base)?,
                size: field(base + 1)?,
                stride: field(base + 2)?,
            };
        }

        Ok(Self {
            mode: TilingMode::try_from(words[W_MODE])?,
            used_core_count: field(W_USED_CORES)?,
            core_step_in: field(W_CORE_STEP_IN)?,
            mc_pos: field(W_MC_POS)?,
            non_last: range(W_NON_LAST)?,
            last: range(W_LAST)?,
            axis0_step: field(W_AXIS0_STEP)?,
            axis1_step: field(W_AXIS1_STEP)?,
            vnc_col_size: field(W_VNC_COL_SIZE)?,
            storage_offset: field(W_STORAGE_OFFSET)?,
            last_dim_size: field(W_LAST_DIM_SIZE)?,
            last_dim_stride: field(W_LAST_DIM_STRIDE)?,
            second_to_last_dim_size: field(W_SECOND_SIZE)?,
            second_to_last_dim_stride: field(W_SECOND_STRIDE)?,
            out_lp_step: field(W_OUT_LP_STEP)?,
            src_footprint: field(W_SRC_FOOTPRINT)?,
            dim_num,
            dims,
        })
    }

    /// Serialize to a parameter block, the inverse of [`TilingPlan::from_words`].
    pub fn to_words(&self) -> Vec<i64> {
        let mut w = vec![0i64; PARAM_WORDS];
        let put_range = |w: &mut [i64], base: usize, r: &CoreWorkRange| {
            w[base] = r.axis0.loop_count as i64;
            w[base + 1] = r.axis0.leftover as i64;
            w[base + 2] = r.axis0.backend as i64;
            w[base + 3] = r.axis1.loop_count as i64;
            w[base + 4] = r.axis1.leftover as i64;
            w[base + 5] = r.axis1.backend as i64;
        };
        w[W_MODE] = self.mode.id();
        w[W_USED_CORES] = self.used_core_count as i64;
        w[W_CORE_STEP_IN] = self.core_step_in as i64;
        w[W_MC_POS] = self.mc_pos as i64;
        put_range(&mut w, W_NON_LAST, &self.non_last);
        put_range(&mut w, W_LAST, &self.last);
        w[W_AXIS0_STEP] = self.axis0_step as i64;
        w[W_AXIS1_STEP] = self.axis1_step as i64;
        w[W_VNC_COL_SIZE] = self.vnc_col_size as i64;
        w[W_STORAGE_OFFSET] = self.storage_offset as i64;
        w[W_LAST_DIM_SIZE] = self.last_dim_size as i64;
        w[W_LAST_DIM_STRIDE] = self.last_dim_stride as i64;
        w[W_SECOND_SIZE] = self.second_to_last_dim_size as i64;
        w[W_SECOND_STRIDE] = self.second_to_last_dim_stride as i64;
        w[W_OUT_LP_STEP] = self.out_lp_step as i64;
        w[W_SRC_FOOTPRINT] = self.src_footprint as i64;
        w[W_DIM_NUM] = self.dim_num as i64;
        for (k, d) in self.dims.iter().enumerate() {
            let base = W_TRIPLES + 3 * k;
            w[base] = d.reduced_size as i64;
            w[base + 1] = d.size as i64;
            w[base + 2] = d.stride as i64;
        }
        w
    }
}

//! Host-side planner: view geometry in, [`TilingPlan`] out.
//!
//! The planner is the only place that validates anything. It normalizes the
//! view, picks one of the ten strategies, sizes tiles against the scratchpad
//! and splits the work across cores so that every core owns a disjoint
//! output range of at least one alignment unit (unless the whole output is
//! smaller than that).

use std::mem::size_of;

use strided_device::{
    alignment_unit, round_down, round_up, DeviceConfig, Element, MIN_LINE_PITCH, TRANSPOSE_LANES,
};
use tracing::{debug, trace};

use crate::fuse::{max_reach, normalize};
use crate::mode::TilingMode;
use crate::plan::{AxisRange, CoreWorkRange, DimTriple, TilingPlan, MAX_DIM_NUM};
use crate::{PlanError, Result};

/// Largest last-dim stride for which a whole strided span is read with one
/// contiguous burst per line.
pub const SPAN_STRIDE_LIMIT: usize = 16;

/// Smallest usable line pitch of the reorder engine, in elements.
const MIN_VNC_COL_SIZE: usize = MIN_LINE_PITCH;

/// Partition of the scratchpad used by the reorder-based strategies.
///
/// ```text
/// [0, 16V)     lines: one input line per transpose lane, pitch V
/// [16V, 32V)   vnc: forward-transposed (column-major) lines
/// [32V, 48V)   target: columns selected by the middle pass
/// [48V, cap)   dense: packed output run
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScratchLayout {
    pub vnc_col_size: usize,
    pub lines: usize,
    pub vnc: usize,
    pub target: usize,
    pub dense: usize,
    pub dense_len: usize,
}

impl ScratchLayout {
    /// Line pitch for a scratchpad of `capacity` elements: three regions of
    /// 16 lines share three quarters of the scratchpad.
    pub fn vnc_col_size_for(capacity: usize) -> usize {
        round_down(capacity * 3 / 4 / (3 * TRANSPOSE_LANES), MIN_VNC_COL_SIZE)
    }

    pub fn new(capacity: usize, vnc_col_size: usize) -> Self {
        let region = TRANSPOSE_LANES * vnc_col_size;
        Self {
            vnc_col_size,
            lines: 0,
            vnc: region,
            target: 2 * region,
            dense: 3 * region,
            dense_len: capacity.saturating_sub(3 * region),
        }
    }

    fn reorder_ready(&self) -> bool {
        self.vnc_col_size >= MIN_VNC_COL_SIZE
    }
}

/// Normalized view geometry.
#[derive(Debug)]
struct Shape {
    sizes: Vec<usize>,
    strides: Vec<usize>,
    last: usize,
    last_stride: usize,
    second: usize,
    second_stride: usize,
    /// Output rows: product of all dims but the last.
    rows: usize,
}

impl Shape {
    fn new(sizes: Vec<usize>, strides: Vec<usize>) -> Self {
        let m = sizes.len();
        let (second, second_stride) = if m >= 2 {
            (sizes[m - 2], strides[m - 2])
        } else {
            (1, 0)
        };
        Self {
            last: sizes[m - 1],
            last_stride: strides[m - 1],
            second,
            second_stride,
            rows: sizes[..m - 1].iter().product(),
            sizes,
            strides,
        }
    }

    fn ndim(&self) -> usize {
        self.sizes.len()
    }
}

/// Mode plus tile steps along both axes.
#[derive(Debug, Clone, Copy)]
struct Selection {
    mode: TilingMode,
    axis0_step: usize,
    axis1_step: usize,
}

/// Per-core split.
#[derive(Debug)]
struct Partition {
    used_core_count: usize,
    core_step_in: usize,
    mc_pos: usize,
    non_last: CoreWorkRange,
    last: CoreWorkRange,
}

/// Plan `as_strided(src, size, stride, storage_offset)` for element type `T`
/// on `config`.
///
/// Returns `Ok(None)` for an empty view (some dim of size 0).
pub fn plan_as_strided<T: Element>(
    src_len: usize,
    size: &[usize],
    stride: &[isize],
    storage_offset: isize,
    config: &DeviceConfig,
) -> Result<Option<TilingPlan>> {
    config.validate()?;
    if size.len() != stride.len() {
        return Err(PlanError::RankMismatch {
            size: size.len(),
            stride: stride.len(),
        });
    }
    let mut ustride = Vec::with_capacity(stride.len());
    for (dim, &s) in stride.iter().enumerate() {
        match usize::try_from(s) {
            Ok(s) => ustride.push(s),
            Err(_) => return Err(PlanError::NegativeStride { dim, stride: s }),
        }
    }
    let storage_offset = match usize::try_from(storage_offset) {
        Ok(offset) => offset,
        Err(_) => return Err(PlanError::NegativeOffset(storage_offset)),
    };

    if output_len(size)? == 0 {
        debug!(?size, "empty view, nothing to plan");
        return Ok(None);
    }

    // Bounds arithmetic runs on the raw dims: normalization preserves reach.
    let footprint = max_reach(size, &ustride)
        .and_then(|reach| reach.checked_add(1))
        .ok_or(PlanError::Overflow("view reach"))?;
    let required = storage_offset
        .checked_add(footprint)
        .ok_or(PlanError::Overflow("view reach"))?;
    if required > src_len {
        return Err(PlanError::SourceTooSmall {
            required,
            available: src_len,
        });
    }

    let (sizes, strides) = normalize(size, &ustride);
    if sizes.len() > MAX_DIM_NUM + 1 {
        return Err(PlanError::TooManyDims {
            dims: sizes.len(),
            max: MAX_DIM_NUM + 1,
        });
    }

    let u = alignment_unit::<T>();
    let capacity = round_down(config.scratch_elems(size_of::<T>()), u);
    if capacity < u {
        return Err(scratch_too_small("scratchpad", u, capacity));
    }
    let layout = ScratchLayout::new(capacity, ScratchLayout::vnc_col_size_for(capacity));
    let shape = Shape::new(sizes, strides);
    trace!(?shape, unit = u, capacity, "normalized view");

    let sel = select(&shape, u, capacity, &layout, footprint)?;
    let part = partition(&shape, &sel, u, config.core_num);
    let (dim_num, dims) = decompose(&shape, sel.mode);
    let out_lp_step = if sel.mode == TilingMode::FirstStrideSmall {
        shape.second * shape.last
    } else {
        shape.last
    };

    debug!(
        mode = %sel.mode,
        used_cores = part.used_core_count,
        mc_pos = part.mc_pos,
        core_step_in = part.core_step_in,
        axis0_step = sel.axis0_step,
        axis1_step = sel.axis1_step,
        "tiling plan"
    );

    Ok(Some(TilingPlan {
        mode: sel.mode,
        used_core_count: part.used_core_count,
        core_step_in: part.core_step_in,
        mc_pos: part.mc_pos,
        non_last: part.non_last,
        last: part.last,
        axis0_step: sel.axis0_step,
        axis1_step: sel.axis1_step,
        vnc_col_size: layout.vnc_col_size,
        storage_offset,
        last_dim_size: shape.last,
        last_dim_stride: shape.last_stride,
        second_to_last_dim_size: shape.second,
        second_to_last_dim_stride: shape.second_stride,
        out_lp_step,
        src_footprint: footprint,
        dim_num,
        dims,
    }))
}

/// Number of output elements, `0` for an empty view.
pub fn output_len(size: &[usize]) -> Result<usize> {
    if size.contains(&0) {
        return Ok(0);
    }
    let mut total = 1usize;
    for &d in size {
        total = match total.checked_mul(d) {
            Some(t) => t,
            None => return Err(PlanError::Overflow("output element count")),
        };
    }
    Ok(total)
}

fn scratch_too_small(region: &'static str, required: usize, available: usize) -> PlanError {
    PlanError::ScratchTooSmall {
        region,
        required,
        available,
    }
}

fn pitch_too_small(layout: &ScratchLayout, required: usize) -> PlanError {
    scratch_too_small("reorder line pitch", required, layout.vnc_col_size)
}

fn select(
    shape: &Shape,
    u: usize,
    capacity: usize,
    layout: &ScratchLayout,
    footprint: usize,
) -> Result<Selection> {
    let (l, s, l2, s2) = (
        shape.last,
        shape.last_stride,
        shape.second,
        shape.second_stride,
    );
    let v = layout.vnc_col_size;
    let span = (l - 1) * s + 1;

    let direct = |mode| {
        let pitch = round_up(l, u);
        let (axis0_step, axis1_step) = if pitch <= capacity {
            (capacity / pitch, l)
        } else {
            (1, round_down(capacity, u))
        };
        Selection {
            mode,
            axis0_step,
            axis1_step,
        }
    };
    let packed = |mode| -> Result<Selection> {
        if !layout.reorder_ready() {
            return Err(pitch_too_small(layout, MIN_VNC_COL_SIZE));
        }
        if layout.dense_len < u + l {
            return Err(scratch_too_small("dense region", u + l, layout.dense_len));
        }
        let rows_max = (layout.dense_len - u) / l;
        let rows = if rows_max >= TRANSPOSE_LANES {
            round_down(rows_max, TRANSPOSE_LANES)
        } else {
            rows_max
        };
        let rows_min = u.div_ceil(l).min(shape.rows);
        if rows < rows_min {
            return Err(scratch_too_small(
                "dense region",
                u + rows_min * l,
                layout.dense_len,
            ));
        }
        Ok(Selection {
            mode,
            axis0_step: rows,
            axis1_step: l,
        })
    };

    if s == 0 {
        return if l >= u {
            Ok(direct(TilingMode::LastStrideZeroSizeLarge))
        } else {
            packed(TilingMode::LastStrideZeroSizeSmall)
        };
    }
    if s == 1 {
        return if l >= u {
            Ok(direct(TilingMode::LastStrideOne))
        } else {
            packed(TilingMode::LastDimSmall)
        };
    }

    if layout.reorder_ready()
        && shape.ndim() >= 2
        && s2 == 1
        && l < u
        && l <= TRANSPOSE_LANES
        && s > SPAN_STRIDE_LIMIT
        && l2 >= TRANSPOSE_LANES
        && l2 * l >= 2 * u
    {
        let n = v.min(layout.dense_len.saturating_sub(u) / l);
        if n >= u.div_ceil(l) {
            return Ok(Selection {
                mode: TilingMode::FirstStrideSmall,
                axis0_step: 1,
                axis1_step: n,
            });
        }
    }

    if layout.reorder_ready() && s <= SPAN_STRIDE_LIMIT {
        if l < 4 * u && span <= v {
            return packed(TilingMode::LastDimSmall);
        }
        let reach = (v - 1) / s + 1;
        if l >= u && reach >= u {
            if shape.ndim() >= 2 && l2 >= TRANSPOSE_LANES && span <= v {
                return Ok(Selection {
                    mode: TilingMode::LastTwoDimsLarge,
                    axis0_step: TRANSPOSE_LANES,
                    axis1_step: l,
                });
            }
            return Ok(Selection {
                mode: TilingMode::LastDimLarge,
                axis0_step: TRANSPOSE_LANES,
                axis1_step: l.min(round_down(reach, u)),
            });
        }
    }

    let resident = round_up(footprint, u);
    if resident <= capacity / 2 {
        let rows = (capacity - resident - u) / l;
        if rows >= 1 && (rows >= u.div_ceil(l) || rows >= shape.rows) {
            return Ok(Selection {
                mode: TilingMode::FitsInScratch,
                axis0_step: rows,
                axis1_step: l,
            });
        }
    }

    if !layout.reorder_ready() {
        return Err(pitch_too_small(layout, MIN_VNC_COL_SIZE));
    }
    if l < 4 * u && (l - 1) * u < v {
        return packed(TilingMode::LastDimSmallStrideLarge);
    }
    // One block per element: a whole unit of columns needs a pitch of u * u.
    let cols = l.min(round_down(v / u, u));
    if l < u || cols < u {
        return Err(pitch_too_small(layout, u * u));
    }
    Ok(Selection {
        mode: TilingMode::LastDimLargeStrideLarge,
        axis0_step: TRANSPOSE_LANES,
        axis1_step: cols,
    })
}

/// Floor split of `items` into core shares of `step`: every core but the
/// last gets `step`, the last gets the remainder (at least `step`).
fn split_cores(items: usize, step: usize, core_num: usize) -> (usize, usize) {
    let used = core_num.min((items / step).max(1));
    (used, items - (used - 1) * step)
}

fn partition(shape: &Shape, sel: &Selection, u: usize, core_num: usize) -> Partition {
    let (l, l2, rows) = (shape.last, shape.second, shape.rows);
    let (a0, a1) = (sel.axis0_step, sel.axis1_step);

    let build = |mc_pos: usize, step: usize, items: usize, axis: &dyn Fn(usize) -> CoreWorkRange| {
        let (used, last_share) = split_cores(items, step, core_num);
        Partition {
            used_core_count: used,
            core_step_in: step,
            mc_pos,
            non_last: axis(step),
            last: axis(last_share),
        }
    };

    match sel.mode {
        TilingMode::FirstStrideSmall => {
            let outer = rows / l2;
            let row_elems = l2 * l;
            if outer < core_num && row_elems / u > outer {
                let step = l2.div_ceil(core_num).max(u.div_ceil(l));
                build(1, step, l2, &|share| CoreWorkRange {
                    axis0: AxisRange::split(outer, a0, row_elems, u),
                    axis1: AxisRange::split(share, a1, l, u),
                })
            } else {
                let step = outer.div_ceil(core_num).max(1);
                build(0, step, outer, &|share| CoreWorkRange {
                    axis0: AxisRange::split(share, a0, row_elems, u),
                    axis1: AxisRange::split(l2, a1, l, u),
                })
            }
        }
        mode if mode.packs_rows() => {
            let step = rows.div_ceil(core_num).max(u.div_ceil(l));
            build(0, step, rows, &|share| CoreWorkRange {
                axis0: AxisRange::split(share, a0, l, u),
                axis1: AxisRange {
                    loop_count: 1,
                    leftover: 0,
                    backend: 0,
                },
            })
        }
        _ => {
            if rows < core_num && l / u > rows {
                let step = round_up(l.div_ceil(core_num).max(u), u);
                build(1, step, l, &|share| CoreWorkRange {
                    axis0: AxisRange::split(rows, a0, l, u),
                    axis1: AxisRange::split(share, a1, 1, u),
                })
            } else {
                let step = rows.div_ceil(core_num).max(1);
                build(0, step, rows, &|share| CoreWorkRange {
                    axis0: AxisRange::split(share, a0, l, u),
                    axis1: AxisRange::split(l, a1, 1, u),
                })
            }
        }
    }
}

/// Decomposition triples of the axis-0 index space: every dim but the last
/// (but the last two for the transpose-based strategy).
fn decompose(shape: &Shape, mode: TilingMode) -> (usize, [DimTriple; MAX_DIM_NUM]) {
    let inner = if mode == TilingMode::FirstStrideSmall {
        2
    } else {
        1
    };
    let lead = shape.ndim().saturating_sub(inner);
    let mut dims = [DimTriple::default(); MAX_DIM_NUM];
    if lead == 0 {
        dims[0] = DimTriple {
            reduced_size: 1,
            size: 1,
            stride: 0,
        };
        return (1, dims);
    }
    let mut reduced = 1;
    for k in (0..lead).rev() {
        dims[k] = DimTriple {
            reduced_size: reduced,
            size: shape.sizes[k],
            stride: shape.strides[k],
        };
        reduced *= shape.sizes[k];
    }
    (lead, dims)
}

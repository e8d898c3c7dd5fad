use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use strided_device::{alignment_unit, DeviceConfig, Element};
use strided_tiling::{
    plan_as_strided, resolve_offset, resolver_for, TilingMode, TilingPlan, MAX_DIM_NUM,
};

fn plan<T: Element>(src_len: usize, size: &[usize], stride: &[isize], offset: isize) -> TilingPlan {
    plan_as_strided::<T>(src_len, size, stride, offset, &DeviceConfig::default())
        .unwrap()
        .unwrap()
}

/// Flat source offset of output row `r` by the direct stride formula.
fn row_offset(size: &[usize], stride: &[isize], offset: isize, mut r: usize) -> usize {
    let mut acc = offset;
    for k in (0..size.len() - 1).rev() {
        acc += (r % size[k]) as isize * stride[k];
        r /= size[k];
    }
    acc as usize
}

#[test]
fn test_max_dims_selects_last_resolver() {
    let size = vec![2usize; MAX_DIM_NUM + 1];
    let stride: Vec<isize> = (0..=MAX_DIM_NUM as isize).map(|k| 2 * k + 1).collect();
    let p = plan::<f32>(1000, &size, &stride, 7);
    assert_eq!(p.dim_num, MAX_DIM_NUM);
    for r in [0usize, 1, 5, 1000, 99_999, (1 << MAX_DIM_NUM) - 1] {
        assert_eq!(
            resolve_offset(&p, r),
            row_offset(&size, &stride, 7, r),
            "row {r}"
        );
    }
    // One fewer triple gives a different answer for a high row.
    let r = (1 << MAX_DIM_NUM) - 1;
    assert_ne!(
        resolver_for(MAX_DIM_NUM - 1)(&p.dims, r),
        resolver_for(MAX_DIM_NUM)(&p.dims, r)
    );
}

#[test]
fn test_too_many_dims() {
    let size = vec![2usize; MAX_DIM_NUM + 2];
    let stride: Vec<isize> = (0..MAX_DIM_NUM as isize + 2).map(|k| 2 * k + 1).collect();
    let err = plan_as_strided::<f32>(10_000, &size, &stride, 0, &DeviceConfig::default());
    assert!(err.is_err());
}

#[test]
fn test_param_block_round_trip_random_views() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..200 {
        let ndim = rng.gen_range(1..5);
        let size: Vec<usize> = (0..ndim).map(|_| rng.gen_range(1..40)).collect();
        let stride: Vec<isize> = (0..ndim).map(|_| rng.gen_range(0..50)).collect();
        let reach: usize = size
            .iter()
            .zip(&stride)
            .map(|(&d, &s)| (d - 1) * s as usize)
            .sum();
        let p = plan::<u16>(reach + 3, &size, &stride, 2);
        let back = TilingPlan::from_words(&p.to_words()).unwrap();
        assert_eq!(back, p);
    }
}

/// Check that core shares cover the split axis exactly and that every core
/// owns at least one alignment unit of output when the output allows it.
fn check_partition<T: Element>(p: &TilingPlan, total: usize) {
    let u = alignment_unit::<T>();
    let l = p.last_dim_size;
    let (split_items, item_elems) = match (p.mode, p.mc_pos) {
        (TilingMode::FirstStrideSmall, 0) => (total / p.out_lp_step, p.out_lp_step),
        (TilingMode::FirstStrideSmall, _) => (p.second_to_last_dim_size, l),
        (_, 0) => (total / l, l),
        (_, _) => (l, 1),
    };
    let (step0, step1) = (p.axis0_step, p.axis1_step);
    let share = |core: usize| {
        let r = p.core_range(core);
        if p.mc_pos == 0 {
            r.axis0.items(step0)
        } else {
            r.axis1.items(step1)
        }
    };
    let covered: usize = (0..p.used_core_count).map(share).sum();
    assert_eq!(covered, split_items, "{}", p.mode);
    for core in 0..p.used_core_count {
        if core + 1 < p.used_core_count {
            assert_eq!(share(core), p.core_step_in);
        }
        if total >= u {
            assert!(share(core) * item_elems >= u, "{} core {core}", p.mode);
        }
    }
}

#[test]
fn test_partition_covers_output() {
    let mut rng = StdRng::seed_from_u64(7);
    let cfg = DeviceConfig::default().with_core_num(8);
    for _ in 0..300 {
        let ndim = rng.gen_range(1..4);
        let size: Vec<usize> = (0..ndim).map(|_| rng.gen_range(1..300)).collect();
        let stride: Vec<isize> = (0..ndim).map(|_| rng.gen_range(0..40)).collect();
        let reach: usize = size
            .iter()
            .zip(&stride)
            .map(|(&d, &s)| (d - 1) * s as usize)
            .sum();
        let total: usize = size.iter().product();
        let p = plan_as_strided::<f32>(reach + 1, &size, &stride, 0, &cfg)
            .unwrap()
            .unwrap();
        assert!(p.used_core_count <= cfg.core_num);
        check_partition::<f32>(&p, total);
    }
}

#[test]
fn test_every_mode_is_reachable() {
    let cases: [(&[usize], &[isize], TilingMode); 10] = [
        (&[64, 64], &[64, 1], TilingMode::LastStrideOne),
        (&[4, 600], &[1, 3], TilingMode::LastDimLarge),
        (&[40, 7], &[50, 3], TilingMode::LastDimSmall),
        (&[30, 7], &[90, 40], TilingMode::FitsInScratch),
        (&[3, 2000], &[1, 40], TilingMode::LastDimLargeStrideLarge),
        (&[3, 9], &[1, 9000], TilingMode::LastDimSmallStrideLarge),
        (&[20, 300], &[1000, 3], TilingMode::LastTwoDimsLarge),
        (&[6, 300], &[1, 0], TilingMode::LastStrideZeroSizeLarge),
        (&[6, 3], &[1, 0], TilingMode::LastStrideZeroSizeSmall),
        (&[512, 3], &[1, 600], TilingMode::FirstStrideSmall),
    ];
    for (size, stride, mode) in cases {
        let reach: usize = size
            .iter()
            .zip(stride)
            .map(|(&d, &s)| (d - 1) * s as usize)
            .sum();
        let p = plan::<f32>(reach + 1, size, stride, 0);
        assert_eq!(p.mode, mode, "size {size:?} stride {stride:?}");
    }
}

//! Index Resolver: axis-0 index to source element offset.
//!
//! `offset = storage_offset + sum_i ((idx / reduced_size_i) % size_i) * stride_i`
//!
//! The number of active triples is only known once a plan is read, but the
//! hot path must not loop over a runtime-length list. Each `dim_num` gets its
//! own monomorphized resolver with a fixed trip count; the plan picks one
//! entry of the table once per invocation.

use crate::plan::{DimTriple, TilingPlan, MAX_DIM_NUM};

/// Resolver over the first `N` triples, selected per plan.
pub type Resolver = fn(&[DimTriple; MAX_DIM_NUM], usize) -> usize;

#[inline]
fn resolve_n<const N: usize>(dims: &[DimTriple; MAX_DIM_NUM], idx: usize) -> usize {
    let mut offset = 0;
    for d in &dims[..N] {
        offset += (idx / d.reduced_size) % d.size * d.stride;
    }
    offset
}

macro_rules! resolver_table {
    ($($n:literal),* $(,)?) => {
        [$(resolve_n::<$n> as Resolver),*]
    };
}

static RESOLVERS: [Resolver; MAX_DIM_NUM] = resolver_table!(
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21,
);

/// Resolver for `dim_num` active triples (`1..=21`).
#[inline]
pub fn resolver_for(dim_num: usize) -> Resolver {
    RESOLVERS[dim_num.clamp(1, MAX_DIM_NUM) - 1]
}

/// Source offset of axis-0 index `idx`, including the storage offset.
#[inline]
pub fn resolve_offset(plan: &TilingPlan, idx: usize) -> usize {
    plan.storage_offset + resolver_for(plan.dim_num)(&plan.dims, idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triples(sizes: &[usize], strides: &[usize]) -> [DimTriple; MAX_DIM_NUM] {
        let mut dims = [DimTriple::default(); MAX_DIM_NUM];
        let mut reduced = 1;
        for k in (0..sizes.len()).rev() {
            dims[k] = DimTriple {
                reduced_size: reduced,
                size: sizes[k],
                stride: strides[k],
            };
            reduced *= sizes[k];
        }
        dims
    }

    #[test]
    fn test_single_dim() {
        let dims = triples(&[10], &[3]);
        let f = resolver_for(1);
        assert_eq!(f(&dims, 0), 0);
        assert_eq!(f(&dims, 7), 21);
    }

    #[test]
    fn test_two_dims_row_major() {
        // 3 x 4 index space, strides (100, 7).
        let dims = triples(&[3, 4], &[100, 7]);
        let f = resolver_for(2);
        assert_eq!(f(&dims, 0), 0);
        assert_eq!(f(&dims, 5), 100 + 7);
        assert_eq!(f(&dims, 11), 200 + 21);
    }

    #[test]
    fn test_max_dims_against_direct_formula() {
        let sizes = [2usize; MAX_DIM_NUM];
        let strides: Vec<usize> = (0..MAX_DIM_NUM).map(|k| 3 * k + 1).collect();
        let dims = triples(&sizes, &strides);
        let f = resolver_for(MAX_DIM_NUM);
        for idx in [0usize, 1, 2, 1000, 123_457, (1 << 21) - 1] {
            // Bit k (from the top) of idx selects dim k.
            let expected: usize = (0..MAX_DIM_NUM)
                .map(|k| ((idx >> (MAX_DIM_NUM - 1 - k)) & 1) * strides[k])
                .sum();
            assert_eq!(f(&dims, idx), expected, "idx {idx}");
        }
    }

    #[test]
    fn test_table_entries_use_their_own_count() {
        let dims = triples(&[2, 2, 2], &[100, 10, 1]);
        // Only the first triple is read with dim_num = 1.
        assert_eq!(resolver_for(1)(&dims, 7), (7 / 4) % 2 * 100);
        assert_eq!(resolver_for(3)(&dims, 7), 111);
    }
}

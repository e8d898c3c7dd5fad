//! Dimension normalization for row-major strided views.
//!
//! Size-1 dims are dropped and neighbouring dims that walk memory as one
//! contiguous run are merged, so the planner sees the fewest dims that
//! describe the same view.

/// Remove size-1 dimensions.
///
/// If every dim has size 1 (or there are none), a single `(1, 0)` dim is kept
/// so the view still has a last dimension.
pub fn compress_dims(size: &[usize], stride: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let kept: Vec<usize> = (0..size.len()).filter(|&i| size[i] != 1).collect();
    if kept.is_empty() {
        return (vec![1], vec![0]);
    }
    (
        kept.iter().map(|&i| size[i]).collect(),
        kept.iter().map(|&i| stride[i]).collect(),
    )
}

/// Fuse row-major-contiguous neighbours.
///
/// Dims `k` and `k + 1` merge when `stride[k] == size[k + 1] * stride[k + 1]`:
/// the outer dim steps exactly over one full run of the inner one. Two
/// broadcast dims (both stride 0) merge into one broadcast dim.
pub fn fuse_dims(size: &[usize], stride: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let n = size.len();
    if n <= 1 {
        return (size.to_vec(), stride.to_vec());
    }

    let mut fused_size = Vec::with_capacity(n);
    let mut fused_stride = Vec::with_capacity(n);
    fused_size.push(size[n - 1]);
    fused_stride.push(stride[n - 1]);

    // Walk outward from the innermost dim.
    for k in (0..n - 1).rev() {
        let last = fused_size.len() - 1;
        let run = fused_size[last].checked_mul(fused_stride[last]);
        match fused_size[last].checked_mul(size[k]) {
            Some(merged) if run == Some(stride[k]) => fused_size[last] = merged,
            _ => {
                fused_size.push(size[k]);
                fused_stride.push(stride[k]);
            }
        }
    }

    fused_size.reverse();
    fused_stride.reverse();
    (fused_size, fused_stride)
}

/// Compress then fuse.
pub fn normalize(size: &[usize], stride: &[usize]) -> (Vec<usize>, Vec<usize>) {
    let (s, st) = compress_dims(size, stride);
    fuse_dims(&s, &st)
}

/// Largest element offset reachable from the view origin, `None` if it does
/// not fit in `usize`.
pub fn max_reach(size: &[usize], stride: &[usize]) -> Option<usize> {
    let mut reach = 0usize;
    for (&d, &s) in size.iter().zip(stride) {
        reach = reach.checked_add(d.saturating_sub(1).checked_mul(s)?)?;
    }
    Some(reach)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fuse_dims_contiguous() {
        let (s, st) = fuse_dims(&[3, 4], &[4, 1]);
        assert_eq!(s, vec![12]);
        assert_eq!(st, vec![1]);
    }

    #[test]
    fn test_fuse_dims_non_contiguous() {
        let (s, st) = fuse_dims(&[3, 4], &[10, 1]);
        assert_eq!(s, vec![3, 4]);
        assert_eq!(st, vec![10, 1]);
    }

    #[test]
    fn test_fuse_dims_partial() {
        // Inner two dims fuse (6 = 3 * 2), outer does not.
        let (s, st) = fuse_dims(&[5, 4, 3], &[100, 6, 2]);
        assert_eq!(s, vec![5, 12]);
        assert_eq!(st, vec![100, 2]);
    }

    #[test]
    fn test_fuse_broadcast_dims() {
        let (s, st) = fuse_dims(&[2, 3, 4], &[0, 0, 1]);
        assert_eq!(s, vec![6, 4]);
        assert_eq!(st, vec![0, 1]);
    }

    #[test]
    fn test_compress_dims_removes_unit_dims() {
        let (s, st) = compress_dims(&[1, 5, 1, 3], &[99, 7, 42, 2]);
        assert_eq!(s, vec![5, 3]);
        assert_eq!(st, vec![7, 2]);
        let (s, st) = compress_dims(&[1, 1], &[3, 4]);
        assert_eq!(s, vec![1]);
        assert_eq!(st, vec![0]);
        let (s, _) = compress_dims(&[], &[]);
        assert_eq!(s, vec![1]);
    }

    #[test]
    fn test_normalize_fuses_across_removed_dims() {
        // The size-1 dim in the middle hides a contiguous pair.
        let (s, st) = normalize(&[2, 1, 8], &[8, 1000, 1]);
        assert_eq!(s, vec![16]);
        assert_eq!(st, vec![1]);
    }

    #[test]
    fn test_max_reach() {
        assert_eq!(max_reach(&[4, 1024], &[1, 4]), Some(3 + 1023 * 4));
        assert_eq!(max_reach(&[8, 100], &[0, 1]), Some(99));
    }

    #[test]
    fn test_max_reach_overflow() {
        let huge = isize::MAX as usize;
        assert_eq!(max_reach(&[3], &[huge]), Some(2 * huge));
        assert_eq!(max_reach(&[4], &[huge]), None);
        assert_eq!(max_reach(&[3, 2], &[huge, 2]), None);
    }

    #[test]
    fn test_fuse_dims_never_overflows() {
        // The contiguity product overflows, so the dims stay apart.
        let (s, st) = fuse_dims(&[2, usize::MAX], &[1, 2]);
        assert_eq!(s, vec![2, usize::MAX]);
        assert_eq!(st, vec![1, 2]);
    }
}

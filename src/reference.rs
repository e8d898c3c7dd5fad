//! Reference materializer: the stride formula applied element by element.

/// Source offset of the row-major multi-index `index`.
#[inline]
pub fn strided_offset(index: &[usize], stride: &[isize], storage_offset: isize) -> isize {
    index
        .iter()
        .zip(stride)
        .fold(storage_offset, |acc, (&i, &s)| acc + i as isize * s)
}

/// Naive `as_strided`: walk the output in row-major order and read every
/// element through [`strided_offset`].
///
/// # Panics
/// Panics if the view reaches outside `src` or `size` and `stride` differ in
/// length.
pub fn as_strided_naive<T: Copy>(
    src: &[T],
    size: &[usize],
    stride: &[isize],
    storage_offset: isize,
) -> Vec<T> {
    assert_eq!(size.len(), stride.len(), "size/stride rank mismatch");
    let total: usize = size.iter().product();
    let mut out = Vec::with_capacity(total);
    if total == 0 {
        return out;
    }
    let mut index = vec![0usize; size.len()];
    for _ in 0..total {
        let off = strided_offset(&index, stride, storage_offset);
        out.push(src[usize::try_from(off).unwrap_or(usize::MAX)]);
        // Odometer increment, last dim fastest.
        for k in (0..size.len()).rev() {
            index[k] += 1;
            if index[k] < size[k] {
                break;
            }
            index[k] = 0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpose() {
        let src = [1, 2, 3, 4, 5, 6];
        assert_eq!(
            as_strided_naive(&src, &[3, 2], &[1, 3], 0),
            vec![1, 4, 2, 5, 3, 6]
        );
    }

    #[test]
    fn test_scalar_and_empty() {
        let src = [7u8, 8, 9];
        assert_eq!(as_strided_naive(&src, &[], &[], 2), vec![9]);
        assert!(as_strided_naive(&src, &[2, 0], &[1, 1], 0).is_empty());
    }
}

/// Map an index that may fall outside `[0, n)` back into the range by mirroring
/// around the edge samples without repeating them (`gfedcb|abcdefgh|gfedcba`).
#[inline]
pub(crate) fn reflect_101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }

    let last = n as isize - 1;
    let mut i = i;
    while i < 0 || i > last {
        if i < 0 {
            i = -i;
        }
        if i > last {
            i = 2 * last - i;
        }
    }

    i as usize
}

/// Clamp an index to the range `[0, n)` (`aaaaaa|abcdefgh|hhhhhhh`).
#[inline]
pub(crate) fn replicate(i: isize, n: usize) -> usize {
    i.clamp(0, n as isize - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(2, 5), 2);
        assert_eq!(reflect_101(-3, 1), 0);
        assert_eq!(reflect_101(7, 2), 1);
        assert_eq!(reflect_101(-5, 2), 1);
    }

    #[test]
    fn test_replicate() {
        assert_eq!(replicate(-4, 3), 0);
        assert_eq!(replicate(1, 3), 1);
        assert_eq!(replicate(9, 3), 2);
    }
}

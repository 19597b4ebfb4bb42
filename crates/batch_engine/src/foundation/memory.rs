//! Memory management utilities
//!
//! Sizing helpers shared by the buffer pools. Every pooled buffer has a
//! power-of-two capacity so buffers can be bucketed by size class.

/// Round `size` up to the next power of two (minimum 1)
#[inline]
pub fn next_power_of_two(size: usize) -> usize {
    size.max(1).next_power_of_two()
}

/// Size class of a power-of-two capacity (its base-2 logarithm)
///
/// Capacities that are not a power of two are classed by the largest power of
/// two they can hold, so a buffer is never handed out as bigger than it is.
#[inline]
pub fn size_class(capacity: usize) -> u32 {
    if capacity == 0 {
        0
    } else {
        usize::BITS - 1 - capacity.leading_zeros()
    }
}

/// Round `required` up to a power-of-two multiple of `granule`
///
/// `granule` must itself be a power of two; configurations are validated for
/// this before any buffer is sized.
#[inline]
pub fn round_to_granule(required: usize, granule: usize) -> usize {
    next_power_of_two(required.max(granule))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_power_of_two() {
        assert_eq!(next_power_of_two(0), 1);
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(50), 64);
        assert_eq!(next_power_of_two(64), 64);
        assert_eq!(next_power_of_two(65), 128);
    }

    #[test]
    fn test_size_class() {
        assert_eq!(size_class(1), 0);
        assert_eq!(size_class(64), 6);
        assert_eq!(size_class(100), 6);
        assert_eq!(size_class(128), 7);
    }

    #[test]
    fn test_round_to_granule() {
        assert_eq!(round_to_granule(3, 64), 64);
        assert_eq!(round_to_granule(100, 64), 128);
        assert_eq!(round_to_granule(0, 16), 16);
    }
}

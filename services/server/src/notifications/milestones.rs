/// Fixed ascending milestone thresholds.
pub const MILESTONES: [i64; 7] = [10, 50, 100, 500, 1000, 5000, 10000];

/// The highest milestone that `current_upvotes` has crossed, if any.
///
/// A "crossing" only matters at the boundary itself: callers insert a
/// notification for this threshold and rely on the store's uniqueness
/// constraint to make repeated crossings (or concurrent ones) idempotent,
/// so it is safe to always return the *current* highest crossed threshold
/// rather than tracking the previous vote count.
pub fn highest_crossed(current_upvotes: i64) -> Option<i64> {
    MILESTONES.iter().rev().copied().find(|&m| current_upvotes >= m)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_first_threshold_crosses_nothing() {
        assert_eq!(highest_crossed(9), None);
    }

    #[test]
    fn exact_threshold_crosses() {
        assert_eq!(highest_crossed(10), Some(10));
    }

    #[test]
    fn between_thresholds_reports_the_lower_one() {
        assert_eq!(highest_crossed(11), Some(10));
        assert_eq!(highest_crossed(4999), Some(1000));
    }

    #[test]
    fn above_top_threshold_reports_it() {
        assert_eq!(highest_crossed(1_000_000), Some(10000));
    }
}

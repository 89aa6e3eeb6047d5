//! OCR page-batch sizing.
//!
//! Batches start wide and shrink by halving after a failure, never below
//! the floor. The policy is a pure value: a failure maps the current
//! policy to the next one, and the acquisition loop decides whether to
//! retry the same page range or skip it.

/// Page-batch sizing for OCR, with halve-on-failure recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OcrBatchPolicy {
    pages: usize,
}

impl OcrBatchPolicy {
    /// Initial batch width in pages.
    pub const DEFAULT_PAGES: usize = 12;
    /// Smallest batch width the policy will shrink to.
    pub const FLOOR: usize = 4;

    pub fn new(pages: usize) -> Self {
        Self {
            pages: pages.max(1),
        }
    }

    pub fn pages(&self) -> usize {
        self.pages
    }

    /// The policy after a batch failure: half the width, clamped at the floor.
    pub fn shrink(self) -> Self {
        Self {
            pages: (self.pages / 2).max(Self::FLOOR),
        }
    }

    /// True once shrinking can make no further progress. A batch that fails
    /// at the floor is skipped rather than retried.
    pub fn at_floor(&self) -> bool {
        self.pages <= Self::FLOOR
    }
}

impl Default for OcrBatchPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PAGES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrinks_by_halving() {
        let policy = OcrBatchPolicy::default();
        assert_eq!(policy.pages(), 12);
        let policy = policy.shrink();
        assert_eq!(policy.pages(), 6);
        let policy = policy.shrink();
        assert_eq!(policy.pages(), 4);
    }

    #[test]
    fn never_shrinks_below_floor() {
        let mut policy = OcrBatchPolicy::default();
        for _ in 0..10 {
            policy = policy.shrink();
        }
        assert_eq!(policy.pages(), OcrBatchPolicy::FLOOR);
        assert!(policy.at_floor());
    }

    #[test]
    fn custom_width_below_floor_is_already_at_floor() {
        let policy = OcrBatchPolicy::new(2);
        assert_eq!(policy.pages(), 2);
        assert!(policy.at_floor());
        // Shrinking a sub-floor policy clamps up to the floor, not down.
        assert_eq!(policy.shrink().pages(), OcrBatchPolicy::FLOOR);
    }

    #[test]
    fn zero_is_clamped_to_one_page() {
        assert_eq!(OcrBatchPolicy::new(0).pages(), 1);
    }
}

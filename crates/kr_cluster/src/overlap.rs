use std::collections::HashSet;

use kr_core::config::DEFAULT_PAGE_SIZE;

/// SERP overlap between two keywords.
///
/// Shared URLs are divided by the larger of the two result counts, floored at
/// the expected page size. Two sparse result lists that agree completely still
/// score low: two keywords with the same 2 URLs score `2 / 10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverlapScorer {
    page_size: usize,
}

impl Default for OverlapScorer {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl OverlapScorer {
    pub fn new(page_size: usize) -> Self {
        Self { page_size: page_size.max(1) }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn score(&self, a: &[String], b: &[String]) -> f64 {
        let a: HashSet<&str> = a.iter().map(String::as_str).collect();
        let b: HashSet<&str> = b.iter().map(String::as_str).collect();
        self.score_sets(&a, &b)
    }

    /// Scores two already de-duplicated URL sets.
    pub fn score_sets(&self, a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
        let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
        let shared = small.iter().filter(|url| large.contains(*url)).count();
        let denominator = a.len().max(b.len()).max(self.page_size);
        shared as f64 / denominator as f64
    }
}

/// Overlap with the default page size of 10.
pub fn overlap(a: &[String], b: &[String]) -> f64 {
    OverlapScorer::default().score(a, b)
}

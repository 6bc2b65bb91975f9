//! Page range normalization
//!
//! User-supplied page bounds are corrected rather than rejected: reversed
//! ranges are swapped and out-of-bounds values are clamped into the
//! document. Only image extraction (which takes a single explicit page)
//! rejects bad input; see [`crate::pdf::extract_page_images`].

/// A normalized inclusive interval of 1-based page numbers.
///
/// Invariant: after [`PageRange::normalize`], `1 <= start <= end <= page_count`
/// whenever the document has at least one page. An empty document yields an
/// empty range that iterates zero pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    start: u32,
    end: u32,
}

impl PageRange {
    /// Normalize user-supplied bounds against the document's page count.
    ///
    /// - `end_page` unset defaults to the last page.
    /// - A reversed interval is swapped, not rejected.
    /// - Both bounds are clamped into `[1, page_count]`.
    /// - `page_count == 0` produces an empty range; no input is an error.
    pub fn normalize(start_page: i32, end_page: Option<i32>, page_count: u32) -> Self {
        if page_count == 0 {
            return Self { start: 1, end: 0 };
        }

        let last = i64::from(page_count);
        let mut start = i64::from(start_page);
        let mut end = end_page.map(i64::from).unwrap_or(last);

        if start > end {
            std::mem::swap(&mut start, &mut end);
        }

        Self {
            start: start.clamp(1, last) as u32,
            end: end.clamp(1, last) as u32,
        }
    }

    /// First page in the range (1-based). Meaningless when empty.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Last page in the range (1-based, inclusive). Meaningless when empty.
    pub fn end(&self) -> u32 {
        self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// Number of pages in the range.
    pub fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start + 1) as usize
        }
    }

    /// Iterate 1-based page numbers in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

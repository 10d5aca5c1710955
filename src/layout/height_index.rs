//! HeightIndex - per-column row index via Fenwick tree
//!
//! A render sink keeps one index per column, with one entry per placed tile
//! (its height in rows). Finding which tiles intersect the viewport is then a
//! binary search over prefix sums instead of a linear walk down the column.
//!
//! # Complexity
//!
//! - `push`: O(log n)
//! - `prefix_sum`: O(log n)
//! - `lower_bound`: O(log² n)
//! - `visible_range`: O(log² n)

use std::ops::Range;

/// Cumulative row heights of the tiles in one column.
#[derive(Debug, Clone, Default)]
pub struct HeightIndex {
    /// Fenwick tree backing storage (1-indexed internally, 0-indexed API)
    tree: Vec<isize>,
    /// Number of valid entries (len <= tree.len())
    len: usize,
}

impl HeightIndex {
    /// Creates an empty index with pre-allocated storage.
    ///
    /// ```
    /// # use waterfall::layout::height_index::HeightIndex;
    /// let index = HeightIndex::new(16);
    /// assert!(index.is_empty());
    /// assert_eq!(index.total(), 0);
    /// ```
    pub fn new(capacity: usize) -> Self {
        Self {
            tree: vec![0; capacity],
            len: 0,
        }
    }

    /// Rows covered by entries `0..=index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn prefix_sum(&self, index: usize) -> usize {
        assert!(
            index < self.len,
            "index {} out of bounds (len: {})",
            index,
            self.len
        );
        fenwick::array::prefix_sum(&self.tree, index).max(0) as usize
    }

    /// First entry whose bottom edge lies below `row`, i.e. the tile that
    /// covers `row`. `None` if `row` is past the end of the column.
    ///
    /// ```
    /// # use waterfall::layout::height_index::HeightIndex;
    /// let mut index = HeightIndex::new(4);
    /// index.push(10); // rows [0..10)
    /// index.push(5);  // rows [10..15)
    /// assert_eq!(index.lower_bound(9), Some(0));
    /// assert_eq!(index.lower_bound(10), Some(1));
    /// assert_eq!(index.lower_bound(15), None);
    /// ```
    pub fn lower_bound(&self, row: usize) -> Option<usize> {
        let mut left = 0;
        let mut right = self.len;

        while left < right {
            let mid = left + (right - left) / 2;
            if self.prefix_sum(mid) > row {
                right = mid;
            } else {
                left = mid + 1;
            }
        }

        (left < self.len).then_some(left)
    }

    /// Entries intersecting rows `[offset, offset + height)`.
    ///
    /// Zero-height entries at the boundaries are skipped; they occupy no
    /// rows and cannot be seen.
    pub fn visible_range(&self, offset: usize, height: usize) -> Range<usize> {
        if height == 0 {
            return 0..0;
        }
        let Some(start) = self.lower_bound(offset) else {
            return self.len..self.len;
        };
        let last_row = offset.saturating_add(height - 1);
        let end = self.lower_bound(last_row).map_or(self.len, |i| i + 1);
        start..end
    }

    /// Total rows in the column.
    pub fn total(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.prefix_sum(self.len - 1)
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when nothing has been pushed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends a tile of `rows` rows, growing storage if needed.
    pub fn push(&mut self, rows: usize) {
        if self.len >= self.tree.len() {
            self.grow();
        }
        let idx = self.len;
        self.len += 1;
        // Full-tree update so later slots see the new prefix
        fenwick::array::update(&mut self.tree, idx, rows as isize);
    }

    /// Doubles storage and rebuilds the tree. Nodes past the old end must
    /// cover earlier entries too, so a plain resize is not enough.
    fn grow(&mut self) {
        let entries: Vec<isize> = (0..self.len)
            .map(|i| {
                let below = if i == 0 { 0 } else { self.prefix_sum(i - 1) };
                (self.prefix_sum(i) - below) as isize
            })
            .collect();
        self.tree = vec![0; self.tree.len().max(1) * 2];
        for (i, rows) in entries.into_iter().enumerate() {
            fenwick::array::update(&mut self.tree, i, rows);
        }
    }

    /// Removes all entries, keeping capacity.
    pub fn clear(&mut self) {
        self.tree.iter_mut().for_each(|v| *v = 0);
        self.len = 0;
    }
}

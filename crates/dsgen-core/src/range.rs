use std::fmt;

use serde::{Deserialize, Serialize};

/// Inclusive range of 1-based row numbers.
///
/// The range is empty when `start > end`. `end` may be `u64::MAX` to mean
/// "until the producer runs out".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RowRange {
    pub start: u64,
    pub end: u64,
}

impl RowRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Range covering `[1, total]`.
    pub fn full(total: u64) -> Self {
        Self::new(1, total)
    }

    /// Range starting at `start` with no upper bound.
    pub fn unbounded(start: u64) -> Self {
        Self::new(start, u64::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }

    pub fn is_unbounded(&self) -> bool {
        self.end == u64::MAX
    }

    /// Number of rows in the range, saturating for unbounded ranges.
    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).saturating_add(1)
        }
    }

    pub fn contains(&self, row: u64) -> bool {
        self.start <= row && row <= self.end
    }

    /// Row numbers of the range in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u64> + use<> {
        let range = *self;
        let mut next = Some(range.start).filter(|_| !range.is_empty());
        std::iter::from_fn(move || {
            let current = next?;
            next = if current < range.end {
                Some(current + 1)
            } else {
                None
            };
            Some(current)
        })
    }

    /// The `chunk`-th (1-based) of `parallelism` contiguous chunks of `[1, total]`.
    ///
    /// Every chunk gets `total / parallelism` rows and the last one also takes
    /// the remainder. When there are fewer rows than chunks, the leading chunks
    /// get one row each and the rest are empty.
    pub fn for_chunk(total: u64, parallelism: u64, chunk: u64) -> Self {
        let parallelism = parallelism.max(1);
        if chunk == 0 || chunk > parallelism {
            return Self::new(1, 0);
        }

        let per_chunk = total / parallelism;
        if per_chunk == 0 {
            return if chunk <= total {
                Self::new(chunk, chunk)
            } else {
                Self::new(total + 1, total)
            };
        }

        let start = (chunk - 1) * per_chunk + 1;
        let end = if chunk == parallelism {
            total
        } else {
            chunk * per_chunk
        };
        Self::new(start, end)
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unbounded() {
            write!(f, "[{}, ..]", self.start)
        } else {
            write!(f, "[{}, {}]", self.start, self.end)
        }
    }
}

//! Column addressing of inverse-Jacobian matrices.
//!
//! A [`BuildingBlock`] says which columns of a stored sensitivity matrix
//! belong to which curve. Column `j` of the matrix stored for curve `c`
//! holds the sensitivity of `c`'s parameters to the `j`-th market quote of
//! the block, and the quotes of curve `k` occupy `range(k)`.

use std::collections::HashMap;
use std::ops::Range;

use crate::error::{CalibrationError, CalibrationResult};

/// A contiguous run of columns: `[start, start + len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockRange {
    /// First column.
    pub start: usize,
    /// Number of columns.
    pub len: usize,
}

impl BlockRange {
    /// Creates a new range.
    #[must_use]
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// One past the last column.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Returns true if the range has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Equivalent standard range.
    #[must_use]
    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Ordered table from curve name to its column range.
///
/// The ranges partition `[0, total_parameters())` in table order, so every
/// column is attributed to exactly one curve.
///
/// # Example
///
/// ```rust
/// use curvekit_calibration::block::BuildingBlock;
///
/// let block = BuildingBlock::from_lengths([("USD-OIS", 4), ("USD-3M", 3)]).unwrap();
/// assert_eq!(block.start("USD-3M"), Some(4));
/// assert_eq!(block.total_parameters(), 7);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildingBlock {
    entries: Vec<(String, BlockRange)>,
    index: HashMap<String, usize>,
    total: usize,
}

impl BuildingBlock {
    /// Lays curves out one after the other with the given column counts.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if a name appears twice.
    pub fn from_lengths<I, S>(lengths: I) -> CalibrationResult<Self>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let mut block = Self::default();
        for (name, len) in lengths {
            let range = BlockRange::new(block.total, len);
            block.push(name.into(), range)?;
        }
        Ok(block)
    }

    /// Builds a block from explicit ranges.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if a name appears twice or if the ranges,
    /// taken in order, leave a gap or overlap.
    pub fn from_ranges<I, S>(ranges: I) -> CalibrationResult<Self>
    where
        I: IntoIterator<Item = (S, BlockRange)>,
        S: Into<String>,
    {
        let mut block = Self::default();
        for (name, range) in ranges {
            let name = name.into();
            if range.start != block.total {
                return Err(CalibrationError::configuration(format!(
                    "range of curve {name} starts at column {} but the previous range ends at {}",
                    range.start, block.total
                )));
            }
            block.push(name, range)?;
        }
        Ok(block)
    }

    fn push(&mut self, name: String, range: BlockRange) -> CalibrationResult<()> {
        if self.index.contains_key(&name) {
            return Err(CalibrationError::configuration(format!(
                "curve {name} appears twice in a building block"
            )));
        }
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, range));
        self.total = range.end();
        Ok(())
    }

    /// Column range of a curve.
    #[must_use]
    pub fn range(&self, name: &str) -> Option<BlockRange> {
        self.index.get(name).map(|&i| self.entries[i].1)
    }

    /// First column of a curve.
    #[must_use]
    pub fn start(&self, name: &str) -> Option<usize> {
        self.range(name).map(|r| r.start)
    }

    /// Number of columns of a curve.
    #[must_use]
    pub fn len(&self, name: &str) -> Option<usize> {
        self.range(name).map(|r| r.len)
    }

    /// Returns true if the curve has a range in this block.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Curve names in column order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Names and ranges in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, BlockRange)> {
        self.entries.iter().map(|(name, range)| (name.as_str(), *range))
    }

    /// Number of curves addressed.
    #[must_use]
    pub fn curve_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of columns.
    #[must_use]
    pub fn total_parameters(&self) -> usize {
        self.total
    }
}

//! Storage of per-curve inverse-Jacobian matrices.

use std::collections::HashMap;
use std::sync::Arc;

use nalgebra::DMatrix;

use crate::block::BuildingBlock;
use crate::error::{CalibrationError, CalibrationResult};

/// The stored sensitivity of one curve's parameters to market quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockEntry {
    block: Arc<BuildingBlock>,
    matrix: Arc<DMatrix<f64>>,
}

impl BlockEntry {
    /// Column addressing of the matrix.
    #[must_use]
    pub fn block(&self) -> &BuildingBlock {
        &self.block
    }

    /// Rows are the curve's parameters, columns the quotes of the block.
    #[must_use]
    pub fn matrix(&self) -> &DMatrix<f64> {
        &self.matrix
    }
}

/// Curve name to stored sensitivity, in insertion order.
///
/// Curves calibrated in the same stage share one [`BuildingBlock`]. Cloning
/// is cheap: entries are reference counted and never mutated in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockBundle {
    order: Vec<String>,
    entries: HashMap<String, BlockEntry>,
}

impl BlockBundle {
    /// Creates an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the matrix of `name`.
    ///
    /// An existing entry is replaced only when the new one has the same
    /// block and matrix shape.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` when the block does not address `name`, when
    /// the matrix shape disagrees with the block, or when the geometry of an
    /// existing entry would change.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        block: Arc<BuildingBlock>,
        matrix: DMatrix<f64>,
    ) -> CalibrationResult<()> {
        let name = name.into();
        let range = block.range(&name).ok_or_else(|| {
            CalibrationError::configuration(format!(
                "building block does not address curve {name}"
            ))
        })?;
        if matrix.nrows() != range.len || matrix.ncols() != block.total_parameters() {
            return Err(CalibrationError::configuration(format!(
                "matrix of curve {name} is {}x{}, block requires {}x{}",
                matrix.nrows(),
                matrix.ncols(),
                range.len,
                block.total_parameters()
            )));
        }
        self.insert(
            name,
            BlockEntry {
                block,
                matrix: Arc::new(matrix),
            },
        )
    }

    fn insert(&mut self, name: String, entry: BlockEntry) -> CalibrationResult<()> {
        match self.entries.get(&name) {
            Some(existing) => {
                if existing.block != entry.block
                    || existing.matrix.shape() != entry.matrix.shape()
                {
                    return Err(CalibrationError::configuration(format!(
                        "curve {name} already has a block with a different geometry"
                    )));
                }
            }
            None => self.order.push(name.clone()),
        }
        self.entries.insert(name, entry);
        Ok(())
    }

    /// Copies every entry of `other` into this bundle.
    pub fn add_all(&mut self, other: &BlockBundle) -> CalibrationResult<()> {
        for name in &other.order {
            if let Some(entry) = other.entries.get(name) {
                self.insert(name.clone(), entry.clone())?;
            }
        }
        Ok(())
    }

    /// Returns a copy of this bundle with the matrices of one stage added.
    ///
    /// All matrices share `block`.
    pub fn with_stage(
        &self,
        block: &Arc<BuildingBlock>,
        matrices: Vec<(String, DMatrix<f64>)>,
    ) -> CalibrationResult<Self> {
        let mut next = self.clone();
        for (name, matrix) in matrices {
            next.add(name, Arc::clone(block), matrix)?;
        }
        Ok(next)
    }

    /// Stored sensitivity of a curve; `None` when no chain is available.
    #[must_use]
    pub fn block(&self, name: &str) -> Option<&BlockEntry> {
        self.entries.get(name)
    }

    /// Returns true if the curve has a stored sensitivity.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Curve names in insertion order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Number of stored curves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates over names and entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BlockEntry)> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name).map(|e| (name.as_str(), e)))
    }

    /// Returns an independent copy sharing no allocation with this bundle.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        let mut blocks: Vec<(Arc<BuildingBlock>, Arc<BuildingBlock>)> = Vec::new();
        let mut entries = HashMap::with_capacity(self.entries.len());
        for (name, entry) in &self.entries {
            // Entries that shared a block keep sharing the copy.
            let block = match blocks.iter().find(|(old, _)| Arc::ptr_eq(old, &entry.block)) {
                Some((_, copy)) => Arc::clone(copy),
                None => {
                    let copy = Arc::new(entry.block.as_ref().clone());
                    blocks.push((Arc::clone(&entry.block), Arc::clone(&copy)));
                    copy
                }
            };
            entries.insert(
                name.clone(),
                BlockEntry {
                    block,
                    matrix: Arc::new(entry.matrix.as_ref().clone()),
                },
            );
        }
        Self {
            order: self.order.clone(),
            entries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage_block() -> Arc<BuildingBlock> {
        Arc::new(BuildingBlock::from_lengths([("D", 2), ("F", 3)]).unwrap())
    }

    #[test]
    fn test_add_and_lookup() {
        let block = stage_block();
        let mut bundle = BlockBundle::new();
        bundle
            .add("D", Arc::clone(&block), DMatrix::from_element(2, 5, 1.0))
            .unwrap();
        bundle
            .add("F", Arc::clone(&block), DMatrix::from_element(3, 5, 2.0))
            .unwrap();

        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.names(), ["D".to_string(), "F".to_string()]);
        let entry = bundle.block("F").unwrap();
        assert_eq!(entry.matrix().shape(), (3, 5));
        assert_eq!(entry.block().start("F"), Some(2));
        assert!(std::ptr::eq(bundle.block("D").unwrap().block(), entry.block()));
        assert!(bundle.block("X").is_none());
    }

    #[test]
    fn test_shape_checks() {
        let block = stage_block();
        let mut bundle = BlockBundle::new();

        let wrong_rows = bundle.add("D", Arc::clone(&block), DMatrix::zeros(3, 5));
        assert!(wrong_rows.unwrap_err().is_configuration());

        let wrong_cols = bundle.add("D", Arc::clone(&block), DMatrix::zeros(2, 4));
        assert!(wrong_cols.is_err());

        let unaddressed = bundle.add("X", block, DMatrix::zeros(2, 5));
        assert!(unaddressed.is_err());
        assert!(bundle.is_empty());
    }

    #[test]
    fn test_replace_requires_same_geometry() {
        let mut bundle = BlockBundle::new();
        bundle
            .add("D", stage_block(), DMatrix::from_element(2, 5, 1.0))
            .unwrap();

        // Equal geometry in a different allocation replaces the matrix.
        bundle
            .add("D", stage_block(), DMatrix::from_element(2, 5, 3.0))
            .unwrap();
        assert_eq!(bundle.len(), 1);
        assert!((bundle.block("D").unwrap().matrix()[(0, 0)] - 3.0).abs() < 1e-15);

        let other = Arc::new(BuildingBlock::from_lengths([("D", 2)]).unwrap());
        let err = bundle.add("D", other, DMatrix::zeros(2, 2)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_with_stage_leaves_original() {
        let block = stage_block();
        let original = BlockBundle::new();
        let next = original
            .with_stage(
                &block,
                vec![
                    ("D".to_string(), DMatrix::zeros(2, 5)),
                    ("F".to_string(), DMatrix::zeros(3, 5)),
                ],
            )
            .unwrap();

        assert!(original.is_empty());
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn test_add_all_and_deep_copy() {
        let block = stage_block();
        let mut first = BlockBundle::new();
        first.add("D", Arc::clone(&block), DMatrix::zeros(2, 5)).unwrap();
        first.add("F", block, DMatrix::zeros(3, 5)).unwrap();

        let mut merged = BlockBundle::new();
        merged.add_all(&first).unwrap();
        assert_eq!(merged, first);

        let copy = first.deep_copy();
        assert_eq!(copy, first);
        let d = copy.block("D").unwrap();
        assert!(!std::ptr::eq(d.block(), first.block("D").unwrap().block()));
        assert!(std::ptr::eq(d.block(), copy.block("F").unwrap().block()));
        assert_eq!(copy.iter().map(|(name, _)| name).collect::<Vec<_>>(), vec!["D", "F"]);
    }
}

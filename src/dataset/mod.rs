//! Training data containers and loaders.
//!
//! - [`Dataset`]: batch access to `(X, y, sample_weight)` triples.
//! - [`InMemoryDataset`]: dense in-memory implementation used by the trainer.
//! - [`loader`]: reads flight records from the historical CSV.
//! - [`split`]: deterministic train/test split.

use ndarray::{Array1, Array2};
use std::{fmt::Debug, ops::Range};

pub mod loader;
pub mod memory;
pub mod split;

pub use self::loader::{load_flight_records, read_flight_records};
pub use self::memory::InMemoryDataset;
pub use self::split::train_test_split;

/// A contiguous slice of a dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    /// Features, shape `(n, n_features)`.
    pub x: Array2<f64>,
    /// Targets, shape `(n,)`.
    pub y: Array1<f64>,
    /// Per-sample loss weights, shape `(n,)`.
    pub sample_weight: Array1<f64>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

/// Source of weighted `(X, y)` batches.
pub trait Dataset {
    /// Error type returned when accessing data.
    type Error: Debug + 'static;

    /// Total number of samples, if known.
    fn len(&self) -> Option<usize>;

    fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Number of feature columns.
    fn n_features(&self) -> usize;

    /// Iterates over consecutive batches of at most `batch_size` samples.
    fn batches(&self, batch_size: usize) -> DatasetBatchIter<'_, Self>
    where
        Self: Sized,
    {
        DatasetBatchIter {
            dataset: self,
            batch_size: batch_size.max(1),
            current: 0,
        }
    }

    /// Loads the samples in `range`.
    fn get_batch(&self, range: Range<usize>) -> Result<Batch, Self::Error>;
}

/// Iterator returned by [`Dataset::batches`].
pub struct DatasetBatchIter<'a, D: ?Sized> {
    dataset: &'a D,
    batch_size: usize,
    current: usize,
}

impl<'a, D: Dataset> Iterator for DatasetBatchIter<'a, D> {
    type Item = Result<Batch, D::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.dataset.len()?;
        if self.current >= total {
            return None;
        }

        let end = (self.current + self.batch_size).min(total);
        let range = self.current..end;
        self.current = end;

        Some(self.dataset.get_batch(range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockDataset {
        len: usize,
    }

    impl Dataset for MockDataset {
        type Error = &'static str;

        fn len(&self) -> Option<usize> {
            Some(self.len)
        }

        fn n_features(&self) -> usize {
            2
        }

        fn get_batch(&self, range: Range<usize>) -> Result<Batch, Self::Error> {
            if range.start >= self.len || range.end > self.len {
                return Err("range out of bounds");
            }
            let n = range.len();
            let start = range.start;
            let x = Array2::from_shape_fn((n, 2), |(i, j)| ((start + i) * 2 + j) as f64);
            let y = (start..range.end).map(|i| i as f64).collect();
            Ok(Batch {
                x,
                y,
                sample_weight: Array1::ones(n),
            })
        }
    }

    #[test]
    fn test_dataset_is_empty() {
        assert!(MockDataset { len: 0 }.is_empty());
        assert!(!MockDataset { len: 1 }.is_empty());
    }

    #[test]
    fn test_batches_full() {
        let dataset = MockDataset { len: 6 };
        let mut iter = dataset.batches(2);
        for i in 0..3 {
            let batch = iter.next().unwrap().unwrap();
            assert_eq!(batch.x.dim(), (2, 2));
            assert_eq!(batch.y.to_vec(), vec![i as f64 * 2.0, i as f64 * 2.0 + 1.0]);
        }
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_batches_partial_last() {
        let dataset = MockDataset { len: 5 };
        let mut iter = dataset.batches(2);
        assert_eq!(iter.next().unwrap().unwrap().len(), 2);
        assert_eq!(iter.next().unwrap().unwrap().len(), 2);
        assert_eq!(iter.next().unwrap().unwrap().len(), 1);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_batches_larger_than_dataset() {
        let dataset = MockDataset { len: 3 };
        let mut iter = dataset.batches(10);
        assert_eq!(iter.next().unwrap().unwrap().x.dim(), (3, 2));
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_batches_empty_dataset() {
        let dataset = MockDataset { len: 0 };
        assert!(dataset.batches(2).next().is_none());
    }
}

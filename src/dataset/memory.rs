use crate::dataset::{Batch, Dataset};
use crate::error::{DelayError, Result};
use ndarray::{s, Array1, Array2};
use std::ops::Range;

/// Dense dataset with per-sample weights.
#[derive(Clone, Debug)]
pub struct InMemoryDataset {
    x: Array2<f64>,
    y: Array1<f64>,
    sample_weight: Array1<f64>,
}

impl InMemoryDataset {
    /// Creates an unweighted dataset.
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> Result<Self> {
        let n = y.len();
        Self::with_sample_weight(x, y, Array1::ones(n))
    }

    pub fn with_sample_weight(
        x: Array2<f64>,
        y: Array1<f64>,
        sample_weight: Array1<f64>,
    ) -> Result<Self> {
        if x.nrows() != y.len() || y.len() != sample_weight.len() {
            return Err(DelayError::InvalidInput(format!(
                "x, y and sample_weight must have the same length (got {}, {}, {})",
                x.nrows(),
                y.len(),
                sample_weight.len()
            )));
        }
        if y.is_empty() {
            return Err(DelayError::InvalidInput("Dataset is empty".into()));
        }
        Ok(Self {
            x,
            y,
            sample_weight,
        })
    }
}

impl Dataset for InMemoryDataset {
    type Error = std::convert::Infallible;

    fn len(&self) -> Option<usize> {
        Some(self.y.len())
    }

    fn n_features(&self) -> usize {
        self.x.ncols()
    }

    fn get_batch(&self, range: Range<usize>) -> std::result::Result<Batch, Self::Error> {
        Ok(Batch {
            x: self.x.slice(s![range.clone(), ..]).to_owned(),
            y: self.y.slice(s![range.clone()]).to_owned(),
            sample_weight: self.sample_weight.slice(s![range]).to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_length_mismatch_is_rejected() {
        let result = InMemoryDataset::new(Array2::zeros((3, 2)), array![0.0, 1.0]);
        assert!(matches!(result, Err(DelayError::InvalidInput(_))));
    }

    #[test]
    fn test_empty_is_rejected() {
        let result = InMemoryDataset::new(Array2::zeros((0, 2)), Array1::zeros(0));
        assert!(result.is_err());
    }

    #[test]
    fn test_get_batch_slices_all_arrays() {
        let ds = InMemoryDataset::with_sample_weight(
            array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]],
            array![0.0, 1.0, 0.0],
            array![0.2, 0.8, 0.2],
        )
        .unwrap();
        let batch = ds.get_batch(1..3).unwrap();
        assert_eq!(batch.x, array![[3.0, 4.0], [5.0, 6.0]]);
        assert_eq!(batch.y, array![1.0, 0.0]);
        assert_eq!(batch.sample_weight, array![0.8, 0.2]);
        assert_eq!(ds.n_features(), 2);
    }
}

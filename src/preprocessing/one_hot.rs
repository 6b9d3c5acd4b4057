//! Batch-level dummy encoding with prefixed column names.
//!
//! Columns are generated from the categories present in the batch (one per
//! distinct value, named `<prefix>_<value>`), then reindexed onto a fixed
//! column list so the model always sees the same layout.

use ndarray::Array2;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;

/// Column-major table of 0/1 indicator columns.
#[derive(Clone, Debug, Default)]
pub struct DummyFrame {
    n_rows: usize,
    columns: Vec<String>,
    data: Vec<Vec<u8>>,
}

impl DummyFrame {
    /// One-hot encodes `values`, creating one column per distinct category.
    ///
    /// Columns come out in category order, mirroring a sorted `get_dummies`.
    pub fn encode<T>(prefix: &str, values: &[T]) -> Self
    where
        T: Display + Ord,
    {
        let categories: BTreeSet<&T> = values.iter().collect();
        let mut columns = Vec::with_capacity(categories.len());
        let mut data = Vec::with_capacity(categories.len());
        for category in categories {
            columns.push(format!("{prefix}_{category}"));
            data.push(values.iter().map(|v| u8::from(v == category)).collect());
        }
        Self {
            n_rows: values.len(),
            columns,
            data,
        }
    }

    /// Concatenates frames column-wise. All frames must have the same row count.
    pub fn concat(frames: Vec<DummyFrame>) -> Self {
        let n_rows = frames.first().map(|f| f.n_rows).unwrap_or(0);
        debug_assert!(frames.iter().all(|f| f.n_rows == n_rows));
        let mut out = DummyFrame {
            n_rows,
            ..Default::default()
        };
        for frame in frames {
            out.columns.extend(frame.columns);
            out.data.extend(frame.data);
        }
        out
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Generated column names, in generation order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Projects the frame onto `target`: unknown columns are dropped, target
    /// columns not generated for this batch are filled with zeros, and the
    /// output columns follow `target` order.
    pub fn reindex(&self, target: &[&str]) -> Array2<f64> {
        let index: HashMap<&str, usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        let mut out = Array2::<f64>::zeros((self.n_rows, target.len()));
        for (j, name) in target.iter().enumerate() {
            if let Some(&src) = index.get(name) {
                for (row, &v) in self.data[src].iter().enumerate() {
                    out[[row, j]] = f64::from(v);
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_generates_prefixed_sorted_columns() {
        let frame = DummyFrame::encode("MES", &[12u32, 7, 12, 1]);
        assert_eq!(frame.columns(), &["MES_1", "MES_7", "MES_12"]);
        assert_eq!(frame.n_rows(), 4);
    }

    #[test]
    fn test_encode_one_indicator_per_row() {
        let values = vec!["N".to_string(), "I".to_string(), "N".to_string()];
        let frame = DummyFrame::encode("TIPOVUELO", &values);
        let dense = frame.reindex(&["TIPOVUELO_I", "TIPOVUELO_N"]);
        assert_eq!(dense.row(0).to_vec(), vec![0.0, 1.0]);
        assert_eq!(dense.row(1).to_vec(), vec![1.0, 0.0]);
        assert_eq!(dense.row(2).to_vec(), vec![0.0, 1.0]);
    }

    #[test]
    fn test_reindex_drops_and_zero_fills() {
        let frame = DummyFrame::concat(vec![
            DummyFrame::encode("OPERA", &["Aerolineas Argentinas".to_string()]),
            DummyFrame::encode("MES", &[7u32]),
        ]);
        let dense = frame.reindex(&["MES_10", "MES_7", "OPERA_Copa Air"]);
        assert_eq!(dense.shape(), &[1, 3]);
        assert_eq!(dense.row(0).to_vec(), vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_empty_batch() {
        let frame = DummyFrame::encode::<u32>("MES", &[]);
        assert!(frame.columns().is_empty());
        let dense = frame.reindex(&["MES_7", "MES_10"]);
        assert_eq!(dense.shape(), &[0, 2]);
    }
}

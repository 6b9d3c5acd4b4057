//! Fixed feature layout and the record → feature-matrix transform.

use crate::error::{DelayError, Result};
use crate::preprocessing::calendar::{self, PeriodDay};
use crate::preprocessing::one_hot::DummyFrame;
use crate::preprocessing::record::FlightRecord;
use ndarray::{Array2, ArrayView1, ArrayView2};
use std::collections::BTreeSet;
use tracing::debug;

/// Model input columns, in the exact order the classifier consumes them.
///
/// This table is the input contract of the model; it is never derived from
/// training data.
pub const FEATURE_COLUMNS: [&str; N_FEATURES] = [
    "OPERA_Latin American Wings",
    "MES_7",
    "MES_10",
    "OPERA_Grupo LATAM",
    "MES_12",
    "TIPOVUELO_I",
    "MES_4",
    "MES_11",
    "OPERA_Sky Airline",
    "OPERA_Copa Air",
];

/// Width of every feature row.
pub const N_FEATURES: usize = 10;

/// Binary delay label: 1 when the departure was more than 15 minutes late.
pub type Label = u8;

/// Name of the derived label column.
pub const DELAY_COLUMN: &str = "delay";

/// `(n_rows, N_FEATURES)` matrix laid out as [`FEATURE_COLUMNS`].
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureMatrix {
    data: Array2<f64>,
}

impl FeatureMatrix {
    /// Wraps a dense matrix, checking its width.
    pub fn new(data: Array2<f64>) -> Result<Self> {
        if data.ncols() != N_FEATURES {
            return Err(DelayError::InvalidInput(format!(
                "expected {} feature columns, got {}",
                N_FEATURES,
                data.ncols()
            )));
        }
        Ok(Self { data })
    }

    pub fn zeros(n_rows: usize) -> Self {
        Self {
            data: Array2::zeros((n_rows, N_FEATURES)),
        }
    }

    pub fn from_rows(rows: &[[f64; N_FEATURES]]) -> Self {
        let flat: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        let data = Array2::from_shape_vec((rows.len(), N_FEATURES), flat)
            .unwrap_or_else(|_| Array2::zeros((0, N_FEATURES)));
        Self { data }
    }

    pub fn n_rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    pub fn column_names(&self) -> &'static [&'static str] {
        &FEATURE_COLUMNS
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    pub fn row(&self, index: usize) -> ArrayView1<'_, f64> {
        self.data.row(index)
    }

    /// Values of a named feature column, if the name is part of the layout.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        FEATURE_COLUMNS
            .iter()
            .position(|c| *c == name)
            .map(|j| self.data.column(j))
    }

    /// Keeps only the rows at `indices`, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        Self {
            data: self.data.select(ndarray::Axis(0), indices),
        }
    }
}

/// Per-record columns derived from the departure timestamps.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DerivedColumns {
    pub period_day: Vec<PeriodDay>,
    pub high_season: Vec<u8>,
    pub min_diff: Vec<f64>,
    pub delay: Vec<Label>,
}

impl DerivedColumns {
    /// Numeric view of a derived column by name.
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        match name {
            DELAY_COLUMN => Some(self.delay.iter().map(|&v| f64::from(v)).collect()),
            "min_diff" => Some(self.min_diff.clone()),
            "high_season" => Some(self.high_season.iter().map(|&v| f64::from(v)).collect()),
            "period_day" => Some(self.period_day.iter().map(PeriodDay::code).collect()),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.delay.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delay.is_empty()
    }
}

/// Turns raw flight records into the fixed feature layout.
#[derive(Clone, Copy, Debug, Default)]
pub struct FeatureBuilder;

impl FeatureBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Builds the feature matrix and, when `compute_label` is set, the delay
    /// labels.
    ///
    /// # Errors
    /// [`DelayError::Schema`] listing every absent column (sorted). Timestamp
    /// columns are only required when `compute_label` is set.
    pub fn preprocess(
        &self,
        records: &[FlightRecord],
        compute_label: bool,
    ) -> Result<(FeatureMatrix, Option<Vec<Label>>)> {
        if compute_label {
            let (features, derived) = self.preprocess_with_derived(records)?;
            Ok((features, Some(derived.delay)))
        } else {
            Ok((self.features(records)?, None))
        }
    }

    /// Builds the feature matrix together with one named derived column as
    /// target (`delay`, `min_diff`, `high_season` or `period_day`).
    pub fn preprocess_for_target(
        &self,
        records: &[FlightRecord],
        target_column: &str,
    ) -> Result<(FeatureMatrix, Vec<f64>)> {
        let (features, derived) = self.preprocess_with_derived(records)?;
        let target = derived
            .column(target_column)
            .ok_or_else(|| DelayError::schema([target_column]))?;
        Ok((features, target))
    }

    /// Builds the feature matrix and every derived column.
    pub fn preprocess_with_derived(
        &self,
        records: &[FlightRecord],
    ) -> Result<(FeatureMatrix, DerivedColumns)> {
        check_required(records, true)?;
        let derived = derive_columns(records)?;
        let features = encode(records)?;
        Ok((features, derived))
    }

    /// Builds the feature matrix only.
    pub fn features(&self, records: &[FlightRecord]) -> Result<FeatureMatrix> {
        check_required(records, false)?;
        encode(records)
    }
}

fn check_required(records: &[FlightRecord], with_timestamps: bool) -> Result<()> {
    let mut missing: BTreeSet<&'static str> = BTreeSet::new();
    for record in records {
        missing.extend(record.missing_categorical());
        if with_timestamps {
            missing.extend(record.missing_timestamps());
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(DelayError::schema(missing))
    }
}

fn encode(records: &[FlightRecord]) -> Result<FeatureMatrix> {
    let mut airlines = Vec::with_capacity(records.len());
    let mut flight_types = Vec::with_capacity(records.len());
    let mut months = Vec::with_capacity(records.len());
    for record in records {
        match (&record.airline, &record.flight_type, record.month) {
            (Some(a), Some(t), Some(m)) => {
                airlines.push(a.as_str());
                flight_types.push(t.as_str());
                months.push(m);
            }
            _ => return Err(DelayError::schema(record.missing_categorical())),
        }
    }

    let frame = DummyFrame::concat(vec![
        DummyFrame::encode("OPERA", &airlines),
        DummyFrame::encode("TIPOVUELO", &flight_types),
        DummyFrame::encode("MES", &months),
    ]);
    debug!(
        rows = frame.n_rows(),
        generated_columns = frame.columns().len(),
        "encoded flight batch"
    );
    FeatureMatrix::new(frame.reindex(&FEATURE_COLUMNS))
}

fn derive_columns(records: &[FlightRecord]) -> Result<DerivedColumns> {
    let mut derived = DerivedColumns::default();
    for record in records {
        let (scheduled, actual) = match (&record.scheduled_departure, &record.actual_departure) {
            (Some(s), Some(a)) => (s, a),
            _ => return Err(DelayError::schema(record.missing_timestamps())),
        };
        let diff = calendar::min_diff(scheduled, actual);
        derived.period_day.push(calendar::period_day(scheduled));
        derived.high_season.push(calendar::high_season(scheduled));
        derived.min_diff.push(diff);
        derived.delay.push(calendar::delay_label(diff));
    }
    Ok(derived)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::record::parse_timestamp;

    fn record(airline: &str, flight_type: &str, month: u32) -> FlightRecord {
        FlightRecord::new(airline, flight_type, month)
    }

    fn timed(airline: &str, month: u32, scheduled: &str, actual: &str) -> FlightRecord {
        record(airline, "N", month).with_departures(
            parse_timestamp(scheduled).unwrap(),
            parse_timestamp(actual).unwrap(),
        )
    }

    #[test]
    fn test_output_has_fixed_layout() {
        let builder = FeatureBuilder::new();
        let (features, labels) = builder
            .preprocess(&[record("Aerolineas Argentinas", "N", 3)], false)
            .unwrap();
        assert!(labels.is_none());
        assert_eq!(features.view().shape(), &[1, N_FEATURES]);
        assert_eq!(features.column_names(), &FEATURE_COLUMNS);
        assert!(features.row(0).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_one_hot_positions() {
        let builder = FeatureBuilder::new();
        let records = vec![
            record("Grupo LATAM", "I", 7),
            record("Sky Airline", "N", 12),
            record("Copa Air", "I", 4),
        ];
        let features = builder.features(&records).unwrap();

        let row0 = features.row(0).to_vec();
        assert_eq!(row0, vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let row1 = features.row(1).to_vec();
        assert_eq!(row1, vec![0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0]);
        let row2 = features.row(2).to_vec();
        assert_eq!(row2, vec![0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0]);

        let months: f64 = ["MES_7", "MES_10", "MES_12", "MES_4", "MES_11"]
            .iter()
            .map(|c| features.column(c).unwrap()[0])
            .sum();
        assert_eq!(months, 1.0);
    }

    #[test]
    fn test_absent_category_is_zero_column() {
        let features = FeatureBuilder::new()
            .features(&[record("Grupo LATAM", "N", 1), record("Sky Airline", "N", 2)])
            .unwrap();
        assert!(features.column("MES_10").unwrap().iter().all(|&v| v == 0.0));
        assert!(features.column("TIPOVUELO_I").unwrap().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_missing_categorical_columns() {
        let incomplete = FlightRecord {
            flight_type: Some("N".to_string()),
            ..Default::default()
        };
        let err = FeatureBuilder::new()
            .preprocess(&[incomplete], false)
            .unwrap_err();
        match err {
            DelayError::Schema { missing } => assert_eq!(missing, vec!["MES", "OPERA"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_timestamps_required_only_for_labels() {
        let builder = FeatureBuilder::new();
        let records = vec![record("Grupo LATAM", "N", 1)];
        assert!(builder.preprocess(&records, false).is_ok());
        match builder.preprocess(&records, true).unwrap_err() {
            DelayError::Schema { missing } => assert_eq!(missing, vec!["Fecha-I", "Fecha-O"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_labels_from_departure_difference() {
        let records = vec![
            timed("Grupo LATAM", 1, "2023-01-01 10:00:00", "2023-01-01 10:20:00"),
            timed("Grupo LATAM", 1, "2023-01-01 10:00:00", "2023-01-01 10:10:00"),
        ];
        let (_, labels) = FeatureBuilder::new().preprocess(&records, true).unwrap();
        assert_eq!(labels, Some(vec![1, 0]));
    }

    #[test]
    fn test_derived_columns() {
        let records = vec![timed(
            "Sky Airline",
            12,
            "2017-12-25 07:30:00",
            "2017-12-25 07:45:00",
        )];
        let (_, derived) = FeatureBuilder::new()
            .preprocess_with_derived(&records)
            .unwrap();
        assert_eq!(derived.period_day, vec![PeriodDay::Morning]);
        assert_eq!(derived.high_season, vec![1]);
        assert_eq!(derived.min_diff, vec![15.0]);
        assert_eq!(derived.delay, vec![0]);
    }

    #[test]
    fn test_preprocess_for_target() {
        let records = vec![timed(
            "Copa Air",
            7,
            "2017-07-20 13:00:00",
            "2017-07-20 13:30:00",
        )];
        let builder = FeatureBuilder::new();
        let (_, target) = builder.preprocess_for_target(&records, "min_diff").unwrap();
        assert_eq!(target, vec![30.0]);

        match builder.preprocess_for_target(&records, "not_a_column").unwrap_err() {
            DelayError::Schema { missing } => assert_eq!(missing, vec!["not_a_column"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_batch() {
        let (features, labels) = FeatureBuilder::new().preprocess(&[], true).unwrap();
        assert!(features.is_empty());
        assert_eq!(features.view().ncols(), N_FEATURES);
        assert_eq!(labels, Some(vec![]));
    }

    #[test]
    fn test_feature_matrix_rejects_wrong_width() {
        assert!(FeatureMatrix::new(Array2::zeros((2, 3))).is_err());
    }
}

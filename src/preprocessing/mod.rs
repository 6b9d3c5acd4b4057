//! Feature engineering for flight records.
//!
//! Raw records are one-hot encoded per batch (`OPERA_*`, `TIPOVUELO_*`,
//! `MES_*`) and projected onto the fixed ten-column layout in
//! [`FEATURE_COLUMNS`]. When labels are requested, the departure timestamps
//! are turned into a time-of-day bucket, a high-season flag, the delay in
//! minutes and the binary delay label.

pub mod calendar;
pub mod features;
pub mod one_hot;
pub mod record;

pub use calendar::PeriodDay;
pub use features::{
    DerivedColumns, FeatureBuilder, FeatureMatrix, Label, DELAY_COLUMN, FEATURE_COLUMNS,
    N_FEATURES,
};
pub use record::{parse_timestamp, FlightRecord, TIMESTAMP_FORMAT};

//! Reference-value validation for prediction requests.
//!
//! The service only accepts categorical values that occur in the historical
//! dataset. The sets are loaded once at startup and never change.

use crate::dataset::load_flight_records;
use crate::error::{DelayError, Result};
use crate::preprocessing::record::columns;
use crate::preprocessing::FlightRecord;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Observed `OPERA`, `TIPOVUELO` and `MES` values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceValues {
    pub opera: HashSet<String>,
    pub tipo_vuelo: HashSet<String>,
    pub mes: HashSet<u32>,
}

impl ReferenceValues {
    /// Collects the non-null values of each categorical column.
    pub fn from_records(records: &[FlightRecord]) -> Self {
        let mut refs = Self::default();
        for record in records {
            if let Some(airline) = &record.airline {
                refs.opera.insert(airline.clone());
            }
            if let Some(flight_type) = &record.flight_type {
                refs.tipo_vuelo.insert(flight_type.clone());
            }
            if let Some(month) = record.month {
                refs.mes.insert(month);
            }
        }
        refs
    }

    /// Reads the reference CSV.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let refs = Self::from_records(&load_flight_records(path)?);
        info!(
            airlines = refs.opera.len(),
            flight_types = refs.tipo_vuelo.len(),
            months = refs.mes.len(),
            "loaded reference values"
        );
        Ok(refs)
    }

    /// Checks every record in order, fields in the order airline, flight
    /// type, month. The first violation rejects the whole batch.
    ///
    /// # Errors
    /// [`DelayError::InvalidCategoricalValue`] naming the offending column.
    pub fn validate(&self, records: &[FlightRecord]) -> Result<()> {
        for record in records {
            if !record.airline.as_ref().is_some_and(|v| self.opera.contains(v)) {
                return Err(invalid(columns::AIRLINE));
            }
            if !record
                .flight_type
                .as_ref()
                .is_some_and(|v| self.tipo_vuelo.contains(v))
            {
                return Err(invalid(columns::FLIGHT_TYPE));
            }
            if !record.month.is_some_and(|v| self.mes.contains(&v)) {
                return Err(invalid(columns::MONTH));
            }
        }
        Ok(())
    }
}

fn invalid(field: &str) -> DelayError {
    DelayError::InvalidCategoricalValue {
        field: field.to_string(),
    }
}

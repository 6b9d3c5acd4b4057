//! Raw flight records as read from the historical dataset or an API request.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp layout used by the `Fecha-I` / `Fecha-O` columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Column names of the raw dataset.
pub mod columns {
    pub const AIRLINE: &str = "OPERA";
    pub const FLIGHT_TYPE: &str = "TIPOVUELO";
    pub const MONTH: &str = "MES";
    pub const SCHEDULED_DEPARTURE: &str = "Fecha-I";
    pub const ACTUAL_DEPARTURE: &str = "Fecha-O";
}

/// One flight, as it arrives from a CSV row or an HTTP payload.
///
/// Every field is optional so that absent columns can be reported as a
/// [`DelayError::Schema`](crate::error::DelayError::Schema) instead of failing
/// at deserialization time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlightRecord {
    #[serde(rename = "OPERA", default)]
    pub airline: Option<String>,
    #[serde(rename = "TIPOVUELO", default)]
    pub flight_type: Option<String>,
    #[serde(rename = "MES", default)]
    pub month: Option<u32>,
    #[serde(rename = "Fecha-I", default, with = "timestamp")]
    pub scheduled_departure: Option<NaiveDateTime>,
    #[serde(rename = "Fecha-O", default, with = "timestamp")]
    pub actual_departure: Option<NaiveDateTime>,
}

impl FlightRecord {
    /// Record carrying only the categorical inputs used at serving time.
    pub fn new(airline: impl Into<String>, flight_type: impl Into<String>, month: u32) -> Self {
        Self {
            airline: Some(airline.into()),
            flight_type: Some(flight_type.into()),
            month: Some(month),
            scheduled_departure: None,
            actual_departure: None,
        }
    }

    /// Adds the departure timestamps needed to derive a training label.
    pub fn with_departures(mut self, scheduled: NaiveDateTime, actual: NaiveDateTime) -> Self {
        self.scheduled_departure = Some(scheduled);
        self.actual_departure = Some(actual);
        self
    }

    /// Names of the categorical columns this record lacks.
    pub(crate) fn missing_categorical(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.airline.is_none() {
            missing.push(columns::AIRLINE);
        }
        if self.flight_type.is_none() {
            missing.push(columns::FLIGHT_TYPE);
        }
        if self.month.is_none() {
            missing.push(columns::MONTH);
        }
        missing
    }

    /// Names of the timestamp columns this record lacks.
    pub(crate) fn missing_timestamps(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.scheduled_departure.is_none() {
            missing.push(columns::SCHEDULED_DEPARTURE);
        }
        if self.actual_departure.is_none() {
            missing.push(columns::ACTUAL_DEPARTURE);
        }
        missing
    }
}

/// Parses a `%Y-%m-%d %H:%M:%S` timestamp.
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
}

mod timestamp {
    use super::{parse_timestamp, TIMESTAMP_FORMAT};
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse_timestamp(s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2017-01-01 23:30:00").unwrap();
        assert_eq!(ts.format(TIMESTAMP_FORMAT).to_string(), "2017-01-01 23:30:00");
    }

    #[test]
    fn test_parse_timestamp_rejects_other_layouts() {
        assert!(parse_timestamp("01/01/2017 23:30").is_err());
    }

    #[test]
    fn test_missing_categorical_reports_absent_fields() {
        let record = FlightRecord {
            airline: Some("Grupo LATAM".to_string()),
            ..Default::default()
        };
        assert_eq!(record.missing_categorical(), vec!["TIPOVUELO", "MES"]);
        assert_eq!(record.missing_timestamps(), vec!["Fecha-I", "Fecha-O"]);
    }

    #[test]
    fn test_json_roundtrip_uses_dataset_column_names() {
        let record = FlightRecord::new("Sky Airline", "N", 7).with_departures(
            parse_timestamp("2017-07-01 10:00:00").unwrap(),
            parse_timestamp("2017-07-01 10:20:00").unwrap(),
        );
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["OPERA"], "Sky Airline");
        assert_eq!(json["Fecha-O"], "2017-07-01 10:20:00");

        let back: FlightRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_deserialize_without_timestamps() {
        let record: FlightRecord =
            serde_json::from_str(r#"{"OPERA": "Copa Air", "TIPOVUELO": "I", "MES": 3}"#).unwrap();
        assert_eq!(record.month, Some(3));
        assert!(record.scheduled_departure.is_none());
    }
}

//! CSV loading of historical flight records.

use crate::error::Result;
use crate::preprocessing::FlightRecord;
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

/// Reads every row of a flight CSV.
///
/// Only the `OPERA`, `TIPOVUELO`, `MES`, `Fecha-I` and `Fecha-O` columns are
/// read; other columns are ignored and absent ones become `None`.
pub fn load_flight_records<P: AsRef<Path>>(path: P) -> Result<Vec<FlightRecord>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let records = read_flight_records(BufReader::new(file))?;
    info!(path = %path.display(), rows = records.len(), "loaded flight records");
    Ok(records)
}

/// Reads flight records from any CSV source with a header row.
pub fn read_flight_records<R: Read>(reader: R) -> Result<Vec<FlightRecord>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let mut records = Vec::new();
    for row in rdr.deserialize() {
        let record: FlightRecord = row?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
Fecha-I,Vlo-I,Ori-I,Des-I,Emp-I,Fecha-O,Vlo-O,Ori-O,Des-O,Emp-O,DIA,MES,AÑO,DIANOM,TIPOVUELO,OPERA,SIGLAORI,SIGLADES
2017-01-01 23:30:00,226,SCEL,KMIA,AAL,2017-01-01 23:33:00,226,SCEL,KMIA,AAL,1,1,2017,Domingo,I,American Airlines,Santiago,Miami
2017-01-02 23:30:00,226,SCEL,KMIA,AAL,2017-01-02 23:59:00,226,SCEL,KMIA,AAL,2,1,2017,Lunes,I,American Airlines,Santiago,Miami
";

    #[test]
    fn test_read_dataset_layout() {
        let records = read_flight_records(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].airline.as_deref(), Some("American Airlines"));
        assert_eq!(records[0].flight_type.as_deref(), Some("I"));
        assert_eq!(records[0].month, Some(1));
        assert!(records[1].actual_departure.is_some());
    }

    #[test]
    fn test_read_categorical_only_csv() {
        let csv = "OPERA,TIPOVUELO,MES\nGrupo LATAM,N,7\n";
        let records = read_flight_records(csv.as_bytes()).unwrap();
        assert_eq!(records, vec![FlightRecord::new("Grupo LATAM", "N", 7)]);
    }

    #[test]
    fn test_bad_timestamp_is_an_error() {
        let csv = "Fecha-I,Fecha-O,OPERA,TIPOVUELO,MES\n\
                   yesterday,2017-01-01 10:00:00,Copa Air,I,1\n";
        assert!(read_flight_records(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_load_from_file() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let mut f = NamedTempFile::new()?;
        f.write_all(SAMPLE.as_bytes())?;
        let records = load_flight_records(f.path())?;
        assert_eq!(records.len(), 2);
        Ok(())
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_flight_records("/nonexistent/data.csv").is_err());
    }
}

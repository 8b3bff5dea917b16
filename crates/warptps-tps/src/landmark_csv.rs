use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::{error::TpsError, landmarks::LandmarkSet, point::Point};

/// Column names of the landmark CSV schema, in order.
pub const CSV_HEADER: [&str; 5] = ["LandmarkIndex", "SourceX", "SourceY", "DestX", "DestY"];

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LandmarkRecord {
    landmark_index: usize,
    source_x: f64,
    source_y: f64,
    dest_x: f64,
    dest_y: f64,
}

/// Write a 2d landmark set as CSV, one row per landmark after the header row.
///
/// # Errors
///
/// Returns [`TpsError::DimensionMismatch`] for 3d landmarks and [`TpsError::Csv`] if
/// writing fails.
pub fn write_csv<W: Write>(landmarks: &LandmarkSet, writer: W) -> Result<(), TpsError> {
    if let Some(dim) = landmarks.dim().filter(|&d| d != 2) {
        return Err(TpsError::DimensionMismatch {
            expected: 2,
            actual: dim,
        });
    }

    let mut wtr = csv::Writer::from_writer(writer);

    // serde only emits the header together with the first record
    if landmarks.is_empty() {
        wtr.write_record(CSV_HEADER)?;
    }

    for pair in landmarks {
        wtr.serialize(LandmarkRecord {
            landmark_index: pair.index,
            source_x: pair.source.x(),
            source_y: pair.source.y(),
            dest_x: pair.dest.x(),
            dest_y: pair.dest.y(),
        })?;
    }

    wtr.flush().map_err(|e| TpsError::Csv(e.into()))?;
    Ok(())
}

/// Read a landmark set from CSV.
///
/// # Errors
///
/// Returns [`TpsError::CsvSchema`] if the header differs from [`CSV_HEADER`] or the
/// indices do not count up from zero, and [`TpsError::Csv`] for malformed rows.
pub fn read_csv<R: Read>(reader: R) -> Result<LandmarkSet, TpsError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?;
    if !headers.iter().eq(CSV_HEADER) {
        return Err(TpsError::CsvSchema(format!(
            "expected header {}, got {}",
            CSV_HEADER.join(","),
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let mut landmarks = LandmarkSet::new();
    for (expected, record) in rdr.deserialize::<LandmarkRecord>().enumerate() {
        let record = record?;
        if record.landmark_index != expected {
            return Err(TpsError::CsvSchema(format!(
                "landmark index {} found where {} was expected",
                record.landmark_index, expected
            )));
        }
        landmarks.add(
            Point::Xy([record.source_x, record.source_y]),
            Point::Xy([record.dest_x, record.dest_y]),
        )?;
    }

    Ok(landmarks)
}

/// Serialize a landmark set into a CSV string.
pub fn to_csv_string(landmarks: &LandmarkSet) -> Result<String, TpsError> {
    let mut buf = Vec::new();
    write_csv(landmarks, &mut buf)?;
    String::from_utf8(buf).map_err(|e| TpsError::CsvSchema(e.to_string()))
}

/// Parse a landmark set from a CSV string.
pub fn from_csv_str(s: &str) -> Result<LandmarkSet, TpsError> {
    read_csv(s.as_bytes())
}

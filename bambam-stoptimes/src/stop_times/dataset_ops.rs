use std::{
    collections::HashSet,
    fs::File,
    io::{Read, Seek, SeekFrom},
    path::Path,
};

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::stop_times::{
    stop_time_error::StopTimeError, RejectedRecord, RejectionKind, StopTimesSchema, StopVisit,
};

/// the contents of a `stop_times.txt` file after the structural pass.
pub struct StopTimesDataset {
    pub schema: StopTimesSchema,
    /// records that passed the structural checks, in file order
    pub visits: Vec<StopVisit>,
    /// records that did not, in file order
    pub rejected: Vec<RejectedRecord>,
    pub ends_with_newline: bool,
}

impl StopTimesDataset {
    /// true when every record has the header's field count and the file is newline-terminated.
    pub fn is_structurally_valid(&self) -> bool {
        let arity_ok = !self
            .rejected
            .iter()
            .any(|r| r.kind == RejectionKind::FieldCount);
        arity_ok && self.ends_with_newline
    }
}

/// reads a `stop_times.txt` file into typed visits.
///
/// records with the wrong number of fields or an unusable stop_sequence are rejected
/// with a warning and do not appear in the result. a missing required column fails
/// the read.
pub fn read_stop_times(path: &Path) -> Result<StopTimesDataset, StopTimeError> {
    let filepath = path.to_string_lossy().to_string();
    let read_error = |source: csv::Error| StopTimeError::ReadError {
        filepath: filepath.clone(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(read_error)?;
    let headers = reader
        .headers()
        .map_err(read_error)?
        .iter()
        .map(String::from)
        .collect::<Vec<_>>();
    let schema = StopTimesSchema::new(headers, &filepath)?;

    let mut visits = vec![];
    let mut rejected = vec![];
    let mut record = StringRecord::new();
    while reader.read_record(&mut record).map_err(read_error)? {
        let line_number = record.position().map(|p| p.line()).unwrap_or_default();
        let fields = record.iter().collect::<Vec<_>>();
        match schema.to_visit(&fields, line_number) {
            Ok(visit) => visits.push(visit),
            Err(rejection) => {
                log::warn!(
                    "skipping record at line {} of {filepath}: {}",
                    rejection.line_number,
                    rejection.message
                );
                rejected.push(rejection);
            }
        }
    }

    let ends_with_newline = ends_with_newline(path)?;
    if !ends_with_newline {
        log::warn!("{filepath} does not end with a newline");
    }
    log::info!(
        "read {} stop records from {filepath} ({} rejected)",
        visits.len(),
        rejected.len()
    );

    Ok(StopTimesDataset {
        schema,
        visits,
        rejected,
        ends_with_newline,
    })
}

/// loads the set of identifiers in one column of a companion GTFS file, such as
/// `trip_id` from `trips.txt`.
///
/// # Result
/// None if the file does not exist, so that checks depending on it can be skipped.
pub fn read_reference_ids(
    path: &Path,
    column: &str,
) -> Result<Option<HashSet<String>>, StopTimeError> {
    let filepath = path.to_string_lossy().to_string();
    if !path.is_file() {
        log::warn!("reference file {filepath} not found, skipping {column} reference checks");
        return Ok(None);
    }
    let read_error = |source: csv::Error| StopTimeError::ReadError {
        filepath: filepath.clone(),
        source,
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(read_error)?;
    let idx = reader
        .headers()
        .map_err(read_error)?
        .iter()
        .position(|h| h.trim_start_matches('\u{feff}').trim() == column)
        .ok_or_else(|| StopTimeError::MissingColumn {
            filepath: filepath.clone(),
            column: column.to_string(),
        })?;

    let mut ids = HashSet::new();
    for row in reader.records() {
        let row = row.map_err(read_error)?;
        if let Some(id) = row.get(idx) {
            ids.insert(id.to_string());
        }
    }
    log::info!("loaded {} {column} values from {filepath}", ids.len());
    Ok(Some(ids))
}

/// writes visits back out in the layout described by `schema`.
pub fn write_stop_times(
    path: &Path,
    schema: &StopTimesSchema,
    visits: &[StopVisit],
    overwrite: bool,
) -> Result<(), StopTimeError> {
    let filepath = path.to_string_lossy().to_string();
    if path.exists() && !overwrite {
        return Err(StopTimeError::OutputExists(filepath));
    }
    let write_error = |source: csv::Error| StopTimeError::WriteError {
        filepath: filepath.clone(),
        source,
    };
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(write_error)?;
    writer.write_record(&schema.headers).map_err(write_error)?;
    for visit in visits.iter() {
        writer
            .write_record(schema.to_fields(visit))
            .map_err(write_error)?;
    }
    writer.flush()?;
    log::info!("wrote {} stop records to {filepath}", visits.len());
    Ok(())
}

fn ends_with_newline(path: &Path) -> Result<bool, StopTimeError> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

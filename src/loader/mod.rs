//! CSV loader for telematics exports.
//!
//! Resolves the header against known column aliases, coerces every row into a
//! [`TripRecord`] and either skips or rejects rows that fail validation,
//! depending on [`Settings::strict`].

pub mod normalize;
pub mod schema;
pub mod types;

pub use types::{LoadedTable, RowIssue, TripRecord};

use std::io::Read;

use csv::{ReaderBuilder, StringRecord, StringRecordsIter, Trim};
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{Result, ValidationError};
use normalize::{LocationResolver, normalize_make, parse_reading, parse_timestamp, split_asset_id};
use schema::{ColumnMap, Field};

/// Loads a table from in-memory CSV bytes.
pub fn load_bytes(bytes: &[u8], settings: &Settings) -> Result<LoadedTable> {
    load_table(bytes, settings)
}

/// Non-blank rows examined when looking for the header row.
const HEADER_SCAN_ROWS: usize = 10;

/// Reads and validates a CSV table from `reader`.
///
/// # Errors
///
/// Returns [`ValidationError::MissingColumns`] when a required column is absent,
/// a [`ValidationError::Row`] for the first bad row in strict mode, and CSV
/// errors for unreadable input. Input with no rows at all yields an empty
/// table rather than an error.
#[tracing::instrument(skip_all, fields(skip_rows = ?settings.skip_rows, strict = settings.strict))]
pub fn load_table<R: Read>(reader: R, settings: &Settings) -> Result<LoadedTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let mut rows = rdr.records();

    let Some((headers, columns)) = find_header(&mut rows, settings.skip_rows)? else {
        warn!("Input contains no header row");
        return Ok(LoadedTable::default());
    };
    debug!(?headers, "Header resolved");

    let locations = LocationResolver::new(settings);
    let mut table = LoadedTable::default();

    for row in rows {
        let (line, parsed) = match row {
            Ok(row) if is_blank(&row) => continue,
            Ok(row) => {
                let line = row.position().map_or(0, |p| p.line());
                (line, parse_row(&columns, &row, line, &locations))
            }
            Err(error) => match encoding_issue(&error) {
                Some((line, issue)) => (line, Err(issue)),
                None => return Err(error.into()),
            },
        };
        table.rows_read += 1;

        match parsed {
            Ok(record) => table.records.push(record),
            Err(error) if settings.strict => {
                return Err(ValidationError::Row {
                    line,
                    source: Box::new(error),
                }
                .into());
            }
            Err(error) => {
                warn!(line, error = %error, "Skipping invalid row");
                table.issues.push(RowIssue { line, error });
            }
        }
    }

    info!(
        rows = table.rows_read,
        valid = table.records.len(),
        skipped = table.issues.len(),
        "Table loaded"
    );
    Ok(table)
}

/// Locates the header row: after exactly `skip_rows` preamble lines when set,
/// otherwise the first of the leading rows that names every required column.
fn find_header<R: Read>(
    rows: &mut StringRecordsIter<'_, R>,
    skip_rows: Option<usize>,
) -> Result<Option<(StringRecord, ColumnMap)>> {
    if let Some(skip) = skip_rows {
        for _ in 0..skip {
            if rows.next().is_none() {
                return Ok(None);
            }
        }
        for row in rows.by_ref() {
            let row = row?;
            if is_blank(&row) {
                continue;
            }
            let columns = ColumnMap::resolve(&row)?;
            return Ok(Some((row, columns)));
        }
        return Ok(None);
    }

    let mut first_error = None;
    let mut scanned = 0;
    for row in rows.by_ref() {
        let row = match row {
            Ok(row) => row,
            Err(error) if encoding_issue(&error).is_some() => continue,
            Err(error) => return Err(error.into()),
        };
        if is_blank(&row) {
            continue;
        }
        match ColumnMap::resolve(&row) {
            Ok(columns) => {
                debug!(preamble = scanned, "Header row detected");
                return Ok(Some((row, columns)));
            }
            Err(error) => {
                first_error.get_or_insert(error);
                scanned += 1;
                if scanned == HEADER_SCAN_ROWS {
                    break;
                }
            }
        }
    }

    match first_error {
        Some(error) => Err(error.into()),
        None => Ok(None),
    }
}

/// Maps a row that is not valid UTF-8 to its line and a row-level issue.
fn encoding_issue(error: &csv::Error) -> Option<(u64, ValidationError)> {
    match error.kind() {
        csv::ErrorKind::Utf8 { pos, err } => Some((
            pos.as_ref().map_or(0, |p| p.line()),
            ValidationError::InvalidEncoding {
                column: err.field() + 1,
            },
        )),
        _ => None,
    }
}

fn is_blank(row: &StringRecord) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

fn parse_row(
    columns: &ColumnMap,
    row: &StringRecord,
    line: u64,
    locations: &LocationResolver,
) -> std::result::Result<TripRecord, ValidationError> {
    let asset_id = columns
        .get(Field::AssetId, row)
        .ok_or(ValidationError::MissingValue { field: "asset_id" })?;

    let start_km = parse_reading("start_km", columns.get(Field::StartKm, row))?;
    let end_km = parse_reading("end_km", columns.get(Field::EndKm, row))?;
    if end_km < start_km {
        return Err(ValidationError::EndBeforeStart { start_km, end_km });
    }

    let timestamp = parse_timestamp(columns.get(Field::Timestamp, row))?;

    let age_years = match columns.get(Field::AgeYears, row) {
        Some(raw) => Some(parse_reading("age_years", Some(raw))?),
        None => None,
    };

    let (vehicle_id, role) = split_asset_id(asset_id);

    Ok(TripRecord {
        line,
        asset_id: asset_id.to_string(),
        vehicle_id,
        role,
        start_km,
        end_km,
        timestamp,
        location: locations.resolve(columns.get(Field::Location, row)),
        make: normalize_make(columns.get(Field::Make, row)),
        age_years,
    })
}

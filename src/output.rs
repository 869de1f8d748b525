//! Export of derived records and reports.
//!
//! Supports CSV (optionally gzip-compressed) and JSON report files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::WriterBuilder;
use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::info;

use crate::error::{FleetError, Result};
use crate::metrics::DerivedRecord;
use crate::pipeline::Outcome;
use crate::presenter::render_json;

/// Serializes `records` as CSV rows with a header into `writer`.
pub fn write_records<W: Write>(writer: W, records: &[DerivedRecord]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush().map_err(|e| FleetError::io("<csv writer>", e))?;
    Ok(())
}

/// Writes `records` to a CSV file at `path`, gzip-compressed when `gzip` is set.
///
/// Overwrites any existing file.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display(), count = records.len()))]
pub fn export_records(path: impl AsRef<Path>, records: &[DerivedRecord], gzip: bool) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| FleetError::io(path, e))?;

    if gzip {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        write_records(&mut encoder, records)?;
        encoder
            .finish()
            .and_then(|mut inner| inner.flush())
            .map_err(|e| FleetError::io(path, e))?;
    } else {
        write_records(BufWriter::new(file), records)?;
    }

    info!(gzip, "Records exported");
    Ok(())
}

/// Writes the JSON rendering of `outcome` to `path`.
pub fn export_json(path: impl AsRef<Path>, outcome: &Outcome) -> Result<()> {
    let path = path.as_ref();
    let json = render_json(outcome)?;
    std::fs::write(path, json).map_err(|e| FleetError::io(path, e))?;
    info!(path = %path.display(), "Report JSON written");
    Ok(())
}

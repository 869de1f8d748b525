//! Reads raw input bytes from a local path or an HTTP(S) URL.

use std::io::Read;

use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::{FleetError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Fetches a telematics export over HTTP with a blocking client.
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let resp = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(resp.bytes()?.to_vec())
}

/// Loads source data from a local file path or fetches it over HTTP,
/// gunzipping it when the payload is gzip-compressed.
#[tracing::instrument(skip_all, fields(source = %source))]
pub fn read_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_bytes(source)?
    } else {
        std::fs::read(source).map_err(|e| FleetError::io(source, e))?
    };
    debug!(bytes = bytes.len(), "Source bytes read");

    maybe_gunzip(bytes, source)
}

/// Returns `bytes` unchanged unless they start with the gzip magic number.
pub fn maybe_gunzip(bytes: Vec<u8>, source: &str) -> Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }

    let mut decoded = Vec::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_end(&mut decoded)
        .map_err(|e| FleetError::io(source, e))?;
    debug!(
        compressed = bytes.len(),
        decompressed = decoded.len(),
        "Gzip source decompressed"
    );
    Ok(decoded)
}

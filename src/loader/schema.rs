//! Header resolution: maps the columns of an export onto record fields.

use csv::StringRecord;

use crate::error::ValidationError;

/// A logical column of the input table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    AssetId,
    StartKm,
    EndKm,
    Timestamp,
    Location,
    Make,
    AgeYears,
}

const FIELD_COUNT: usize = 7;

impl Field {
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::AssetId,
        Field::StartKm,
        Field::EndKm,
        Field::Timestamp,
        Field::Location,
        Field::Make,
        Field::AgeYears,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::AssetId => "asset_id",
            Field::StartKm => "start_km",
            Field::EndKm => "end_km",
            Field::Timestamp => "timestamp",
            Field::Location => "location",
            Field::Make => "make",
            Field::AgeYears => "age_years",
        }
    }

    /// Normalized header names accepted for this field, in priority order.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Field::AssetId => &[
                "asset_id",
                "asset",
                "vehicle_id",
                "vehicle",
                "plate_number",
                "plate",
                "unit",
            ],
            Field::StartKm => &["start_km", "start_odometer", "odometer_start", "start"],
            Field::EndKm => &["end_km", "end_odometer", "odometer_end", "end"],
            Field::Timestamp => &["timestamp", "date", "datetime", "trip_date", "grouping"],
            Field::Location => &["location", "region", "site", "city"],
            Field::Make => &["make", "brand", "manufacturer"],
            Field::AgeYears => &["age_years", "asset_age", "age"],
        }
    }

    pub fn required(self) -> bool {
        matches!(
            self,
            Field::AssetId | Field::StartKm | Field::EndKm | Field::Timestamp
        )
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Lower-cases a header and collapses runs of non-alphanumerics to `_`.
///
/// `" Start Km "` and `"Start-KM"` both become `start_km`.
pub fn normalize_header(header: &str) -> String {
    let mut out = String::with_capacity(header.len());
    let mut pending_sep = false;

    for c in header.trim().chars() {
        if c.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(c.to_lowercase());
        } else {
            pending_sep = true;
        }
    }

    out
}

/// Column index for every resolved field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    indices: [Option<usize>; FIELD_COUNT],
}

impl ColumnMap {
    /// Resolves `headers`, failing when any required field has no column.
    pub fn resolve(headers: &StringRecord) -> Result<Self, ValidationError> {
        let normalized: Vec<String> = headers.iter().map(normalize_header).collect();
        let mut indices = [None; FIELD_COUNT];

        for field in Field::ALL {
            indices[field.slot()] = field
                .aliases()
                .iter()
                .find_map(|alias| normalized.iter().position(|h| h == alias));
        }

        let missing: Vec<String> = Field::ALL
            .iter()
            .filter(|f| f.required() && indices[f.slot()].is_none())
            .map(|f| f.name().to_string())
            .collect();

        if !missing.is_empty() {
            return Err(ValidationError::MissingColumns { missing });
        }

        Ok(ColumnMap { indices })
    }

    pub fn index(&self, field: Field) -> Option<usize> {
        self.indices[field.slot()]
    }

    /// Returns the trimmed, non-empty cell for `field`.
    pub fn get<'a>(&self, field: Field, record: &'a StringRecord) -> Option<&'a str> {
        self.index(field)
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header(" Start Km "), "start_km");
        assert_eq!(normalize_header("Start-KM"), "start_km");
        assert_eq!(normalize_header("Plate  Number"), "plate_number");
        assert_eq!(normalize_header("__asset__id__"), "asset_id");
        assert_eq!(normalize_header(""), "");
    }

    #[test]
    fn test_resolve_canonical_headers() {
        let headers = StringRecord::from(vec!["asset_id", "start_km", "end_km", "timestamp"]);
        let map = ColumnMap::resolve(&headers).unwrap();
        assert_eq!(map.index(Field::AssetId), Some(0));
        assert_eq!(map.index(Field::Timestamp), Some(3));
        assert_eq!(map.index(Field::Location), None);
    }

    #[test]
    fn test_resolve_export_headers() {
        let headers = StringRecord::from(vec![
            "Sr",
            "Plate Number",
            "Make",
            "Location",
            "Start Km",
            "End Km",
            "Total Km",
            "Date",
        ]);
        let map = ColumnMap::resolve(&headers).unwrap();
        assert_eq!(map.index(Field::AssetId), Some(1));
        assert_eq!(map.index(Field::Make), Some(2));
        assert_eq!(map.index(Field::Location), Some(3));
        assert_eq!(map.index(Field::StartKm), Some(4));
        assert_eq!(map.index(Field::EndKm), Some(5));
        assert_eq!(map.index(Field::Timestamp), Some(7));
    }

    #[test]
    fn test_alias_priority() {
        let headers = StringRecord::from(vec![
            "plate", "asset_id", "start", "end", "date",
        ]);
        let map = ColumnMap::resolve(&headers).unwrap();
        assert_eq!(map.index(Field::AssetId), Some(1));
    }

    #[test]
    fn test_missing_required_columns() {
        let headers = StringRecord::from(vec!["asset_id", "end_km"]);
        let err = ColumnMap::resolve(&headers).unwrap_err();
        assert_eq!(
            err,
            ValidationError::MissingColumns {
                missing: vec!["start_km".into(), "timestamp".into()],
            }
        );
    }

    #[test]
    fn test_get_skips_blank_cells() {
        let headers = StringRecord::from(vec!["asset_id", "start_km", "end_km", "timestamp"]);
        let map = ColumnMap::resolve(&headers).unwrap();
        let row = StringRecord::from(vec![" A1 ", "  ", "150"]);
        assert_eq!(map.get(Field::AssetId, &row), Some("A1"));
        assert_eq!(map.get(Field::StartKm, &row), None);
        assert_eq!(map.get(Field::Timestamp, &row), None);
    }
}

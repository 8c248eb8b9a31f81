//! Work units and the flat delimited files they are read from.
//!
//! Every invocation re-reads these files so list edits take effect on the
//! next run. Files are comma-delimited, one record per line; blank lines and
//! lines starting with `#` are ignored, and a leading header row is skipped
//! when its first column matches the expected column name.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which pipeline a unit list feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    Serviceability,
    Availability,
}

impl CheckKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CheckKind::Serviceability => "serviceability",
            CheckKind::Availability => "availability",
        }
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CheckKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serviceability" => Ok(CheckKind::Serviceability),
            "availability" => Ok(CheckKind::Availability),
            other => Err(format!("unknown check kind '{other}'")),
        }
    }
}

/// A delivery location probed for store serviceability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// A dark store whose item availability is probed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub store_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
}

/// An item identifier to check at every store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: String,
    pub item_name: Option<String>,
}

/// One store × item probe target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreItemPair {
    pub store_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub item_id: String,
    pub item_name: Option<String>,
}

impl StoreItemPair {
    #[must_use]
    pub fn new(store: &Store, item: &Item) -> Self {
        Self {
            store_id: store.store_id.clone(),
            latitude: store.latitude,
            longitude: store.longitude,
            item_id: item.item_id.clone(),
            item_name: item.item_name.clone(),
        }
    }
}

#[derive(Debug, Error)]
pub enum UnitLoadError {
    #[error("failed to read unit list {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {reason}")]
    Parse {
        path: String,
        line: usize,
        reason: String,
    },
}

/// Load `name,latitude,longitude` rows.
///
/// # Errors
///
/// Returns [`UnitLoadError`] if the file cannot be read or any row is malformed.
pub fn load_locations(path: &Path) -> Result<Vec<Location>, UnitLoadError> {
    let content = read(path)?;
    parse_rows(&content, path, "name", |fields, err| {
        let [name, lat, lng, ..] = fields else {
            return Err(err("expected name,latitude,longitude".to_string()));
        };
        Ok(Location {
            name: non_empty(name).ok_or_else(|| err("location name is empty".to_string()))?,
            latitude: parse_coordinate(lat, "latitude").map_err(err)?,
            longitude: parse_coordinate(lng, "longitude").map_err(err)?,
        })
    })
}

/// Load `store_id,latitude,longitude[,name]` rows.
///
/// # Errors
///
/// Returns [`UnitLoadError`] if the file cannot be read or any row is malformed.
pub fn load_stores(path: &Path) -> Result<Vec<Store>, UnitLoadError> {
    let content = read(path)?;
    parse_rows(&content, path, "store_id", |fields, err| {
        let [store_id, lat, lng, rest @ ..] = fields else {
            return Err(err("expected store_id,latitude,longitude[,name]".to_string()));
        };
        Ok(Store {
            store_id: non_empty(store_id).ok_or_else(|| err("store_id is empty".to_string()))?,
            latitude: parse_coordinate(lat, "latitude").map_err(err)?,
            longitude: parse_coordinate(lng, "longitude").map_err(err)?,
            name: rest.first().and_then(|s| non_empty(s)),
        })
    })
}

/// Load `item_id[,item_name]` rows.
///
/// # Errors
///
/// Returns [`UnitLoadError`] if the file cannot be read or any row is malformed.
pub fn load_items(path: &Path) -> Result<Vec<Item>, UnitLoadError> {
    let content = read(path)?;
    parse_rows(&content, path, "item_id", |fields, err| {
        let [item_id, rest @ ..] = fields else {
            return Err(err("expected item_id[,item_name]".to_string()));
        };
        Ok(Item {
            item_id: non_empty(item_id).ok_or_else(|| err("item_id is empty".to_string()))?,
            item_name: rest.first().and_then(|s| non_empty(s)),
        })
    })
}

fn read(path: &Path) -> Result<String, UnitLoadError> {
    std::fs::read_to_string(path).map_err(|e| UnitLoadError::Io {
        path: path.display().to_string(),
        source: e,
    })
}

fn parse_rows<T, F>(
    content: &str,
    path: &Path,
    header_column: &str,
    parse_row: F,
) -> Result<Vec<T>, UnitLoadError>
where
    F: Fn(&[&str], &dyn Fn(String) -> UnitLoadError) -> Result<T, UnitLoadError>,
{
    let mut rows = Vec::new();
    let mut seen_data = false;

    for (idx, raw_line) in content.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let err = |reason: String| UnitLoadError::Parse {
            path: path.display().to_string(),
            line: idx + 1,
            reason,
        };
        let owned =
            split_fields(line).ok_or_else(|| err("unterminated quoted field".to_string()))?;
        let fields: Vec<&str> = owned.iter().map(|f| f.trim()).collect();
        if !seen_data
            && fields
                .first()
                .is_some_and(|first| first.eq_ignore_ascii_case(header_column))
        {
            seen_data = true;
            continue;
        }
        seen_data = true;

        rows.push(parse_row(&fields, &err)?);
    }

    Ok(rows)
}

/// Splits one row on commas. A field wrapped in double quotes may contain
/// commas, and `""` inside it is a literal quote. `None` on an unclosed quote.
fn split_fields(line: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' if in_quotes => in_quotes = false,
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }

    if in_quotes {
        return None;
    }
    fields.push(field);
    Some(fields)
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_coordinate(raw: &str, field: &str) -> Result<f64, String> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid {field} '{raw}': {e}"))?;
    if !value.is_finite() {
        return Err(format!("{field} must be finite"));
    }
    Ok(value)
}

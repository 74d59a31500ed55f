use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use compact_str::CompactString;
use csv::StringRecord;

use crate::error::{Error, Result};

/// Reference to a CSV column, either by header name or by 0-based index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Name(String),
    Index(usize),
}

impl FromStr for ColumnRef {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(match s.parse::<usize>() {
            Ok(index) => ColumnRef::Index(index),
            Err(_) => ColumnRef::Name(s.to_string()),
        })
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Name(name) => write!(f, "'{name}'"),
            ColumnRef::Index(index) => write!(f, "#{index}"),
        }
    }
}

/// Which columns hold the entrant name and the waffle count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMapping {
    pub name: ColumnRef,
    pub count: ColumnRef,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            name: ColumnRef::Name("username".to_string()),
            count: ColumnRef::Name("waffles".to_string()),
        }
    }
}

impl ColumnMapping {
    /// Headerless event-log export: uid, waffles, time, username.
    pub fn event_log() -> Self {
        Self {
            name: ColumnRef::Index(3),
            count: ColumnRef::Index(1),
        }
    }
}

/// Column mapping resolved against the header row: plain field indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: usize,
    pub count: usize,
}

/// One validated data row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub name: CompactString,
    pub count: u64,
    /// 1-based line in the source, for error reporting.
    pub line: u64,
}

impl ColumnSchema {
    /// Resolve `mapping` against `headers` (None for headerless sources).
    /// Header names match case-insensitively.
    pub fn resolve(mapping: &ColumnMapping, headers: Option<&StringRecord>) -> Result<Self> {
        Ok(Self {
            name: resolve_column(&mapping.name, headers)?,
            count: resolve_column(&mapping.count, headers)?,
        })
    }

    /// Pull the typed name/count pair out of one record.
    pub fn extract(&self, record: &StringRecord, line: u64) -> Result<RawRow> {
        let name = field(record, self.name)
            .ok_or_else(|| Error::malformed(line, format!("missing name field (column #{})", self.name)))?;
        let raw_count = field(record, self.count)
            .ok_or_else(|| Error::malformed(line, format!("missing count field (column #{})", self.count)))?;
        let count = raw_count.parse::<u64>().map_err(|_| {
            Error::malformed(
                line,
                format!("count '{raw_count}' is not a non-negative integer"),
            )
        })?;

        Ok(RawRow {
            name: CompactString::new(name),
            count,
            line,
        })
    }
}

fn resolve_column(column: &ColumnRef, headers: Option<&StringRecord>) -> Result<usize> {
    match (column, headers) {
        (ColumnRef::Index(index), Some(headers)) if *index >= headers.len() => Err(Error::malformed(
            1,
            format!("header has {} columns, no column #{index}", headers.len()),
        )),
        (ColumnRef::Index(index), _) => Ok(*index),
        (ColumnRef::Name(name), Some(headers)) => headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
            .ok_or_else(|| Error::malformed(1, format!("header has no column named '{name}'"))),
        (ColumnRef::Name(name), None) => Err(Error::malformed(
            1,
            format!("column '{name}' is referenced by name but the source has no header row"),
        )),
    }
}

fn field(record: &StringRecord, index: usize) -> Option<&str> {
    record.get(index).map(str::trim).filter(|f| !f.is_empty())
}

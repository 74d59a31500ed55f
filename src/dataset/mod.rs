pub mod aggregate;
pub mod loader;
pub mod schema;

use std::fmt;
use std::str::FromStr;

use compact_str::CompactString;

use self::aggregate::{aggregate_counts, sort_by_count};
use crate::error::{Error, Result};

pub use loader::{load_path, load_reader, LoadOptions};
pub use schema::{ColumnMapping, ColumnRef, ColumnSchema, RawRow};

/// A ranked leaderboard entrant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub name: CompactString,
    pub count: u64,
    /// 1-based position after sorting by count, descending.
    pub rank: u32,
}

/// How entrants with equal counts are ordered when ranks are assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Keep the order in which entrants first appear in the source.
    #[default]
    InputOrder,
    /// Lexicographic by name.
    Name,
}

impl FromStr for TieBreak {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "input-order" | "input" => Ok(TieBreak::InputOrder),
            "name" => Ok(TieBreak::Name),
            other => Err(format!("unknown tie-break '{other}' (expected input-order or name)")),
        }
    }
}

impl fmt::Display for TieBreak {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TieBreak::InputOrder => "input-order",
            TieBreak::Name => "name",
        })
    }
}

/// Immutable ranked list of records.
///
/// Invariants: counts are non-increasing in rank order, ranks run 1..=len
/// without gaps, names are unique, and every count is non-zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    /// Build a dataset from validated rows: sum repeated names, drop
    /// zero-count entrants, then rank.
    pub fn from_rows(rows: Vec<RawRow>, tie_break: TieBreak) -> Result<Self> {
        let row_count = rows.len();
        let mut entrants = aggregate_counts(rows);
        let before = entrants.len();
        entrants.retain(|e| e.count > 0);

        tracing::debug!(
            "{} rows → {} entrants, {} dropped with zero count",
            row_count,
            before,
            before - entrants.len()
        );

        if entrants.is_empty() {
            return Err(Error::EmptyDataset);
        }

        sort_by_count(&mut entrants, tie_break);

        let records = entrants
            .into_iter()
            .enumerate()
            .map(|(i, e)| Record {
                name: e.name,
                count: e.count,
                rank: i as u32 + 1,
            })
            .collect();

        Ok(Self { records })
    }

    /// Convenience constructor from `(name, count)` pairs in input order.
    pub fn from_counts<I, S>(counts: I, tie_break: TieBreak) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: AsRef<str>,
    {
        let rows = counts
            .into_iter()
            .enumerate()
            .map(|(i, (name, count))| RawRow {
                name: CompactString::new(name.as_ref()),
                count,
                line: i as u64 + 1,
            })
            .collect();
        Self::from_rows(rows, tie_break)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records with `rank <= maxrank`, in rank order.
    pub fn view(&self, maxrank: u32) -> &[Record] {
        let n = (maxrank as usize).min(self.records.len());
        &self.records[..n]
    }

    pub fn total_count(&self) -> u64 {
        self.records.iter().map(|r| r.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_are_contiguous_and_counts_non_increasing() {
        let ds = Dataset::from_counts(
            [("alice", 50), ("bob", 30), ("carol", 0), ("dave", 20)],
            TieBreak::InputOrder,
        )
        .unwrap();

        let summary: Vec<_> = ds
            .records()
            .iter()
            .map(|r| (r.name.as_str(), r.count, r.rank))
            .collect();
        assert_eq!(summary, [("alice", 50, 1), ("bob", 30, 2), ("dave", 20, 3)]);
    }

    #[test]
    fn all_zero_counts_is_an_empty_dataset() {
        let err = Dataset::from_counts([("a", 0), ("b", 0)], TieBreak::InputOrder).unwrap_err();
        assert!(matches!(err, Error::EmptyDataset));
    }

    #[test]
    fn view_clamps_to_dataset_size() {
        let ds = Dataset::from_counts([("a", 3), ("b", 2)], TieBreak::InputOrder).unwrap();
        assert_eq!(ds.view(1).len(), 1);
        assert_eq!(ds.view(10).len(), 2);
        assert_eq!(ds.view(10)[1].rank, 2);
        assert!(ds.view(0).is_empty());
    }

    #[test]
    fn tie_break_parses() {
        assert_eq!("name".parse::<TieBreak>(), Ok(TieBreak::Name));
        assert_eq!("input-order".parse::<TieBreak>(), Ok(TieBreak::InputOrder));
        assert!("random".parse::<TieBreak>().is_err());
    }
}

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::schema::{ColumnMapping, ColumnSchema};
use super::{Dataset, TieBreak};
use crate::error::{Error, Result};

/// How to read a leaderboard export.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub columns: ColumnMapping,
    /// Whether the first row is a header. Headerless sources need index mappings.
    pub has_headers: bool,
    pub tie_break: TieBreak,
}

impl LoadOptions {
    pub fn new(columns: ColumnMapping) -> Self {
        Self {
            columns,
            has_headers: true,
            tie_break: TieBreak::default(),
        }
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self::new(ColumnMapping::default())
    }
}

/// Load and rank the CSV export at `path`.
pub fn load_path(path: &Path, options: &LoadOptions) -> Result<Dataset> {
    let file = File::open(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!("Loading leaderboard from {}", path.display());
    load_reader(file, options)
}

/// Load and rank a CSV export from any reader.
///
/// With the default column mapping, a source whose first row is not a header
/// but an event-log row (uid, waffles, time, username) is read as headerless.
pub fn load_reader<R: Read>(reader: R, options: &LoadOptions) -> Result<Dataset> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = csv.records();

    // First row, when it turns out to be data rather than a header.
    let mut first_row = None;
    let schema = if options.has_headers {
        let Some(first) = records.next() else {
            // Nothing at all in the source, not even a header row.
            return Err(Error::EmptyDataset);
        };
        let first = first.map_err(csv_error)?;
        match ColumnSchema::resolve(&options.columns, Some(&first)) {
            Ok(schema) => schema,
            Err(_) if options.columns == ColumnMapping::default() && is_event_log_row(&first) => {
                tracing::info!("No header row; reading columns as uid, waffles, time, username");
                first_row = Some(first);
                ColumnSchema::resolve(&ColumnMapping::event_log(), None)?
            }
            Err(err) => return Err(err),
        }
    } else {
        ColumnSchema::resolve(&options.columns, None)?
    };
    tracing::debug!(
        "Column schema: name={} count={} (mapping {} / {})",
        schema.name,
        schema.count,
        options.columns.name,
        options.columns.count
    );

    let mut rows = Vec::new();
    for result in first_row.map(Ok).into_iter().chain(records) {
        let record = result.map_err(csv_error)?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let line = record.position().map_or(0, |p| p.line());
        rows.push(schema.extract(&record, line)?);
    }

    let dataset = Dataset::from_rows(rows, options.tie_break)?;
    tracing::info!(
        "Ranked {} entrants ({} waffles total)",
        dataset.len(),
        dataset.total_count()
    );
    Ok(dataset)
}

fn is_event_log_row(record: &csv::StringRecord) -> bool {
    ColumnSchema::resolve(&ColumnMapping::event_log(), None)
        .and_then(|schema| schema.extract(record, 1))
        .is_ok()
}

/// Read failures tied to a row (bad UTF-8, unbalanced quotes) are malformed
/// input at that row's line.
fn csv_error(err: csv::Error) -> Error {
    match err.position().map(|p| p.line()) {
        Some(line) => Error::malformed(line, err.to_string()),
        None => Error::Csv(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnRef;

    fn options() -> LoadOptions {
        LoadOptions::new(ColumnMapping {
            name: ColumnRef::Name("name".into()),
            count: ColumnRef::Name("count".into()),
        })
    }

    #[test]
    fn drops_zero_counts_and_ranks_the_rest() {
        let csv = "name,count\nalice,50\nbob,30\ncarol,0\ndave,20\n";
        let ds = load_reader(csv.as_bytes(), &options()).unwrap();
        let names: Vec<_> = ds.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["alice", "bob", "dave"]);
        assert!(ds.records().iter().all(|r| r.count > 0));
        assert_eq!(ds.records()[2].rank, 3);
    }

    #[test]
    fn header_only_is_empty_dataset() {
        let err = load_reader("name,count\n".as_bytes(), &options()).unwrap_err();
        assert!(matches!(err, Error::EmptyDataset));
    }

    #[test]
    fn completely_empty_source_is_empty_dataset() {
        let err = load_reader("".as_bytes(), &options()).unwrap_err();
        assert!(matches!(err, Error::EmptyDataset));
    }

    #[test]
    fn missing_count_reports_its_line() {
        let csv = "name,count\nalice,5\nbob\n";
        match load_reader(csv.as_bytes(), &options()) {
            Err(Error::MalformedInput { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("count"), "{reason}");
            }
            other => panic!("expected malformed input, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_count_is_malformed() {
        let csv = "name,count\nalice,lots\n";
        let err = load_reader(csv.as_bytes(), &options()).unwrap_err();
        assert_eq!(err.kind(), "malformed-input");
    }

    #[test]
    fn headerless_event_log_by_index() {
        // uid, waffles, time, username
        let csv = "\
1,2,2019-01-03 09:00:00,alice
2,1,2019-01-03 09:05:00,bob
1,3,2019-01-04 08:00:00,alice
3,0,2019-01-04 08:30:00,carol
";
        let options = LoadOptions {
            columns: ColumnMapping {
                name: ColumnRef::Index(3),
                count: ColumnRef::Index(1),
            },
            has_headers: false,
            tie_break: TieBreak::InputOrder,
        };
        let ds = load_reader(csv.as_bytes(), &options).unwrap();
        let summary: Vec<_> = ds
            .records()
            .iter()
            .map(|r| (r.name.as_str(), r.count))
            .collect();
        assert_eq!(summary, [("alice", 5), ("bob", 1)]);
    }

    #[test]
    fn default_mapping_reads_the_export_header() {
        let csv = "uid,waffles,time,username\n7,4,2019-02-01 10:00:00,erin\n";
        let ds = load_reader(csv.as_bytes(), &LoadOptions::new(ColumnMapping::default())).unwrap();
        assert_eq!(ds.records()[0].name, "erin");
        assert_eq!(ds.records()[0].count, 4);
    }

    #[test]
    fn default_options_detect_a_headerless_event_log() {
        let csv = "\
1,2,2019-01-03 09:00:00,alice
2,1,2019-01-03 09:05:00,bob
1,3,2019-01-04 08:00:00,alice
";
        let ds = load_reader(csv.as_bytes(), &LoadOptions::default()).unwrap();
        let summary: Vec<_> = ds
            .records()
            .iter()
            .map(|r| (r.name.as_str(), r.count))
            .collect();
        assert_eq!(summary, [("alice", 5), ("bob", 1)]);
        assert_eq!(ds.records()[1].rank, 2);
    }

    #[test]
    fn unknown_header_is_still_malformed() {
        let csv = "who,how_many\nalice,3\n";
        let err = load_reader(csv.as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::MalformedInput { line: 1, .. }), "{err:?}");
    }

    #[test]
    fn invalid_utf8_reports_its_line() {
        let mut csv = b"name,count\nalice,5\n".to_vec();
        csv.extend_from_slice(b"b\xffb,3\n");
        match load_reader(csv.as_slice(), &options()) {
            Err(Error::MalformedInput { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected malformed input, got {other:?}"),
        }
    }

    #[test]
    fn load_path_reads_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("waffle.csv");
        std::fs::write(&path, "name,count\nx,1\ny,2\n").unwrap();
        let ds = load_path(&path, &options()).unwrap();
        assert_eq!(ds.records()[0].name, "y");
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_path(Path::new("/definitely/not/here.csv"), &options()).unwrap_err();
        assert_eq!(err.kind(), "io");
    }
}

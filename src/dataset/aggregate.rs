use std::collections::HashMap;

use compact_str::CompactString;

use super::schema::RawRow;
use super::TieBreak;

/// One entrant after all of its rows have been summed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entrant {
    pub name: CompactString,
    pub count: u64,
    /// Line of the entrant's first row; defines input order.
    pub first_line: u64,
}

/// Sum the counts of rows that name the same entrant.
/// Entrants come out in order of first appearance.
pub fn aggregate_counts(rows: Vec<RawRow>) -> Vec<Entrant> {
    let mut index: HashMap<CompactString, usize> = HashMap::with_capacity(rows.len());
    let mut entrants: Vec<Entrant> = Vec::with_capacity(rows.len());

    for row in rows {
        match index.get(&row.name) {
            Some(&i) => {
                entrants[i].count = entrants[i].count.saturating_add(row.count);
            }
            None => {
                index.insert(row.name.clone(), entrants.len());
                entrants.push(Entrant {
                    name: row.name,
                    count: row.count,
                    first_line: row.line,
                });
            }
        }
    }

    entrants
}

/// Sort entrants by count (descending), breaking ties per `tie_break`.
/// The sort is stable, so `InputOrder` keeps first-appearance order.
pub fn sort_by_count(entrants: &mut [Entrant], tie_break: TieBreak) {
    match tie_break {
        TieBreak::InputOrder => entrants.sort_by(|a, b| b.count.cmp(&a.count)),
        TieBreak::Name => {
            entrants.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, count: u64, line: u64) -> RawRow {
        RawRow {
            name: name.into(),
            count,
            line,
        }
    }

    #[test]
    fn repeated_names_are_summed_in_first_seen_order() {
        let entrants = aggregate_counts(vec![
            row("bob", 2, 2),
            row("alice", 1, 3),
            row("bob", 5, 4),
        ]);
        assert_eq!(entrants.len(), 2);
        assert_eq!(entrants[0].name, "bob");
        assert_eq!(entrants[0].count, 7);
        assert_eq!(entrants[0].first_line, 2);
        assert_eq!(entrants[1].name, "alice");
    }

    #[test]
    fn ties_follow_the_configured_order() {
        let base = aggregate_counts(vec![row("zed", 4, 2), row("amy", 4, 3), row("max", 9, 4)]);

        let mut by_input = base.clone();
        sort_by_count(&mut by_input, TieBreak::InputOrder);
        let names: Vec<_> = by_input.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["max", "zed", "amy"]);

        let mut by_name = base;
        sort_by_count(&mut by_name, TieBreak::Name);
        let names: Vec<_> = by_name.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["max", "amy", "zed"]);
    }
}

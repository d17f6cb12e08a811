//! Circular dependency detection for computed rows.
//!
//! A statement definition must not contain a row whose formula (or rollup)
//! reaches back to itself, e.g. C1 = C2, C2 = C3 + C4, C3 = C1. Schema loaders
//! use this module to reject such definitions up front; the resolver does its
//! own detection during a pass so hand-built sheets can never recurse forever.

use super::row_id::RowId;
use super::sheet::Sheet;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Done,
}

/// Detect a circular dependency reachable from `start`.
/// Returns Some(cycle_path) if a cycle is found, None otherwise. The path
/// begins and ends with the same row.
pub fn detect_cycle(start: &str, sheet: &Sheet) -> Option<Vec<RowId>> {
    let start = sheet.index_of(start)?;
    let mut marks = vec![Mark::Unvisited; sheet.len()];
    search_from(start, sheet, &mut marks).map(|path| to_ids(sheet, &path))
}

/// Find any cycle in the sheet, checking rows in declaration order.
pub fn find_any_cycle(sheet: &Sheet) -> Option<Vec<RowId>> {
    let mut marks = vec![Mark::Unvisited; sheet.len()];
    (0..sheet.len()).find_map(|start| {
        if marks[start] != Mark::Unvisited {
            return None;
        }
        search_from(start, sheet, &mut marks).map(|path| to_ids(sheet, &path))
    })
}

/// Depth-first search from `start` over an explicit stack of
/// `(row, dependencies, next)` frames.
fn search_from(start: usize, sheet: &Sheet, marks: &mut [Mark]) -> Option<Vec<usize>> {
    marks[start] = Mark::Visiting;
    let mut frames = vec![(start, sheet.dependencies(start), 0)];

    while let Some((current, deps, next)) = frames.last_mut() {
        let Some(&dep) = deps.get(*next) else {
            marks[*current] = Mark::Done;
            frames.pop();
            continue;
        };
        *next += 1;

        match marks[dep] {
            Mark::Done => {}
            Mark::Visiting => {
                // Trim the stack down to the cycle itself.
                let from = frames.iter().position(|f| f.0 == dep).unwrap_or(0);
                let mut path: Vec<usize> = frames[from..].iter().map(|f| f.0).collect();
                path.push(dep);
                return Some(path);
            }
            Mark::Unvisited => {
                marks[dep] = Mark::Visiting;
                frames.push((dep, sheet.dependencies(dep), 0));
            }
        }
    }
    None
}

fn to_ids(sheet: &Sheet, path: &[usize]) -> Vec<RowId> {
    path.iter().map(|&i| sheet.rows()[i].id.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Row;

    fn ids(path: &[RowId]) -> Vec<&str> {
        path.iter().map(RowId::as_str).collect()
    }

    #[test]
    fn test_no_cycle() {
        let sheet = Sheet::new(
            "bs",
            vec![
                Row::computed("C1", "a", "C2+C3").unwrap(),
                Row::computed("C2", "b", "C3").unwrap(),
                Row::input("C3", "c").unwrap(),
            ],
        )
        .unwrap();
        assert!(detect_cycle("C1", &sheet).is_none());
        assert!(find_any_cycle(&sheet).is_none());
    }

    #[test]
    fn test_detects_cycle_path() {
        let sheet = Sheet::new(
            "bs",
            vec![
                Row::computed("C9", "outside", "C1").unwrap(),
                Row::computed("C1", "a", "C2").unwrap(),
                Row::computed("C2", "b", "C4+C3").unwrap(),
                Row::computed("C3", "c", "C1").unwrap(),
                Row::input("C4", "d").unwrap(),
            ],
        )
        .unwrap();
        let path = detect_cycle("C9", &sheet).unwrap();
        assert_eq!(ids(&path), vec!["C1", "C2", "C3", "C1"]);
        assert_eq!(ids(&find_any_cycle(&sheet).unwrap()), vec!["C1", "C2", "C3", "C1"]);
    }

    #[test]
    fn test_deep_chain() {
        let n = 50_000;
        let mut rows: Vec<Row> = (2..=n)
            .rev()
            .map(|i| {
                let prev = format!("R{}", i - 1);
                Row::computed(&format!("R{i}"), "link", &prev).unwrap()
            })
            .collect();
        rows.push(Row::input("R1", "start").unwrap());
        let sheet = Sheet::new("chain", rows).unwrap();
        assert!(find_any_cycle(&sheet).is_none());
        assert!(detect_cycle(&format!("R{n}"), &sheet).is_none());
    }

    #[test]
    fn test_self_reference() {
        let sheet =
            Sheet::new("bs", vec![Row::computed("C1", "a", "C1").unwrap()]).unwrap();
        assert_eq!(ids(&detect_cycle("C1", &sheet).unwrap()), vec!["C1", "C1"]);
    }
}

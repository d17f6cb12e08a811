//! Statement sheets.
//!
//! A [`Sheet`] is an ordered, immutable list of rows plus an id index built
//! once at construction. Construction enforces the closed-world rule: every
//! row referenced by a formula, rollup group, parent or weight must exist in
//! the same sheet. Cycles are not rejected here; see [`detect_cycle`] and the
//! resolver, which reports them per row.
//!
//! [`detect_cycle`]: super::detect_cycle

use std::collections::HashMap;

use super::error::ConfigError;
use super::row::{Derivation, Row, RowKind};
use super::row_id::RowId;

#[derive(Clone, Debug)]
pub struct Sheet {
    name: String,
    rows: Vec<Row>,
    index: HashMap<RowId, usize>,
    /// Parent row index -> child row indices, in declaration order.
    children: HashMap<usize, Vec<usize>>,
}

impl Sheet {
    /// Build a sheet, validating ids and references.
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Result<Sheet, ConfigError> {
        let name = name.into();

        let mut index = HashMap::with_capacity(rows.len());
        for (i, row) in rows.iter().enumerate() {
            if index.insert(row.id.clone(), i).is_some() {
                return Err(ConfigError::DuplicateRow {
                    sheet: name,
                    id: row.id.clone(),
                });
            }
        }

        let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
        for (i, row) in rows.iter().enumerate() {
            let Some(parent) = &row.parent else {
                continue;
            };
            let Some(&parent_idx) = index.get(parent) else {
                return Err(ConfigError::UnknownParent {
                    sheet: name,
                    row: row.id.clone(),
                    parent: parent.clone(),
                });
            };
            if rows[parent_idx].parent.is_some() {
                return Err(ConfigError::NestedHierarchy {
                    sheet: name,
                    row: row.id.clone(),
                    parent: parent.clone(),
                });
            }
            if let Some(weight) = &row.weight
                && !index.contains_key(weight)
            {
                return Err(ConfigError::UnknownReference {
                    sheet: name,
                    row: row.id.clone(),
                    token: weight.to_string(),
                });
            }
            children.entry(parent_idx).or_default().push(i);
        }

        for row in &rows {
            let RowKind::Computed(derivation) = &row.kind else {
                continue;
            };
            match derivation {
                Derivation::Formula(formula) => {
                    if let Some(missing) = formula.references().find(|r| !index.contains_key(*r)) {
                        return Err(ConfigError::UnknownReference {
                            sheet: name,
                            row: row.id.clone(),
                            token: missing.to_string(),
                        });
                    }
                }
                Derivation::Rollup { group, .. } => {
                    let Some(&group_idx) = index.get(group) else {
                        return Err(ConfigError::UnknownReference {
                            sheet: name,
                            row: row.id.clone(),
                            token: group.to_string(),
                        });
                    };
                    let members = children.get(&group_idx).map(Vec::as_slice).unwrap_or(&[]);
                    if let Some(&unweighted) = members.iter().find(|&&c| rows[c].weight.is_none()) {
                        return Err(ConfigError::MissingWeight {
                            sheet: name,
                            row: rows[unweighted].id.clone(),
                            group: group.clone(),
                        });
                    }
                }
            }
        }

        Ok(Sheet {
            name,
            rows,
            index,
            children,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Row> {
        self.index_of(id).map(|i| &self.rows[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub(crate) fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Child rows of `parent` in declaration order.
    pub fn children_of(&self, parent: &str) -> impl Iterator<Item = &Row> {
        self.index_of(parent)
            .and_then(|p| self.children.get(&p))
            .into_iter()
            .flatten()
            .map(|&c| &self.rows[c])
    }

    pub(crate) fn child_indices(&self, parent_idx: usize) -> &[usize] {
        self.children
            .get(&parent_idx)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Rows that row `idx` reads directly when it is resolved.
    pub(crate) fn dependencies(&self, idx: usize) -> Vec<usize> {
        let RowKind::Computed(derivation) = &self.rows[idx].kind else {
            return Vec::new();
        };
        match derivation {
            Derivation::Formula(formula) => formula
                .references()
                .filter_map(|r| self.index_of(r.as_str()))
                .collect(),
            Derivation::Rollup { group, .. } => {
                let Some(group_idx) = self.index_of(group.as_str()) else {
                    return Vec::new();
                };
                let mut deps = Vec::new();
                for &child in self.child_indices(group_idx) {
                    deps.push(child);
                    if let Some(w) = self.rows[child].weight.as_ref() {
                        deps.extend(self.index_of(w.as_str()));
                    }
                }
                deps
            }
        }
    }
}

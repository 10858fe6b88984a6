// Join Engine - relational composition of two views.
//
// Shared column names are the join keys. With none shared the result is the
// Cartesian product; otherwise keys must carry equal recorded types.

use std::collections::{HashMap, HashSet};
use super::{Table, TableView};
use crate::error::{GraphError, GraphResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinMode {
    Inner,
    /// Every left row; unmatched right cells filled.
    #[default]
    Left,
    /// Every right row, in right order; unmatched left cells filled.
    Right,
    /// Left join in left order, then right rows that matched nothing.
    Outer,
}

impl TableView {
    /// Joins `other` into this view on their shared columns.
    ///
    /// An empty view is replaced by `other` outright. Unmatched cells are set
    /// to `fill`. Column types of the result are the union of both sides.
    pub fn merge(&mut self, other: &TableView, mode: JoinMode, fill: &str) -> GraphResult<()> {
        let other_columns: HashSet<String> = other.table.column_names().into_iter().collect();
        let shared: Vec<String> = self
            .table
            .column_names()
            .into_iter()
            .filter(|c| other_columns.contains(c))
            .collect();

        if self.is_empty() {
            tracing::info!("Merge into empty view: adopting {} columns", other.table.width());
            self.table = other.table.clone();
            self.col_types = other.col_types.clone();
            return Ok(());
        }

        if shared.is_empty() {
            tracing::info!(
                "Cross join: {} x {} rows",
                self.table.row_count(),
                other.table.row_count()
            );
            self.table = cross_join(&self.table, &other.table);
        } else {
            for col in &shared {
                let current = self.type_of(col).unwrap_or_default();
                let given = other.type_of(col).unwrap_or_default();
                if current != given {
                    return Err(GraphError::TypeMismatch {
                        column: col.clone(),
                        current: current.to_string(),
                        given: given.to_string(),
                    });
                }
            }

            tracing::info!("{:?} join on {:?}", mode, shared);
            self.table = key_join(&self.table, &other.table, &shared, mode, fill);
        }

        self.col_types
            .extend(other.col_types.iter().map(|(k, v)| (k.clone(), v.clone())));
        Ok(())
    }
}

/// Every left row paired with every right row, left columns first.
pub fn cross_join(left: &Table, right: &Table) -> Table {
    let mut header = left.column_names();
    header.extend(right.column_names());

    let mut out = Table::with_header(header);
    for i in 0..left.row_count() {
        let left_row = left.row_values(i);
        for j in 0..right.row_count() {
            let mut row: Vec<String> = left_row.iter().map(|s| s.to_string()).collect();
            row.extend(right.row_values(j).into_iter().map(str::to_string));
            out.push_row(row);
        }
    }
    out
}

/// Equi-join on `keys`. Result columns are the left columns followed by the
/// right columns that are not keys.
pub fn key_join(left: &Table, right: &Table, keys: &[String], mode: JoinMode, fill: &str) -> Table {
    let left_names = left.column_names();
    let right_names = right.column_names();
    let right_extra: Vec<usize> = right_names
        .iter()
        .enumerate()
        .filter(|(_, name)| !keys.contains(name))
        .map(|(j, _)| j)
        .collect();

    // For left columns that are keys, where the same key sits on the right
    let left_key_in_right: Vec<Option<usize>> = left_names
        .iter()
        .map(|name| {
            if keys.contains(name) {
                right_names.iter().position(|r| r == name)
            } else {
                None
            }
        })
        .collect();

    let mut header = left_names.clone();
    header.extend(right_extra.iter().map(|&j| right_names[j].clone()));
    let mut out = Table::with_header(header);

    // Builds one output row. Left cells come from `li` when present; key
    // cells of a right-only row are taken from the right side.
    let build = |li: Option<usize>, rj: Option<usize>| -> Vec<String> {
        let left_row = li.map(|i| left.row_values(i));
        let right_row = rj.map(|j| right.row_values(j));

        let mut row = Vec::with_capacity(left_names.len() + right_extra.len());
        for (c, key_pos) in left_key_in_right.iter().enumerate() {
            let cell = match (&left_row, &right_row, key_pos) {
                (Some(l), _, _) => l[c],
                (None, Some(r), Some(p)) => r[*p],
                _ => fill,
            };
            row.push(cell.to_string());
        }
        for &j in &right_extra {
            let cell = right_row.as_ref().map_or(fill, |r| r[j]);
            row.push(cell.to_string());
        }
        row
    };

    let key_of = |table: &Table, i: usize| -> Vec<String> {
        keys.iter()
            .map(|k| table.row(i).get(k).unwrap_or_default().to_string())
            .collect()
    };

    match mode {
        JoinMode::Inner | JoinMode::Left | JoinMode::Outer => {
            let mut index: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
            for j in 0..right.row_count() {
                index.entry(key_of(right, j)).or_default().push(j);
            }

            let mut matched_right = vec![false; right.row_count()];
            for i in 0..left.row_count() {
                match index.get(&key_of(left, i)) {
                    Some(matches) => {
                        for &j in matches {
                            matched_right[j] = true;
                            out.push_row(build(Some(i), Some(j)));
                        }
                    }
                    None if mode != JoinMode::Inner => out.push_row(build(Some(i), None)),
                    None => {}
                }
            }

            if mode == JoinMode::Outer {
                for (j, matched) in matched_right.iter().enumerate() {
                    if !matched {
                        out.push_row(build(None, Some(j)));
                    }
                }
            }
        }
        JoinMode::Right => {
            let mut index: HashMap<Vec<String>, Vec<usize>> = HashMap::new();
            for i in 0..left.row_count() {
                index.entry(key_of(left, i)).or_default().push(i);
            }

            for j in 0..right.row_count() {
                match index.get(&key_of(right, j)) {
                    Some(matches) => {
                        for &i in matches {
                            out.push_row(build(Some(i), Some(j)));
                        }
                    }
                    None => out.push_row(build(None, Some(j))),
                }
            }
        }
    }

    out
}

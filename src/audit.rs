//! Read-only data-quality checks over a record set.

use crate::types::{OverviewRow, Record, RecordSet, Value};
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AuditReport {
    pub total_rows: usize,
    /// Rows equal, field by field, to an earlier row.
    pub duplicate_count: usize,
    /// Fraction of absent values per field, highest first.
    pub missing_fraction_by_field: Vec<(String, f64)>,
    /// Distinct present values per textual field, lowest first.
    pub cardinality_by_categorical_field: Vec<(String, usize)>,
}

pub fn audit(records: &RecordSet) -> AuditReport {
    AuditReport {
        total_rows: records.len(),
        duplicate_count: duplicate_count(records.rows()),
        missing_fraction_by_field: missing_fractions(records),
        cardinality_by_categorical_field: categorical_cardinality(records),
    }
}

fn duplicate_count(rows: &[Record]) -> usize {
    let mut seen: HashSet<&Record> = HashSet::with_capacity(rows.len());
    rows.iter().filter(|r| !seen.insert(*r)).count()
}

fn missing_fractions(records: &RecordSet) -> Vec<(String, f64)> {
    let n = records.len();
    let mut out: Vec<(String, f64)> = records
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let missing = records.rows().iter().filter(|r| r[idx].is_missing()).count();
            let frac = if n == 0 { 0.0 } else { missing as f64 / n as f64 };
            (name.clone(), frac)
        })
        .collect();
    // Stable, so ties keep schema order.
    out.sort_by(|a, b| b.1.total_cmp(&a.1));
    out
}

fn categorical_cardinality(records: &RecordSet) -> Vec<(String, usize)> {
    let mut out: Vec<(String, usize)> = records
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            let mut present = records
                .rows()
                .iter()
                .map(|r| &r[idx])
                .filter(|v| !v.is_missing())
                .peekable();
            present.peek()?;
            let mut distinct: HashSet<&str> = HashSet::new();
            for v in present {
                distinct.insert(v.as_text()?);
            }
            Some((name.clone(), distinct.len()))
        })
        .collect();
    out.sort_by_key(|(_, n)| *n);
    out
}

/// Per-column inferred type and null counts, like a dataframe `info()`.
pub fn overview(records: &RecordSet) -> Vec<OverviewRow> {
    records
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let mut kinds: Vec<&'static str> = Vec::new();
            let mut missing = 0usize;
            for r in records.rows() {
                match &r[idx] {
                    Value::Missing => missing += 1,
                    v => {
                        let kind = v.type_name();
                        if !kinds.contains(&kind) {
                            kinds.push(kind);
                        }
                    }
                }
            }
            let dtype = match kinds.as_slice() {
                [] => "empty".to_string(),
                [one] => one.to_string(),
                _ => "mixed".to_string(),
            };
            OverviewRow {
                column: name.clone(),
                dtype,
                non_null: records.len() - missing,
                missing,
            }
        })
        .collect()
}

/// Number of columns per inferred type, most common first.
pub fn type_counts(records: &RecordSet) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for row in overview(records) {
        match counts.iter_mut().find(|(t, _)| *t == row.dtype) {
            Some((_, n)) => *n += 1,
            None => counts.push((row.dtype, 1)),
        }
    }
    // Stable, so ties keep first-seen order.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

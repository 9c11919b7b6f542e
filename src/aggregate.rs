//! Grouping, reduction and ranking over a normalized record set.

use crate::error::{Result, SalesError};
use crate::types::{RecordSet, Value};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Reduction {
    Sum,
    Mean,
    /// Number of present (non-missing) values.
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    Ascending,
    #[default]
    Descending,
}

/// One output column of [`aggregate_by`]: reduce `source` into `output`.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub output: String,
    pub source: String,
    pub reduction: Reduction,
}

impl MetricSpec {
    pub fn new(output: impl Into<String>, source: impl Into<String>, reduction: Reduction) -> Self {
        Self {
            output: output.into(),
            source: source.into(),
            reduction,
        }
    }

    pub fn sum(output: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(output, source, Reduction::Sum)
    }

    pub fn mean(output: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(output, source, Reduction::Mean)
    }

    pub fn count(output: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(output, source, Reduction::Count)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub key: Vec<Value>,
    /// Aligned with [`GroupedTable::metric_names`]. `None` is the mean of
    /// no values.
    pub metrics: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedTable {
    pub key_fields: Vec<String>,
    pub metric_names: Vec<String>,
    pub groups: Vec<Group>,
}

impl GroupedTable {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn metric_index(&self, name: &str) -> Result<usize> {
        self.metric_names
            .iter()
            .position(|m| m == name)
            .ok_or_else(|| SalesError::InvalidField(name.to_string()))
    }

    /// Stable sort on one metric; absent values go last in either order.
    pub fn sort_by_metric(&mut self, name: &str, order: Order) -> Result<()> {
        let idx = self.metric_index(name)?;
        self.groups
            .sort_by(|a, b| compare_metric(a.metrics[idx], b.metrics[idx], order));
        Ok(())
    }
}

fn compare_metric(a: Option<f64>, b: Option<f64>, order: Order) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => match order {
            Order::Ascending => x.total_cmp(&y),
            Order::Descending => y.total_cmp(&x),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Acc {
    sum: f64,
    count: usize,
}

impl Acc {
    fn finish(self, reduction: Reduction) -> Option<f64> {
        match reduction {
            Reduction::Sum => Some(self.sum),
            Reduction::Count => Some(self.count as f64),
            Reduction::Mean if self.count == 0 => None,
            Reduction::Mean => Some(self.sum / self.count as f64),
        }
    }
}

/// Group rows by the values of `group_key_fields` and reduce each metric.
///
/// Rows with an absent key value are left out. Groups come back in
/// ascending key order.
pub fn aggregate_by(
    records: &RecordSet,
    group_key_fields: &[&str],
    metric_specs: &[MetricSpec],
) -> Result<GroupedTable> {
    if group_key_fields.is_empty() {
        return Err(SalesError::InvalidField("<no group key>".to_string()));
    }
    let key_idx = group_key_fields
        .iter()
        .map(|f| records.column_index(f))
        .collect::<Result<Vec<_>>>()?;
    let src_idx = metric_specs
        .iter()
        .map(|m| records.column_index(&m.source))
        .collect::<Result<Vec<_>>>()?;

    let mut map: BTreeMap<Vec<Value>, Vec<Acc>> = BTreeMap::new();
    for row in records.rows() {
        if key_idx.iter().any(|&k| row[k].is_missing()) {
            continue;
        }
        let key: Vec<Value> = key_idx.iter().map(|&k| row[k].clone()).collect();
        let accs = map
            .entry(key)
            .or_insert_with(|| vec![Acc::default(); metric_specs.len()]);
        for ((spec, &src), acc) in metric_specs.iter().zip(&src_idx).zip(accs.iter_mut()) {
            let v = &row[src];
            if v.is_missing() {
                continue;
            }
            match spec.reduction {
                Reduction::Count => acc.count += 1,
                Reduction::Sum | Reduction::Mean => {
                    let n = v.as_f64().ok_or_else(|| SalesError::NotNumeric {
                        field: spec.source.clone(),
                    })?;
                    acc.sum += n;
                    acc.count += 1;
                }
            }
        }
    }

    let groups = map
        .into_iter()
        .map(|(key, accs)| Group {
            key,
            metrics: accs
                .into_iter()
                .zip(metric_specs)
                .map(|(acc, spec)| acc.finish(spec.reduction))
                .collect(),
        })
        .collect();

    Ok(GroupedTable {
        key_fields: group_key_fields.iter().map(|s| s.to_string()).collect(),
        metric_names: metric_specs.iter().map(|m| m.output.clone()).collect(),
        groups,
    })
}

/// The `n` groups of `group_key_field` ranked by `reduction` over
/// `metric_field`. `Order::Descending` yields the largest values.
///
/// Ties keep ascending key order.
pub fn top_n_by(
    records: &RecordSet,
    group_key_field: &str,
    metric_field: &str,
    reduction: Reduction,
    n: usize,
    order: Order,
) -> Result<Vec<(Value, Option<f64>)>> {
    let spec = MetricSpec::new(metric_field, metric_field, reduction);
    let mut table = aggregate_by(records, &[group_key_field], &[spec])?;
    table.sort_by_metric(metric_field, order)?;
    Ok(table
        .groups
        .into_iter()
        .take(n)
        .map(|mut g| (g.key.swap_remove(0), g.metrics[0]))
        .collect())
}

/// Occurrences of each present value of `field`, most frequent first.
pub fn value_counts(records: &RecordSet, field: &str) -> Result<Vec<(Value, usize)>> {
    let mut counts: BTreeMap<&Value, usize> = BTreeMap::new();
    for v in records.column(field)? {
        if !v.is_missing() {
            *counts.entry(v).or_default() += 1;
        }
    }
    let mut out: Vec<(Value, usize)> = counts.into_iter().map(|(v, c)| (v.clone(), c)).collect();
    out.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(out)
}

/// Row-normalized contingency table: each row's shares sum to 1.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Crosstab {
    pub row_field: String,
    pub col_field: String,
    pub row_labels: Vec<Value>,
    pub col_labels: Vec<Value>,
    pub shares: Vec<Vec<f64>>,
}

pub fn crosstab(records: &RecordSet, row_field: &str, col_field: &str) -> Result<Crosstab> {
    let r_idx = records.column_index(row_field)?;
    let c_idx = records.column_index(col_field)?;

    let mut counts: BTreeMap<&Value, BTreeMap<&Value, usize>> = BTreeMap::new();
    let mut col_set: BTreeSet<&Value> = BTreeSet::new();
    for row in records.rows() {
        let (r, c) = (&row[r_idx], &row[c_idx]);
        if r.is_missing() || c.is_missing() {
            continue;
        }
        *counts.entry(r).or_default().entry(c).or_default() += 1;
        col_set.insert(c);
    }

    let col_labels: Vec<&Value> = col_set.into_iter().collect();
    let mut row_labels = Vec::with_capacity(counts.len());
    let mut shares = Vec::with_capacity(counts.len());
    for (r, cols) in counts {
        let total: usize = cols.values().sum();
        shares.push(
            col_labels
                .iter()
                .map(|c| cols.get(c).copied().unwrap_or(0) as f64 / total as f64)
                .collect(),
        );
        row_labels.push(r.clone());
    }

    Ok(Crosstab {
        row_field: row_field.to_string(),
        col_field: col_field.to_string(),
        row_labels,
        col_labels: col_labels.into_iter().cloned().collect(),
        shares,
    })
}

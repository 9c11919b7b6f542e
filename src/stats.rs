//! Descriptive statistics and correlations over numeric fields.

use crate::error::{Result, SalesError};
use crate::types::{RecordSet, Value};
use crate::util::{average, quantile_sorted, std_dev};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub field: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub p50: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

// Present values of `field` as numbers. Text or dates are an error.
fn numeric_values(records: &RecordSet, field: &str) -> Result<Vec<Option<f64>>> {
    records
        .column(field)?
        .map(|v| match v {
            Value::Missing => Ok(None),
            other => other.as_f64().map(Some).ok_or_else(|| SalesError::NotNumeric {
                field: field.to_string(),
            }),
        })
        .collect()
}

/// Sum of the present values of `field`.
pub fn sum(records: &RecordSet, field: &str) -> Result<f64> {
    Ok(numeric_values(records, field)?.into_iter().flatten().sum())
}

/// Columns whose present values are all numeric (ints, floats or flags).
pub fn numeric_fields(records: &RecordSet) -> Vec<&str> {
    records
        .columns()
        .iter()
        .enumerate()
        .filter(|(idx, _)| {
            let mut present = records.rows().iter().map(|r| &r[*idx]).filter(|v| !v.is_missing());
            let mut any = false;
            let all_numeric = present.all(|v| {
                any = true;
                matches!(v, Value::Int(_) | Value::Number(_))
            });
            any && all_numeric
        })
        .map(|(_, name)| name.as_str())
        .collect()
}

/// Count, mean, sample std, min, quartiles and max of each field.
pub fn describe(records: &RecordSet, fields: &[&str]) -> Result<Vec<Summary>> {
    fields
        .iter()
        .map(|field| {
            let mut v: Vec<f64> = numeric_values(records, field)?.into_iter().flatten().collect();
            v.sort_by(|a, b| a.total_cmp(b));
            Ok(Summary {
                field: field.to_string(),
                count: v.len(),
                mean: (!v.is_empty()).then(|| average(&v)),
                std: std_dev(&v),
                min: v.first().copied(),
                p25: quantile_sorted(&v, 0.25),
                p50: quantile_sorted(&v, 0.5),
                p75: quantile_sorted(&v, 0.75),
                max: v.last().copied(),
            })
        })
        .collect()
}

/// [`describe`] computed separately for each value of a grouping field.
///
/// Groups come out in ascending key order; rows with an absent key are left
/// out. These are the inputs of a per-group boxplot.
pub fn describe_by(
    records: &RecordSet,
    group_field: &str,
    fields: &[&str],
) -> Result<Vec<(Value, Vec<Summary>)>> {
    let key = records.column_index(group_field)?;
    for f in fields {
        records.column_index(f)?;
    }
    let mut groups: BTreeMap<&Value, RecordSet> = BTreeMap::new();
    for row in records.rows() {
        if row[key].is_missing() {
            continue;
        }
        groups
            .entry(&row[key])
            .or_insert_with(|| RecordSet::new(records.columns().to_vec()))
            .push(row.clone());
    }
    groups
        .into_iter()
        .map(|(k, subset)| Ok((k.clone(), describe(&subset, fields)?)))
        .collect()
}

/// One equal-width histogram bin. `upper` is exclusive except for the last
/// bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// Equal-width histogram of the present values of `field` over their range.
///
/// A constant column is spread over `[v - 0.5, v + 0.5]`. No values or zero
/// bins give an empty histogram.
pub fn histogram(records: &RecordSet, field: &str, bins: usize) -> Result<Vec<Bin>> {
    let v: Vec<f64> = numeric_values(records, field)?.into_iter().flatten().collect();
    if v.is_empty() || bins == 0 {
        return Ok(Vec::new());
    }
    let mut lo = v.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for x in &v {
        let idx = (((x - lo) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    Ok(counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count,
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationMatrix {
    pub fields: Vec<String>,
    /// `values[i][j]` is the Pearson coefficient of `fields[i]` and
    /// `fields[j]`; `None` when a field is constant or has under two
    /// complete pairs.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.fields.iter().position(|f| f == a)?;
        let j = self.fields.iter().position(|f| f == b)?;
        self.values[i][j]
    }
}

/// Pairwise-complete Pearson correlation between `fields`.
pub fn correlation_matrix(records: &RecordSet, fields: &[&str]) -> Result<CorrelationMatrix> {
    let columns = fields
        .iter()
        .map(|f| numeric_values(records, f))
        .collect::<Result<Vec<_>>>()?;

    let values = columns
        .iter()
        .map(|a| columns.iter().map(|b| pearson(a, b)).collect())
        .collect();

    Ok(CorrelationMatrix {
        fields: fields.iter().map(|s| s.to_string()).collect(),
        values,
    })
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mx) * (y - my);
        sxx += (x - mx).powi(2);
        syy += (y - my).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> RecordSet {
        let mut s = RecordSet::new(vec!["x".into(), "y".into(), "z".into(), "t".into()]);
        let rows = [
            (1.0, 2.0, Some(5.0), "a"),
            (2.0, 4.0, Some(5.0), "b"),
            (3.0, 6.0, None, "c"),
            (4.0, 8.0, Some(5.0), "d"),
        ];
        for (x, y, z, t) in rows {
            s.push(vec![
                Value::Number(x),
                Value::Int(y as i64),
                z.map_or(Value::Missing, Value::Number),
                t.into(),
            ]);
        }
        s
    }

    #[test]
    fn describe_quartiles() {
        let out = describe(&fixture(), &["x"]).unwrap();
        let s = &out[0];
        assert_eq!(s.count, 4);
        assert_eq!(s.mean, Some(2.5));
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.p25, Some(1.75));
        assert_eq!(s.p50, Some(2.5));
        assert_eq!(s.p75, Some(3.25));
        assert_eq!(s.max, Some(4.0));
        assert!((s.std.unwrap() - 1.2909944).abs() < 1e-6);
    }

    #[test]
    fn describe_skips_missing() {
        let out = describe(&fixture(), &["z"]).unwrap();
        assert_eq!(out[0].count, 3);
        assert_eq!(out[0].std, Some(0.0));
    }

    #[test]
    fn sum_skips_missing() {
        assert_eq!(sum(&fixture(), "z").unwrap(), 15.0);
        assert_eq!(sum(&fixture(), "y").unwrap(), 20.0);
    }

    #[test]
    fn describe_text_is_not_numeric() {
        assert!(matches!(
            describe(&fixture(), &["t"]),
            Err(SalesError::NotNumeric { .. })
        ));
    }

    #[test]
    fn numeric_fields_excludes_text() {
        assert_eq!(numeric_fields(&fixture()), vec!["x", "y", "z"]);
    }

    #[test]
    fn perfect_correlation_and_constant_field() {
        let m = correlation_matrix(&fixture(), &["x", "y", "z"]).unwrap();
        assert!((m.get("x", "y").unwrap() - 1.0).abs() < 1e-12);
        assert!((m.get("x", "x").unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(m.get("x", "z"), None);
        assert_eq!(m.get("x", "missing"), None);
    }

    #[test]
    fn describe_by_groups_in_key_order() {
        let mut s = fixture();
        s.push(vec![Value::Number(9.0), Value::Int(1), Value::Missing, Value::Missing]);
        s.push(vec![Value::Number(7.0), Value::Int(1), Value::Missing, "a".into()]);
        let out = describe_by(&s, "t", &["x"]).unwrap();
        let keys: Vec<String> = out.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["a", "b", "c", "d"]);
        let a = &out[0].1[0];
        assert_eq!(a.count, 2);
        assert_eq!(a.mean, Some(4.0));
        assert_eq!(a.max, Some(7.0));
        assert_eq!(out[1].1[0].count, 1);
    }

    #[test]
    fn describe_by_unknown_field() {
        assert!(matches!(
            describe_by(&fixture(), "t", &["nope"]),
            Err(SalesError::InvalidField(f)) if f == "nope"
        ));
        assert!(matches!(
            describe_by(&fixture(), "nope", &["x"]),
            Err(SalesError::InvalidField(_))
        ));
    }

    #[test]
    fn histogram_equal_width_bins() {
        let bins = histogram(&fixture(), "x", 3).unwrap();
        assert_eq!(bins.len(), 3);
        assert_eq!(bins[0].lower, 1.0);
        assert_eq!(bins[2].upper, 4.0);
        // 1 | 2 | 3, 4 (maximum falls in the last bin)
        let counts: Vec<usize> = bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 1, 2]);
        assert_eq!(counts.iter().sum::<usize>(), 4);
    }

    #[test]
    fn histogram_of_constant_column() {
        let bins = histogram(&fixture(), "z", 2).unwrap();
        assert_eq!(bins[0].lower, 4.5);
        assert_eq!(bins[1].upper, 5.5);
        assert_eq!(bins[0].count + bins[1].count, 3);
        assert!(histogram(&fixture(), "x", 0).unwrap().is_empty());
    }

    #[test]
    fn unknown_field_is_invalid() {
        assert!(matches!(
            correlation_matrix(&fixture(), &["nope"]),
            Err(SalesError::InvalidField(_))
        ));
    }
}

//! Coercion of the raw sales log into typed values.
//!
//! Monetary, identifier, date and repeat-customer fields are strict: a present
//! cell that does not parse aborts normalization with [`SalesError::Parse`].
//! An absent date leaves `ano` and `mes` absent. The delivery flag never
//! fails, and the customer rating becomes [`Value::Missing`] instead.

use crate::error::{Result, SalesError};
use crate::fields;
use crate::types::{Record, RecordSet, Value};
use crate::util::{parse_date, parse_decimal, parse_flag, parse_i64};
use chrono::Datelike;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    /// Fractional separator used by monetary and rating text.
    pub decimal_separator: char,
    /// `chrono` format of the order date. No fallback format is tried.
    pub date_format: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            decimal_separator: ',',
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

struct Columns {
    monetary: Vec<(usize, String)>,
    ids: [(usize, &'static str); 2],
    date: usize,
    year: usize,
    month: usize,
    delivered: usize,
    repeat: usize,
    rating: usize,
}

/// Normalize a raw record set and return it.
///
/// Row count and row order are preserved. Already-typed values are kept, so
/// running this again on its own output is a no-op. `ano` and `mes` columns
/// are appended on the first run.
pub fn normalize(
    mut records: RecordSet,
    monetary_fields: &[&str],
    opts: &NormalizeOptions,
) -> Result<RecordSet> {
    // Resolve every field before touching a row.
    let monetary = monetary_fields
        .iter()
        .map(|f| Ok((records.column_index(f)?, f.to_string())))
        .collect::<Result<Vec<_>>>()?;
    let ids = [
        (records.column_index(fields::ORDER_ID)?, fields::ORDER_ID),
        (records.column_index(fields::CUSTOMER_ID)?, fields::CUSTOMER_ID),
    ];
    let date = records.column_index(fields::ORDER_DATE)?;
    let delivered = records.column_index(fields::DELIVERED)?;
    let repeat = records.column_index(fields::REPEAT_CUSTOMER)?;
    let rating = records.column_index(fields::RATING)?;
    let year = records.ensure_column(fields::YEAR);
    let month = records.ensure_column(fields::MONTH);

    let cols = Columns {
        monetary,
        ids,
        date,
        year,
        month,
        delivered,
        repeat,
        rating,
    };

    let mut ratings_dropped = 0usize;
    for (i, row) in records.rows_mut().iter_mut().enumerate() {
        ratings_dropped += normalize_row(row, i + 1, &cols, opts)?;
    }

    debug!(columns = ?monetary_fields, "monetary fields coerced");
    if ratings_dropped > 0 {
        warn!(
            count = ratings_dropped,
            "customer ratings could not be parsed and were set to absent"
        );
    }
    info!(rows = records.len(), "sales log normalized");
    Ok(records)
}

// Returns 1 when a present rating was discarded.
fn normalize_row(
    row: &mut Record,
    row_no: usize,
    cols: &Columns,
    opts: &NormalizeOptions,
) -> Result<usize> {
    for (idx, name) in &cols.monetary {
        row[*idx] = coerce_decimal(&row[*idx], name, row_no, opts.decimal_separator)?;
    }
    for (idx, name) in &cols.ids {
        row[*idx] = coerce_id(&row[*idx], name, row_no)?;
    }

    match coerce_date(&row[cols.date], row_no, &opts.date_format)? {
        Some(date) => {
            row[cols.year] = Value::Int(date.year() as i64);
            row[cols.month] = Value::Int(date.month() as i64);
            row[cols.date] = Value::Date(date);
        }
        None => {
            row[cols.year] = Value::Missing;
            row[cols.month] = Value::Missing;
        }
    }

    row[cols.delivered] = coerce_delivered(&row[cols.delivered]);
    row[cols.repeat] = coerce_repeat(&row[cols.repeat], row_no)?;

    let rating = coerce_rating(&row[cols.rating], opts.decimal_separator);
    let dropped = usize::from(!row[cols.rating].is_missing() && rating.is_missing());
    row[cols.rating] = rating;
    Ok(dropped)
}

fn parse_error(field: &str, row: usize, value: &Value, expected: &'static str) -> SalesError {
    SalesError::Parse {
        field: field.to_string(),
        row,
        value: value.to_string(),
        expected,
    }
}

fn coerce_decimal(v: &Value, field: &str, row: usize, sep: char) -> Result<Value> {
    match v {
        Value::Text(s) => parse_decimal(s, sep)
            .map(Value::Number)
            .ok_or_else(|| parse_error(field, row, v, "decimal number")),
        Value::Int(n) => Ok(Value::Number(*n as f64)),
        Value::Number(n) if n.is_finite() => Ok(v.clone()),
        Value::Missing => Ok(Value::Missing),
        _ => Err(parse_error(field, row, v, "decimal number")),
    }
}

fn coerce_id(v: &Value, field: &str, row: usize) -> Result<Value> {
    match v {
        Value::Int(_) => Ok(v.clone()),
        Value::Text(s) => parse_i64(s)
            .map(Value::Int)
            .ok_or_else(|| parse_error(field, row, v, "integer identifier")),
        Value::Number(n) if n.fract() == 0.0 && n.is_finite() => Ok(Value::Int(*n as i64)),
        _ => Err(parse_error(field, row, v, "integer identifier")),
    }
}

// An absent date stays absent; present text must match `fmt`.
fn coerce_date(v: &Value, row: usize, fmt: &str) -> Result<Option<chrono::NaiveDate>> {
    match v {
        Value::Missing => Ok(None),
        Value::Date(d) => Ok(Some(*d)),
        Value::Text(s) => parse_date(s, fmt)
            .map(Some)
            .ok_or_else(|| parse_error(fields::ORDER_DATE, row, v, "date")),
        _ => Err(parse_error(fields::ORDER_DATE, row, v, "date")),
    }
}

// Total: absent is false, known false tokens are false, anything else present
// is true.
fn coerce_delivered(v: &Value) -> Value {
    let flag = match v {
        Value::Missing => false,
        Value::Bool(b) => *b,
        Value::Text(s) => parse_flag(s).unwrap_or(true),
        other => other.as_f64().map_or(true, |n| n != 0.0),
    };
    Value::Bool(flag)
}

fn coerce_repeat(v: &Value, row: usize) -> Result<Value> {
    let flag = match v {
        Value::Text(s) => parse_flag(s),
        Value::Missing | Value::Date(_) => None,
        other => other.as_f64().map(|n| n != 0.0),
    };
    flag.map(|b| Value::Int(i64::from(b)))
        .ok_or_else(|| parse_error(fields::REPEAT_CUSTOMER, row, v, "0/1 flag"))
}

fn coerce_rating(v: &Value, sep: char) -> Value {
    match v {
        Value::Text(s) => parse_decimal(s, sep).map_or(Value::Missing, Value::Number),
        Value::Number(n) if n.is_finite() => v.clone(),
        Value::Int(n) => Value::Number(*n as f64),
        _ => Value::Missing,
    }
}

use crate::error::{Result, SalesError};
use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use tabled::Tabled;

/// A single cell of the sales log.
///
/// Cells load as `Text` (or `Missing` when empty) and are replaced by typed
/// variants during normalization.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Missing,
    Text(String),
    Int(i64),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the cell. Booleans count as 0/1.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Number(n) => Some(*n),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Missing => "missing",
            Value::Text(_) => "text",
            Value::Int(_) => "int",
            Value::Number(_) => "float",
            Value::Bool(_) => "bool",
            Value::Date(_) => "date",
        }
    }

    // Variant rank used to order values of different kinds.
    fn rank(&self) -> u8 {
        match self {
            Value::Missing => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Number(_) => 3,
            Value::Date(_) => 4,
            Value::Text(_) => 5,
        }
    }
}

// Floats compare by bit pattern so that `Eq`, `Hash` and `Ord` agree.
// Negative zero is folded into zero first.
fn canonical(n: f64) -> f64 {
    if n == 0.0 {
        0.0
    } else {
        n
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Missing => {}
            Value::Text(s) => s.hash(state),
            Value::Int(n) => n.hash(state),
            Value::Number(n) => canonical(*n).to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Date(d) => d.hash(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Missing, Value::Missing) => Ordering::Equal,
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => canonical(*a).total_cmp(&canonical(*b)),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Text(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Number(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Missing => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

static MISSING: Value = Value::Missing;

/// One row of the sales log, aligned with [`RecordSet::columns`].
pub type Record = Vec<Value>;

/// The whole sales log: an ordered schema plus its rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl RecordSet {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row, padding short rows with `Missing` and dropping extra cells.
    pub fn push(&mut self, mut row: Record) {
        row.resize(self.columns.len(), Value::Missing);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| SalesError::InvalidField(name.to_string()))
    }

    /// Values of one column, in row order.
    pub fn column(&self, name: &str) -> Result<impl Iterator<Item = &Value> + '_> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(move |r| &r[idx]))
    }

    pub fn get(&self, row: usize, name: &str) -> Result<&Value> {
        let idx = self.column_index(name)?;
        Ok(self.rows.get(row).map_or(&MISSING, |r| &r[idx]))
    }

    /// Index of `name`, appending it as an all-`Missing` column when absent.
    pub(crate) fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.columns.iter().position(|c| c == name) {
            return idx;
        }
        self.columns.push(name.to_string());
        for r in &mut self.rows {
            r.push(Value::Missing);
        }
        self.columns.len() - 1
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [Record] {
        &mut self.rows
    }

    /// Keep only rows for which `pred` holds.
    pub fn filter<F>(&self, mut pred: F) -> RecordSet
    where
        F: FnMut(&Record) -> bool,
    {
        RecordSet {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| pred(r)).cloned().collect(),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct OverviewRow {
    #[serde(rename = "Column")]
    #[tabled(rename = "Column")]
    pub column: String,
    #[serde(rename = "Type")]
    #[tabled(rename = "Type")]
    pub dtype: String,
    #[serde(rename = "NonNull")]
    #[tabled(rename = "NonNull")]
    pub non_null: usize,
    #[serde(rename = "Missing")]
    #[tabled(rename = "Missing")]
    pub missing: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MissingShareRow {
    #[serde(rename = "Field")]
    #[tabled(rename = "Field")]
    pub field: String,
    #[serde(rename = "MissingPct")]
    #[tabled(rename = "MissingPct")]
    pub missing_pct: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CardinalityRow {
    #[serde(rename = "Field")]
    #[tabled(rename = "Field")]
    pub field: String,
    #[serde(rename = "Distinct")]
    #[tabled(rename = "Distinct")]
    pub distinct: usize,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ChannelSummaryRow {
    #[serde(rename = "Channel")]
    #[tabled(rename = "Channel")]
    pub channel: String,
    #[serde(rename = "TotalValue")]
    #[tabled(rename = "TotalValue")]
    pub total_value: String,
    #[serde(rename = "TotalProfit")]
    #[tabled(rename = "TotalProfit")]
    pub total_profit: String,
    #[serde(rename = "Orders")]
    #[tabled(rename = "Orders")]
    pub orders: usize,
}

/// A grouping value with one formatted metric, e.g. mean margin per channel.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct GroupValueRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct FrequencyRow {
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Share")]
    #[tabled(rename = "Share")]
    pub share: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlyProfitRow {
    #[serde(rename = "Year")]
    #[tabled(rename = "Year")]
    pub year: i64,
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: i64,
    #[serde(rename = "Period")]
    #[tabled(rename = "Period")]
    pub period: String,
    #[serde(rename = "TotalProfit")]
    #[tabled(rename = "TotalProfit")]
    pub total_profit: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CustomerRankingRow {
    #[serde(rename = "Rank")]
    #[tabled(rename = "Rank")]
    pub rank: usize,
    #[serde(rename = "Customer")]
    #[tabled(rename = "Customer")]
    pub customer: String,
    #[serde(rename = "TotalProfit")]
    #[tabled(rename = "TotalProfit")]
    pub total_profit: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct DescribeRow {
    #[serde(rename = "Field")]
    #[tabled(rename = "Field")]
    pub field: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Mean")]
    #[tabled(rename = "Mean")]
    pub mean: String,
    #[serde(rename = "Std")]
    #[tabled(rename = "Std")]
    pub std: String,
    #[serde(rename = "Min")]
    #[tabled(rename = "Min")]
    pub min: String,
    #[serde(rename = "P25")]
    #[tabled(rename = "P25")]
    pub p25: String,
    #[serde(rename = "P50")]
    #[tabled(rename = "P50")]
    pub p50: String,
    #[serde(rename = "P75")]
    #[tabled(rename = "P75")]
    pub p75: String,
    #[serde(rename = "Max")]
    #[tabled(rename = "Max")]
    pub max: String,
}

/// Descriptive statistics of one field within one group.
#[derive(Debug, Serialize, Tabled, Clone)]
pub struct GroupDescribeRow {
    #[serde(rename = "Group")]
    #[tabled(rename = "Group")]
    pub group: String,
    #[serde(rename = "Field")]
    #[tabled(rename = "Field")]
    pub field: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
    #[serde(rename = "Mean")]
    #[tabled(rename = "Mean")]
    pub mean: String,
    #[serde(rename = "Min")]
    #[tabled(rename = "Min")]
    pub min: String,
    #[serde(rename = "P25")]
    #[tabled(rename = "P25")]
    pub p25: String,
    #[serde(rename = "P50")]
    #[tabled(rename = "P50")]
    pub p50: String,
    #[serde(rename = "P75")]
    #[tabled(rename = "P75")]
    pub p75: String,
    #[serde(rename = "Max")]
    #[tabled(rename = "Max")]
    pub max: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct HistogramRow {
    #[serde(rename = "From")]
    #[tabled(rename = "From")]
    pub lower: String,
    #[serde(rename = "To")]
    #[tabled(rename = "To")]
    pub upper: String,
    #[serde(rename = "Count")]
    #[tabled(rename = "Count")]
    pub count: usize,
}

/// Summary of all orders placed by one customer.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CustomerProfile {
    pub customer_id: i64,
    pub orders: usize,
    pub total_profit: f64,
    pub total_value: f64,
    pub mean_rating: Option<f64>,
    pub top_product_types: Vec<(String, usize)>,
    pub payment_methods: Vec<(String, usize)>,
}

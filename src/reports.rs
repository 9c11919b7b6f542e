use crate::aggregate::{
    aggregate_by, crosstab, top_n_by, value_counts, Crosstab, MetricSpec, Order, Reduction,
};
use crate::audit::AuditReport;
use crate::error::Result;
use crate::fields;
use crate::stats::{describe, describe_by, histogram, sum, Summary};
use crate::types::{
    CardinalityRow, ChannelSummaryRow, CustomerProfile, CustomerRankingRow, DescribeRow,
    FrequencyRow, GroupDescribeRow, GroupValueRow, HistogramRow, MissingShareRow,
    MonthlyProfitRow, RecordSet, Value,
};
use crate::util::{format_number, format_opt};

/// Total value, total profit and order count per sales channel, by total
/// value descending.
pub fn channel_summary(data: &RecordSet) -> Result<Vec<ChannelSummaryRow>> {
    let mut table = aggregate_by(
        data,
        &[fields::CHANNEL],
        &[
            MetricSpec::sum("valor_total", fields::TOTAL_VALUE),
            MetricSpec::sum("lucro_total", fields::TOTAL_PROFIT),
            MetricSpec::count("qtd_pedidos", fields::ORDER_ID),
        ],
    )?;
    table.sort_by_metric("valor_total", Order::Descending)?;
    Ok(table
        .groups
        .into_iter()
        .map(|g| ChannelSummaryRow {
            channel: g.key[0].to_string(),
            total_value: format_opt(g.metrics[0], 2),
            total_profit: format_opt(g.metrics[1], 2),
            orders: g.metrics[2].unwrap_or(0.0) as usize,
        })
        .collect())
}

// Single-key aggregate rendered as group/value rows in the requested order.
fn ranked_by_channel(
    data: &RecordSet,
    source: &str,
    reduction: Reduction,
    decimals: usize,
) -> Result<Vec<GroupValueRow>> {
    let rows = top_n_by(data, fields::CHANNEL, source, reduction, usize::MAX, Order::Ascending)?;
    Ok(rows
        .into_iter()
        .map(|(k, v)| GroupValueRow {
            group: k.to_string(),
            value: format_opt(v, decimals),
        })
        .collect())
}

/// Products sold per channel, fewest first.
pub fn products_per_channel(data: &RecordSet) -> Result<Vec<GroupValueRow>> {
    ranked_by_channel(data, fields::PRODUCT, Reduction::Count, 0)
}

/// Mean real profit margin per channel, lowest first.
pub fn mean_margin_per_channel(data: &RecordSet) -> Result<Vec<GroupValueRow>> {
    ranked_by_channel(data, fields::REAL_MARGIN, Reduction::Mean, 2)
}

/// Frequency table of one categorical field, with each value's share of the
/// present values.
pub fn frequency(data: &RecordSet, field: &str) -> Result<Vec<FrequencyRow>> {
    let counts = value_counts(data, field)?;
    let total: usize = counts.iter().map(|(_, c)| c).sum();
    Ok(counts
        .into_iter()
        .map(|(v, count)| FrequencyRow {
            value: v.to_string(),
            count,
            share: format_number(count as f64 / total as f64, 4),
        })
        .collect())
}

/// Total profit per (year, month), chronological.
pub fn monthly_profit(data: &RecordSet) -> Result<Vec<MonthlyProfitRow>> {
    let table = aggregate_by(
        data,
        &[fields::YEAR, fields::MONTH],
        &[MetricSpec::sum("lucro_total", fields::TOTAL_PROFIT)],
    )?;
    Ok(table
        .groups
        .into_iter()
        .filter_map(|g| {
            let (Value::Int(year), Value::Int(month)) = (&g.key[0], &g.key[1]) else {
                return None;
            };
            Some(MonthlyProfitRow {
                year: *year,
                month: *month,
                period: format!("{}-{}", year, month),
                total_profit: format_opt(g.metrics[0], 2),
            })
        })
        .collect())
}

/// Mean total profit for delivered and undelivered orders.
pub fn profit_by_delivery(data: &RecordSet) -> Result<Vec<GroupValueRow>> {
    let table = aggregate_by(
        data,
        &[fields::DELIVERED],
        &[MetricSpec::mean("lucro_medio", fields::TOTAL_PROFIT)],
    )?;
    Ok(table
        .groups
        .into_iter()
        .map(|g| GroupValueRow {
            group: match &g.key[0] {
                Value::Bool(true) => "Entregue".to_string(),
                Value::Bool(false) => "Não Entregue".to_string(),
                other => other.to_string(),
            },
            value: format_opt(g.metrics[0], 2),
        })
        .collect())
}

/// The `n` customers generating the most total profit.
pub fn top_customers(data: &RecordSet, n: usize) -> Result<Vec<CustomerRankingRow>> {
    let top = top_n_by(
        data,
        fields::CUSTOMER_ID,
        fields::TOTAL_PROFIT,
        Reduction::Sum,
        n,
        Order::Descending,
    )?;
    Ok(top
        .into_iter()
        .enumerate()
        .map(|(idx, (customer, profit))| CustomerRankingRow {
            rank: idx + 1,
            customer: customer.to_string(),
            total_profit: format_opt(profit, 2),
        })
        .collect())
}

/// Orders, profit, value, rating and buying habits of one customer.
///
/// Returns `None` when the customer placed no orders.
pub fn customer_profile(data: &RecordSet, customer_id: i64) -> Result<Option<CustomerProfile>> {
    let idx = data.column_index(fields::CUSTOMER_ID)?;
    let orders = data.filter(|r| r[idx] == Value::Int(customer_id));
    if orders.is_empty() {
        return Ok(None);
    }

    let rating = describe(&orders, &[fields::RATING])?;
    let labelled = |counts: Vec<(Value, usize)>| -> Vec<(String, usize)> {
        counts.into_iter().map(|(v, c)| (v.to_string(), c)).collect()
    };

    let mut top_product_types = labelled(value_counts(&orders, fields::PRODUCT_TYPE)?);
    top_product_types.truncate(5);

    Ok(Some(CustomerProfile {
        customer_id,
        orders: orders.len(),
        total_profit: sum(&orders, fields::TOTAL_PROFIT)?,
        total_value: sum(&orders, fields::TOTAL_VALUE)?,
        mean_rating: rating[0].mean,
        top_product_types,
        payment_methods: labelled(value_counts(&orders, fields::PAYMENT_METHOD)?),
    }))
}

/// Bins used for the order value distribution.
pub const VALUE_HISTOGRAM_BINS: usize = 30;

/// Distribution of order values over equal-width bins.
pub fn value_histogram(data: &RecordSet, bins: usize) -> Result<Vec<HistogramRow>> {
    Ok(histogram(data, fields::TOTAL_VALUE, bins)?
        .into_iter()
        .map(|b| HistogramRow {
            lower: format_number(b.lower, 2),
            upper: format_number(b.upper, 2),
            count: b.count,
        })
        .collect())
}

fn grouped_summary(data: &RecordSet, group: &str, field: &str) -> Result<Vec<GroupDescribeRow>> {
    Ok(describe_by(data, group, &[field])?
        .into_iter()
        .flat_map(|(key, summaries)| {
            summaries.into_iter().map(move |s| GroupDescribeRow {
                group: key.to_string(),
                field: s.field,
                count: s.count,
                mean: format_opt(s.mean, 2),
                min: format_opt(s.min, 2),
                p25: format_opt(s.p25, 2),
                p50: format_opt(s.p50, 2),
                p75: format_opt(s.p75, 2),
                max: format_opt(s.max, 2),
            })
        })
        .collect())
}

/// Spread of order value within each region.
pub fn value_by_region(data: &RecordSet) -> Result<Vec<GroupDescribeRow>> {
    grouped_summary(data, fields::REGION, fields::TOTAL_VALUE)
}

/// Spread of total profit within each product type.
pub fn profit_by_product_type(data: &RecordSet) -> Result<Vec<GroupDescribeRow>> {
    grouped_summary(data, fields::PRODUCT_TYPE, fields::TOTAL_PROFIT)
}

/// Column types and how many columns share each one.
pub fn type_distribution(records: &RecordSet) -> Vec<GroupValueRow> {
    crate::audit::type_counts(records)
        .into_iter()
        .map(|(dtype, n)| GroupValueRow {
            group: dtype,
            value: n.to_string(),
        })
        .collect()
}

/// Header and the first `n` rows as display text.
pub fn head_rows(records: &RecordSet, n: usize) -> (Vec<String>, Vec<Vec<String>>) {
    let rows = records
        .rows()
        .iter()
        .take(n)
        .map(|r| r.iter().map(|v| v.to_string()).collect())
        .collect();
    (records.columns().to_vec(), rows)
}

pub fn describe_rows(summaries: &[Summary]) -> Vec<DescribeRow> {
    summaries
        .iter()
        .map(|s| DescribeRow {
            field: s.field.clone(),
            count: s.count,
            mean: format_opt(s.mean, 2),
            std: format_opt(s.std, 2),
            min: format_opt(s.min, 2),
            p25: format_opt(s.p25, 2),
            p50: format_opt(s.p50, 2),
            p75: format_opt(s.p75, 2),
            max: format_opt(s.max, 2),
        })
        .collect()
}

pub fn missing_rows(report: &AuditReport) -> Vec<MissingShareRow> {
    report
        .missing_fraction_by_field
        .iter()
        .map(|(field, frac)| MissingShareRow {
            field: field.clone(),
            missing_pct: format_number(frac * 100.0, 2),
        })
        .collect()
}

pub fn cardinality_rows(report: &AuditReport) -> Vec<CardinalityRow> {
    report
        .cardinality_by_categorical_field
        .iter()
        .map(|(field, distinct)| CardinalityRow {
            field: field.clone(),
            distinct: *distinct,
        })
        .collect()
}

/// Share of each product type within each customer sex.
pub fn product_mix_by_sex(data: &RecordSet) -> Result<Crosstab> {
    crosstab(data, fields::CUSTOMER_SEX, fields::PRODUCT_TYPE)
}

/// Render a crosstab as markdown-ready rows of formatted shares.
pub fn crosstab_rows(ct: &Crosstab) -> (Vec<String>, Vec<Vec<String>>) {
    let mut header = vec![ct.row_field.clone()];
    header.extend(ct.col_labels.iter().map(|c| c.to_string()));
    let rows = ct
        .row_labels
        .iter()
        .zip(&ct.shares)
        .map(|(label, shares)| {
            let mut row = vec![label.to_string()];
            row.extend(shares.iter().map(|s| format_number(*s, 2)));
            row
        })
        .collect();
    (header, rows)
}

use sales_report::aggregate::{aggregate_by, top_n_by, MetricSpec, Order, Reduction};
use sales_report::audit::audit;
use sales_report::fields::{self, MONETARY_FIELDS};
use sales_report::loader::{load_sales_log, LoadOptions};
use sales_report::normalize::{normalize, NormalizeOptions};
use sales_report::{reports, RecordSet, SalesError, Value};
use std::path::PathBuf;
use tempfile::TempDir;

const HEADER: &str = "id_pedido;id_cliente;canal_venda;tipo_produto;produto;forma_pagamento;regiao;sexo_cliente;custo_unitario;custo_total;valor_unitario;sub_total;desconto_aplicado;valor_frete;valor_total;lucro_unitario;lucro_total;margem_lucro_fixada;percentual_desconto_aplicado;margem_lucro_real;data_pedido;produto_entregue;cliente_reincidente;avaliacao_cliente";

const ROWS: [&str; 5] = [
    "1;1513;Loja;Periférico;Mouse;Pix;Sul;F;10,00;20,00;15,00;30,00;0,00;5,00;35,00;5,00;10,00;0,50;0,00;0,29;15/03/2024;True;1;5",
    "2;1513;Site;Vídeo;Monitor;Cartão;Sudeste;F;500,00;500,00;700,00;700,00;50,00;20,00;670,00;200,00;150,00;0,40;0,07;0,22;20/03/2024;;0;4,5",
    "3;7;Site;Periférico;Teclado;Boleto;Sul;M;40,00;40,00;60,00;60,00;0,00;10,00;70,00;20,00;20,00;0,50;0,00;0,29;02/04/2024;False;0;abc",
    "4;8;App;Acessório;Cabo;Pix;Norte;M;2,00;4,00;5,00;10,00;1,00;0,00;9,00;3,00;-1,50;0,60;0,10;-0,17;30/04/2024;True;1;",
    // exact copy of order 3
    "3;7;Site;Periférico;Teclado;Boleto;Sul;M;40,00;40,00;60,00;60,00;0,00;10,00;70,00;20,00;20,00;0,50;0,00;0,29;02/04/2024;False;0;abc",
];

fn write_log(dir: &TempDir, rows: &[&str]) -> PathBuf {
    let path = dir.path().join("log.csv");
    let mut text = String::from(HEADER);
    for r in rows {
        text.push('\n');
        text.push_str(r);
    }
    text.push('\n');
    std::fs::write(&path, text).unwrap();
    path
}

fn load(rows: &[&str]) -> Result<RecordSet, SalesError> {
    let dir = TempDir::new().unwrap();
    let path = write_log(&dir, rows);
    let raw = load_sales_log(&path, &LoadOptions::default())?;
    normalize(raw, &MONETARY_FIELDS, &NormalizeOptions::default())
}

#[test]
fn full_pipeline() {
    let data = load(&ROWS).expect("fixture loads");
    assert_eq!(data.len(), 5);

    for field in MONETARY_FIELDS {
        for v in data.column(field).unwrap() {
            match v {
                Value::Number(n) => assert!(n.is_finite()),
                other => panic!("{field} not numeric: {other:?}"),
            }
        }
    }
    assert_eq!(data.get(0, fields::TOTAL_VALUE).unwrap(), &Value::Number(35.0));
    assert_eq!(data.get(0, fields::YEAR).unwrap(), &Value::Int(2024));
    assert_eq!(data.get(0, fields::MONTH).unwrap(), &Value::Int(3));
    assert_eq!(data.get(1, fields::DELIVERED).unwrap(), &Value::Bool(false));
    assert!(data.get(2, fields::RATING).unwrap().is_missing());

    let report = audit(&data);
    assert_eq!(report.duplicate_count, 1);
    assert_eq!(report.missing_fraction_by_field[0], (fields::RATING.to_string(), 0.6));
}

#[test]
fn two_channel_sums() {
    let data = load(&ROWS[..3]).unwrap();
    let table = aggregate_by(
        &data,
        &[fields::CHANNEL],
        &[MetricSpec::sum("valor_total", fields::TOTAL_VALUE)],
    )
    .unwrap();
    assert_eq!(table.len(), 2);
    let sums: Vec<(String, Option<f64>)> = table
        .groups
        .iter()
        .map(|g| (g.key[0].to_string(), g.metrics[0]))
        .collect();
    assert_eq!(
        sums,
        vec![("Loja".to_string(), Some(35.0)), ("Site".to_string(), Some(740.0))]
    );
}

#[test]
fn ranking_and_reports() {
    let data = load(&ROWS).unwrap();

    let top = top_n_by(
        &data,
        fields::CUSTOMER_ID,
        fields::TOTAL_PROFIT,
        Reduction::Sum,
        10,
        Order::Descending,
    )
    .unwrap();
    assert_eq!(top.len(), 3);
    assert_eq!(top[0], (Value::Int(1513), Some(160.0)));
    assert_eq!(top[2], (Value::Int(8), Some(-1.5)));

    let channels = reports::channel_summary(&data).unwrap();
    assert_eq!(channels[0].channel, "Site");
    assert_eq!(channels[0].total_value, "810.00");
    assert_eq!(channels[0].orders, 3);

    let months = reports::monthly_profit(&data).unwrap();
    assert_eq!(months.len(), 2);
    assert_eq!(months[1].period, "2024-4");
    assert_eq!(months[1].total_profit, "38.50");

    let profile = reports::customer_profile(&data, 1513).unwrap().unwrap();
    assert_eq!(profile.orders, 2);
    assert_eq!(profile.mean_rating, Some(4.75));
}

#[test]
fn renormalizing_changes_nothing() {
    let data = load(&ROWS).unwrap();
    let again = normalize(data.clone(), &MONETARY_FIELDS, &NormalizeOptions::default()).unwrap();
    assert_eq!(data, again);
}

#[test]
fn malformed_value_aborts_load() {
    let bad = ROWS[0].replace(";35,00;", ";abc;");
    let err = load(&[bad.as_str()]).unwrap_err();
    assert!(matches!(
        err,
        SalesError::Parse { ref field, row: 1, .. } if field == fields::TOTAL_VALUE
    ));
}

#[test]
fn malformed_date_aborts_load() {
    let bad = ROWS[0].replace("15/03/2024", "2024-03-15");
    assert!(matches!(load(&[bad.as_str()]), Err(SalesError::Parse { .. })));
}

#[test]
fn empty_date_and_free_text_delivery_load() {
    let row = ROWS[0]
        .replace("15/03/2024", "")
        .replace(";True;", ";Entregue;");
    let data = load(&[row.as_str()]).unwrap();
    assert!(data.get(0, fields::YEAR).unwrap().is_missing());
    assert!(data.get(0, fields::MONTH).unwrap().is_missing());
    assert_eq!(data.get(0, fields::DELIVERED).unwrap(), &Value::Bool(true));
    assert!(reports::monthly_profit(&data).unwrap().is_empty());
}

#[test]
fn distribution_tables() {
    let data = load(&ROWS).unwrap();

    let regions = reports::value_by_region(&data).unwrap();
    let names: Vec<&str> = regions.iter().map(|r| r.group.as_str()).collect();
    assert_eq!(names, vec!["Norte", "Sudeste", "Sul"]);
    assert_eq!(regions[2].count, 3);
    assert_eq!(regions[2].p50, "70.00");

    let bins = reports::value_histogram(&data, reports::VALUE_HISTOGRAM_BINS).unwrap();
    assert_eq!(bins.len(), 30);
    assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
    assert_eq!(bins[29].count, 1);
}

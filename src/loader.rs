use crate::error::{Result, SalesError};
use crate::types::{RecordSet, Value};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Field delimiter of the input file.
    pub delimiter: u8,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self { delimiter: b';' }
    }
}

/// Load the sales log at `path` into a raw, un-normalized record set.
///
/// The file is held open only for the duration of the read.
pub fn load_sales_log(path: &Path, opts: &LoadOptions) -> Result<RecordSet> {
    let file = File::open(path).map_err(|source| SalesError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let set = read_sales_log(file, opts)?;
    info!(
        path = %path.display(),
        rows = set.len(),
        columns = set.columns().len(),
        "sales log loaded"
    );
    Ok(set)
}

/// Read a delimited sales log from any reader.
///
/// Every non-empty cell becomes [`Value::Text`]; empty cells become
/// [`Value::Missing`]. Rows whose width differs from the header fail.
pub fn read_sales_log<R: Read>(reader: R, opts: &LoadOptions) -> Result<RecordSet> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .has_headers(true)
        .flexible(false)
        .trim(Trim::All)
        .from_reader(reader);

    let columns: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    debug!(?columns, "header read");

    let mut set = RecordSet::new(columns);
    for result in rdr.records() {
        let record = result?;
        let row = record
            .iter()
            .map(|cell| {
                if cell.is_empty() {
                    Value::Missing
                } else {
                    Value::Text(cell.to_string())
                }
            })
            .collect();
        set.push(row);
    }
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_semicolon_file_with_missing_cells() {
        let data = "id_pedido;canal_venda;valor_total\n1;Loja;10,5\n2;;\n";
        let set = read_sales_log(data.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(set.columns(), ["id_pedido", "canal_venda", "valor_total"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(0, "valor_total").unwrap(), &Value::Text("10,5".into()));
        assert!(set.get(1, "canal_venda").unwrap().is_missing());
    }

    #[test]
    fn strips_byte_order_mark() {
        let data = "\u{feff}id_pedido;x\n1;a\n";
        let set = read_sales_log(data.as_bytes(), &LoadOptions::default()).unwrap();
        assert_eq!(set.columns()[0], "id_pedido");
    }

    #[test]
    fn ragged_row_fails() {
        let data = "a;b\n1;2;3\n";
        let err = read_sales_log(data.as_bytes(), &LoadOptions::default()).unwrap_err();
        assert!(matches!(err, SalesError::Csv(_)));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_sales_log(Path::new("does/not/exist.csv"), &LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, SalesError::FileRead { .. }));
        assert!(err.to_string().contains("exist.csv"));
    }
}

use crate::error::{PluginError, PluginResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// One result row: column/metric name mapped to a scalar value, in column order.
pub type Row = Map<String, Value>;

/// A single result set as returned by the query backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub data: Vec<Row>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rowcount: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl QueryResult {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            rowcount: Some(rows.len()),
            data: rows,
            query: None,
        }
    }

    /// Create a QueryResult from JSON: either a bare array of row objects or a
    /// full result object with a `data` array.
    pub fn from_json(value: &Value) -> PluginResult<Self> {
        match value {
            Value::Array(items) => {
                let mut rows = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    let obj = item.as_object().ok_or_else(|| {
                        PluginError::InvalidData(format!("row {} is not an object", idx + 1))
                    })?;
                    rows.push(obj.clone());
                }
                Ok(Self::from_rows(rows))
            }
            Value::Object(_) => Ok(serde_json::from_value(value.clone())?),
            _ => Err(PluginError::InvalidData(
                "query result must be an array of rows or an object with `data`".to_string(),
            )),
        }
    }

    /// Read rows from CSV with a header line. Cells that parse as finite
    /// numbers become JSON numbers, empty cells become null.
    pub fn from_csv<R: Read>(reader: R) -> PluginResult<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let mut row = Row::new();
            for (header, cell) in headers.iter().zip(record.iter()) {
                row.insert(header.clone(), parse_cell(cell));
            }
            rows.push(row);
        }

        debug!(columns = headers.len(), rows = rows.len(), "loaded rows from CSV");
        Ok(Self::from_rows(rows))
    }

    /// Load rows from a file: CSV when the extension says so, JSON (a bare
    /// row array or a result object) otherwise.
    pub fn from_path(path: &Path) -> PluginResult<Self> {
        let file = File::open(path)?;
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if is_csv {
            Self::from_csv(file)
        } else {
            let value: Value = serde_json::from_reader(BufReader::new(file))?;
            Self::from_json(&value)
        }
    }
}

fn parse_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Number(int.into());
    }
    match trimmed.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(num) => Value::Number(num),
        None => Value::String(cell.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_bare_array() {
        let result = QueryResult::from_json(&json!([
            {"col1": "a", "count": 3},
            {"col1": "b", "count": 12}
        ]))
        .unwrap();
        assert_eq!(result.data.len(), 2);
        assert_eq!(result.rowcount, Some(2));
        assert_eq!(result.data[1]["count"], json!(12));
    }

    #[test]
    fn test_from_json_result_object() {
        let result = QueryResult::from_json(&json!({
            "data": [{"col1": "a"}],
            "rowcount": 1,
            "query": "SELECT col1 FROM t"
        }))
        .unwrap();
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.query.as_deref(), Some("SELECT col1 FROM t"));
    }

    #[test]
    fn test_from_json_rejects_scalar_rows() {
        let err = QueryResult::from_json(&json!([{"a": 1}, 5])).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_from_json_empty_array_is_allowed() {
        let result = QueryResult::from_json(&json!([])).unwrap();
        assert!(result.data.is_empty());
    }

    #[test]
    fn test_row_keeps_column_order() {
        let result = QueryResult::from_json(&json!([{"zeta": 1, "alpha": 2}])).unwrap();
        let keys: Vec<&str> = result.data[0].keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_from_csv_types_cells() {
        let csv = "region,count,share,note\nnorth,3,0.5,\nsouth,12,1.25,late\n";
        let result = QueryResult::from_csv(csv.as_bytes()).unwrap();
        assert_eq!(result.data.len(), 2);
        assert_eq!(result.data[0]["region"], json!("north"));
        assert_eq!(result.data[0]["count"], json!(3));
        assert_eq!(result.data[1]["share"], json!(1.25));
        assert_eq!(result.data[0]["note"], Value::Null);
        assert_eq!(result.data[1]["note"], json!("late"));
    }

    #[test]
    fn test_from_csv_header_only() {
        let result = QueryResult::from_csv("region,count\n".as_bytes()).unwrap();
        assert!(result.data.is_empty());
        assert_eq!(result.rowcount, Some(0));
    }

    #[test]
    fn test_from_path_picks_format_by_extension() {
        let csv = QueryResult::from_path(Path::new("test/sales.csv")).unwrap();
        assert_eq!(csv.data.len(), 3);
        assert_eq!(csv.data[2]["count"], json!(40));

        let rows = QueryResult::from_path(Path::new("test/rows.json")).unwrap();
        assert_eq!(rows.data.len(), 2);
        assert_eq!(rows.data[0]["col1"], json!("a"));
    }

    #[test]
    fn test_from_path_reports_missing_file() {
        let err = QueryResult::from_path(Path::new("test/no_such_rows.json")).unwrap_err();
        assert!(matches!(err, PluginError::Io(_)));
    }

    #[test]
    fn test_parse_cell_keeps_non_finite_as_text() {
        assert_eq!(parse_cell("NaN"), json!("NaN"));
        assert_eq!(parse_cell("inf"), json!("inf"));
    }
}

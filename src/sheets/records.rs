use std::collections::HashSet;

use error_stack::report;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::error::SheetsError;

/// One row, keyed by the header row. Field order follows the columns.
pub type Record = IndexMap<String, CellValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    pub fn blank() -> Self {
        CellValue::Text(String::new())
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Interprets a rendered cell the way a spreadsheet user reads it: integers first, then
    /// finite floats, otherwise the text as-is.
    pub fn numericise(raw: &str) -> Self {
        if raw.contains('_') {
            return CellValue::Text(raw.to_string());
        }

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return CellValue::Text(raw.to_string());
        }

        if let Ok(integer) = trimmed.parse::<i64>() {
            return CellValue::Integer(integer);
        }

        match trimmed.parse::<f64>() {
            Ok(float) if float.is_finite() => CellValue::Float(float),
            _ => CellValue::Text(raw.to_string()),
        }
    }
}

impl From<&Value> for CellValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(text) => CellValue::numericise(text),
            Value::Number(number) => match number.as_i64() {
                Some(integer) => CellValue::Integer(integer),
                None => number
                    .as_f64()
                    .map(CellValue::Float)
                    .unwrap_or_else(|| CellValue::Text(number.to_string())),
            },
            Value::Bool(flag) => CellValue::Text(bool_text(*flag).to_string()),
            Value::Null => CellValue::blank(),
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Integer(integer) => write!(f, "{}", integer),
            CellValue::Float(float) => write!(f, "{}", float),
            CellValue::Text(text) => write!(f, "{}", text),
        }
    }
}

fn bool_text(flag: bool) -> &'static str {
    if flag {
        "TRUE"
    } else {
        "FALSE"
    }
}

fn header_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => bool_text(*flag).to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub trait IntoRecords {
    fn into_records(self) -> error_stack::Result<Vec<Record>, SheetsError>;
}

/// The first row names the fields, every following row becomes one record.
///
/// Short rows are padded with blanks, cells past the last header are dropped. A header row that
/// repeats a name is rejected, since one of the columns could not be represented.
impl IntoRecords for Vec<Vec<Value>> {
    fn into_records(self) -> error_stack::Result<Vec<Record>, SheetsError> {
        let mut rows = self.into_iter();
        let Some(header_row) = rows.next() else {
            return Ok(Vec::new());
        };
        let headers = header_row.iter().map(header_text).collect::<Vec<_>>();

        let mut seen = HashSet::new();
        if let Some(duplicate) = headers.iter().find(|header| !seen.insert(*header)) {
            return Err(report!(SheetsError::NonUniqueHeader(duplicate.clone()))
                .attach_printable(format!("Header row: {:?}", headers)));
        }

        Ok(rows
            .map(|row| {
                let mut cells = row.iter();
                headers
                    .iter()
                    .map(|header| {
                        let cell = cells
                            .next()
                            .map(CellValue::from)
                            .unwrap_or_else(CellValue::blank);
                        (header.clone(), cell)
                    })
                    .collect::<Record>()
            })
            .collect())
    }
}

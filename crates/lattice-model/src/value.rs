use serde::{Deserialize, Serialize};
use std::fmt;

/// JSON-friendly representation of a single table cell.
///
/// Tile bodies arrive as arbitrary JSON; cell values are carried through
/// verbatim and never validated. Shapes the common variants don't cover
/// (nested arrays, objects) are preserved in [`CellValue::Other`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// JSON `null` (an empty cell).
    Null,
    /// JSON boolean.
    Boolean(bool),
    /// JSON number. Timestamps and integers are served as doubles.
    Number(f64),
    /// JSON string.
    String(String),
    /// Any other JSON shape, passed through untouched.
    Other(serde_json::Value),
}

impl Default for CellValue {
    fn default() -> Self {
        CellValue::Null
    }
}

impl CellValue {
    /// Returns true if the value is [`CellValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => Ok(()),
            CellValue::Boolean(b) => write!(f, "{b}"),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::String(s) => f.write_str(s),
            CellValue::Other(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_plain_json_scalars() {
        let row: Vec<CellValue> = serde_json::from_str(r#"[null, true, 3.5, "x"]"#).expect("parse");
        assert_eq!(
            row,
            vec![
                CellValue::Null,
                CellValue::Boolean(true),
                CellValue::Number(3.5),
                CellValue::String("x".to_string()),
            ]
        );
    }

    #[test]
    fn unexpected_shapes_pass_through() {
        let row: Vec<CellValue> = serde_json::from_str(r#"[{"a": 1}]"#).expect("parse");
        assert_eq!(
            row,
            vec![CellValue::Other(serde_json::json!({"a": 1}))]
        );
        assert_eq!(serde_json::to_string(&row).expect("serialize"), r#"[{"a":1}]"#);
    }
}

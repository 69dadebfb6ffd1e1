//! Name-indexed source rows.
//!
//! Shamela files disagree on column naming and casing (`id` vs `ID`,
//! `nass` vs `Nass`), and Access exports numeric cells either as numbers or
//! as strings depending on the column type of the originating table. Rows
//! are therefore modelled as insertion-ordered maps from column name to
//! JSON value with case-insensitive lookup and lenient coercion, so column
//! resolution can live in the discovery layer instead of at call sites.

use indexmap::IndexMap;
use serde_json::Value;

/// One record read from a source table, keyed by column name.
///
/// Column order matches the source table, which keeps "the first column"
/// well-defined for id-column fallback.
#[derive(Debug, Clone, Default)]
pub struct SourceRow {
    values: IndexMap<String, Value>,
}

impl SourceRow {
    /// Builds a row from a decoded JSON object.
    pub fn from_object(object: serde_json::Map<String, Value>) -> Self {
        Self { values: object.into_iter().collect() }
    }

    /// Builds a row from name/value pairs, preserving their order.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        Self { values: pairs.into_iter().collect() }
    }

    /// Column names in source order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    /// Number of columns in the row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row carries no columns at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Looks up a value by column name, exact match first, then
    /// ASCII-case-insensitive.
    pub fn get(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.values.get(name) {
            return Some(value);
        }
        self.values
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    }

    /// Reads a column as an integer, accepting JSON numbers and numeric
    /// strings.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Reads a column as text. Numbers are rendered; NULL yields `None`.
    pub fn get_string(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// The first column of the row, in source order.
    pub fn first(&self) -> Option<(&str, &Value)> {
        self.values.iter().next().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> SourceRow {
        SourceRow::from_pairs(vec![
            ("ID".to_string(), json!(7)),
            ("nass".to_string(), json!("  نص الصفحة ")),
            ("page".to_string(), json!("12")),
            ("part".to_string(), json!(null)),
        ])
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let row = row();
        assert_eq!(row.get_i64("id"), Some(7));
        assert_eq!(row.get_i64("Id"), Some(7));
        assert_eq!(row.get_i64("ID"), Some(7));
    }

    #[test]
    fn test_numeric_string_coercion() {
        let row = row();
        assert_eq!(row.get_i64("page"), Some(12));
        assert_eq!(row.get_string("ID").as_deref(), Some("7"));
    }

    #[test]
    fn test_null_is_absent() {
        let row = row();
        assert_eq!(row.get_i64("part"), None);
        assert_eq!(row.get_string("part"), None);
        assert_eq!(row.get_i64("missing"), None);
    }

    #[test]
    fn test_first_column_follows_source_order() {
        let row = row();
        let (name, _) = row.first().unwrap();
        assert_eq!(name, "ID");
    }

    #[test]
    fn test_string_values_are_trimmed() {
        let row = row();
        assert_eq!(row.get_string("nass").as_deref(), Some("نص الصفحة"));
    }
}

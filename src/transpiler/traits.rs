//! Transpiler traits and utilities.

/// Trait for dialect-specific SQL generation.
pub trait SqlGenerator: Send + Sync {
    /// Quote an identifier (column name).
    fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
    /// Generate the parameter placeholder (e.g., $1, :1) for a given 1-based index.
    fn placeholder(&self, index: usize) -> String;
    /// Get the boolean literal (true/false vs 1/0).
    fn bool_literal(&self, val: bool) -> String;
    /// Wrap an already quoted `YYYY-MM-DD HH:MM:SS` string in the dialect's date constructor.
    fn date_literal(&self, quoted: &str) -> String;
    /// Pagination suffix, including its leading space. Empty when neither is set.
    fn limit_offset(&self, take: Option<u64>, skip: Option<u64>) -> String;
    /// RETURNING suffix for the given quoted columns.
    /// `out_placeholders` holds one freshly allocated output placeholder per
    /// column when `returning_binds_out` is true, and is empty otherwise.
    fn returning(&self, columns: &[String], out_placeholders: &[String]) -> String;
    /// Flip a boolean column. NULL flips to true.
    fn toggle(&self, column: &str) -> String {
        format!(
            "CASE {} WHEN {} THEN {} ELSE {} END",
            column,
            self.bool_literal(true),
            self.bool_literal(false),
            self.bool_literal(true)
        )
    }
    /// Whether RETURNING values come back through output binds rather than rows.
    fn returning_binds_out(&self) -> bool {
        false
    }
}

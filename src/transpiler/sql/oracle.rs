use super::super::traits::SqlGenerator;

pub struct OracleGenerator;

impl SqlGenerator for OracleGenerator {
    fn placeholder(&self, index: usize) -> String {
        // Oracle uses :1, :2, etc. (1-based index)
        format!(":{}", index)
    }

    fn bool_literal(&self, val: bool) -> String {
        // No BOOLEAN type in Oracle SQL
        if val { "1".to_string() } else { "0".to_string() }
    }

    fn date_literal(&self, quoted: &str) -> String {
        format!("TO_DATE({}, 'YYYY-MM-DD HH24:MI:SS')", quoted)
    }

    fn limit_offset(&self, take: Option<u64>, skip: Option<u64>) -> String {
        // Oracle 12c+ row limiting clause
        match (take, skip) {
            (Some(take), Some(skip)) => {
                format!(" OFFSET {} ROWS FETCH NEXT {} ROWS ONLY", skip, take)
            }
            (Some(take), None) => format!(" FETCH FIRST {} ROWS ONLY", take),
            (None, Some(skip)) => format!(" OFFSET {} ROWS", skip),
            (None, None) => String::new(),
        }
    }

    fn returning(&self, columns: &[String], out_placeholders: &[String]) -> String {
        format!(
            " RETURNING {} INTO {}",
            columns.join(","),
            out_placeholders.join(",")
        )
    }

    fn returning_binds_out(&self) -> bool {
        true
    }
}

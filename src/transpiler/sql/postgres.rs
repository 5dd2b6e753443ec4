use super::super::traits::SqlGenerator;

pub struct PostgresGenerator;

impl SqlGenerator for PostgresGenerator {
    fn placeholder(&self, index: usize) -> String {
        format!("${}", index)
    }

    fn bool_literal(&self, val: bool) -> String {
        if val { "TRUE".to_string() } else { "FALSE".to_string() }
    }

    fn date_literal(&self, quoted: &str) -> String {
        format!("TIMESTAMP {}", quoted)
    }

    fn limit_offset(&self, take: Option<u64>, skip: Option<u64>) -> String {
        let mut sql = String::new();
        if let Some(take) = take {
            sql.push_str(&format!(" LIMIT {}", take));
        }
        if let Some(skip) = skip {
            sql.push_str(&format!(" OFFSET {}", skip));
        }
        sql
    }

    fn returning(&self, columns: &[String], _out_placeholders: &[String]) -> String {
        format!(" RETURNING {}", columns.join(","))
    }
}

//! Payload entries for INSERT and UPDATE.
//!
//! Each entry names a column, the operation applied to it and the value.
//! Payloads can also be read from the legacy sigil form, where a one
//! character key prefix selects the operation:
//!
//! | sigil | operation |
//! |-------|-----------|
//! | `+ - * /` | arithmetic delta |
//! | `>` `<` | clamp (GREATEST / LEAST) |
//! | `!` | boolean toggle |
//! | `=` | raw SQL, insert and update |
//! | `#` | raw SQL, update only |

use serde::{Deserialize, Deserializer};

use crate::ast::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOp {
    Set,
    Add,
    Subtract,
    Multiply,
    Divide,
    Greatest,
    Least,
    Toggle,
    /// Raw, unescaped SQL text. Trusted input.
    Raw,
    /// Raw, unescaped SQL text, emitted on update only.
    RawUpdate,
}

impl MutationOp {
    pub fn from_sigil(c: char) -> Option<Self> {
        Some(match c {
            '+' => MutationOp::Add,
            '-' => MutationOp::Subtract,
            '*' => MutationOp::Multiply,
            '/' => MutationOp::Divide,
            '>' => MutationOp::Greatest,
            '<' => MutationOp::Least,
            '!' => MutationOp::Toggle,
            '=' => MutationOp::Raw,
            '#' => MutationOp::RawUpdate,
            _ => return None,
        })
    }

    pub fn sigil(&self) -> Option<char> {
        Some(match self {
            MutationOp::Set => return None,
            MutationOp::Add => '+',
            MutationOp::Subtract => '-',
            MutationOp::Multiply => '*',
            MutationOp::Divide => '/',
            MutationOp::Greatest => '>',
            MutationOp::Least => '<',
            MutationOp::Toggle => '!',
            MutationOp::Raw => '=',
            MutationOp::RawUpdate => '#',
        })
    }

    /// Arithmetic operator for the delta operations.
    pub fn arithmetic(&self) -> Option<&'static str> {
        match self {
            MutationOp::Add => Some("+"),
            MutationOp::Subtract => Some("-"),
            MutationOp::Multiply => Some("*"),
            MutationOp::Divide => Some("/"),
            _ => None,
        }
    }
}

/// One payload entry. `value: None` means "undefined": the column is skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub column: String,
    pub op: MutationOp,
    pub value: Option<Value>,
}

impl Mutation {
    pub fn new(column: impl Into<String>, op: MutationOp, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op,
            value: Some(value.into()),
        }
    }

    /// Parse a sigil-prefixed key such as `+score` or `!active`.
    pub fn from_sigil_key(key: &str, value: Option<Value>) -> Self {
        let mut chars = key.chars();
        match chars.next().and_then(MutationOp::from_sigil) {
            Some(op) => Self {
                column: chars.as_str().to_string(),
                op,
                value,
            },
            None => Self {
                column: key.to_string(),
                op: MutationOp::Set,
                value,
            },
        }
    }
}

/// Ordered list of payload entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    pub entries: Vec<Mutation>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, mutation: Mutation) -> Self {
        self.entries.push(mutation);
        self
    }

    pub fn set(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Mutation::new(column, MutationOp::Set, value))
    }

    /// Set only when the value is present.
    pub fn set_opt(mut self, column: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        self.entries.push(Mutation {
            column: column.into(),
            op: MutationOp::Set,
            value: value.map(Into::into),
        });
        self
    }

    pub fn increment(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Mutation::new(column, MutationOp::Add, value))
    }

    pub fn decrement(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Mutation::new(column, MutationOp::Subtract, value))
    }

    pub fn greatest(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Mutation::new(column, MutationOp::Greatest, value))
    }

    pub fn least(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(Mutation::new(column, MutationOp::Least, value))
    }

    pub fn toggle(self, column: impl Into<String>) -> Self {
        self.push(Mutation::new(column, MutationOp::Toggle, Value::Null))
    }

    pub fn raw(self, column: impl Into<String>, sql: impl Into<String>) -> Self {
        self.push(Mutation::new(column, MutationOp::Raw, Value::String(sql.into())))
    }

    /// Build from sigil-keyed pairs, keeping their order.
    pub fn from_sigils<K: AsRef<str>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| Mutation::from_sigil_key(k.as_ref(), Some(v)))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|m| m.value.is_none())
    }
}

impl<'de> Deserialize<'de> for Payload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = serde_json::Map::<String, serde_json::Value>::deserialize(deserializer)?;
        Ok(Payload::from_sigils(map.into_iter().map(|(k, v)| (k, Value::from(v)))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigil_key_parsing() {
        let m = Mutation::from_sigil_key("+score", Some(Value::Int(5)));
        assert_eq!(m.column, "score");
        assert_eq!(m.op, MutationOp::Add);

        let m = Mutation::from_sigil_key("name", Some(Value::from("x")));
        assert_eq!(m.column, "name");
        assert_eq!(m.op, MutationOp::Set);
    }

    #[test]
    fn test_sigil_round_trip() {
        for c in ['+', '-', '*', '/', '>', '<', '!', '=', '#'] {
            let op = MutationOp::from_sigil(c).unwrap();
            assert_eq!(op.sigil(), Some(c));
        }
        assert_eq!(MutationOp::Set.sigil(), None);
    }

    #[test]
    fn test_payload_json_keeps_order() {
        let payload: Payload =
            serde_json::from_str(r#"{"name": "Ann", "+visits": 1, "!active": true}"#).unwrap();
        let cols: Vec<&str> = payload.entries.iter().map(|m| m.column.as_str()).collect();
        assert_eq!(cols, ["name", "visits", "active"]);
    }

    #[test]
    fn test_undefined_only_payload_is_empty() {
        let payload = Payload::new().set_opt("name", None::<String>);
        assert!(payload.is_empty());
    }
}

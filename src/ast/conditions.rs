use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::ast::Value;

/// Comparison operator of a `where` or date-part condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Comparer {
    #[default]
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<>", alias = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
}

impl Comparer {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparer::Eq => "=",
            Comparer::Ne => "<>",
            Comparer::Gt => ">",
            Comparer::Gte => ">=",
            Comparer::Lt => "<",
            Comparer::Lte => "<=",
        }
    }
}

/// Where the search value is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchAnchor {
    /// `value%`
    #[serde(alias = "beg")]
    Begin,
    /// `%value`
    End,
    /// `%value%`
    #[default]
    #[serde(alias = "*")]
    Contains,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatePart {
    Month,
    Year,
    Day,
    Hour,
    Minute,
}

impl DatePart {
    pub fn as_sql(&self) -> &'static str {
        match self {
            DatePart::Month => "MONTH",
            DatePart::Year => "YEAR",
            DatePart::Day => "DAY",
            DatePart::Hour => "HOUR",
            DatePart::Minute => "MINUTE",
        }
    }
}

/// One node of the WHERE expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Where {
        name: String,
        comparer: Comparer,
        value: Value,
    },
    In {
        name: String,
        values: Vec<Value>,
    },
    NotIn {
        name: String,
        values: Vec<Value>,
    },
    Between {
        name: String,
        a: Value,
        b: Value,
    },
    Search {
        name: String,
        value: String,
        anchor: SearchAnchor,
    },
    Empty {
        name: String,
    },
    Contains {
        name: String,
    },
    DatePart {
        part: DatePart,
        name: String,
        comparer: Comparer,
        value: Value,
    },
    /// ACL membership test with optional owner bypass.
    Permit {
        name: String,
        values: Vec<Value>,
        required: bool,
        userid: Option<Value>,
    },
    /// Raw SQL fragment, inserted verbatim inside parentheses.
    Query(String),
    /// Nested group joined with OR.
    Or(Vec<Condition>),
    /// Unrecognized kind. Ignored in lenient mode, rejected in strict mode.
    Unknown(String),
}

impl Condition {
    pub fn compare(name: impl Into<String>, comparer: Comparer, value: impl Into<Value>) -> Self {
        Condition::Where {
            name: name.into(),
            comparer,
            value: value.into(),
        }
    }

    pub fn eq(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(name, Comparer::Eq, value)
    }

    pub fn is_in<V: Into<Value>>(name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Condition::In {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn not_in<V: Into<Value>>(name: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Condition::NotIn {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn between(name: impl Into<String>, a: impl Into<Value>, b: impl Into<Value>) -> Self {
        Condition::Between {
            name: name.into(),
            a: a.into(),
            b: b.into(),
        }
    }

    pub fn search(name: impl Into<String>, value: impl Into<String>, anchor: SearchAnchor) -> Self {
        Condition::Search {
            name: name.into(),
            value: value.into(),
            anchor,
        }
    }

    pub fn empty(name: impl Into<String>) -> Self {
        Condition::Empty { name: name.into() }
    }

    pub fn contains(name: impl Into<String>) -> Self {
        Condition::Contains { name: name.into() }
    }

    pub fn date_part(
        part: DatePart,
        name: impl Into<String>,
        comparer: Comparer,
        value: impl Into<Value>,
    ) -> Self {
        Condition::DatePart {
            part,
            name: name.into(),
            comparer,
            value: value.into(),
        }
    }

    pub fn query(fragment: impl Into<String>) -> Self {
        Condition::Query(fragment.into())
    }

    pub fn or(children: Vec<Condition>) -> Self {
        Condition::Or(children)
    }
}

#[derive(Deserialize)]
struct WhereArgs {
    name: String,
    #[serde(default)]
    comparer: Comparer,
    #[serde(default)]
    value: Option<Value>,
}

#[derive(Deserialize)]
struct SetArgs {
    name: String,
    #[serde(deserialize_with = "one_or_many")]
    value: Vec<Value>,
}

#[derive(Deserialize)]
struct BetweenArgs {
    name: String,
    a: Value,
    b: Value,
}

#[derive(Deserialize)]
struct SearchArgs {
    name: String,
    value: Value,
    #[serde(default, alias = "compare")]
    anchor: SearchAnchor,
}

#[derive(Deserialize)]
struct NameArgs {
    name: String,
}

#[derive(Deserialize)]
struct PermitArgs {
    name: String,
    #[serde(deserialize_with = "one_or_many")]
    value: Vec<Value>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    userid: Option<Value>,
}

#[derive(Deserialize)]
struct QueryArgs {
    value: String,
}

#[derive(Deserialize)]
struct OrArgs {
    value: Vec<Condition>,
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Value>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(arr) => arr,
        v => vec![v],
    })
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut raw = serde_json::Map::deserialize(deserializer)?;
        let kind = match raw.remove("type") {
            Some(serde_json::Value::String(s)) => s,
            _ => return Err(D::Error::missing_field("type")),
        };
        let raw = serde_json::Value::Object(raw);

        fn args<T: serde::de::DeserializeOwned>(raw: serde_json::Value) -> serde_json::Result<T> {
            serde_json::from_value(raw)
        }

        let cond = match kind.as_str() {
            "where" => {
                let a: WhereArgs = args(raw).map_err(D::Error::custom)?;
                Condition::Where {
                    name: a.name,
                    comparer: a.comparer,
                    value: a.value.unwrap_or(Value::Null),
                }
            }
            "in" | "notin" => {
                let a: SetArgs = args(raw).map_err(D::Error::custom)?;
                if kind == "in" {
                    Condition::In { name: a.name, values: a.value }
                } else {
                    Condition::NotIn { name: a.name, values: a.value }
                }
            }
            "between" => {
                let a: BetweenArgs = args(raw).map_err(D::Error::custom)?;
                Condition::Between { name: a.name, a: a.a, b: a.b }
            }
            "search" => {
                let a: SearchArgs = args(raw).map_err(D::Error::custom)?;
                Condition::Search {
                    name: a.name,
                    value: a.value.to_raw_text(),
                    anchor: a.anchor,
                }
            }
            "empty" => Condition::Empty { name: args::<NameArgs>(raw).map_err(D::Error::custom)?.name },
            "contains" => Condition::Contains { name: args::<NameArgs>(raw).map_err(D::Error::custom)?.name },
            "month" | "year" | "day" | "hour" | "minute" => {
                let part: DatePart = serde_json::from_value(serde_json::Value::String(kind.clone()))
                    .map_err(D::Error::custom)?;
                let a: WhereArgs = args(raw).map_err(D::Error::custom)?;
                Condition::DatePart {
                    part,
                    name: a.name,
                    comparer: a.comparer,
                    value: a.value.unwrap_or(Value::Null),
                }
            }
            "permit" => {
                let a: PermitArgs = args(raw).map_err(D::Error::custom)?;
                Condition::Permit {
                    name: a.name,
                    values: a.value,
                    required: a.required,
                    userid: a.userid,
                }
            }
            "query" => Condition::Query(args::<QueryArgs>(raw).map_err(D::Error::custom)?.value),
            "or" => Condition::Or(args::<OrArgs>(raw).map_err(D::Error::custom)?.value),
            _ => Condition::Unknown(kind),
        };
        Ok(cond)
    }
}

use serde::Deserialize;
use serde_json::{Map, Value};

/// Body accepted by the relay endpoint.
///
/// `action` and `table` stay optional here so a request that omits them
/// reaches validation and gets a client error instead of a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelayRequest {
    pub action: Option<String>,
    pub table: Option<String>,
    pub values: Option<Value>,
    #[serde(rename = "where")]
    pub filter: Option<Map<String, Value>>,
    pub order: Option<OrderSpec>,
    pub bulk: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderSpec {
    pub column: Option<String>,
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Select,
    Insert,
    Update,
    Delete,
}

impl Action {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "select" => Some(Self::Select),
            "insert" => Some(Self::Insert),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Select => "select",
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    /// Anything other than a case-insensitive "desc" sorts ascending.
    pub fn normalize(dir: Option<&str>) -> Self {
        match dir {
            Some(d) if d.eq_ignore_ascii_case("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

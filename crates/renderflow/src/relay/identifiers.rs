use std::collections::HashSet;

use crate::relay::error::{RelayError, RelayResult};

/// Postgres truncates identifiers beyond this many bytes.
const MAX_IDENTIFIER_LEN: usize = 63;

/// Decides which table and column names may be interpolated into SQL text.
///
/// Every name must be a plain identifier (`[A-Za-z_][A-Za-z0-9_]*`). When an
/// allow-list is configured the table must also appear in it.
#[derive(Clone, Debug, Default)]
pub struct IdentifierPolicy {
    allowed_tables: Option<HashSet<String>>,
}

impl IdentifierPolicy {
    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn with_allowed_tables<I, S>(tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_tables: Some(
                tables
                    .into_iter()
                    .map(|t| t.into().to_ascii_lowercase())
                    .collect(),
            ),
        }
    }

    pub fn from_config(allowed: Option<&[String]>) -> Self {
        match allowed {
            Some(tables) => Self::with_allowed_tables(tables.iter().cloned()),
            None => Self::permissive(),
        }
    }

    /// Validated, double-quoted table name.
    ///
    /// Table names are folded to lower case first, the way Postgres reads an
    /// unquoted name, so `Videos` still means `videos`. Column names keep
    /// their case.
    pub fn table(&self, name: &str) -> RelayResult<String> {
        if !is_safe_identifier(name) {
            return Err(RelayError::InvalidIdentifier(name.to_string()));
        }
        let folded = name.to_ascii_lowercase();
        if let Some(allowed) = &self.allowed_tables {
            if !allowed.contains(&folded) {
                return Err(RelayError::TableNotAllowed(name.to_string()));
            }
        }
        Ok(quote(&folded))
    }

    /// Validated, double-quoted column name.
    pub fn column(&self, name: &str) -> RelayResult<String> {
        if !is_safe_identifier(name) {
            return Err(RelayError::InvalidIdentifier(name.to_string()));
        }
        Ok(quote(name))
    }
}

pub fn is_safe_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= MAX_IDENTIFIER_LEN
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn quote(name: &str) -> String {
    format!("\"{name}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_injection_shaped_names() {
        for bad in [
            "",
            "videos; DROP TABLE videos",
            "a\"b",
            "1abc",
            "public.videos",
            "name'--",
            "spaced name",
        ] {
            assert!(!is_safe_identifier(bad), "{bad:?} should be rejected");
        }
        assert!(is_safe_identifier("render_id"));
        assert!(is_safe_identifier("_x1"));
        assert!(!is_safe_identifier(&"a".repeat(64)));
    }

    #[test]
    fn allow_list_limits_tables_but_not_columns() {
        let policy = IdentifierPolicy::with_allowed_tables(["videos"]);
        assert_eq!(policy.table("videos").unwrap(), "\"videos\"");
        assert!(matches!(
            policy.table("integrations"),
            Err(RelayError::TableNotAllowed(_))
        ));
        assert_eq!(policy.column("api_key").unwrap(), "\"api_key\"");
    }

    #[test]
    fn table_names_fold_like_unquoted_postgres_names() {
        let policy = IdentifierPolicy::permissive();
        assert_eq!(policy.table("Videos").unwrap(), "\"videos\"");
        assert_eq!(policy.table("VIDEOS").unwrap(), "\"videos\"");
        assert_eq!(policy.column("fileUrl").unwrap(), "\"fileUrl\"");

        let listed = IdentifierPolicy::with_allowed_tables(["Videos"]);
        assert_eq!(listed.table("videos").unwrap(), "\"videos\"");
        assert_eq!(listed.table("VIDEOS").unwrap(), "\"videos\"");
    }
}

//! Generic table access over a single endpoint.
//!
//! A [`RelayRequest`] names an action, a table and equality filters; the relay
//! turns it into exactly one parameterized statement and runs it on one pooled
//! connection. There is no schema knowledge and no transaction beyond that one
//! statement.

pub mod error;
pub mod identifiers;
pub mod request;
pub mod sql;

pub use error::{RelayError, RelayResult};
pub use identifiers::IdentifierPolicy;
pub use request::{Action, OrderSpec, RelayRequest};
pub use sql::{build_statement, Returning, Statement};

use std::sync::Arc;

use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    Rows(Vec<Value>),
    /// `None` when an update matched nothing.
    Row(Option<Value>),
    Deleted,
}

#[derive(Clone)]
pub struct QueryRelay {
    pool: PgPool,
    policy: Arc<IdentifierPolicy>,
}

impl QueryRelay {
    pub fn new(pool: PgPool, policy: IdentifierPolicy) -> Self {
        Self {
            pool,
            policy: Arc::new(policy),
        }
    }

    pub async fn execute(&self, req: &RelayRequest) -> RelayResult<RelayOutcome> {
        let stmt = build_statement(req, &self.policy)?;
        debug!(
            action = stmt.action.as_str(),
            params = stmt.params.len(),
            sql = %stmt.sql,
            "relay statement"
        );

        // released back to the pool on drop, success or not
        let mut conn = self.pool.acquire().await?;

        match stmt.returning {
            Returning::Nothing => {
                let mut query = sqlx::query(&stmt.sql);
                for param in &stmt.params {
                    query = query.bind(param);
                }
                query.execute(&mut *conn).await?;
                Ok(RelayOutcome::Deleted)
            }
            Returning::All | Returning::First => {
                let sql = stmt.json_rows_sql();
                let mut query = sqlx::query_scalar::<_, Value>(&sql);
                for param in &stmt.params {
                    query = query.bind(param);
                }
                let rows = query.fetch_all(&mut *conn).await?;

                if stmt.returning == Returning::First {
                    Ok(RelayOutcome::Row(rows.into_iter().next()))
                } else {
                    Ok(RelayOutcome::Rows(rows))
                }
            }
        }
    }
}

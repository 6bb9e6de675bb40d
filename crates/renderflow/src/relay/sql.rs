// Statement building for the query relay.
//
// Values never appear in SQL text. Each one is bound as a jsonb parameter and
// converted to the target column's type by Postgres itself through
// jsonb_populate_record over the table's row type, so the relay works against
// any table without knowing its schema.

use serde_json::{Map, Value};

use crate::relay::error::{RelayError, RelayResult};
use crate::relay::identifiers::IdentifierPolicy;
use crate::relay::request::{Action, RelayRequest, SortDir};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returning {
    /// Every produced row.
    All,
    /// The first produced row, or null when nothing matched.
    First,
    /// No rows; success only.
    Nothing,
}

#[derive(Debug, Clone)]
pub struct Statement {
    pub action: Action,
    pub sql: String,
    pub params: Vec<Value>,
    pub returning: Returning,
    order_by: Option<String>,
}

impl Statement {
    /// The statement wrapped so each result row comes back as one JSON object.
    pub fn json_rows_sql(&self) -> String {
        let mut sql = format!(
            "WITH relay_rows AS ({}) SELECT to_jsonb(relay_rows) AS relay_row FROM relay_rows",
            self.sql
        );
        if let Some(order_by) = &self.order_by {
            sql.push_str(" ORDER BY ");
            sql.push_str(order_by);
        }
        sql
    }
}

struct Params<'a> {
    table: &'a str,
    values: Vec<Value>,
}

impl<'a> Params<'a> {
    fn new(table: &'a str) -> Self {
        Self {
            table,
            values: Vec::new(),
        }
    }

    /// Pushes `value` and returns an expression yielding it typed as `column`.
    /// `column` must already be validated; `quoted` is its quoted form.
    fn bind(&mut self, column: &str, quoted: &str, value: Value) -> String {
        self.values.push(value);
        format!(
            "(jsonb_populate_record(NULL::{}, jsonb_build_object('{}', ${}::jsonb))).{}",
            self.table,
            column,
            self.values.len(),
            quoted
        )
    }
}

pub fn build_statement(req: &RelayRequest, policy: &IdentifierPolicy) -> RelayResult<Statement> {
    let table = req
        .table
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or(RelayError::MissingTable)?;

    let action = req
        .action
        .as_deref()
        .and_then(Action::parse)
        .ok_or(RelayError::UnknownAction)?;

    let table = policy.table(table)?;

    match action {
        Action::Select => build_select(&table, req, policy),
        Action::Insert => build_insert(&table, req, policy),
        Action::Update => build_update(&table, req, policy),
        Action::Delete => build_delete(&table, req, policy),
    }
}

fn build_select(
    table: &str,
    req: &RelayRequest,
    policy: &IdentifierPolicy,
) -> RelayResult<Statement> {
    let mut params = Params::new(table);
    let mut sql = format!("SELECT * FROM {table}");

    if let Some(filter) = &req.filter {
        let clause = equality_clause(filter, policy, &mut params)?;
        if !clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clause);
        }
    }

    let mut order_by = None;
    if let Some(order) = &req.order {
        if let Some(column) = order.column.as_deref().filter(|c| !c.is_empty()) {
            let dir = SortDir::normalize(order.dir.as_deref());
            let clause = format!("{} {}", policy.column(column)?, dir.as_sql());
            sql.push_str(" ORDER BY ");
            sql.push_str(&clause);
            order_by = Some(clause);
        }
    }

    Ok(Statement {
        action: Action::Select,
        sql,
        params: params.values,
        returning: Returning::All,
        order_by,
    })
}

fn build_insert(
    table: &str,
    req: &RelayRequest,
    policy: &IdentifierPolicy,
) -> RelayResult<Statement> {
    let values = req.values.as_ref().ok_or(RelayError::MissingValues)?;
    let bulk = req.bulk.unwrap_or(false);

    match values {
        Value::Array(rows) if bulk => build_bulk_insert(table, rows, policy),
        Value::Object(row) => {
            let mut params = Params::new(table);
            let sql = if row.is_empty() {
                format!("INSERT INTO {table} DEFAULT VALUES RETURNING *")
            } else {
                let (columns, exprs) = bind_row(row, row.keys(), policy, &mut params)?;
                format!("INSERT INTO {table} ({columns}) VALUES ({exprs}) RETURNING *")
            };
            Ok(Statement {
                action: Action::Insert,
                sql,
                params: params.values,
                returning: Returning::First,
                order_by: None,
            })
        }
        Value::Array(_) => Err(RelayError::InvalidValues(
            "a list of rows requires bulk: true".into(),
        )),
        _ => Err(RelayError::InvalidValues("values must be an object".into())),
    }
}

fn build_bulk_insert(
    table: &str,
    rows: &[Value],
    policy: &IdentifierPolicy,
) -> RelayResult<Statement> {
    let mut objects = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        match row {
            Value::Object(map) => objects.push(map),
            _ => {
                return Err(RelayError::InvalidValues(format!(
                    "row {i} is not an object"
                )))
            }
        }
    }

    let first = objects.first().ok_or(RelayError::MissingValues)?;
    if first.is_empty() {
        return Err(RelayError::InvalidValues(
            "bulk rows need at least one column".into(),
        ));
    }
    let columns: Vec<&String> = first.keys().collect();

    // every row must stay within the first row's column set; gaps bind null
    for (i, row) in objects.iter().enumerate().skip(1) {
        if let Some(extra) = row.keys().find(|k| !first.contains_key(k.as_str())) {
            return Err(RelayError::InvalidValues(format!(
                "row {i} has column {extra:?} not present in the first row"
            )));
        }
    }

    let mut params = Params::new(table);
    let mut column_list = String::new();
    let mut tuples = Vec::with_capacity(objects.len());
    for row in &objects {
        let (cols, exprs) = bind_row(row, columns.iter().copied(), policy, &mut params)?;
        column_list = cols;
        tuples.push(format!("({exprs})"));
    }

    Ok(Statement {
        action: Action::Insert,
        sql: format!(
            "INSERT INTO {table} ({column_list}) VALUES {} RETURNING *",
            tuples.join(", ")
        ),
        params: params.values,
        returning: Returning::All,
        order_by: None,
    })
}

fn build_update(
    table: &str,
    req: &RelayRequest,
    policy: &IdentifierPolicy,
) -> RelayResult<Statement> {
    let values = req.values.as_ref().ok_or(RelayError::MissingValuesOrWhere)?;
    let filter = req
        .filter
        .as_ref()
        .filter(|f| !f.is_empty())
        .ok_or(RelayError::MissingValuesOrWhere)?;

    let Value::Object(values) = values else {
        return Err(RelayError::InvalidValues("values must be an object".into()));
    };
    if values.is_empty() {
        return Err(RelayError::MissingValuesOrWhere);
    }

    let mut params = Params::new(table);
    let mut assignments = Vec::with_capacity(values.len());
    for (column, value) in values {
        let quoted = policy.column(column)?;
        let expr = params.bind(column, &quoted, value.clone());
        assignments.push(format!("{quoted} = {expr}"));
    }
    let clause = equality_clause(filter, policy, &mut params)?;

    Ok(Statement {
        action: Action::Update,
        sql: format!(
            "UPDATE {table} SET {} WHERE {clause} RETURNING *",
            assignments.join(", ")
        ),
        params: params.values,
        returning: Returning::First,
        order_by: None,
    })
}

fn build_delete(
    table: &str,
    req: &RelayRequest,
    policy: &IdentifierPolicy,
) -> RelayResult<Statement> {
    let filter = req
        .filter
        .as_ref()
        .filter(|f| !f.is_empty())
        .ok_or(RelayError::MissingWhere)?;

    let mut params = Params::new(table);
    let clause = equality_clause(filter, policy, &mut params)?;

    Ok(Statement {
        action: Action::Delete,
        sql: format!("DELETE FROM {table} WHERE {clause}"),
        params: params.values,
        returning: Returning::Nothing,
        order_by: None,
    })
}

fn equality_clause(
    filter: &Map<String, Value>,
    policy: &IdentifierPolicy,
    params: &mut Params<'_>,
) -> RelayResult<String> {
    let mut terms = Vec::with_capacity(filter.len());
    for (column, value) in filter {
        let quoted = policy.column(column)?;
        let expr = params.bind(column, &quoted, value.clone());
        terms.push(format!("{quoted} = {expr}"));
    }
    Ok(terms.join(" AND "))
}

/// Binds `row`'s value for each of `columns` (null when absent).
/// Returns the quoted column list and the matching value expressions.
fn bind_row<'c>(
    row: &Map<String, Value>,
    columns: impl Iterator<Item = &'c String>,
    policy: &IdentifierPolicy,
    params: &mut Params<'_>,
) -> RelayResult<(String, String)> {
    let mut names = Vec::new();
    let mut exprs = Vec::new();
    for column in columns {
        let quoted = policy.column(column)?;
        let value = row.get(column).cloned().unwrap_or(Value::Null);
        exprs.push(params.bind(column, &quoted, value));
        names.push(quoted);
    }
    Ok((names.join(", "), exprs.join(", ")))
}

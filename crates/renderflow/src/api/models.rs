use serde::Serialize;
use serde_json::Value;

use crate::relay::RelayOutcome;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RelayResponse {
    Data { data: Value },
    Ok { ok: bool },
}

impl From<RelayOutcome> for RelayResponse {
    fn from(outcome: RelayOutcome) -> Self {
        match outcome {
            RelayOutcome::Rows(rows) => RelayResponse::Data {
                data: Value::Array(rows),
            },
            RelayOutcome::Row(row) => RelayResponse::Data {
                data: row.unwrap_or(Value::Null),
            },
            RelayOutcome::Deleted => RelayResponse::Ok { ok: true },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WorkerResponse {
    pub ok: bool,
    pub processed: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

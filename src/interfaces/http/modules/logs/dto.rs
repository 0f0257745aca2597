use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LogsResponse {
    pub logs: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ClearedLogs {
    pub message: String,
}

use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::roster::StudentRecord;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// One validated sheet load. Replaced wholesale on every load; dropped
/// on disconnect. Never persisted.
pub struct RosterState {
    pub load_id: String,
    pub sheet_name: String,
    pub loaded_at: String,
    pub records: Vec<StudentRecord>,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub roster: Option<RosterState>,
}

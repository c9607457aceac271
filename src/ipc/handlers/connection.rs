use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use rusqlite::Connection;
use serde_json::json;

pub const SHEET_ID_KEY: &str = "connection.sheet_id";
pub const SHEET_NAME_KEY: &str = "connection.sheet_name";

fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

fn stored_string(conn: &Connection, key: &str) -> Option<String> {
    db::settings_get_json(conn, key)
        .ok()
        .flatten()
        .and_then(|v| v.as_str().map(|s| s.to_string()))
}

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    ok(
        &req.id,
        json!({
            "sheetId": stored_string(conn, SHEET_ID_KEY),
            "sheetName": stored_string(conn, SHEET_NAME_KEY),
        }),
    )
}

fn handle_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let sheet_id = req
        .params
        .get("sheetId")
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string());
    let Some(sheet_id) = sheet_id.filter(|s| !s.is_empty()) else {
        return err(&req.id, "bad_params", "missing sheetId", None);
    };

    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    if let Err(e) = db::settings_set_json(conn, SHEET_ID_KEY, &json!(sheet_id)) {
        return err(&req.id, "db_write_failed", format!("{e:?}"), None);
    }
    tracing::info!("connection id stored");
    ok(&req.id, json!({ "sheetId": sheet_id }))
}

fn handle_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    {
        let conn = match db_conn(state, req) {
            Ok(c) => c,
            Err(e) => return e,
        };
        if let Err(e) = db::settings_delete(conn, SHEET_ID_KEY)
            .and_then(|_| db::settings_delete(conn, SHEET_NAME_KEY))
        {
            return err(&req.id, "db_write_failed", format!("{e:?}"), None);
        }
    }
    // Disconnecting also discards the in-memory roster.
    state.roster = None;
    tracing::info!("connection cleared");
    ok(&req.id, json!({ "cleared": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "connection.get" => Some(handle_get(state, req)),
        "connection.set" => Some(handle_set(state, req)),
        "connection.clear" => Some(handle_clear(state, req)),
        _ => None,
    }
}

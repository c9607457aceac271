use crate::db;
use crate::fmt::format_decimal;
use crate::ipc::error::{err, ok};
use crate::ipc::handlers::connection::SHEET_NAME_KEY;
use crate::ipc::types::{AppState, Request, RosterState};
use crate::roster::validate_roster;
use crate::subjects::{Subject, PASSING_GRADE};
use serde_json::json;

fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

fn install_roster(
    state: &mut AppState,
    req: &Request,
    sheet_name: String,
    candidates: &[serde_json::Value],
) -> serde_json::Value {
    let records = validate_roster(candidates);
    let load_id = uuid::Uuid::new_v4().to_string();
    let loaded_at = chrono::Utc::now().to_rfc3339();

    tracing::info!(
        sheet = %sheet_name,
        students = records.len(),
        %load_id,
        "roster replaced"
    );

    // Remember which tab is on screen, when a workspace is open. Losing
    // this on a db error must not fail the load itself.
    if let Some(conn) = state.db.as_ref() {
        let _ = db::settings_set_json(conn, SHEET_NAME_KEY, &json!(sheet_name));
    }

    let student_count = records.len();
    let records_json = serde_json::to_value(&records).unwrap_or_else(|_| json!([]));
    state.roster = Some(RosterState {
        load_id: load_id.clone(),
        sheet_name: sheet_name.clone(),
        loaded_at: loaded_at.clone(),
        records,
    });

    ok(
        &req.id,
        json!({
            "loadId": load_id,
            "loadedAt": loaded_at,
            "sheetName": sheet_name,
            "studentCount": student_count,
            "records": records_json,
        }),
    )
}

fn handle_load(state: &mut AppState, req: &Request) -> serde_json::Value {
    let sheet_name = match required_str(req, "sheetName") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(students) = req.params.get("students").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing students", None);
    };
    let students = students.clone();
    install_roster(state, req, sheet_name, &students)
}

/// Strip the markdown fences models like to wrap JSON in.
fn clean_model_reply(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

fn handle_load_from_text(state: &mut AppState, req: &Request) -> serde_json::Value {
    let sheet_name = match required_str(req, "sheetName") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let response_text = match required_str(req, "responseText") {
        Ok(v) => v,
        Err(e) => return e,
    };

    let cleaned = clean_model_reply(&response_text);
    let parsed: serde_json::Value = match serde_json::from_str(&cleaned) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "bad_extraction",
                format!("model reply is not valid JSON: {}", e),
                None,
            )
        }
    };
    let Some(candidates) = parsed.as_array().cloned() else {
        return err(&req.id, "bad_extraction", "model reply is not a JSON array", None);
    };

    install_roster(state, req, sheet_name, &candidates)
}

fn handle_clear(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.roster = None;
    ok(&req.id, json!({ "cleared": true }))
}

fn handle_table(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(roster) = state.roster.as_ref() else {
        return err(&req.id, "no_roster", "load a roster first", None);
    };

    let mut columns = vec![
        json!({ "key": "numero", "label": "Nº" }),
        json!({ "key": "aluno", "label": "Aluno" }),
    ];
    for subject in Subject::ALL {
        columns.push(json!({ "key": subject.key(), "label": subject.label() }));
    }

    let rows: Vec<serde_json::Value> = roster
        .records
        .iter()
        .map(|record| {
            let grades: Vec<serde_json::Value> = Subject::ALL
                .iter()
                .map(|&subject| {
                    let value = record.grade(subject);
                    json!({
                        "key": subject.key(),
                        "value": value,
                        "display": format_decimal(value),
                        "passed": value >= PASSING_GRADE,
                    })
                })
                .collect();
            json!({
                "numero": record.numero,
                "numeroDisplay": format_decimal(record.numero),
                "aluno": record.aluno,
                "grades": grades,
            })
        })
        .collect();

    ok(
        &req.id,
        json!({
            "sheetName": roster.sheet_name,
            "loadId": roster.load_id,
            "loadedAt": roster.loaded_at,
            "columns": columns,
            "rows": rows,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.load" => Some(handle_load(state, req)),
        "roster.loadFromText" => Some(handle_load_from_text(state, req)),
        "roster.clear" => Some(handle_clear(state, req)),
        "roster.table" => Some(handle_table(state, req)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_reply_fences_are_stripped() {
        let cleaned = clean_model_reply("```json\n[{\"numero\": 1}]\n```");
        assert_eq!(cleaned, "[{\"numero\": 1}]");
        let untouched = clean_model_reply("[1, 2]");
        assert_eq!(untouched, "[1, 2]");
    }
}

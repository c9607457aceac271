use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::subjects::Subject;
use serde_json::json;

fn cell_text(cell: &serde_json::Value) -> String {
    match cell {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// Flatten raw sheet rows into the plain-text block handed to the
/// extraction model: columns joined with ", ", rows with newlines.
fn handle_compose_input(req: &Request) -> serde_json::Value {
    let Some(rows) = req.params.get("rows").and_then(|v| v.as_array()) else {
        return err(&req.id, "bad_params", "missing rows", None);
    };

    let mut lines = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(cells) = row.as_array() else {
            return err(&req.id, "bad_params", "rows must contain arrays of cells", None);
        };
        let line = cells.iter().map(cell_text).collect::<Vec<_>>().join(", ");
        lines.push(line);
    }

    ok(&req.id, json!({ "textData": lines.join("\n") }))
}

/// The fixed extraction prompt. The expected key list is derived from
/// the subject table so the wire contract has a single source of truth.
fn build_prompt(text_data: &str) -> String {
    let subject_keys = Subject::ALL
        .iter()
        .map(|s| format!("\"{}\" (number or null)", s.key()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are a data extraction assistant.\n\
         Analyze the following text from a school grade sheet.\n\
         Extract a list of students with their grades.\n\
         \n\
         Return ONLY a valid JSON array. Do not include markdown code blocks.\n\
         \n\
         The JSON objects must have these exact keys:\n\
         \"numero\" (number), \"aluno\" (string), {subject_keys}.\n\
         \n\
         Treat empty values, \"-\", or missing grades as 0 or null.\n\
         Convert comma decimals (e.g., \"12,5\") to dots (e.g., 12.5).\n\
         \n\
         Data Text:\n\
         {text_data}"
    )
}

fn handle_build_prompt(req: &Request) -> serde_json::Value {
    let Some(text_data) = req.params.get("textData").and_then(|v| v.as_str()) else {
        return err(&req.id, "bad_params", "missing textData", None);
    };
    ok(&req.id, json!({ "prompt": build_prompt(text_data) }))
}

pub fn try_handle(_state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "extraction.composeInput" => Some(handle_compose_input(req)),
        "extraction.buildPrompt" => Some(handle_build_prompt(req)),
        _ => None,
    }
}

use crate::calc;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request, RosterState};
use serde_json::json;

fn roster_state<'a>(state: &'a AppState, req: &Request) -> Result<&'a RosterState, serde_json::Value> {
    state
        .roster
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_roster", "load a roster first", None))
}

fn handle_subjects(state: &mut AppState, req: &Request) -> serde_json::Value {
    let roster = match roster_state(state, req) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let stats = calc::compute_subject_stats(&roster.records);
    ok(
        &req.id,
        json!({
            "sheetName": roster.sheet_name,
            "loadId": roster.load_id,
            "subjects": stats,
        }),
    )
}

fn handle_overview(state: &mut AppState, req: &Request) -> serde_json::Value {
    let roster = match roster_state(state, req) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let stats = calc::compute_subject_stats(&roster.records);

    ok(
        &req.id,
        json!({
            "sheetName": roster.sheet_name,
            "loadId": roster.load_id,
            "totalStudents": roster.records.len(),
            "globalAverage": calc::global_average(&stats),
            "bestStudent": calc::top_student(&roster.records),
            "bestSubject": calc::best_subject(&stats),
            "lowestAvgSubject": calc::lowest_avg_subject(&stats),
            "highestStdDevSubject": calc::highest_std_dev_subject(&stats),
            "topNegativeSubjects": calc::top_negative_subjects(&stats),
            "balanceData": calc::success_balance(&stats),
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.subjects" => Some(handle_subjects(state, req)),
        "analytics.overview" => Some(handle_overview(state, req)),
        _ => None,
    }
}

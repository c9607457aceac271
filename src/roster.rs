use serde::Serialize;
use serde_json::Value;

use crate::subjects::Subject;

/// A validated roster row. Every field is always populated: the
/// validator substitutes defaults, it never drops a candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub numero: f64,
    pub aluno: String,
    pub portugues: f64,
    pub ingles: f64,
    pub matematica: f64,
    pub psicologia: f64,
    pub quimica: f64,
    pub educacao_fisica: f64,
    pub emrc: f64,
}

impl StudentRecord {
    pub fn grade(&self, subject: Subject) -> f64 {
        match subject {
            Subject::Portugues => self.portugues,
            Subject::Ingles => self.ingles,
            Subject::Matematica => self.matematica,
            Subject::Psicologia => self.psicologia,
            Subject::Quimica => self.quimica,
            Subject::EducacaoFisica => self.educacao_fisica,
            Subject::Emrc => self.emrc,
        }
    }

    /// The seven grades in canonical subject order.
    pub fn grades(&self) -> [f64; 7] {
        [
            self.portugues,
            self.ingles,
            self.matematica,
            self.psicologia,
            self.quimica,
            self.educacao_fisica,
            self.emrc,
        ]
    }
}

/// Total grade normalization. Numbers pass through unchanged (no range
/// clamp); strings are trimmed, a comma decimal separator becomes a
/// period, then parsed as f64. Everything else, and any non-finite parse
/// result, falls back to 0.
pub fn parse_grade(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => {
            let sanitized = s.trim().replace(',', ".");
            match sanitized.parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                _ => 0.0,
            }
        }
        _ => 0.0,
    }
}

/// A missing field normalizes exactly like an unparseable one.
fn grade_field(candidate: &Value, key: &str) -> f64 {
    candidate.get(key).map(parse_grade).unwrap_or(0.0)
}

fn coerce_name(value: Option<&Value>, position: usize) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("Aluno {}", position),
    }
}

/// Convert one untrusted extraction candidate into a record. `index` is
/// the 0-based position in the batch; the name placeholder embeds the
/// 1-based position so placeholders stay unique within a load.
pub fn validate_candidate(candidate: &Value, index: usize) -> StudentRecord {
    StudentRecord {
        numero: grade_field(candidate, "numero"),
        aluno: coerce_name(candidate.get("aluno"), index + 1),
        portugues: grade_field(candidate, Subject::Portugues.key()),
        ingles: grade_field(candidate, Subject::Ingles.key()),
        matematica: grade_field(candidate, Subject::Matematica.key()),
        psicologia: grade_field(candidate, Subject::Psicologia.key()),
        quimica: grade_field(candidate, Subject::Quimica.key()),
        educacao_fisica: grade_field(candidate, Subject::EducacaoFisica.key()),
        emrc: grade_field(candidate, Subject::Emrc.key()),
    }
}

/// Validate a whole extraction batch. Malformed candidates degrade to
/// default-valued records instead of being dropped, so the output stays
/// positionally aligned with the source rows.
pub fn validate_roster(candidates: &[Value]) -> Vec<StudentRecord> {
    candidates
        .iter()
        .enumerate()
        .map(|(index, candidate)| validate_candidate(candidate, index))
        .collect()
}

/// Grades strictly below this value count as failing ("negativa").
pub const PASSING_GRADE: f64 = 10.0;

/// The seven subjects tracked on a roster sheet, in the fixed order used
/// everywhere subjects are enumerated (stats payloads, table columns).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subject {
    Portugues,
    Ingles,
    Matematica,
    Psicologia,
    Quimica,
    EducacaoFisica,
    Emrc,
}

impl Subject {
    pub const ALL: [Subject; 7] = [
        Subject::Portugues,
        Subject::Ingles,
        Subject::Matematica,
        Subject::Psicologia,
        Subject::Quimica,
        Subject::EducacaoFisica,
        Subject::Emrc,
    ];

    /// Wire key, matching the extraction JSON contract.
    pub fn key(self) -> &'static str {
        match self {
            Subject::Portugues => "portugues",
            Subject::Ingles => "ingles",
            Subject::Matematica => "matematica",
            Subject::Psicologia => "psicologia",
            Subject::Quimica => "quimica",
            Subject::EducacaoFisica => "educacaoFisica",
            Subject::Emrc => "emrc",
        }
    }

    /// Display label shown in the dashboard.
    pub fn label(self) -> &'static str {
        match self {
            Subject::Portugues => "Português",
            Subject::Ingles => "Inglês",
            Subject::Matematica => "Matemática",
            Subject::Psicologia => "Psicologia",
            Subject::Quimica => "Química",
            Subject::EducacaoFisica => "Educação Física",
            Subject::Emrc => "EMRC",
        }
    }
}

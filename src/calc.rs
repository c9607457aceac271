use serde::Serialize;

use crate::roster::StudentRecord;
use crate::subjects::{Subject, PASSING_GRADE};

/// 1-decimal display rounding used for every aggregate:
/// `Int(10*x + 0.5) / 10`.
pub fn round_off_1_decimal(x: f64) -> f64 {
    ((10.0 * x) + 0.5).floor() / 10.0
}

/// Colors for the four distribution buckets, in bucket order.
const BUCKET_COLORS: [&str; 4] = ["#f43f5e", "#f59e0b", "#22d3ee", "#d946ef"];

/// Severity colors for the top-negative ranking, most severe first.
const SEVERITY_COLORS: [&str; 3] = ["#D32F2F", "#EC407A", "#F48FB1"];

/// One bar of a subject's grade-distribution chart. `chart_value` is the
/// signed rendering value: the failing bucket carries the negated count
/// so it draws below the axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBucket {
    pub range: &'static str,
    pub count: usize,
    pub chart_value: i64,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStats {
    pub subject: String,
    pub key: &'static str,
    pub avg: f64,
    pub std_dev: f64,
    pub max: f64,
    pub min: f64,
    pub count: usize,
    pub count_below_ten: usize,
    pub percentage_below_ten: f64,
    pub distribution: Vec<GradeBucket>,
}

/// Bucket index for one grade. Boundaries are half-open so the four
/// ranges partition the whole axis: a grade lands in exactly one bucket
/// and bucket counts always sum to the grade count. Grades above 20 stay
/// in the top bucket, uncapped.
fn bucket_index(grade: f64) -> usize {
    if grade < PASSING_GRADE {
        0
    } else if grade < 14.0 {
        1
    } else if grade < 18.0 {
        2
    } else {
        3
    }
}

fn stats_for_grades(subject: Subject, grades: &[f64]) -> SubjectStats {
    let count = grades.len();

    let mut sum = 0.0_f64;
    let mut max = f64::NEG_INFINITY;
    let mut min = f64::INFINITY;
    let mut bucket_counts = [0_usize; 4];
    for &g in grades {
        sum += g;
        max = max.max(g);
        min = min.min(g);
        bucket_counts[bucket_index(g)] += 1;
    }

    // Population statistics over all retained grades. A 0 is a real
    // grade here, not a missing one: defaulting happened upstream in the
    // validator.
    let mean = if count > 0 { sum / (count as f64) } else { 0.0 };
    let variance = if count > 0 {
        grades.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / (count as f64)
    } else {
        0.0
    };

    let count_below_ten = bucket_counts[0];
    let percentage_below_ten = if count > 0 {
        round_off_1_decimal(100.0 * (count_below_ten as f64) / (count as f64))
    } else {
        0.0
    };

    let ranges = ["< 10", "10-13", "14-17", "18-20"];
    let distribution = (0..4usize)
        .map(|i| {
            let bucket_count = bucket_counts[i];
            let chart_value = if i == 0 {
                -(bucket_count as i64)
            } else {
                bucket_count as i64
            };
            GradeBucket {
                range: ranges[i],
                count: bucket_count,
                chart_value,
                color: BUCKET_COLORS[i],
            }
        })
        .collect();

    SubjectStats {
        subject: subject.label().to_string(),
        key: subject.key(),
        avg: round_off_1_decimal(mean),
        std_dev: round_off_1_decimal(variance.sqrt()),
        max: if count > 0 { max } else { 0.0 },
        min: if count > 0 { min } else { 0.0 },
        count,
        count_below_ten,
        percentage_below_ten,
        distribution,
    }
}

/// One `SubjectStats` per subject, in canonical subject order, over the
/// full record set. Total for any input, including the empty roster.
pub fn compute_subject_stats(records: &[StudentRecord]) -> Vec<SubjectStats> {
    Subject::ALL
        .iter()
        .map(|&subject| {
            let grades: Vec<f64> = records.iter().map(|r| r.grade(subject)).collect();
            stats_for_grades(subject, &grades)
        })
        .collect()
}

/// Subject with the highest average. Ties keep the earliest subject in
/// canonical order, so repeated recomputations never jitter.
pub fn best_subject(stats: &[SubjectStats]) -> Option<&SubjectStats> {
    let mut best: Option<&SubjectStats> = None;
    for s in stats {
        if best.map(|b| s.avg > b.avg).unwrap_or(true) {
            best = Some(s);
        }
    }
    best
}

/// Subject with the lowest average; ties keep the earliest subject.
pub fn lowest_avg_subject(stats: &[SubjectStats]) -> Option<&SubjectStats> {
    let mut worst: Option<&SubjectStats> = None;
    for s in stats {
        if worst.map(|w| s.avg < w.avg).unwrap_or(true) {
            worst = Some(s);
        }
    }
    worst
}

/// Subject with the most dispersed grades; ties keep the earliest.
pub fn highest_std_dev_subject(stats: &[SubjectStats]) -> Option<&SubjectStats> {
    let mut top: Option<&SubjectStats> = None;
    for s in stats {
        if top.map(|t| s.std_dev > t.std_dev).unwrap_or(true) {
            top = Some(s);
        }
    }
    top
}

/// A subject highlighted on the failure-rate podium, with its severity
/// color by rank position.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NegativeHighlight {
    pub subject: String,
    pub key: &'static str,
    pub count_below_ten: usize,
    pub percentage_below_ten: f64,
    pub color: &'static str,
}

/// Top 3 subjects by failing percentage, descending. The sort is stable,
/// so equal percentages keep canonical subject order.
pub fn top_negative_subjects(stats: &[SubjectStats]) -> Vec<NegativeHighlight> {
    let mut ordered: Vec<&SubjectStats> = stats.iter().collect();
    ordered.sort_by(|a, b| {
        b.percentage_below_ten
            .partial_cmp(&a.percentage_below_ten)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ordered
        .into_iter()
        .take(SEVERITY_COLORS.len())
        .enumerate()
        .map(|(rank, s)| NegativeHighlight {
            subject: s.subject.clone(),
            key: s.key,
            count_below_ten: s.count_below_ten,
            percentage_below_ten: s.percentage_below_ten,
            color: SEVERITY_COLORS[rank],
        })
        .collect()
}

/// Pass/fail split per subject for the stacked success chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectBalance {
    pub subject: String,
    pub key: &'static str,
    pub positives: usize,
    pub negatives: usize,
}

pub fn success_balance(stats: &[SubjectStats]) -> Vec<SubjectBalance> {
    stats
        .iter()
        .map(|s| SubjectBalance {
            subject: s.subject.clone(),
            key: s.key,
            positives: s.count - s.count_below_ten,
            negatives: s.count_below_ten,
        })
        .collect()
}

/// Roster-wide best student by unweighted mean of the seven stored
/// grades. Ties keep the first occurrence in roster order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentAverage {
    pub numero: f64,
    pub aluno: String,
    pub avg: f64,
}

pub fn top_student(records: &[StudentRecord]) -> Option<StudentAverage> {
    let mut best: Option<StudentAverage> = None;
    for record in records {
        let grades = record.grades();
        let avg = grades.iter().sum::<f64>() / (grades.len() as f64);
        if best.as_ref().map(|b| avg > b.avg).unwrap_or(true) {
            best = Some(StudentAverage {
                numero: record.numero,
                aluno: record.aluno.clone(),
                avg,
            });
        }
    }
    best
}

/// Mean of the seven per-subject averages, for the overview stat card.
pub fn global_average(stats: &[SubjectStats]) -> f64 {
    if stats.is_empty() {
        return 0.0;
    }
    round_off_1_decimal(stats.iter().map(|s| s.avg).sum::<f64>() / (stats.len() as f64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::validate_roster;
    use serde_json::json;

    fn roster_with_math(grades: &[f64]) -> Vec<StudentRecord> {
        let candidates: Vec<serde_json::Value> = grades
            .iter()
            .enumerate()
            .map(|(i, g)| json!({ "numero": i + 1, "aluno": format!("S{}", i + 1), "matematica": g }))
            .collect();
        validate_roster(&candidates)
    }

    #[test]
    fn round_off_one_decimal() {
        assert_eq!(round_off_1_decimal(0.0), 0.0);
        assert_eq!(round_off_1_decimal(3.54), 3.5);
        assert_eq!(round_off_1_decimal(3.55), 3.6);
        assert_eq!(round_off_1_decimal(49.999), 50.0);
    }

    #[test]
    fn spread_grades_match_known_aggregates() {
        let records = roster_with_math(&[5.0, 5.0, 15.0, 15.0]);
        let stats = compute_subject_stats(&records);
        let math = stats.iter().find(|s| s.key == "matematica").expect("math");
        assert_eq!(math.avg, 10.0);
        assert_eq!(math.std_dev, 5.0);
        assert_eq!(math.count, 4);
        assert_eq!(math.count_below_ten, 2);
        assert_eq!(math.percentage_below_ten, 50.0);
        let counts: Vec<usize> = math.distribution.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 0, 2, 0]);
        assert_eq!(math.distribution[0].chart_value, -2);
        assert_eq!(math.distribution[2].chart_value, 2);
    }

    #[test]
    fn std_dev_uses_unrounded_mean() {
        let records = roster_with_math(&[9.8, 10.0, 10.9]);
        let stats = compute_subject_stats(&records);
        let math = stats.iter().find(|s| s.key == "matematica").expect("math");
        let mean = (9.8 + 10.0 + 10.9) / 3.0;
        let variance = [(9.8 - mean), (10.0 - mean), (10.9 - mean)]
            .iter()
            .map(|d| d * d)
            .sum::<f64>()
            / 3.0;
        assert_eq!(math.avg, 10.2);
        assert_eq!(math.std_dev, round_off_1_decimal(variance.sqrt()));
    }

    #[test]
    fn buckets_partition_every_grade() {
        let records = roster_with_math(&[0.0, 9.9, 10.0, 12.5, 13.5, 14.0, 17.9, 18.0, 20.0, 25.0]);
        let stats = compute_subject_stats(&records);
        let math = stats.iter().find(|s| s.key == "matematica").expect("math");
        let total: usize = math.distribution.iter().map(|b| b.count).sum();
        assert_eq!(total, math.count);
        let counts: Vec<usize> = math.distribution.iter().map(|b| b.count).collect();
        // 13.5 belongs to the mid-low bucket, 25.0 stays in the top one.
        assert_eq!(counts, vec![2, 3, 2, 3]);
    }

    #[test]
    fn empty_roster_degrades_to_zeros() {
        let stats = compute_subject_stats(&[]);
        assert_eq!(stats.len(), 7);
        for s in &stats {
            assert_eq!(s.avg, 0.0);
            assert_eq!(s.std_dev, 0.0);
            assert_eq!(s.max, 0.0);
            assert_eq!(s.min, 0.0);
            assert_eq!(s.count, 0);
            assert_eq!(s.percentage_below_ten, 0.0);
            assert!(s.distribution.iter().all(|b| b.count == 0));
        }
        assert!(top_student(&[]).is_none());
        assert_eq!(global_average(&stats), 0.0);
    }

    #[test]
    fn recomputation_is_idempotent() {
        let records = roster_with_math(&[7.0, 11.0, 16.5, 19.0]);
        let first = compute_subject_stats(&records);
        let second = compute_subject_stats(&records);
        assert_eq!(first, second);
        assert_eq!(top_negative_subjects(&first), top_negative_subjects(&second));
    }

    #[test]
    fn rankings_pick_extremes_and_respect_ties() {
        let candidates = vec![
            json!({ "numero": 1, "aluno": "Ana", "portugues": 12, "ingles": 8 }),
            json!({ "numero": 2, "aluno": "Rui", "portugues": 12, "ingles": 8 }),
        ];
        let records = validate_roster(&candidates);
        let stats = compute_subject_stats(&records);

        let worst = lowest_avg_subject(&stats).expect("worst");
        // Every other subject defaulted to 0, so the worst is the first
        // all-zero subject in canonical order: matematica.
        assert_eq!(worst.key, "matematica");

        let best = best_subject(&stats).expect("best");
        assert_eq!(best.key, "portugues");
        assert_eq!(best.avg, 12.0);

        // Restricted to the two graded subjects, the lower mean loses.
        assert_eq!(
            lowest_avg_subject(&stats[0..2]).map(|s| s.key),
            Some("ingles")
        );
        assert!(best_subject(&[]).is_none());
        assert!(lowest_avg_subject(&[]).is_none());
        assert!(highest_std_dev_subject(&[]).is_none());

        // All-equal dispersion keeps canonical order.
        let even = compute_subject_stats(&roster_with_math(&[10.0, 10.0]));
        assert_eq!(
            highest_std_dev_subject(&even).map(|s| s.key),
            Some("portugues")
        );
    }

    #[test]
    fn top_negative_podium_assigns_severity_colors() {
        let candidates = vec![
            json!({ "numero": 1, "aluno": "Ana", "portugues": 15, "ingles": 15, "matematica": 4 }),
            json!({ "numero": 2, "aluno": "Rui", "portugues": 15, "ingles": 8, "matematica": 4 }),
        ];
        let records = validate_roster(&candidates);
        let stats = compute_subject_stats(&records);
        let podium = top_negative_subjects(&stats);
        assert_eq!(podium.len(), 3);
        // matematica fails 100%, then the first fully-defaulted subject
        // (psicologia) also at 100% but later in canonical order.
        assert_eq!(podium[0].key, "matematica");
        assert_eq!(podium[0].color, "#D32F2F");
        assert_eq!(podium[1].key, "psicologia");
        assert_eq!(podium[1].color, "#EC407A");
        assert_eq!(podium[2].color, "#F48FB1");
    }

    #[test]
    fn balance_splits_pass_and_fail() {
        let records = roster_with_math(&[4.0, 10.0, 16.0]);
        let stats = compute_subject_stats(&records);
        let balance = success_balance(&stats);
        let math = balance.iter().find(|b| b.key == "matematica").expect("math");
        assert_eq!(math.positives, 2);
        assert_eq!(math.negatives, 1);
        assert_eq!(math.positives + math.negatives, 3);
    }

    #[test]
    fn top_student_breaks_ties_by_first_occurrence() {
        let candidates = vec![
            json!({ "numero": 1, "aluno": "Ana", "portugues": 14 }),
            json!({ "numero": 2, "aluno": "Rui", "portugues": 14 }),
            json!({ "numero": 3, "aluno": "Eva", "portugues": 10 }),
        ];
        let records = validate_roster(&candidates);
        let best = top_student(&records).expect("top student");
        assert_eq!(best.aluno, "Ana");
        assert!((best.avg - 2.0).abs() < 1e-9);
    }
}

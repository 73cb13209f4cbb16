//! Progress statistics over answered questions.

use crate::evaluation::ParsedEvaluation;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// The scores of one answered question, as the caller stored them.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerRecord {
    pub question_id: u64,
    pub category: String,
    pub clarity_score: i32,
    pub logic_score: i32,
    pub perspective_score: i32,
    pub depth_score: i32,
    pub answered_at: DateTime<Utc>,
}

impl AnswerRecord {
    pub fn from_evaluation(
        question_id: u64,
        category: &str,
        evaluation: &ParsedEvaluation,
        answered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            question_id,
            category: category.to_string(),
            clarity_score: evaluation.clarity_score,
            logic_score: evaluation.logic_score,
            perspective_score: evaluation.perspective_score,
            depth_score: evaluation.depth_score,
            answered_at,
        }
    }

    fn mean_score(&self) -> f32 {
        let sum: i64 = [
            self.clarity_score,
            self.logic_score,
            self.perspective_score,
            self.depth_score,
        ]
        .into_iter()
        .map(i64::from)
        .sum();
        (sum as f64 / 4.0) as f32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStats {
    pub category: String,
    pub question_count: usize,
    pub average_score: f32,
    pub clarity_average: f32,
    pub logic_average: f32,
    pub perspective_average: f32,
    pub depth_average: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub total_questions: usize,
    pub total_answers: usize,
    pub average_clarity: f32,
    pub average_logic: f32,
    pub average_perspective: f32,
    pub average_depth: f32,
    pub overall_average: f32,
    pub best_category: String,
    pub worst_category: String,
    /// Mean score of the newer half of answers minus the older half.
    pub improvement_trend: f32,
    pub category_stats: BTreeMap<String, CategoryStats>,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            total_questions: 0,
            total_answers: 0,
            average_clarity: 0.0,
            average_logic: 0.0,
            average_perspective: 0.0,
            average_depth: 0.0,
            overall_average: 0.0,
            best_category: "None".to_string(),
            worst_category: "None".to_string(),
            improvement_trend: 0.0,
            category_stats: BTreeMap::new(),
        }
    }
}

fn average<'a>(
    answers: impl IntoIterator<Item = &'a AnswerRecord>,
    score: fn(&AnswerRecord) -> f32,
) -> f32 {
    let (sum, count) = answers
        .into_iter()
        .fold((0.0f32, 0usize), |(sum, count), a| (sum + score(a), count + 1));
    if count == 0 { 0.0 } else { sum / count as f32 }
}

fn dimension_averages(answers: &[&AnswerRecord]) -> [f32; 4] {
    [
        average(answers.iter().copied(), |a| a.clarity_score as f32),
        average(answers.iter().copied(), |a| a.logic_score as f32),
        average(answers.iter().copied(), |a| a.perspective_score as f32),
        average(answers.iter().copied(), |a| a.depth_score as f32),
    ]
}

/// Aggregates scores across answers. `total_questions` counts every
/// generated question, answered or not.
pub fn calculate_statistics(total_questions: usize, answers: &[AnswerRecord]) -> Statistics {
    if answers.is_empty() {
        return Statistics::default();
    }

    let all: Vec<&AnswerRecord> = answers.iter().collect();
    let [clarity, logic, perspective, depth] = dimension_averages(&all);

    let mut by_category: BTreeMap<&str, Vec<&AnswerRecord>> = BTreeMap::new();
    for answer in answers {
        by_category.entry(answer.category.as_str()).or_default().push(answer);
    }

    let category_stats: BTreeMap<String, CategoryStats> = by_category
        .into_iter()
        .map(|(category, group)| {
            let [c, l, p, d] = dimension_averages(&group);
            let stats = CategoryStats {
                category: category.to_string(),
                question_count: group.len(),
                average_score: (c + l + p + d) / 4.0,
                clarity_average: c,
                logic_average: l,
                perspective_average: p,
                depth_average: d,
            };
            (category.to_string(), stats)
        })
        .collect();

    // Ties go to the alphabetically first category.
    let best_category = category_stats
        .values()
        .reduce(|best, s| if s.average_score > best.average_score { s } else { best })
        .map(|s| s.category.clone())
        .unwrap_or_else(|| "None".to_string());
    let worst_category = category_stats
        .values()
        .reduce(|worst, s| if s.average_score < worst.average_score { s } else { worst })
        .map(|s| s.category.clone())
        .unwrap_or_else(|| "None".to_string());

    let mut chronological = all;
    chronological.sort_by_key(|a| a.answered_at);
    let (older, newer) = chronological.split_at(chronological.len() / 2);
    let improvement_trend = average(newer.iter().copied(), AnswerRecord::mean_score)
        - average(older.iter().copied(), AnswerRecord::mean_score);

    Statistics {
        total_questions,
        total_answers: answers.len(),
        average_clarity: clarity,
        average_logic: logic,
        average_perspective: perspective,
        average_depth: depth,
        overall_average: (clarity + logic + perspective + depth) / 4.0,
        best_category,
        worst_category,
        improvement_trend,
        category_stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(category: &str, score: i32, minute: u32) -> AnswerRecord {
        AnswerRecord {
            question_id: minute as u64,
            category: category.to_string(),
            clarity_score: score,
            logic_score: score,
            perspective_score: score,
            depth_score: score,
            answered_at: Utc.with_ymd_and_hms(2025, 1, 1, 12, minute, 0).unwrap(),
        }
    }

    #[test]
    fn test_no_answers_gives_defaults() {
        let stats = calculate_statistics(3, &[]);
        assert_eq!(stats, Statistics::default());
        assert_eq!(stats.best_category, "None");
    }

    #[test]
    fn test_averages_and_categories() {
        let answers = vec![
            record("Scientific", 8, 0),
            record("Scientific", 6, 1),
            record("Society", 4, 2),
        ];
        let stats = calculate_statistics(5, &answers);

        assert_eq!(stats.total_questions, 5);
        assert_eq!(stats.total_answers, 3);
        assert!((stats.average_clarity - 6.0).abs() < 1e-6);
        assert!((stats.overall_average - 6.0).abs() < 1e-6);
        assert_eq!(stats.best_category, "Scientific");
        assert_eq!(stats.worst_category, "Society");

        let scientific = &stats.category_stats["Scientific"];
        assert_eq!(scientific.question_count, 2);
        assert!((scientific.average_score - 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_trend_compares_newer_half_with_older_half() {
        // Out of order on purpose; sorted by time the scores are 3, 5, 7, 9.
        let answers = vec![
            record("General", 9, 30),
            record("General", 3, 0),
            record("General", 7, 20),
            record("General", 5, 10),
        ];
        let stats = calculate_statistics(4, &answers);
        assert!((stats.improvement_trend - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_answer_counts_as_newer_half() {
        let stats = calculate_statistics(1, &[record("General", 6, 0)]);
        assert!((stats.improvement_trend - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_extreme_scores_do_not_overflow() {
        let evaluation = crate::evaluation::parse_evaluation(
            "CLARITY SCORE: 2000000000\nLOGIC SCORE: 2000000000\n\
             PERSPECTIVE SCORE: -2000000000\nDEPTH SCORE: 2000000000",
        );
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let answers = vec![
            AnswerRecord::from_evaluation(1, "General", &evaluation, at),
            AnswerRecord::from_evaluation(2, "General", &evaluation, at),
        ];

        let stats = calculate_statistics(2, &answers);

        assert!(stats.overall_average.is_finite());
        assert!((stats.overall_average - 1.0e9).abs() < 1.0e3);
        assert!((stats.category_stats["General"].average_score - 1.0e9).abs() < 1.0e3);
        assert!(stats.improvement_trend.abs() < 1.0e3);
    }

    #[test]
    fn test_record_from_evaluation() {
        let evaluation = ParsedEvaluation {
            clarity_score: 9,
            ..ParsedEvaluation::default()
        };
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let record = AnswerRecord::from_evaluation(42, "Leadership", &evaluation, at);
        assert_eq!(record.clarity_score, 9);
        assert_eq!(record.logic_score, 5);
        assert_eq!(record.question_id, 42);
        assert_eq!(record.category, "Leadership");
    }
}

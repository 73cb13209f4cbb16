use crate::coach::Coach;
use crate::evaluation::ParsedEvaluation;
use crate::prompts::{AnswerLength, LengthPreference};
use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CATEGORY: &str = "General";

pub const DEFAULT_CATEGORIES: [&str; 7] = [
    "Philosophical",
    "Leadership",
    "Psychological",
    "Scientific",
    "Technological",
    "Society",
    "General",
];

pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 10;
pub const DEFAULT_DIFFICULTY: u8 = 5;

/// A generated practice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub text: String,
    pub difficulty: u8,
    pub category: String,
    pub expected_length: AnswerLength,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PracticeState {
    Idle,
    AwaitingAnswer {
        question: Question,
    },
    Evaluated {
        question: Question,
        answer: String,
        evaluation: ParsedEvaluation,
    },
}

/// One user's run through question, answer and feedback.
///
/// The session owns only the flow. Where the results are stored is up to
/// the caller, which receives each `Question` and `ParsedEvaluation` as it
/// is produced.
pub struct PracticeSession {
    pub state: PracticeState,
    difficulty: u8,
    category: String,
    length_preference: LengthPreference,
}

impl Default for PracticeSession {
    fn default() -> Self {
        Self::new(DEFAULT_DIFFICULTY, DEFAULT_CATEGORY, LengthPreference::Auto)
    }
}

impl PracticeSession {
    pub fn new(difficulty: u8, category: &str, length_preference: LengthPreference) -> Self {
        let mut session = Self {
            state: PracticeState::Idle,
            difficulty: DEFAULT_DIFFICULTY,
            category: DEFAULT_CATEGORY.to_string(),
            length_preference,
        };
        session.set_difficulty(difficulty);
        session.set_category(category);
        session
    }

    pub fn difficulty(&self) -> u8 {
        self.difficulty
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Clamped to 1..=10.
    pub fn set_difficulty(&mut self, difficulty: u8) {
        self.difficulty = difficulty.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
    }

    /// A blank category falls back to "General".
    pub fn set_category(&mut self, category: &str) {
        let category = category.trim();
        self.category = if category.is_empty() {
            DEFAULT_CATEGORY.to_string()
        } else {
            category.to_string()
        };
    }

    pub fn set_length_preference(&mut self, preference: LengthPreference) {
        self.length_preference = preference;
    }

    pub fn expected_length(&self) -> AnswerLength {
        self.length_preference.resolve(self.difficulty)
    }

    /// Asks the coach for a new question and waits for an answer to it. Any
    /// previous question or evaluation is dropped.
    pub async fn next_question<C: Coach + ?Sized>(&mut self, coach: &C) -> Result<Question> {
        let expected_length = self.expected_length();
        let text = coach
            .generate_question(self.difficulty, &self.category, expected_length)
            .await
            .context("Failed to generate question")?;

        tracing::info!(
            difficulty = self.difficulty,
            category = %self.category,
            "Generated question"
        );

        let question = Question {
            text,
            difficulty: self.difficulty,
            category: self.category.clone(),
            expected_length,
            created_at: Utc::now(),
        };
        self.state = PracticeState::AwaitingAnswer {
            question: question.clone(),
        };
        Ok(question)
    }

    /// Sends the answer for scoring. The state only changes on success, so a
    /// failed call can be retried with the same question.
    pub async fn submit_answer<C: Coach + ?Sized>(
        &mut self,
        coach: &C,
        answer: &str,
    ) -> Result<ParsedEvaluation> {
        let question = match &self.state {
            PracticeState::AwaitingAnswer { question } => question,
            PracticeState::Evaluated { .. } => {
                return Err(anyhow!("This question has already been answered"));
            }
            PracticeState::Idle => return Err(anyhow!("No current question to answer")),
        };

        let answer = answer.trim();
        if answer.is_empty() {
            return Err(anyhow!("Please enter your answer"));
        }

        let evaluation = coach
            .evaluate_answer(&question.text, answer, question.expected_length)
            .await
            .context("Failed to evaluate answer")?;

        tracing::info!(
            clarity = evaluation.clarity_score,
            logic = evaluation.logic_score,
            perspective = evaluation.perspective_score,
            depth = evaluation.depth_score,
            "Answer evaluated"
        );

        self.state = PracticeState::Evaluated {
            question: question.clone(),
            answer: answer.to_string(),
            evaluation: evaluation.clone(),
        };
        Ok(evaluation)
    }

    /// Follow-up questions for the answer that was just evaluated.
    pub async fn follow_ups<C: Coach + ?Sized>(&self, coach: &C) -> Result<Vec<String>> {
        match &self.state {
            PracticeState::Evaluated {
                question, answer, ..
            } => coach
                .generate_follow_up_questions(&question.text, answer)
                .await
                .context("Failed to generate follow-up questions"),
            _ => Err(anyhow!("Answer the current question before asking for follow-ups")),
        }
    }

    pub fn reset(&mut self) {
        self.state = PracticeState::Idle;
    }
}

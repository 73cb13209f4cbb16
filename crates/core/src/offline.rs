use crate::coach::Coach;
use crate::evaluation::{
    ParsedEvaluation, UnattributedText, parse_evaluation_with, parse_follow_up_questions,
};
use crate::prompts::AnswerLength;
use anyhow::Result;
use async_trait::async_trait;

/// A simulated `Coach` that never touches the network.
///
/// Replies are written in the same layout the hosted model is asked for and
/// go through the same parsers, so the whole flow can be exercised offline.
/// Scores follow a simple word-count heuristic against the expected length.
pub struct OfflineCoach;

impl OfflineCoach {
    fn rubric_reply(answer: &str, length: AnswerLength) -> String {
        let words = answer.split_whitespace().count();
        let target = match length {
            AnswerLength::Short => 30,
            AnswerLength::Medium => 80,
            AnswerLength::Long => 150,
        };
        // 1..=10, highest when the answer is close to the target length.
        let distance = words.abs_diff(target) * 10 / target.max(1);
        let depth = 10usize.saturating_sub(distance).max(1);
        let clarity = if answer.contains('.') { 7 } else { 5 };

        format!(
            "CLARITY SCORE: {clarity} [offline estimate]\n\
             LOGIC SCORE: 6\n\
             PERSPECTIVE SCORE: 5\n\
             DEPTH SCORE: {depth}\n\
             \n\
             FEEDBACK:\n\
             Your answer has {words} words; about {target} fit this question.\n\
             \n\
             WORD AND PHRASE SUGGESTIONS:\n\
             Replace 'I think' with 'The evidence suggests'.\n\
             \n\
             BETTER ANSWER SUGGESTIONS:\n\
             State your position in the first sentence.\n\
             Add one counterargument and answer it.\n\
             \n\
             THOUGHT PROCESS GUIDANCE:\n\
             List the stakeholders before deciding.\n\
             \n\
             MODEL ANSWER:\n\
             No model answer is available offline."
        )
    }
}

#[async_trait]
impl Coach for OfflineCoach {
    async fn generate_question(
        &self,
        difficulty: u8,
        category: &str,
        _length: AnswerLength,
    ) -> Result<String> {
        Ok(format!(
            "[{category}, level {difficulty}] What trade-offs would you weigh before changing a long-standing habit?"
        ))
    }

    async fn evaluate_answer(
        &self,
        _question: &str,
        answer: &str,
        length: AnswerLength,
    ) -> Result<ParsedEvaluation> {
        let reply = Self::rubric_reply(answer, length);
        Ok(parse_evaluation_with(&reply, UnattributedText::Discard))
    }

    async fn generate_follow_up_questions(
        &self,
        _question: &str,
        _answer: &str,
    ) -> Result<Vec<String>> {
        let reply = "1. Which assumption in your answer is weakest? (Score: 4)\n\
                     2. How would someone who disagrees frame the problem? (Score: 6)\n\
                     3. Would your reasoning hold in a different country? (Score: 8)";
        Ok(parse_follow_up_questions(reply))
    }

    async fn improve_text(&self, text: &str, _text_type: &str) -> Result<ParsedEvaluation> {
        let reply = format!(
            "Overall the text is readable.\n\
             CLARITY SCORE: 6\n\
             IMPROVEMENT SUGGESTIONS\n\
             Split long sentences.\n\
             IMPROVED VERSION\n\
             {}",
            text.trim()
        );
        Ok(parse_evaluation_with(&reply, UnattributedText::Feedback))
    }

    async fn generate_random_fact(&self, category: &str) -> Result<String> {
        Ok(format!(
            "Octopuses have three hearts. It is a reminder that {category} is full of designs nobody would guess."
        ))
    }

    async fn generate_metacognitive_guidance(&self, input: &str) -> Result<String> {
        Ok(format!(
            "Problem Analysis: restate \"{}\" in one sentence, then list what you already know and what you need to find out.",
            input.trim()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_evaluation_goes_through_the_parser() {
        let coach = OfflineCoach;
        let answer = "Cities should limit cars. Air quality improves and streets become safer.";
        let evaluation = coach
            .evaluate_answer("Should cities ban cars?", answer, AnswerLength::Short)
            .await
            .unwrap();

        assert_eq!(evaluation.clarity_score, 7);
        assert_eq!(evaluation.logic_score, 6);
        assert!((1..=10).contains(&evaluation.depth_score));
        assert!(evaluation.feedback.starts_with("Your answer has 11 words"));
        assert_eq!(
            evaluation.better_answer_suggestions,
            "State your position in the first sentence.\nAdd one counterargument and answer it."
        );
    }

    #[tokio::test]
    async fn test_offline_follow_ups() {
        let questions = OfflineCoach
            .generate_follow_up_questions("q", "a")
            .await
            .unwrap();
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0], "Which assumption in your answer is weakest?");
    }

    #[tokio::test]
    async fn test_offline_improvement_collects_preamble() {
        let evaluation = OfflineCoach
            .improve_text("  A draft.  ", "Email")
            .await
            .unwrap();
        assert_eq!(evaluation.feedback, "Overall the text is readable.");
        assert_eq!(evaluation.better_answer_suggestions, "Split long sentences.");
        assert_eq!(evaluation.model_answer, "A draft.");
        assert_eq!(evaluation.clarity_score, 6);
    }
}

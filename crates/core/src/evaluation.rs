//! Extraction of rubric scores and feedback sections from model replies.
//!
//! The model is asked to answer in a fixed layout (`CLARITY SCORE: 8`,
//! `FEEDBACK:` followed by free text, ...) but in practice the layout drifts:
//! headers get renamed, scores carry bracketed notes, blank lines come and go.
//! Parsing is therefore line based and forgiving. A missing or malformed
//! field never fails the parse, it just keeps its default.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Score used whenever a score line is absent or unparseable.
pub const FALLBACK_SCORE: i32 = 5;

/// The sections a rubric reply can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionTag {
    ClarityScore,
    LogicScore,
    PerspectiveScore,
    DepthScore,
    Feedback,
    WordAndPhraseSuggestions,
    BetterAnswerSuggestions,
    ThoughtProcessGuidance,
    ModelAnswer,
}

/// How a line is recognized as a section header.
#[derive(Debug, Clone, Copy)]
enum HeaderRule {
    Prefix(&'static str),
    ContainsAll(&'static [&'static str]),
}

impl HeaderRule {
    fn matches(self, line: &str) -> bool {
        match self {
            HeaderRule::Prefix(prefix) => line.starts_with(prefix),
            HeaderRule::ContainsAll(words) => words.iter().all(|w| line.contains(w)),
        }
    }
}

const SCORE_HEADERS: [(SectionTag, &str); 4] = [
    (SectionTag::ClarityScore, "CLARITY SCORE:"),
    (SectionTag::LogicScore, "LOGIC SCORE:"),
    (SectionTag::PerspectiveScore, "PERSPECTIVE SCORE:"),
    (SectionTag::DepthScore, "DEPTH SCORE:"),
];

// Order matters: the first matching rule wins. Canonical headers come
// first, then synonyms, then the fuzzy WORD/PHRASE rule.
const TEXT_HEADERS: [(SectionTag, HeaderRule); 9] = [
    (SectionTag::Feedback, HeaderRule::Prefix("FEEDBACK:")),
    (
        SectionTag::WordAndPhraseSuggestions,
        HeaderRule::Prefix("WORD AND PHRASE SUGGESTIONS:"),
    ),
    (
        SectionTag::BetterAnswerSuggestions,
        HeaderRule::Prefix("BETTER ANSWER SUGGESTIONS:"),
    ),
    (
        SectionTag::ThoughtProcessGuidance,
        HeaderRule::Prefix("THOUGHT PROCESS GUIDANCE:"),
    ),
    (SectionTag::ModelAnswer, HeaderRule::Prefix("MODEL ANSWER:")),
    (
        SectionTag::BetterAnswerSuggestions,
        HeaderRule::Prefix("IMPROVEMENT SUGGESTIONS"),
    ),
    (
        SectionTag::ThoughtProcessGuidance,
        HeaderRule::Prefix("WRITING PROCESS GUIDANCE"),
    ),
    (SectionTag::ModelAnswer, HeaderRule::Prefix("IMPROVED VERSION")),
    (
        SectionTag::WordAndPhraseSuggestions,
        HeaderRule::ContainsAll(&["WORD", "PHRASE"]),
    ),
];

impl SectionTag {
    /// The header the prompts ask the model to emit for this section.
    pub fn canonical_header(self) -> &'static str {
        match self {
            SectionTag::ClarityScore => "CLARITY SCORE:",
            SectionTag::LogicScore => "LOGIC SCORE:",
            SectionTag::PerspectiveScore => "PERSPECTIVE SCORE:",
            SectionTag::DepthScore => "DEPTH SCORE:",
            SectionTag::Feedback => "FEEDBACK:",
            SectionTag::WordAndPhraseSuggestions => "WORD AND PHRASE SUGGESTIONS:",
            SectionTag::BetterAnswerSuggestions => "BETTER ANSWER SUGGESTIONS:",
            SectionTag::ThoughtProcessGuidance => "THOUGHT PROCESS GUIDANCE:",
            SectionTag::ModelAnswer => "MODEL ANSWER:",
        }
    }

    fn match_score(line: &str) -> Option<(SectionTag, &str)> {
        SCORE_HEADERS
            .iter()
            .find_map(|(tag, header)| line.strip_prefix(header).map(|rest| (*tag, rest)))
    }

    fn match_text(line: &str) -> Option<SectionTag> {
        TEXT_HEADERS
            .iter()
            .find(|(_, rule)| rule.matches(line))
            .map(|(tag, _)| *tag)
    }
}

/// What to do with body text that shows up before any section header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnattributedText {
    /// Drop it. Score explanations that follow a score line land here.
    #[default]
    Discard,
    /// Collect it into `feedback`.
    Feedback,
}

/// Scores and feedback extracted from one rubric reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedEvaluation {
    pub clarity_score: i32,
    pub logic_score: i32,
    pub perspective_score: i32,
    pub depth_score: i32,
    pub feedback: String,
    pub word_and_phrase_suggestions: String,
    pub better_answer_suggestions: String,
    pub thought_process_guidance: String,
    pub model_answer: String,
}

impl Default for ParsedEvaluation {
    fn default() -> Self {
        Self {
            clarity_score: FALLBACK_SCORE,
            logic_score: FALLBACK_SCORE,
            perspective_score: FALLBACK_SCORE,
            depth_score: FALLBACK_SCORE,
            feedback: String::new(),
            word_and_phrase_suggestions: String::new(),
            better_answer_suggestions: String::new(),
            thought_process_guidance: String::new(),
            model_answer: String::new(),
        }
    }
}

impl ParsedEvaluation {
    /// Integer mean of the four scores, rounded toward zero.
    pub fn average_score(&self) -> i32 {
        let sum: i64 = self.scores().iter().map(|&score| i64::from(score)).sum();
        // The mean of four i32 values always fits in an i32.
        i32::try_from(sum / 4).unwrap_or(FALLBACK_SCORE)
    }

    pub fn scores(&self) -> [i32; 4] {
        [
            self.clarity_score,
            self.logic_score,
            self.perspective_score,
            self.depth_score,
        ]
    }

    fn score_mut(&mut self, tag: SectionTag) -> Option<&mut i32> {
        match tag {
            SectionTag::ClarityScore => Some(&mut self.clarity_score),
            SectionTag::LogicScore => Some(&mut self.logic_score),
            SectionTag::PerspectiveScore => Some(&mut self.perspective_score),
            SectionTag::DepthScore => Some(&mut self.depth_score),
            _ => None,
        }
    }

    fn text_mut(&mut self, tag: SectionTag) -> Option<&mut String> {
        match tag {
            SectionTag::Feedback => Some(&mut self.feedback),
            SectionTag::WordAndPhraseSuggestions => Some(&mut self.word_and_phrase_suggestions),
            SectionTag::BetterAnswerSuggestions => Some(&mut self.better_answer_suggestions),
            SectionTag::ThoughtProcessGuidance => Some(&mut self.thought_process_guidance),
            SectionTag::ModelAnswer => Some(&mut self.model_answer),
            _ => None,
        }
    }

    fn trim_text_fields(&mut self) {
        for field in [
            &mut self.feedback,
            &mut self.word_and_phrase_suggestions,
            &mut self.better_answer_suggestions,
            &mut self.thought_process_guidance,
            &mut self.model_answer,
        ] {
            *field = field.trim().to_string();
        }
    }
}

/// Parses a rubric reply, dropping text that precedes every section header.
pub fn parse_evaluation(raw: &str) -> ParsedEvaluation {
    parse_evaluation_with(raw, UnattributedText::Discard)
}

/// Parses a rubric reply with an explicit policy for unattributed text.
pub fn parse_evaluation_with(raw: &str, unattributed: UnattributedText) -> ParsedEvaluation {
    let mut evaluation = ParsedEvaluation::default();
    let mut current: Option<SectionTag> = None;

    for line in raw.split('\n') {
        let line = line.trim();

        if let Some((tag, rest)) = SectionTag::match_score(line) {
            if let Some(score) = evaluation.score_mut(tag) {
                *score = parse_score(rest);
            }
            continue;
        }

        if let Some(tag) = SectionTag::match_text(line) {
            current = Some(tag);
            continue;
        }

        if line.is_empty() {
            continue;
        }

        let target = match (current, unattributed) {
            (Some(tag), _) => evaluation.text_mut(tag),
            (None, UnattributedText::Feedback) => Some(&mut evaluation.feedback),
            (None, UnattributedText::Discard) => None,
        };
        if let Some(field) = target {
            if !field.is_empty() {
                field.push('\n');
            }
            field.push_str(line);
        }
    }

    evaluation.trim_text_fields();
    evaluation
}

// "8 [solid reasoning]" -> 8, anything unreadable -> FALLBACK_SCORE
fn parse_score(rest: &str) -> i32 {
    let value = rest.trim();
    let value = value.split('[').next().unwrap_or_default().trim();
    value.parse().unwrap_or(FALLBACK_SCORE)
}

static FOLLOW_UP_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+\.\s*(.*?)\s*\(Score:\s*\d+\)").expect("follow-up pattern is valid")
});

/// Extracts the question texts from a numbered follow-up list such as
/// `1. Why? (Score: 3)`, in order of appearance.
pub fn parse_follow_up_questions(raw: &str) -> Vec<String> {
    FOLLOW_UP_PATTERN
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

//! Prompt templates sent to the model.
//!
//! Every prompt has an embedded default. A [`PromptBook`] can replace any of
//! them with a custom template keyed by [`PromptKind::key`], which lets the
//! wording be tuned without a rebuild. Templates use `{name}` placeholders.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The length band an answer is expected to fit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerLength {
    Short,
    Medium,
    Long,
}

impl AnswerLength {
    pub fn for_difficulty(difficulty: u8) -> Self {
        match difficulty {
            0..=3 => AnswerLength::Short,
            4..=7 => AnswerLength::Medium,
            _ => AnswerLength::Long,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AnswerLength::Short => "Short (1-3 sentences)",
            AnswerLength::Medium => "Medium (4-6 sentences)",
            AnswerLength::Long => "Long (7+ sentences)",
        }
    }

    /// Extra instruction appended to evaluation prompts.
    pub fn feedback_guidance(self) -> &'static str {
        match self {
            AnswerLength::Short => "Keep feedback concise and focused on key improvements.",
            AnswerLength::Medium => "Provide balanced feedback covering multiple aspects.",
            AnswerLength::Long => "Offer comprehensive feedback with detailed suggestions.",
        }
    }
}

impl fmt::Display for AnswerLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnswerLength::Short => "Short",
            AnswerLength::Medium => "Medium",
            AnswerLength::Long => "Long",
        };
        f.write_str(name)
    }
}

/// The user's length setting. `Auto` derives the band from the difficulty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LengthPreference {
    #[default]
    Auto,
    Short,
    Medium,
    Long,
}

impl LengthPreference {
    pub fn resolve(self, difficulty: u8) -> AnswerLength {
        match self {
            LengthPreference::Auto => AnswerLength::for_difficulty(difficulty),
            LengthPreference::Short => AnswerLength::Short,
            LengthPreference::Medium => AnswerLength::Medium,
            LengthPreference::Long => AnswerLength::Long,
        }
    }

    /// Parses a setting name case-insensitively. Unknown names mean `Auto`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "short" => LengthPreference::Short,
            "medium" => LengthPreference::Medium,
            "long" => LengthPreference::Long,
            _ => LengthPreference::Auto,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptKind {
    GenerateQuestion,
    EvaluateAnswer,
    FollowUpQuestions,
    ImproveText,
    RandomFact,
    MetacognitiveGuidance,
}

impl PromptKind {
    pub const ALL: [PromptKind; 6] = [
        PromptKind::GenerateQuestion,
        PromptKind::EvaluateAnswer,
        PromptKind::FollowUpQuestions,
        PromptKind::ImproveText,
        PromptKind::RandomFact,
        PromptKind::MetacognitiveGuidance,
    ];

    /// Name used to look up an override, e.g. the file stem `evaluate_answer`.
    pub fn key(self) -> &'static str {
        match self {
            PromptKind::GenerateQuestion => "generate_question",
            PromptKind::EvaluateAnswer => "evaluate_answer",
            PromptKind::FollowUpQuestions => "follow_up_questions",
            PromptKind::ImproveText => "improve_text",
            PromptKind::RandomFact => "random_fact",
            PromptKind::MetacognitiveGuidance => "metacognitive_guidance",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    fn default_template(self) -> &'static str {
        match self {
            PromptKind::GenerateQuestion => GENERATE_QUESTION,
            PromptKind::EvaluateAnswer => EVALUATE_ANSWER,
            PromptKind::FollowUpQuestions => FOLLOW_UP_QUESTIONS,
            PromptKind::ImproveText => IMPROVE_TEXT,
            PromptKind::RandomFact => RANDOM_FACT,
            PromptKind::MetacognitiveGuidance => METACOGNITIVE_GUIDANCE,
        }
    }
}

/// The set of templates in use, defaults plus any overrides.
#[derive(Debug, Clone, Default)]
pub struct PromptBook {
    overrides: HashMap<PromptKind, String>,
}

impl PromptBook {
    /// Builds a book from `key -> template` pairs. Unknown keys are ignored
    /// and returned so the caller can report them.
    pub fn with_overrides(templates: HashMap<String, String>) -> (Self, Vec<String>) {
        let mut overrides = HashMap::new();
        let mut unknown = Vec::new();
        for (key, template) in templates {
            match PromptKind::from_key(&key) {
                Some(kind) => {
                    overrides.insert(kind, template);
                }
                None => unknown.push(key),
            }
        }
        unknown.sort();
        (Self { overrides }, unknown)
    }

    pub fn template(&self, kind: PromptKind) -> &str {
        self.overrides
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_template())
    }

    pub fn is_overridden(&self, kind: PromptKind) -> bool {
        self.overrides.contains_key(&kind)
    }

    pub fn generate_question(&self, difficulty: u8, category: &str, length: AnswerLength) -> String {
        let difficulty = difficulty.to_string();
        render(
            self.template(PromptKind::GenerateQuestion),
            &[
                ("difficulty", difficulty.as_str()),
                ("category", category),
                ("expected_length", length.label()),
            ],
        )
    }

    pub fn evaluate_answer(&self, question: &str, answer: &str, length: AnswerLength) -> String {
        let expected_length = length.to_string();
        render(
            self.template(PromptKind::EvaluateAnswer),
            &[
                ("question", question),
                ("answer", answer),
                ("expected_length", expected_length.as_str()),
                ("length_guidance", length.feedback_guidance()),
            ],
        )
    }

    pub fn follow_up_questions(&self, question: &str, answer: &str) -> String {
        render(
            self.template(PromptKind::FollowUpQuestions),
            &[("question", question), ("answer", answer)],
        )
    }

    pub fn improve_text(&self, text: &str, text_type: &str) -> String {
        render(
            self.template(PromptKind::ImproveText),
            &[("text", text), ("text_type", text_type)],
        )
    }

    pub fn random_fact(&self, category: &str) -> String {
        render(self.template(PromptKind::RandomFact), &[("category", category)])
    }

    pub fn metacognitive_guidance(&self, input: &str) -> String {
        render(
            self.template(PromptKind::MetacognitiveGuidance),
            &[("input", input)],
        )
    }
}

/// Replaces `{name}` with its value in a single left-to-right pass, so values
/// that themselves contain braces are never expanded again. Unknown
/// placeholders are kept verbatim.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let replaced = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

const GENERATE_QUESTION: &str = r#"You are a critical thinking coach. The user is practicing how to think clearly and communicate responses effectively.

Generate one thought-provoking question at difficulty level {difficulty} (where 1 is very basic and 10 is extremely complex).

Category: {category}
Expected Answer Length: {expected_length}

Requirements:
- Focus the question on reasoning, trade-offs, or clear explanation
- Make it engaging and thought-provoking
- Avoid yes/no questions
- Ensure the question is relevant to the {category} category
- Design the question so it can be answered appropriately in {expected_length}

Format your response as just the question text, nothing else."#;

const EVALUATE_ANSWER: &str = r#"You are an expert critical thinking evaluator. Analyze the following answer to a critical thinking question.

QUESTION: {question}
USER'S ANSWER: {answer}
Expected Length: {expected_length}
{length_guidance}

Please provide a comprehensive evaluation in the following format:

CLARITY SCORE: [1-10]
[Brief explanation of clarity score]

LOGIC SCORE: [1-10]
[Brief explanation of logic score]

PERSPECTIVE SCORE: [1-10]
[Brief explanation of perspective score]

DEPTH SCORE: [1-10]
[Brief explanation of depth score]

FEEDBACK:
[Constructive feedback on clarity, logic, perspective and depth, including length appropriateness.]

WORD AND PHRASE SUGGESTIONS:
[3-5 more precise words or phrases that could replace weaker language in the answer.]

BETTER ANSWER SUGGESTIONS:
[2-3 specific, concrete ways to improve the answer.]

THOUGHT PROCESS GUIDANCE:
[2-3 frameworks or step-by-step approaches for tackling similar problems.]

MODEL ANSWER:
[A well-structured model answer within the expected length.]"#;

const FOLLOW_UP_QUESTIONS: &str = r#"Based on the original question and the user's answer, generate 3 follow-up questions that would help deepen their understanding and critical thinking.

Original Question: {question}
User's Answer: {answer}

Generate 3 follow-up questions that:
1. Challenge assumptions made in the answer
2. Explore alternative perspectives
3. Apply the reasoning to a different context

Format your response as:
1. [Question text] (Score: [difficulty 1-10])
2. [Question text] (Score: [difficulty 1-10])
3. [Question text] (Score: [difficulty 1-10])

Make the questions progressively more challenging."#;

const IMPROVE_TEXT: &str = r#"You are an expert writing coach. Analyze the following text and provide comprehensive feedback for improvement.

TEXT TYPE: {text_type}
USER'S TEXT: {text}

You MUST provide ALL 9 sections below. Each section must start with the exact header shown.

CLARITY SCORE: [1-10]
LOGIC SCORE: [1-10]
PERSPECTIVE SCORE: [1-10]
DEPTH SCORE: [1-10]

FEEDBACK:
[Specific feedback on structure, clarity and overall effectiveness.]

WORD AND PHRASE SUGGESTIONS:
[5-7 replacements, formatted as "Instead of X, use Y".]

BETTER ANSWER SUGGESTIONS:
[2-3 specific, actionable improvements.]

THOUGHT PROCESS GUIDANCE:
[2-3 ways to improve the writing process for similar texts.]

MODEL ANSWER:
[A complete rewrite that demonstrates best practices.]"#;

const RANDOM_FACT: &str = r#"You are an expert educator and knowledge curator. Generate an interesting, educational random fact from the {category} category.

Requirements:
- Make it genuinely interesting and surprising
- Keep it concise (2-3 sentences maximum)
- Ensure it's accurate
- Focus on lesser-known facts rather than common knowledge
- Include a brief explanation of why it's interesting

Format your response as just the fact with its brief explanation, nothing else."#;

const METACOGNITIVE_GUIDANCE: &str = r#"You are an expert in metacognition and cognitive psychology. The user has described a task or problem they need to solve. Provide metacognitive strategies and thinking techniques to help them approach it more effectively.

User's description: {input}

Include:
1. Problem Analysis: break the problem into manageable components
2. Metacognitive Strategies: self-questioning, planning and monitoring, reflection
3. Thinking Frameworks: first principles, systems thinking, design thinking
4. Practical Steps: actionable next steps
5. Self-Monitoring: ways to track progress and adjust

Use clear headings and bullet points. Be encouraging and practical."#;

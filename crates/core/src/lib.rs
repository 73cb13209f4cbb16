pub mod coach;
pub mod evaluation;
pub mod offline;
pub mod practice;
pub mod prompts;
pub mod stats;
pub mod streak;

pub use coach::{Coach, CoachClient, CoachConfig};
pub use evaluation::{ParsedEvaluation, parse_evaluation, parse_follow_up_questions};
pub use offline::OfflineCoach;
pub use prompts::{AnswerLength, LengthPreference, PromptBook};

pub mod answer;
pub mod attempt;
pub mod question;

pub use answer::AnswerState;
pub use attempt::{remaining_min_to_ms, Attempt, AttemptStatus, SubmitReason};
pub use question::{
    QuestionContent, QuestionOption, QuestionRef, QuestionType, QuestionView, Section,
};

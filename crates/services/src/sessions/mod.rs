mod countdown;
mod workflow;

pub use countdown::ExamCountdown;
pub use workflow::{ExamOutcome, Explanation, StudyService};

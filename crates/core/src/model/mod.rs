mod document;
mod ids;
mod record;
mod topic;

pub use document::ProgressDocument;
pub use ids::{LearnerId, LearnerIdError, TopicKey};
pub use record::{NewSkillRecord, QuestionResult, RecordError, RecordKind, SkillRecord};
pub use topic::{ExerciseState, TopicProgress};

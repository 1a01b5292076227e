//! StudyBuddy: an educational practice app connecting teachers who author
//! exercises with students who attempt them, assisted by an AI tutor that
//! generates step-by-step hints and personalized encouragement.
//!
//! The adaptive feedback core is [`attempt::PracticeSession`] (the
//! per-exercise attempt state machine) backed by [`gateway::AiGateway`] (the
//! rate-limited, schema-validated bridge to the generation service). AI
//! failures degrade silently: the student keeps practicing, the explanation
//! panel simply does not appear.

pub mod attempt;
pub mod catalog;
pub mod gateway;
pub mod gemini;
pub mod progress;
pub mod prompts;
pub mod roster;
pub mod session;
pub mod settings;

pub use attempt::{AttemptOutcome, AttemptRecord, EscalationPolicy, PracticeSession, Submission};
pub use catalog::{Exercise, ExerciseCatalog, ExerciseDraft, Level};
pub use gateway::{AiGateway, AiOutcome, GeneratedExercise, SimilarExercise};
pub use gemini::{GeminiClient, GenerateService};
pub use progress::{ProgressLedger, SEEDS_PER_CORRECT};
pub use roster::{AppUser, Student, StudentKey, StudentRoster, Teacher};
pub use settings::Settings;

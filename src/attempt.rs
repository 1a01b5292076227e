//! Per-exercise attempt state machine. Evaluates submissions, applies
//! first-correct credit through the ledger, and escalates to an AI-generated
//! explanation after repeated failure. Submissions are processed one at a
//! time; the only suspension point is the gateway call, and the session lock
//! is never held across it, so other exercises stay interactive while an
//! explanation is in flight.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::Exercise;
use crate::gateway::{AiGateway, AiOutcome};
use crate::progress::ProgressLedger;
use crate::prompts::PersonalizedFeedbackInput;
use crate::roster::{StudentKey, StudentRoster};

/// Consecutive wrong submissions before an explanation is requested.
pub const ESCALATION_THRESHOLD: u32 = 2;

const CORRECT_MESSAGE: &str = "Wonderful!";
const RETRY_MESSAGE: &str = "Try again - you can do it!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AttemptOutcome {
    Unanswered,
    Correct,
    Incorrect,
}

impl Default for AttemptOutcome {
    fn default() -> Self {
        AttemptOutcome::Unanswered
    }
}

/// Whether a wrong streak asks for one explanation or a fresh one per
/// attempt. The default keeps the first explanation sticky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EscalationPolicy {
    #[default]
    OncePerStreak,
    EveryAttempt,
}

/// Ephemeral per-exercise attempt state, created lazily on first submission
/// and discarded when the topic view is exited.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AttemptRecord {
    pub attempt_count: u32,
    pub last_outcome: AttemptOutcome,
    pub explanation: Option<String>,
    pub explanation_in_flight: bool,
    /// Transient banner message; cleared when the student edits their answer.
    pub feedback: Option<String>,
    #[serde(skip)]
    escalated: bool,
}

/// What a single submission produced, for the presentation layer to render.
#[derive(Debug, Clone)]
pub struct Submission {
    pub outcome: AttemptOutcome,
    pub message: String,
    /// One-shot celebration signal; a no-op if nothing observes it.
    pub celebrate: bool,
    pub credited: bool,
    /// An explanation request was issued for this submission.
    pub escalated: bool,
}

#[derive(Default)]
struct SessionState {
    records: HashMap<String, AttemptRecord>,
    ledger: ProgressLedger,
    total_errors: u32,
}

/// One student's practice session. Holds the attempt records, the credit
/// ledger, and the shared gateway handle.
pub struct PracticeSession {
    pub id: String,
    pub student: StudentKey,
    pub started_at: DateTime<Utc>,
    roster: Arc<StudentRoster>,
    gateway: AiGateway,
    policy: EscalationPolicy,
    inner: Mutex<SessionState>,
}

fn answers_match(submitted: &str, canonical: &str) -> bool {
    submitted.trim().to_lowercase() == canonical.trim().to_lowercase()
}

impl PracticeSession {
    pub fn new(
        student: StudentKey,
        roster: Arc<StudentRoster>,
        gateway: AiGateway,
        policy: EscalationPolicy,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            student,
            started_at: Utc::now(),
            roster,
            gateway,
            policy,
            inner: Mutex::new(SessionState::default()),
        }
    }

    /// Evaluates one submitted answer. Correctness checking and crediting
    /// complete synchronously before this returns control to the event loop;
    /// only explanation generation awaits.
    pub async fn submit(&self, exercise: &Exercise, raw_answer: &str) -> Submission {
        let correct = answers_match(raw_answer, &exercise.answer);

        let (submission, escalate) = {
            let mut guard = self.inner.lock();
            let state = &mut *guard;

            if correct {
                {
                    let record = state.records.entry(exercise.id.clone()).or_default();
                    record.attempt_count = 0;
                    record.last_outcome = AttemptOutcome::Correct;
                    record.escalated = false;
                    record.feedback = Some(CORRECT_MESSAGE.to_string());
                }
                let credited =
                    state
                        .ledger
                        .credit_first_correct(&self.roster, &self.student, &exercise.id);

                (
                    Submission {
                        outcome: AttemptOutcome::Correct,
                        message: CORRECT_MESSAGE.to_string(),
                        celebrate: true,
                        credited,
                        escalated: false,
                    },
                    false,
                )
            } else {
                state.total_errors += 1;
                let record = state.records.entry(exercise.id.clone()).or_default();
                record.attempt_count += 1;
                record.last_outcome = AttemptOutcome::Incorrect;
                record.feedback = Some(RETRY_MESSAGE.to_string());

                let escalate = record.attempt_count >= ESCALATION_THRESHOLD
                    && match self.policy {
                        EscalationPolicy::OncePerStreak => !record.escalated,
                        EscalationPolicy::EveryAttempt => true,
                    };
                if escalate {
                    record.escalated = true;
                    record.explanation_in_flight = true;
                    info!(
                        "Escalating exercise {} after {} wrong attempts",
                        exercise.id, record.attempt_count
                    );
                }

                (
                    Submission {
                        outcome: AttemptOutcome::Incorrect,
                        message: RETRY_MESSAGE.to_string(),
                        celebrate: false,
                        credited: false,
                        escalated: escalate,
                    },
                    escalate,
                )
            }
        };

        if escalate {
            let explanation = self.gateway.generate_explanation(exercise, raw_answer).await;

            let mut state = self.inner.lock();
            match state.records.get_mut(&exercise.id) {
                Some(record) => {
                    record.explanation_in_flight = false;
                    if let AiOutcome::Success(text) = explanation {
                        record.explanation = Some(text);
                    }
                }
                None => {
                    // The student left the topic while the call was in
                    // flight; the late result has nowhere to land.
                    info!(
                        "Dropping explanation for discarded exercise view {}",
                        exercise.id
                    );
                }
            }
        }

        submission
    }

    /// Clears the transient feedback banner when the student edits their
    /// answer before resubmitting. Stored explanations survive.
    pub fn answer_changed(&self, exercise_id: &str) {
        let mut state = self.inner.lock();
        if let Some(record) = state.records.get_mut(exercise_id) {
            record.feedback = None;
        }
    }

    pub fn snapshot(&self, exercise_id: &str) -> Option<AttemptRecord> {
        self.inner.lock().records.get(exercise_id).cloned()
    }

    /// How many of the given exercises the student has currently solved.
    pub fn correct_count(&self, exercises: &[Exercise]) -> usize {
        let state = self.inner.lock();
        exercises
            .iter()
            .filter(|ex| {
                state
                    .records
                    .get(&ex.id)
                    .map(|record| record.last_outcome == AttemptOutcome::Correct)
                    .unwrap_or(false)
            })
            .count()
    }

    pub fn total_errors(&self) -> u32 {
        self.inner.lock().total_errors
    }

    pub fn credited_count(&self) -> usize {
        self.inner.lock().ledger.credited_count()
    }

    /// Discards the ephemeral attempt records when the topic view is exited.
    /// The credit ledger is session-scoped and survives, so re-entering a
    /// topic cannot earn a second credit for the same exercise.
    pub fn exit_topic(&self) {
        let mut state = self.inner.lock();
        let dropped = state.records.len();
        state.records.clear();
        info!("Cleared {} attempt records on topic exit", dropped);
    }

    /// Requests a short personalized encouragement message built from this
    /// session's timing and error count.
    pub async fn request_encouragement(&self, topic: &str, skill: &str) -> AiOutcome<String> {
        let student_name = self
            .roster
            .find_by_key(&self.student)
            .map(|s| s.name)
            .unwrap_or_else(|| self.student.name().to_string());

        let input = PersonalizedFeedbackInput {
            student_name,
            topic: topic.to_string(),
            skill: skill.to_string(),
            time_taken_secs: (Utc::now() - self.started_at).num_seconds().max(0) as u64,
            errors: self.total_errors(),
        };

        self.gateway.generate_personalized_feedback(&input).await
    }
}

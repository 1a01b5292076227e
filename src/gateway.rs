//! Rate-limited AI gateway. Every outbound generation request passes through
//! one shared cooldown gate, and every response is parsed against the shape
//! its intent declared. Callers never see an error: a call either succeeds
//! with a typed payload or degrades to an absent result.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{info, warn};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::catalog::{Exercise, Level};
use crate::gemini::GenerateService;
use crate::prompts::{
    self, AiRequest, ExplanationPayload, FeedbackPayload, GeneratedExercisePayload,
    PersonalizedFeedbackInput, QuestionsPayload, ReviewTopicsPayload, SimilarExercisePayload,
    SUGGESTION_COUNT,
};

/// Minimum spacing between admitted generation requests.
pub const DEFAULT_COOLDOWN_MS: u64 = 2000;

/// Outcome of a gateway call. `Degraded` covers cooldown rejection, malformed
/// responses and transport failures alike; callers only learn whether a
/// payload arrived, never why one did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiOutcome<T> {
    Success(T),
    Degraded,
}

impl<T> AiOutcome<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            AiOutcome::Success(value) => Some(value),
            AiOutcome::Degraded => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, AiOutcome::Degraded)
    }

    fn map<U>(self, f: impl FnOnce(T) -> U) -> AiOutcome<U> {
        match self {
            AiOutcome::Success(value) => AiOutcome::Success(f(value)),
            AiOutcome::Degraded => AiOutcome::Degraded,
        }
    }
}

/// Internal failure taxonomy. Collapsed into [`AiOutcome::Degraded`] before
/// anything leaves the gateway.
#[derive(Debug, Error)]
enum GatewayError {
    #[error("cooldown active, request not sent")]
    RateLimited,
    #[error("response failed schema validation: {0}")]
    MalformedResponse(#[from] serde_json::Error),
    #[error("generation service failure: {0}")]
    Transport(#[from] anyhow::Error),
}

/// A practice item produced by the similar-exercise intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimilarExercise {
    pub question: String,
    pub answer: String,
}

/// A complete exercise produced by the authoring intent, without an id; the
/// catalog assigns one when the teacher accepts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedExercise {
    pub question: String,
    pub answer: String,
    pub hint: String,
}

#[derive(Clone)]
pub struct AiGateway {
    service: Arc<dyn GenerateService>,
    cooldown: Duration,
    last_call: Arc<Mutex<Option<Instant>>>,
}

impl AiGateway {
    pub fn new(service: Arc<dyn GenerateService>, cooldown: Duration) -> Self {
        Self {
            service,
            cooldown,
            last_call: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_default_cooldown(service: Arc<dyn GenerateService>) -> Self {
        Self::new(service, Duration::from_millis(DEFAULT_COOLDOWN_MS))
    }

    /// Admission check and stamp under a single lock acquisition, so two
    /// near-simultaneous calls cannot both pass. The timestamp is written
    /// before the request goes out, which keeps a second call from slipping
    /// through while the first is still in flight.
    fn admit(&self) -> bool {
        let mut last_call = self.last_call.lock();
        if let Some(stamp) = *last_call {
            if stamp.elapsed() < self.cooldown {
                return false;
            }
        }
        *last_call = Some(Instant::now());
        true
    }

    async fn invoke<T: DeserializeOwned>(&self, request: AiRequest) -> AiOutcome<T> {
        match self.try_invoke(request).await {
            Ok(payload) => AiOutcome::Success(payload),
            Err(GatewayError::RateLimited) => {
                info!("Rate limited: please wait before making another AI request");
                AiOutcome::Degraded
            }
            Err(err) => {
                warn!("AI request degraded: {}", err);
                AiOutcome::Degraded
            }
        }
    }

    async fn try_invoke<T: DeserializeOwned>(&self, request: AiRequest) -> Result<T, GatewayError> {
        if !self.admit() {
            return Err(GatewayError::RateLimited);
        }

        let raw = self
            .service
            .generate(request.prompt, request.schema)
            .await
            .map_err(GatewayError::Transport)?;

        let payload = serde_json::from_str::<T>(raw.trim())?;
        Ok(payload)
    }

    /// Socratic hint for a student who answered wrong twice in a row.
    pub async fn generate_explanation(
        &self,
        exercise: &Exercise,
        wrong_answer: &str,
    ) -> AiOutcome<String> {
        self.invoke::<ExplanationPayload>(prompts::explanation(exercise, wrong_answer))
            .await
            .map(|payload| payload.explanation)
    }

    pub async fn generate_similar_exercise(&self, exercise: &Exercise) -> AiOutcome<SimilarExercise> {
        match self
            .invoke::<SimilarExercisePayload>(prompts::similar_exercise(exercise))
            .await
        {
            AiOutcome::Success(payload)
                if !payload.new_question.trim().is_empty()
                    && !payload.new_answer.trim().is_empty() =>
            {
                AiOutcome::Success(SimilarExercise {
                    question: payload.new_question,
                    answer: payload.new_answer,
                })
            }
            AiOutcome::Success(_) => {
                warn!("Similar-exercise response had empty question or answer");
                AiOutcome::Degraded
            }
            AiOutcome::Degraded => AiOutcome::Degraded,
        }
    }

    pub async fn suggest_review_topics(&self, exercise: &Exercise) -> AiOutcome<Vec<String>> {
        match self
            .invoke::<ReviewTopicsPayload>(prompts::review_topics(exercise))
            .await
        {
            AiOutcome::Success(payload) if payload.suggestions.len() == SUGGESTION_COUNT => {
                AiOutcome::Success(payload.suggestions)
            }
            AiOutcome::Success(payload) => {
                warn!(
                    "Review suggestions had {} entries, expected {}",
                    payload.suggestions.len(),
                    SUGGESTION_COUNT
                );
                AiOutcome::Degraded
            }
            AiOutcome::Degraded => AiOutcome::Degraded,
        }
    }

    pub async fn generate_personalized_feedback(
        &self,
        input: &PersonalizedFeedbackInput,
    ) -> AiOutcome<String> {
        self.invoke::<FeedbackPayload>(prompts::personalized_feedback(input))
            .await
            .map(|payload| payload.feedback)
    }

    pub async fn suggest_questions_for_topic(&self, topic: &str) -> AiOutcome<Vec<String>> {
        match self
            .invoke::<QuestionsPayload>(prompts::questions_for_topic(topic))
            .await
        {
            AiOutcome::Success(payload) if payload.questions.len() == SUGGESTION_COUNT => {
                AiOutcome::Success(payload.questions)
            }
            AiOutcome::Success(payload) => {
                warn!(
                    "Question suggestions had {} entries, expected {}",
                    payload.questions.len(),
                    SUGGESTION_COUNT
                );
                AiOutcome::Degraded
            }
            AiOutcome::Degraded => AiOutcome::Degraded,
        }
    }

    pub async fn generate_exercise_for_topic(
        &self,
        topic: &str,
        grade: &str,
        skill: &str,
        level: Level,
    ) -> AiOutcome<GeneratedExercise> {
        match self
            .invoke::<GeneratedExercisePayload>(prompts::exercise_for_topic(
                topic, grade, skill, level,
            ))
            .await
        {
            AiOutcome::Success(payload)
                if !payload.question.trim().is_empty() && !payload.answer.trim().is_empty() =>
            {
                AiOutcome::Success(GeneratedExercise {
                    question: payload.question,
                    answer: payload.answer,
                    hint: payload.hint,
                })
            }
            AiOutcome::Success(_) => {
                warn!("Generated exercise had empty question or answer");
                AiOutcome::Degraded
            }
            AiOutcome::Degraded => AiOutcome::Degraded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ExerciseCatalog, ExerciseDraft};
    use anyhow::Result;
    use futures::future::BoxFuture;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Test double for the generation service: returns a canned response and
    /// counts how many requests actually reached it.
    struct ScriptedService {
        response: Result<String, String>,
        calls: AtomicUsize,
    }

    impl ScriptedService {
        fn ok(response: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Ok(response.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                response: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl GenerateService for ScriptedService {
        fn generate(&self, _prompt: String, _schema: Value) -> BoxFuture<'_, Result<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let response = self.response.clone();
            Box::pin(async move { response.map_err(|message| anyhow::anyhow!(message)) })
        }
    }

    fn sample_exercise() -> Exercise {
        ExerciseCatalog::new().add(ExerciseDraft {
            topic: "Math".to_string(),
            grade: "Grade 1".to_string(),
            skill: "Addition up to 10".to_string(),
            level: Level::Basic,
            question: "2 + 5 = ?".to_string(),
            answer: "7".to_string(),
            hint: String::new(),
        })
    }

    #[tokio::test]
    async fn test_successful_explanation_call() {
        let service = ScriptedService::ok(r#"{"explanation": "Count up from 5."}"#);
        let gateway = AiGateway::new(service.clone(), Duration::ZERO);

        let outcome = gateway.generate_explanation(&sample_exercise(), "8").await;
        assert_eq!(outcome, AiOutcome::Success("Count up from 5.".to_string()));
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn test_cooldown_rejects_second_call_without_sending_it() {
        let service = ScriptedService::ok(r#"{"explanation": "hint"}"#);
        let gateway = AiGateway::new(service.clone(), Duration::from_millis(100));
        let exercise = sample_exercise();

        let first = gateway.generate_explanation(&exercise, "8").await;
        let second = gateway.generate_explanation(&exercise, "9").await;

        assert!(!first.is_degraded());
        assert!(second.is_degraded());
        assert_eq!(service.call_count(), 1);
    }

    #[tokio::test]
    async fn test_call_admitted_after_cooldown_elapses() {
        let service = ScriptedService::ok(r#"{"explanation": "hint"}"#);
        let gateway = AiGateway::new(service.clone(), Duration::from_millis(50));
        let exercise = sample_exercise();

        let first = gateway.generate_explanation(&exercise, "8").await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        let second = gateway.generate_explanation(&exercise, "9").await;

        assert!(!first.is_degraded());
        assert!(!second.is_degraded());
        assert_eq!(service.call_count(), 2);
    }

    #[tokio::test]
    async fn test_missing_required_field_degrades() {
        let service = ScriptedService::ok(r#"{"note": "not an explanation"}"#);
        let gateway = AiGateway::new(service, Duration::ZERO);

        let outcome = gateway.generate_explanation(&sample_exercise(), "8").await;
        assert!(outcome.is_degraded());
    }

    #[tokio::test]
    async fn test_wrongly_shaped_field_degrades() {
        let service = ScriptedService::ok(r#"{"explanation": 42}"#);
        let gateway = AiGateway::new(service, Duration::ZERO);

        let outcome = gateway.generate_explanation(&sample_exercise(), "8").await;
        assert!(outcome.is_degraded());
    }

    #[tokio::test]
    async fn test_transport_failure_degrades_instead_of_erroring() {
        let service = ScriptedService::failing("service unreachable");
        let gateway = AiGateway::new(service, Duration::ZERO);

        let outcome = gateway.generate_explanation(&sample_exercise(), "8").await;
        assert!(outcome.is_degraded());
    }

    #[tokio::test]
    async fn test_review_topics_requires_exactly_three_suggestions() {
        let short = ScriptedService::ok(r#"{"suggestions": ["only one"]}"#);
        let gateway = AiGateway::new(short, Duration::ZERO);
        assert!(gateway.suggest_review_topics(&sample_exercise()).await.is_degraded());

        let full = ScriptedService::ok(r#"{"suggestions": ["counting", "number bonds", "place value"]}"#);
        let gateway = AiGateway::new(full, Duration::ZERO);
        let outcome = gateway.suggest_review_topics(&sample_exercise()).await;
        assert_eq!(
            outcome,
            AiOutcome::Success(vec![
                "counting".to_string(),
                "number bonds".to_string(),
                "place value".to_string(),
            ])
        );
    }

    #[tokio::test]
    async fn test_similar_exercise_maps_response_keys() {
        let service =
            ScriptedService::ok(r#"{"newQuestion": "3 + 4 = ?", "newAnswer": "7"}"#);
        let gateway = AiGateway::new(service, Duration::ZERO);

        let outcome = gateway.generate_similar_exercise(&sample_exercise()).await;
        assert_eq!(
            outcome,
            AiOutcome::Success(SimilarExercise {
                question: "3 + 4 = ?".to_string(),
                answer: "7".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_generated_exercise_with_empty_answer_degrades() {
        let service = ScriptedService::ok(r#"{"question": "What is 2 + 2?", "answer": "  "}"#);
        let gateway = AiGateway::new(service, Duration::ZERO);

        let outcome = gateway
            .generate_exercise_for_topic("Math", "Grade 1", "Addition", Level::Basic)
            .await;
        assert!(outcome.is_degraded());
    }

    #[tokio::test]
    async fn test_generated_exercise_hint_defaults_to_empty() {
        let service = ScriptedService::ok(r#"{"question": "What is 2 + 2?", "answer": "4"}"#);
        let gateway = AiGateway::new(service, Duration::ZERO);

        let outcome = gateway
            .generate_exercise_for_topic("Math", "Grade 1", "Addition", Level::Basic)
            .await;
        assert_eq!(
            outcome,
            AiOutcome::Success(GeneratedExercise {
                question: "What is 2 + 2?".to_string(),
                answer: "4".to_string(),
                hint: String::new(),
            })
        );
    }
}

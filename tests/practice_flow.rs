//! End-to-end flow: a student signs in, works through a topic, struggles on
//! one exercise until the tutor steps in, and earns credit exactly once per
//! solved exercise.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures::future::BoxFuture;
use serde_json::Value;

use studybuddy::attempt::EscalationPolicy;
use studybuddy::catalog::seed_catalog;
use studybuddy::gateway::AiGateway;
use studybuddy::gemini::GenerateService;
use studybuddy::roster::{seed_roster, StudentKey};
use studybuddy::session;
use studybuddy::{AiOutcome, AttemptOutcome};

struct StubTutor {
    calls: AtomicUsize,
}

impl StubTutor {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }

    fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GenerateService for StubTutor {
    fn generate(&self, prompt: String, _schema: Value) -> BoxFuture<'_, Result<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            if prompt.contains("explanation") {
                Ok(r#"{"explanation": "Think about what 8 plus one more is."}"#.to_string())
            } else {
                Ok(r#"{"feedback": "Great effort today, Ben! Take a breath and keep going."}"#.to_string())
            }
        })
    }
}

#[tokio::test]
async fn test_full_practice_session_flow() {
    let tutor = StubTutor::new();
    let roster = Arc::new(seed_roster());
    let catalog = seed_catalog();
    let gateway = AiGateway::new(tutor.clone(), Duration::ZERO);

    let key = StudentKey::new("ben tran", "class 4a");
    let seeds_before = roster.find_by_key(&key).unwrap().knowledge_seeds;

    let practice = session::start_session(
        key.clone(),
        roster.clone(),
        gateway,
        EscalationPolicy::default(),
    );
    assert!(session::get_session(&practice.id).is_some());

    let math = catalog.by_topic("Math");
    assert_eq!(math.len(), 3);

    // First exercise solved on the first try.
    let first = practice.submit(&math[0], " 7 ").await;
    assert_eq!(first.outcome, AttemptOutcome::Correct);
    assert!(first.credited);
    assert!(first.celebrate);

    // Second exercise takes three attempts; the tutor steps in on the second
    // wrong answer and the explanation stays available afterwards.
    let wrong = practice.submit(&math[1], "8").await;
    assert_eq!(wrong.outcome, AttemptOutcome::Incorrect);
    assert!(!wrong.escalated);
    assert_eq!(tutor.call_count(), 0);

    let escalated = practice.submit(&math[1], "10").await;
    assert!(escalated.escalated);
    assert_eq!(tutor.call_count(), 1);

    let record = practice.snapshot(&math[1].id).expect("record exists");
    assert_eq!(
        record.explanation.as_deref(),
        Some("Think about what 8 plus one more is.")
    );

    let solved = practice.submit(&math[1], "9").await;
    assert_eq!(solved.outcome, AttemptOutcome::Correct);
    assert!(solved.credited);

    // Two exercises solved, each credited exactly once.
    assert_eq!(practice.correct_count(&math), 2);
    let student = roster.find_by_key(&key).unwrap();
    assert_eq!(student.knowledge_seeds, seeds_before + 20);
    assert_eq!(student.current_week_correct, 12 + 2);

    // Session-level encouragement draws on accumulated error count.
    assert_eq!(practice.total_errors(), 2);
    let encouragement = practice
        .request_encouragement("Math", "Addition up to 10")
        .await;
    assert_eq!(
        encouragement,
        AiOutcome::Success(
            "Great effort today, Ben! Take a breath and keep going.".to_string()
        )
    );

    // Leaving the topic clears attempt records but solved credit is final:
    // solving the same exercise again earns nothing new.
    practice.exit_topic();
    assert!(practice.snapshot(&math[0].id).is_none());
    let resolved = practice.submit(&math[0], "7").await;
    assert_eq!(resolved.outcome, AttemptOutcome::Correct);
    assert!(!resolved.credited);

    session::end_session(&practice.id);
    assert!(session::get_session(&practice.id).is_none());
}

//! Process-wide registry of active practice sessions.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use log::info;
use parking_lot::Mutex;

use crate::attempt::{EscalationPolicy, PracticeSession};
use crate::gateway::AiGateway;
use crate::roster::{StudentKey, StudentRoster};

lazy_static! {
    static ref ACTIVE_SESSIONS: Mutex<HashMap<String, Arc<PracticeSession>>> =
        Mutex::new(HashMap::new());
}

/// Creates a session for the given student, registers it, and returns it.
pub fn start_session(
    student: StudentKey,
    roster: Arc<StudentRoster>,
    gateway: AiGateway,
    policy: EscalationPolicy,
) -> Arc<PracticeSession> {
    let session = Arc::new(PracticeSession::new(student, roster, gateway, policy));
    let mut sessions = ACTIVE_SESSIONS.lock();
    sessions.insert(session.id.clone(), session.clone());
    info!(
        "Started practice session {} ({} active)",
        session.id,
        sessions.len()
    );
    session
}

pub fn get_session(session_id: &str) -> Option<Arc<PracticeSession>> {
    ACTIVE_SESSIONS.lock().get(session_id).cloned()
}

/// Removes the session from the registry; any in-flight AI result for it is
/// dropped when it resolves.
pub fn end_session(session_id: &str) -> Option<Arc<PracticeSession>> {
    let removed = ACTIVE_SESSIONS.lock().remove(session_id);
    if removed.is_some() {
        info!("Ended practice session {}", session_id);
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::GenerateService;
    use anyhow::Result;
    use futures::future::BoxFuture;
    use serde_json::Value;
    use std::time::Duration;

    struct NullService;

    impl GenerateService for NullService {
        fn generate(&self, _prompt: String, _schema: Value) -> BoxFuture<'_, Result<String>> {
            Box::pin(async { Ok("{}".to_string()) })
        }
    }

    #[test]
    fn test_session_lifecycle() {
        let roster = Arc::new(crate::roster::seed_roster());
        let gateway = AiGateway::new(Arc::new(NullService), Duration::ZERO);
        let session = start_session(
            StudentKey::new("Alice Nguyen", "Class 4A"),
            roster,
            gateway,
            EscalationPolicy::default(),
        );

        let found = get_session(&session.id).expect("session should be registered");
        assert_eq!(found.id, session.id);

        assert!(end_session(&session.id).is_some());
        assert!(get_session(&session.id).is_none());
        assert!(end_session(&session.id).is_none());
    }
}

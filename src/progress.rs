use std::collections::HashSet;

use log::info;

use crate::roster::{StudentKey, StudentRoster};

/// Knowledge seeds awarded for one correctly solved exercise.
pub const SEEDS_PER_CORRECT: u32 = 10;

/// At-most-once scoring credit per exercise instance. Eligibility is keyed by
/// whether the exercise has already been credited this session, not by the
/// attempt counter at the moment of success, so a correct answer after prior
/// wrong attempts is still credited exactly once.
#[derive(Debug, Default)]
pub struct ProgressLedger {
    credited: HashSet<String>,
}

impl ProgressLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies credit for the first correct solve of this exercise instance.
    /// Returns whether credit was applied.
    pub fn credit_first_correct(
        &mut self,
        roster: &StudentRoster,
        student: &StudentKey,
        exercise_id: &str,
    ) -> bool {
        if self.credited.contains(exercise_id) {
            return false;
        }

        if !roster.apply_credit(student, 1, SEEDS_PER_CORRECT) {
            return false;
        }

        self.credited.insert(exercise_id.to_string());
        info!(
            "First-correct credit recorded for exercise {} ({} credited this session)",
            exercise_id,
            self.credited.len()
        );
        true
    }

    pub fn is_credited(&self, exercise_id: &str) -> bool {
        self.credited.contains(exercise_id)
    }

    pub fn credited_count(&self) -> usize {
        self.credited.len()
    }
}

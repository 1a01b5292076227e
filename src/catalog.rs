use log::info;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Difficulty of an exercise as authored by the teacher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Basic,
    Intermediate,
    Advanced,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Basic => "basic",
            Level::Intermediate => "intermediate",
            Level::Advanced => "advanced",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Level::Basic => "Basic",
            Level::Intermediate => "Intermediate",
            Level::Advanced => "Advanced",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "basic" => Some(Level::Basic),
            "intermediate" => Some(Level::Intermediate),
            "advanced" => Some(Level::Advanced),
            _ => None,
        }
    }
}

/// One practice item. Immutable once it has been added to the catalog;
/// attempt records refer to it by id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub topic: String,
    pub grade: String,
    pub skill: String,
    pub level: Level,
    pub question: String,
    pub answer: String,
    pub hint: String,
}

/// Exercise fields as entered in the authoring form, before the catalog
/// assigns an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseDraft {
    pub topic: String,
    pub grade: String,
    pub skill: String,
    pub level: Level,
    pub question: String,
    pub answer: String,
    pub hint: String,
}

/// In-memory exercise store shared by the teacher and student flows.
/// State lives for the process only.
#[derive(Debug, Default)]
pub struct ExerciseCatalog {
    exercises: RwLock<Vec<Exercise>>,
}

impl ExerciseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single exercise and returns it with its assigned id.
    pub fn add(&self, draft: ExerciseDraft) -> Exercise {
        let exercise = Exercise {
            id: Uuid::new_v4().to_string(),
            topic: draft.topic,
            grade: draft.grade,
            skill: draft.skill,
            level: draft.level,
            question: draft.question,
            answer: draft.answer,
            hint: draft.hint,
        };

        let mut exercises = self.exercises.write();
        exercises.push(exercise.clone());
        info!(
            "Added exercise to catalog: {} ({} items total)",
            exercise.question.chars().take(50).collect::<String>(),
            exercises.len()
        );

        exercise
    }

    /// Adds a batch of exercises authored together and returns them in order.
    pub fn add_batch(&self, drafts: Vec<ExerciseDraft>) -> Vec<Exercise> {
        drafts.into_iter().map(|draft| self.add(draft)).collect()
    }

    pub fn list(&self) -> Vec<Exercise> {
        self.exercises.read().clone()
    }

    pub fn by_topic(&self, topic: &str) -> Vec<Exercise> {
        self.exercises
            .read()
            .iter()
            .filter(|ex| ex.topic == topic)
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<Exercise> {
        self.exercises.read().iter().find(|ex| ex.id == id).cloned()
    }

    /// Distinct topics in first-seen order.
    pub fn topics(&self) -> Vec<String> {
        let exercises = self.exercises.read();
        let mut topics: Vec<String> = Vec::new();
        for ex in exercises.iter() {
            if !topics.contains(&ex.topic) {
                topics.push(ex.topic.clone());
            }
        }
        topics
    }

    pub fn len(&self) -> usize {
        self.exercises.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.read().is_empty()
    }
}

/// Built-in catalog used by the demo binary and tests.
pub fn seed_catalog() -> ExerciseCatalog {
    let catalog = ExerciseCatalog::new();
    catalog.add_batch(vec![
        ExerciseDraft {
            topic: "Math".to_string(),
            grade: "Grade 1".to_string(),
            skill: "Addition up to 10".to_string(),
            level: Level::Basic,
            question: "2 + 5 = ?".to_string(),
            answer: "7".to_string(),
            hint: "Try counting on your fingers.".to_string(),
        },
        ExerciseDraft {
            topic: "Math".to_string(),
            grade: "Grade 1".to_string(),
            skill: "Addition up to 10".to_string(),
            level: Level::Basic,
            question: "8 + 1 = ?".to_string(),
            answer: "9".to_string(),
            hint: "Adding 1 gives the next number.".to_string(),
        },
        ExerciseDraft {
            topic: "Language".to_string(),
            grade: "Grade 3".to_string(),
            skill: "Nouns and verbs".to_string(),
            level: Level::Intermediate,
            question: "In the sentence \"Mom is cooking rice\", what kind of word is \"cooking\"?".to_string(),
            answer: "Verb".to_string(),
            hint: "It describes an action.".to_string(),
        },
        ExerciseDraft {
            topic: "Math".to_string(),
            grade: "Grade 4".to_string(),
            skill: "Two-digit multiplication".to_string(),
            level: Level::Advanced,
            question: "25 x 15 = ?".to_string(),
            answer: "375".to_string(),
            hint: "You can split 15 into 10 + 5.".to_string(),
        },
        ExerciseDraft {
            topic: "Science".to_string(),
            grade: "Grade 4".to_string(),
            skill: "The solar system".to_string(),
            level: Level::Intermediate,
            question: "Which planet is known as the \"Red Planet\"?".to_string(),
            answer: "Mars".to_string(),
            hint: "It is the fourth planet from the Sun.".to_string(),
        },
        ExerciseDraft {
            topic: "Science".to_string(),
            grade: "Grade 5".to_string(),
            skill: "Living things".to_string(),
            level: Level::Basic,
            question: "What do plants need for photosynthesis?".to_string(),
            answer: "Sunlight".to_string(),
            hint: "This process makes energy for the plant.".to_string(),
        },
        ExerciseDraft {
            topic: "History & Geography".to_string(),
            grade: "Grade 4".to_string(),
            skill: "World geography".to_string(),
            level: Level::Basic,
            question: "Which is the longest river in the world?".to_string(),
            answer: "The Nile".to_string(),
            hint: "It flows through Egypt.".to_string(),
        },
        ExerciseDraft {
            topic: "History & Geography".to_string(),
            grade: "Grade 5".to_string(),
            skill: "Capitals".to_string(),
            level: Level::Intermediate,
            question: "What is the capital city of Vietnam?".to_string(),
            answer: "Hanoi".to_string(),
            hint: "This city is in the north of the country.".to_string(),
        },
    ]);
    catalog
}

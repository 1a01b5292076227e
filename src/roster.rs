use log::{info, warn};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Teacher {
    pub name: String,
    pub class_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub name: String,
    pub class_name: String,
    pub teacher_name: String,
    pub previous_week_correct: u32,
    pub current_week_correct: u32,
    pub knowledge_seeds: u32,
}

/// A signed-in user. Each role carries only its own fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum AppUser {
    Teacher(Teacher),
    Student(Student),
}

impl AppUser {
    pub fn name(&self) -> &str {
        match self {
            AppUser::Teacher(t) => &t.name,
            AppUser::Student(s) => &s.name,
        }
    }
}

/// Normalized (name, class) pair used for all roster lookups. Lookups are
/// case- and whitespace-insensitive, so the key is folded once on creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudentKey {
    name: String,
    class_name: String,
}

impl StudentKey {
    pub fn new(name: &str, class_name: &str) -> Self {
        Self {
            name: normalize(name),
            class_name: normalize(class_name),
        }
    }

    pub fn for_student(student: &Student) -> Self {
        Self::new(&student.name, &student.class_name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// In-memory student roster. Counters only ever increase through
/// [`StudentRoster::apply_credit`]; weekly resets are an external concern.
#[derive(Debug, Default)]
pub struct StudentRoster {
    students: RwLock<Vec<Student>>,
}

/// Week-over-week movement of a student's correct-answer count, shown to
/// their teacher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Improving,
    Steady,
    Struggling,
}

#[derive(Debug, Clone)]
pub struct WeeklyProgress {
    pub percent: i32,
    pub trend: Trend,
    pub message: String,
}

impl StudentRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_students(students: Vec<Student>) -> Self {
        Self {
            students: RwLock::new(students),
        }
    }

    pub fn find(&self, name: &str, class_name: &str) -> Option<Student> {
        self.find_by_key(&StudentKey::new(name, class_name))
    }

    pub fn find_by_key(&self, key: &StudentKey) -> Option<Student> {
        self.students
            .read()
            .iter()
            .find(|s| StudentKey::for_student(s) == *key)
            .cloned()
    }

    /// Returns the existing record for a returning student, or registers a
    /// fresh zeroed record for a first-time login.
    pub fn login_or_register(&self, name: &str, class_name: &str, teacher_name: &str) -> Student {
        if let Some(existing) = self.find(name, class_name) {
            info!("Returning student signed in: {} ({})", existing.name, existing.class_name);
            return existing;
        }

        let student = Student {
            name: name.trim().to_string(),
            class_name: class_name.trim().to_string(),
            teacher_name: teacher_name.trim().to_string(),
            previous_week_correct: 0,
            current_week_correct: 0,
            knowledge_seeds: 0,
        };
        self.students.write().push(student.clone());
        info!("Registered new student: {} ({})", student.name, student.class_name);
        student
    }

    /// Applies scoring credit to the matching student. Returns false when no
    /// student matches, which callers treat as a silent no-op.
    pub fn apply_credit(&self, key: &StudentKey, correct_delta: u32, seeds_delta: u32) -> bool {
        let mut students = self.students.write();
        match students.iter_mut().find(|s| StudentKey::for_student(s) == *key) {
            Some(student) => {
                student.current_week_correct += correct_delta;
                student.knowledge_seeds += seeds_delta;
                info!(
                    "Credit applied to {}: {} correct this week, {} knowledge seeds",
                    student.name, student.current_week_correct, student.knowledge_seeds
                );
                true
            }
            None => {
                warn!("Credit requested for unknown student: {:?}", key);
                false
            }
        }
    }

    /// Students assigned to the given teacher, matched case-insensitively.
    pub fn students_of(&self, teacher_name: &str) -> Vec<Student> {
        let wanted = normalize(teacher_name);
        self.students
            .read()
            .iter()
            .filter(|s| normalize(&s.teacher_name) == wanted)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.students.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.read().is_empty()
    }
}

/// Summarizes a student's week-over-week movement for the teacher dashboard.
pub fn weekly_progress(student: &Student) -> WeeklyProgress {
    let current = student.current_week_correct as i64;
    let previous = student.previous_week_correct as i64;

    let percent = if previous > 0 {
        (((current - previous) as f64 / previous as f64) * 100.0).round() as i32
    } else if current > 0 {
        100
    } else {
        0
    };

    let (trend, message) = if percent >= 20 {
        (
            Trend::Improving,
            format!(
                "{} improved {}% this week, solving {} more exercises than last week. Time for some praise!",
                student.name,
                percent,
                current - previous
            ),
        )
    } else if percent < 0 {
        (
            Trend::Struggling,
            format!(
                "{} is having a harder week, down {}% from last week. Worth reviewing recent exercises together.",
                student.name,
                percent.abs()
            ),
        )
    } else {
        (
            Trend::Steady,
            format!("{} is keeping a steady pace this week.", student.name),
        )
    };

    WeeklyProgress {
        percent,
        trend,
        message,
    }
}

/// Built-in roster used by the demo binary and tests.
pub fn seed_roster() -> StudentRoster {
    StudentRoster::with_students(vec![
        Student {
            name: "Alice Nguyen".to_string(),
            class_name: "Class 4A".to_string(),
            teacher_name: "Ms. Mai".to_string(),
            previous_week_correct: 10,
            current_week_correct: 13,
            knowledge_seeds: 150,
        },
        Student {
            name: "Ben Tran".to_string(),
            class_name: "Class 4A".to_string(),
            teacher_name: "Ms. Mai".to_string(),
            previous_week_correct: 15,
            current_week_correct: 12,
            knowledge_seeds: 120,
        },
        Student {
            name: "Chris Le".to_string(),
            class_name: "Class 4A".to_string(),
            teacher_name: "Ms. Mai".to_string(),
            previous_week_correct: 12,
            current_week_correct: 12,
            knowledge_seeds: 180,
        },
        Student {
            name: "Daisy Pham".to_string(),
            class_name: "Class 5B".to_string(),
            teacher_name: "Mr. Hung".to_string(),
            previous_week_correct: 8,
            current_week_correct: 11,
            knowledge_seeds: 210,
        },
        Student {
            name: "Ethan Hoang".to_string(),
            class_name: "Class 5B".to_string(),
            teacher_name: "Mr. Hung".to_string(),
            previous_week_correct: 14,
            current_week_correct: 10,
            knowledge_seeds: 95,
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_and_whitespace_insensitive() {
        let roster = seed_roster();
        assert!(roster.find("  alice nguyen ", "CLASS 4A").is_some());
        assert!(roster.find("Alice Nguyen", "Class 4B").is_none());
    }

    #[test]
    fn test_login_or_register_reuses_existing_record() {
        let roster = seed_roster();
        let before = roster.len();
        let student = roster.login_or_register(" ALICE NGUYEN ", "class 4a", "Ms. Mai");
        assert_eq!(roster.len(), before);
        assert_eq!(student.knowledge_seeds, 150);
    }

    #[test]
    fn test_login_or_register_creates_zeroed_record() {
        let roster = seed_roster();
        let student = roster.login_or_register("Fiona Vu", "Class 3C", "Ms. Mai");
        assert_eq!(student.current_week_correct, 0);
        assert_eq!(student.knowledge_seeds, 0);
        assert!(roster.find("fiona vu", "class 3c").is_some());
    }

    #[test]
    fn test_apply_credit_increments_counters() {
        let roster = seed_roster();
        let key = StudentKey::new("Ben Tran", "Class 4A");
        assert!(roster.apply_credit(&key, 1, 10));

        let student = roster.find_by_key(&key).unwrap();
        assert_eq!(student.current_week_correct, 13);
        assert_eq!(student.knowledge_seeds, 130);
    }

    #[test]
    fn test_apply_credit_to_unknown_student_is_a_noop() {
        let roster = seed_roster();
        assert!(!roster.apply_credit(&StudentKey::new("Nobody", "Class 9Z"), 1, 10));
    }

    #[test]
    fn test_weekly_progress_tiers() {
        let roster = seed_roster();

        let improving = roster.find("Alice Nguyen", "Class 4A").unwrap();
        assert_eq!(weekly_progress(&improving).trend, Trend::Improving);
        assert_eq!(weekly_progress(&improving).percent, 30);

        let struggling = roster.find("Ben Tran", "Class 4A").unwrap();
        assert_eq!(weekly_progress(&struggling).trend, Trend::Struggling);

        let steady = roster.find("Chris Le", "Class 4A").unwrap();
        assert_eq!(weekly_progress(&steady).trend, Trend::Steady);
        assert_eq!(weekly_progress(&steady).percent, 0);
    }

    #[test]
    fn test_students_of_teacher() {
        let roster = seed_roster();
        assert_eq!(roster.students_of("ms. mai").len(), 3);
        assert_eq!(roster.students_of("Mr. Hung").len(), 2);
        assert!(roster.students_of("Ms. Unknown").is_empty());
    }
}

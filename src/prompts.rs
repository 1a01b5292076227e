//! Structured request builders. Each pedagogical intent becomes a prompt plus
//! the output schema the model is required to fill, so the gateway can
//! validate responses structurally instead of scraping free text.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::catalog::{Exercise, Level};

/// How many items the list-shaped intents ask for and require back.
pub const SUGGESTION_COUNT: usize = 3;

/// A fully built request: what to ask, and the shape the answer must take.
#[derive(Debug, Clone)]
pub struct AiRequest {
    pub prompt: String,
    pub schema: Value,
}

#[derive(Debug, Deserialize)]
pub struct ExplanationPayload {
    pub explanation: String,
}

#[derive(Debug, Deserialize)]
pub struct SimilarExercisePayload {
    #[serde(rename = "newQuestion")]
    pub new_question: String,
    #[serde(rename = "newAnswer")]
    pub new_answer: String,
}

#[derive(Debug, Deserialize)]
pub struct ReviewTopicsPayload {
    pub suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FeedbackPayload {
    pub feedback: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionsPayload {
    pub questions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedExercisePayload {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub hint: String,
}

/// Context for the personalized encouragement intent.
#[derive(Debug, Clone)]
pub struct PersonalizedFeedbackInput {
    pub student_name: String,
    pub topic: String,
    pub skill: String,
    pub time_taken_secs: u64,
    pub errors: u32,
}

fn string_prop(description: &str) -> Value {
    json!({ "type": "STRING", "description": description })
}

fn string_array_prop(description: &str, item_description: &str) -> Value {
    json!({
        "type": "ARRAY",
        "description": description,
        "items": { "type": "STRING", "description": item_description }
    })
}

/// Socratic step-by-step hint after repeated failure. The prompt forbids
/// revealing the final answer outright.
pub fn explanation(exercise: &Exercise, wrong_answer: &str) -> AiRequest {
    let prompt = format!(
        r#"You are "Miss Nova", a friendly and patient AI teacher who tutors primary-school students.
A student got the following exercise wrong:
- Question: "{question}"
- Correct answer: "{answer}"
- The student's answer: "{wrong}"

Your task:
1. **Do not give away the correct answer directly.**
2. Offer a step-by-step explanation that is easy to follow.
3. Use guiding questions so the student reasons their way to the answer.
4. Keep the tone gentle and encouraging.

Example: if the problem is "What is 12 divided by 4?" and the student answered "2", you might say: "No worries, let's try it together. Can you look at the 4 times table - 4 times what gives 12?"

Now write the explanation for the exercise above.
Return a JSON object with a single key "explanation"."#,
        question = exercise.question,
        answer = exercise.answer,
        wrong = wrong_answer,
    );

    AiRequest {
        prompt,
        schema: json!({
            "type": "OBJECT",
            "properties": {
                "explanation": string_prop("Miss Nova's friendly step-by-step explanation."),
            },
            "required": ["explanation"]
        }),
    }
}

/// Produces an isomorphic practice item from a source exercise.
pub fn similar_exercise(exercise: &Exercise) -> AiRequest {
    let prompt = format!(
        r#"You are an AI teaching assistant. Starting from this sample exercise:
- Topic: "{topic}"
- Question: "{question}"
- Answer: "{answer}"
- Grade: "{grade}"
- Skill: "{skill}"

Create ONE new exercise with a similar structure, difficulty and topic. Make sure the new question differs from the original.

Return a JSON object with exactly two keys: "newQuestion" and "newAnswer"."#,
        topic = exercise.topic,
        question = exercise.question,
        answer = exercise.answer,
        grade = exercise.grade,
        skill = exercise.skill,
    );

    AiRequest {
        prompt,
        schema: json!({
            "type": "OBJECT",
            "properties": {
                "newQuestion": string_prop("The new question, similar to the original."),
                "newAnswer": string_prop("The answer to the new question."),
            },
            "required": ["newQuestion", "newAnswer"]
        }),
    }
}

/// Remediation topic list after a wrong answer.
pub fn review_topics(exercise: &Exercise) -> AiRequest {
    let prompt = format!(
        r#"You are an AI tutor. A primary-school student answered this question incorrectly:
- Topic: "{topic}"
- Skill: "{skill}"
- Question: "{question}"

Based on this mistake, suggest {count} RELATED topics or skills the student may need to review. Keep each suggestion short and suitable for a primary-school student.

Return a JSON object with a single key "suggestions" holding an array of {count} suggestion strings."#,
        topic = exercise.topic,
        skill = exercise.skill,
        question = exercise.question,
        count = SUGGESTION_COUNT,
    );

    AiRequest {
        prompt,
        schema: json!({
            "type": "OBJECT",
            "properties": {
                "suggestions": string_array_prop(
                    "Suggested topics/skills to review.",
                    "A short review suggestion."
                ),
            },
            "required": ["suggestions"]
        }),
    }
}

/// Short, warm encouragement message tailored to one student's session.
pub fn personalized_feedback(input: &PersonalizedFeedbackInput) -> AiRequest {
    let prompt = format!(
        r#"You are "Study Buddy 2.0", an empathetic AI learning companion. Write a short personalized message (2-3 sentences) to encourage a primary-school student who is struggling.

Your philosophy:
- Always use positive, encouraging language.
- Never criticize or compare.
- Respect each student's own pace.
- Sound like a kind friend or gentle teacher.

About the student:
- Name: {name}
- Topic: {topic}
- Skill being practiced: {skill}
- Time spent: {time} seconds
- Wrong answers so far: {errors}

The message must:
1. Greet the student by name.
2. Acknowledge their effort with one encouraging sentence.
3. Give one small, gentle suggestion (for example: "take a deep breath", "have a short break", "re-read the hint").
4. End with a cheer and include at least one fitting emoji.

Example: "Lana, I can see how hard you are trying 💪. Division is tricky today - re-read the hint about remainders. Take a three-minute water break and let's go again!"

Return a JSON object with a single key "feedback"."#,
        name = input.student_name,
        topic = input.topic,
        skill = input.skill,
        time = input.time_taken_secs,
        errors = input.errors,
    );

    AiRequest {
        prompt,
        schema: json!({
            "type": "OBJECT",
            "properties": {
                "feedback": string_prop("The personalized, encouraging message for the student."),
            },
            "required": ["feedback"]
        }),
    }
}

/// Authoring aid: sample questions for a topic the teacher is building out.
pub fn questions_for_topic(topic: &str) -> AiRequest {
    let prompt = format!(
        r#"You are an AI teaching assistant. Create {count} short, concise sample exercise questions for the topic "{topic}" aimed at primary-school students.

Return a JSON object with a single key "questions" holding an array of {count} question strings."#,
        count = SUGGESTION_COUNT,
        topic = topic,
    );

    AiRequest {
        prompt,
        schema: json!({
            "type": "OBJECT",
            "properties": {
                "questions": string_array_prop(
                    "Sample exercise questions for the topic.",
                    "One sample exercise question."
                ),
            },
            "required": ["questions"]
        }),
    }
}

/// Authoring aid: a complete exercise for the given topic, grade, skill and
/// difficulty.
pub fn exercise_for_topic(topic: &str, grade: &str, skill: &str, level: Level) -> AiRequest {
    let prompt = format!(
        r#"You are an AI teaching assistant. Create one exercise for a primary-school student with these details:
- Topic: "{topic}"
- Grade: "{grade}"
- Skill: "{skill}"
- Difficulty: "{level}"

The exercise needs a clear question, an exact answer, and a short hint (the hint may be empty).

Return a JSON object with exactly three keys: "question", "answer", and "hint"."#,
        topic = topic,
        grade = grade,
        skill = skill,
        level = level.display_name(),
    );

    AiRequest {
        prompt,
        schema: json!({
            "type": "OBJECT",
            "properties": {
                "question": string_prop("The exercise question."),
                "answer": string_prop("The answer to the question."),
                "hint": string_prop("A hint for the student (may be an empty string)."),
            },
            "required": ["question", "answer", "hint"]
        }),
    }
}

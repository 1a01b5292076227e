use std::io::{self, Write as _};
use std::sync::Arc;

use log::info;

use studybuddy::attempt::EscalationPolicy;
use studybuddy::catalog::{seed_catalog, ExerciseCatalog, ExerciseDraft};
use studybuddy::gateway::{AiGateway, AiOutcome};
use studybuddy::gemini::GeminiClient;
use studybuddy::roster::{seed_roster, weekly_progress, StudentKey, StudentRoster};
use studybuddy::session;
use studybuddy::settings::Settings;

fn prompt_line(label: &str) -> io::Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("=== StudyBuddy ===");

    let settings = Settings::from_env();
    let api_key = match settings.gemini_api_key.clone() {
        Some(key) => key,
        None => {
            eprintln!("GEMINI_API_KEY is not set. Add it to the environment or a .env file.");
            std::process::exit(1);
        }
    };

    let catalog = Arc::new(seed_catalog());
    let roster = Arc::new(seed_roster());
    let client = Arc::new(GeminiClient::new(api_key, settings.gemini_model.clone()));
    let gateway = AiGateway::new(client, settings.ai_cooldown);

    info!(
        "Loaded {} exercises across {} topics, {} students on the roster",
        catalog.len(),
        catalog.topics().len(),
        roster.len()
    );

    let role = prompt_line("Sign in as (teacher/student)")?;
    if role.eq_ignore_ascii_case("teacher") {
        teacher_dashboard(&catalog, &roster, &gateway).await?;
    } else {
        student_practice(&catalog, roster, gateway).await?;
    }

    Ok(())
}

async fn student_practice(
    catalog: &ExerciseCatalog,
    roster: Arc<StudentRoster>,
    gateway: AiGateway,
) -> anyhow::Result<()> {
    let name = prompt_line("Your name")?;
    let class_name = prompt_line("Your class")?;
    let teacher_name = prompt_line("Your teacher")?;

    let student = roster.login_or_register(&name, &class_name, &teacher_name);
    println!(
        "\nHello {}! You have {} knowledge seeds. Pick a subject to start!",
        student.name, student.knowledge_seeds
    );

    let practice = session::start_session(
        StudentKey::new(&name, &class_name),
        roster.clone(),
        gateway,
        EscalationPolicy::default(),
    );

    loop {
        let topics = catalog.topics();
        println!("\nSubjects:");
        for (index, topic) in topics.iter().enumerate() {
            println!("  {}. {}", index + 1, topic);
        }
        let choice = prompt_line("Choose a subject number (or q to quit)")?;
        if choice.eq_ignore_ascii_case("q") {
            break;
        }
        let Some(topic) = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| topics.get(n.saturating_sub(1)))
        else {
            println!("That is not one of the subjects, try again.");
            continue;
        };

        let exercises = catalog.by_topic(topic);
        for (index, exercise) in exercises.iter().enumerate() {
            println!("\n{}. {}", index + 1, exercise.question);
            loop {
                let answer = prompt_line("Your answer (or s to skip)")?;
                if answer.eq_ignore_ascii_case("s") {
                    break;
                }

                let submission = practice.submit(exercise, &answer).await;
                println!("{}", submission.message);
                if submission.celebrate {
                    println!("*** confetti! ***");
                    break;
                }

                if let Some(record) = practice.snapshot(&exercise.id) {
                    if let Some(explanation) = &record.explanation {
                        println!("\nMiss Nova: {}", explanation);
                    } else if submission.escalated {
                        println!("(Miss Nova is taking a little break - try once more!)");
                    }
                }
            }
        }

        println!(
            "\nYou solved {} of {} exercises in {}.",
            practice.correct_count(&exercises),
            exercises.len(),
            topic
        );
        if let Some(first) = exercises.first() {
            if let AiOutcome::Success(message) =
                practice.request_encouragement(topic, &first.skill).await
            {
                println!("Study Buddy says: {}", message);
            }
        }
        practice.exit_topic();

        if let Some(student) = roster.find(&name, &class_name) {
            println!("Knowledge seeds: {}", student.knowledge_seeds);
        }
    }

    session::end_session(&practice.id);
    Ok(())
}

async fn teacher_dashboard(
    catalog: &ExerciseCatalog,
    roster: &StudentRoster,
    gateway: &AiGateway,
) -> anyhow::Result<()> {
    let name = prompt_line("Your name")?;

    let students = roster.students_of(&name);
    if students.is_empty() {
        println!("\nNo students are assigned to you yet.");
    } else {
        println!("\nYour students this week:");
        for student in &students {
            let progress = weekly_progress(student);
            println!("  - {}", progress.message);
        }
    }

    loop {
        println!("\n1. Suggest sample questions for a topic");
        println!("2. Generate a complete exercise");
        println!("q. Sign out");
        let choice = prompt_line("Choose")?;

        match choice.as_str() {
            "1" => {
                let topic = prompt_line("Topic")?;
                match gateway.suggest_questions_for_topic(&topic).await {
                    AiOutcome::Success(questions) => {
                        println!("Suggested questions:");
                        for question in questions {
                            println!("  - {}", question);
                        }
                    }
                    AiOutcome::Degraded => {
                        println!("The assistant has no suggestions right now, try again shortly.");
                    }
                }
            }
            "2" => {
                let topic = prompt_line("Topic")?;
                let grade = prompt_line("Grade")?;
                let skill = prompt_line("Skill")?;
                let level = prompt_line("Level (basic/intermediate/advanced)")?;
                let level = studybuddy::Level::from_str(&level)
                    .unwrap_or(studybuddy::Level::Intermediate);

                match gateway
                    .generate_exercise_for_topic(&topic, &grade, &skill, level)
                    .await
                {
                    AiOutcome::Success(generated) => {
                        println!("Question: {}", generated.question);
                        println!("Answer:   {}", generated.answer);
                        println!("Hint:     {}", generated.hint);
                        let accept = prompt_line("Add to the catalog? (y/n)")?;
                        if accept.eq_ignore_ascii_case("y") {
                            let exercise = catalog.add(ExerciseDraft {
                                topic,
                                grade,
                                skill,
                                level,
                                question: generated.question,
                                answer: generated.answer,
                                hint: generated.hint,
                            });
                            println!("Added exercise {}.", exercise.id);
                        }
                    }
                    AiOutcome::Degraded => {
                        println!("The assistant could not produce an exercise, try again shortly.");
                    }
                }
            }
            _ if choice.eq_ignore_ascii_case("q") => break,
            _ => println!("That is not an option."),
        }
    }

    Ok(())
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use services::{LearningSession, LessonOutcome, StudioServices};
use storage::{ApiConfig, StaticSession};
use studio_core::model::{LessonContent, TopicRef};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{Cli, Command};

fn print_lesson(topic: TopicRef, lesson: &LessonContent) {
    println!("[{topic}] {} ({} read)", lesson.title, lesson.estimated_time);
    println!();
    println!("{}", lesson.content_markdown);
}

fn print_outline(session: &LearningSession) {
    let roadmap = session.roadmap();
    println!("{}", roadmap.title());
    if let Some(description) = roadmap.description() {
        println!("{description}");
    }
    for (m, module) in roadmap.modules().iter().enumerate() {
        println!();
        println!("Module {}: {}", m + 1, module.title());
        for (t, name) in module.topics().iter().enumerate() {
            let topic = TopicRef::new(m, t);
            let mark = if session.is_completed(topic) { "x" } else { " " };
            println!("  [{mark}] {topic}  {name}");
        }
    }
    let progress = session.progress();
    println!();
    println!(
        "{}/{} topics complete ({}%)",
        progress.completed,
        progress.total,
        progress.percent()
    );
}

async fn open(session: &LearningSession, full: bool) -> Result<()> {
    let topic = session.active_topic();
    match session.open_lesson().await? {
        LessonOutcome::Displayed(lesson) if full => print_lesson(topic, &lesson),
        LessonOutcome::Displayed(lesson) => {
            println!("[{topic}] {} ({})", lesson.title, lesson.estimated_time);
        }
        LessonOutcome::Superseded { topic } => println!("[{topic}] skipped"),
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = ApiConfig::new(&cli.api_url)?.with_timeout(Duration::from_secs(cli.timeout_secs));
    let services = StudioServices::http(&config, Arc::new(StaticSession::new(cli.token)))?;
    let session = services
        .start_session(cli.roadmap_id)
        .await
        .with_context(|| format!("could not open roadmap {}", cli.roadmap_id))?;

    match cli.command {
        Command::Outline => {
            session.wait_for_progress().await;
            print_outline(&session);
        }
        Command::Lesson { topic } => {
            session.select_topic(topic)?;
            open(&session, true).await?;
        }
        Command::Toggle { topic } => {
            let completed = session.toggle(topic).await?;
            let state = if completed { "complete" } else { "not complete" };
            println!("{topic} is now {state}");
        }
        Command::Walk { from, count } => {
            if let Some(from) = from {
                session.select_topic(from)?;
            }
            for step in 0..count {
                if step > 0 && session.advance()?.is_none() {
                    println!("end of roadmap");
                    break;
                }
                open(&session, false).await?;
            }
        }
    }

    session.close();
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err:#}");
        std::process::exit(2);
    }
}

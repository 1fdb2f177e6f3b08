use clap::{Parser, Subcommand};
use studio_core::model::{RoadmapId, TopicRef};

/// Learning studio: read lessons and track progress through a roadmap.
#[derive(Debug, Parser)]
#[command(name = "studio", version, about, long_about = None)]
pub struct Cli {
    /// Learning API base url.
    #[arg(long, env = "STUDIO_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// HTTP request timeout in seconds.
    #[arg(long, env = "STUDIO_HTTP_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,

    /// Roadmap to open.
    #[arg(long, env = "STUDIO_ROADMAP_ID")]
    pub roadmap_id: RoadmapId,

    /// Bearer token of the signed-in user.
    #[arg(long, env = "STUDIO_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print modules and topics with completion marks.
    Outline,
    /// Print the lesson for a topic, e.g. `lesson 0-2`.
    Lesson { topic: TopicRef },
    /// Flip completion for a topic.
    Toggle { topic: TopicRef },
    /// Open lessons in order, starting at `--from`.
    Walk {
        #[arg(long)]
        from: Option<TopicRef>,
        #[arg(long, default_value_t = 3)]
        count: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_topic_arguments() {
        let cli = Cli::parse_from([
            "studio",
            "--roadmap-id",
            "12",
            "--api-url",
            "https://api.example.com",
            "lesson",
            "1-3",
        ]);
        assert_eq!(cli.roadmap_id, RoadmapId::new(12));
        assert_eq!(cli.api_url, "https://api.example.com");
        assert!(matches!(cli.command, Command::Lesson { topic } if topic == TopicRef::new(1, 3)));
    }

    #[test]
    fn walk_defaults() {
        let cli = Cli::parse_from(["studio", "--roadmap-id", "1", "walk"]);
        let Command::Walk { from, count } = cli.command else {
            panic!("expected walk");
        };
        assert_eq!(from, None);
        assert_eq!(count, 3);
    }

    #[test]
    fn rejects_malformed_topic() {
        let result = Cli::try_parse_from(["studio", "--roadmap-id", "1", "toggle", "two"]);
        assert!(result.is_err());
    }
}

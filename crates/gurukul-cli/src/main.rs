//! gurukul CLI — record progress, refresh class analytics, grade work.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

const DEFAULT_LOG_FILTER: &str = "gurukul_core=info,gurukul_providers=info,gurukul_cli=info";

#[derive(Parser)]
#[command(name = "gurukul", version, about = "Learning analytics over a document store")]
struct Cli {
    /// Config file path (default: ./gurukul.toml, then ~/.config/gurukul/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter gurukul.toml
    Init,

    /// Enroll a student in a class
    Enroll {
        #[arg(long)]
        student: String,

        /// Display name used for new users and roster ordering
        #[arg(long)]
        name: String,

        #[arg(long)]
        class: String,
    },

    /// Record a progress event for a student in a class
    Record {
        #[arg(long)]
        student: String,

        #[arg(long)]
        class: String,

        /// The student completed an assignment
        #[arg(long)]
        completed: bool,

        /// Grade received, folded into the running average
        #[arg(long)]
        grade: Option<f64>,
    },

    /// Show a student's progress in a class
    Progress {
        #[arg(long)]
        student: String,

        #[arg(long)]
        class: String,
    },

    /// Recompute and store a class summary
    Refresh {
        #[arg(long)]
        class: String,
    },

    /// Show the stored class summary
    Summary {
        #[arg(long)]
        class: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Log an analytics event
    LogEvent {
        #[arg(long)]
        user: String,

        #[arg(long = "type")]
        event_type: String,

        /// Event data as key=value (repeatable)
        #[arg(long = "data")]
        data: Vec<String>,
    },

    /// List a user's most recent events
    Events {
        #[arg(long)]
        user: String,

        #[arg(long = "type")]
        event_type: Option<String>,

        #[arg(long, default_value = "100")]
        limit: usize,
    },

    /// Build a class report for a date range
    Report {
        #[arg(long)]
        class: String,

        /// First day (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        start: String,

        /// Last day, inclusive (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        end: String,

        /// Output format: markdown, json
        #[arg(long, default_value = "markdown")]
        format: String,

        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Store a submission for an assignment
    Submit {
        #[arg(long)]
        assignment: String,

        #[arg(long)]
        student: String,

        /// File containing the submitted work
        #[arg(long)]
        file: PathBuf,
    },

    /// Generate feedback for a piece of work without storing anything
    Grade {
        /// Assignment type, e.g. "essay"
        #[arg(long)]
        kind: String,

        /// File containing the work
        #[arg(long)]
        file: PathBuf,

        /// Optional rubric file
        #[arg(long)]
        rubric: Option<PathBuf>,
    },

    /// Grade a stored submission and write the result back
    AutoGrade {
        #[arg(long)]
        submission: String,

        #[arg(long)]
        kind: String,
    },

    /// Send a free-form prompt to the configured generator
    Chat {
        #[arg(long)]
        prompt: String,
    },

    /// Generate learning content on a topic
    Content {
        #[arg(long)]
        topic: String,

        #[arg(long, default_value = "beginner")]
        level: String,

        #[arg(long, default_value = "visual")]
        style: String,
    },

    /// Generate quiz questions on a topic
    Quiz {
        #[arg(long)]
        topic: String,

        #[arg(long, default_value = "medium")]
        difficulty: String,

        #[arg(long, default_value = "5")]
        count: u32,
    },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Enroll {
            student,
            name,
            class,
        } => commands::class::enroll(config, student, name, class).await,
        Commands::Record {
            student,
            class,
            completed,
            grade,
        } => commands::progress::record(config, student, class, completed, grade).await,
        Commands::Progress { student, class } => {
            commands::progress::show(config, student, class).await
        }
        Commands::Refresh { class } => commands::class::refresh(config, class).await,
        Commands::Summary { class, json } => commands::class::summary(config, class, json).await,
        Commands::LogEvent {
            user,
            event_type,
            data,
        } => commands::events::log(config, user, event_type, data).await,
        Commands::Events {
            user,
            event_type,
            limit,
        } => commands::events::list(config, user, event_type, limit).await,
        Commands::Report {
            class,
            start,
            end,
            format,
            output,
        } => commands::report::execute(config, class, start, end, format, output).await,
        Commands::Submit {
            assignment,
            student,
            file,
        } => commands::grade::submit(config, assignment, student, file).await,
        Commands::Grade { kind, file, rubric } => {
            commands::grade::grade(config, kind, file, rubric).await
        }
        Commands::AutoGrade { submission, kind } => {
            commands::grade::auto_grade(config, submission, kind).await
        }
        Commands::Chat { prompt } => commands::assist::chat(config, prompt).await,
        Commands::Content {
            topic,
            level,
            style,
        } => commands::assist::content(config, topic, level, style).await,
        Commands::Quiz {
            topic,
            difficulty,
            count,
        } => commands::assist::quiz(config, topic, difficulty, count).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

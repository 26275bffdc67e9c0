use clap::{Parser, Subcommand, ValueEnum};
use courserec::{
    EngineConfig, FeedbackAction, FeedbackEvent, RecommendParams, RecommendationFeedback,
    RecommendationRequest, Recommender, UserFeedback,
};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Course recommendation engine
#[derive(Parser, Debug)]
#[command(name = "courserec")]
#[command(about = "Recommend courses from liked and disliked ones", long_about = None)]
struct Args {
    /// Engine configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of per-faculty course JSON files
    #[arg(long)]
    courses_dir: Option<PathBuf>,

    /// Embedding matrix file (.json or bincode)
    #[arg(long)]
    embeddings: Option<PathBuf>,

    /// Precomputed keyword overlap matrix; built from keywords when absent
    #[arg(long)]
    overlap: Option<PathBuf>,

    /// Precomputed idf-weighted overlap matrix; built from keywords when absent
    #[arg(long)]
    weighted_overlap: Option<PathBuf>,

    /// Append feedback events to this JSONL file
    #[arg(long)]
    feedback_log: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank courses for a set of liked and disliked course codes
    Recommend {
        #[arg(long, value_delimiter = ',', required = true)]
        liked: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        disliked: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        skipped: Vec<String>,

        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,

        #[arg(short, long, default_value = "mmr")]
        strategy: String,

        /// MMR relevance/diversity trade-off in (0, 1]
        #[arg(long)]
        lambda: Option<f32>,

        /// MMR candidate pool size
        #[arg(long)]
        pool_size: Option<usize>,

        /// Seed for the baseline tie shuffle
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Show one course
    Course { code: String },

    /// Find courses by code, name, faculty or department
    Search {
        query: String,

        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// List registered strategy names
    Strategies,

    /// Record a reaction to a recommended course
    Feedback {
        #[arg(long)]
        user: String,

        #[arg(long)]
        course: String,

        #[arg(long, value_enum)]
        action: ActionArg,

        #[arg(long, value_delimiter = ',')]
        liked: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        disliked: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        skipped: Vec<String>,

        #[arg(short, long, default_value = "mmr")]
        strategy: String,
    },

    /// Record a rating of the service
    Rate {
        #[arg(long)]
        user: String,

        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        rating: u8,

        #[arg(long)]
        faculty: Option<String>,

        #[arg(long, default_value = "")]
        text: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ActionArg {
    Like,
    Dislike,
    Skip,
}

impl From<ActionArg> for FeedbackAction {
    fn from(action: ActionArg) -> Self {
        match action {
            ActionArg::Like => FeedbackAction::Like,
            ActionArg::Dislike => FeedbackAction::Dislike,
            ActionArg::Skip => FeedbackAction::Skip,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries the JSON output
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting courserec v{}", env!("CARGO_PKG_VERSION"));
    let config = load_config(&args)?;
    info!("Courses directory: {:?}", config.data.courses_dir);
    info!("Embeddings: {:?}", config.data.embeddings_path);

    let recommender = courserec::open(&config)?;
    let outcome = run(&recommender, args.command);
    recommender.flush_feedback();
    outcome
}

/// Config file (or defaults) with command-line paths layered on top
fn load_config(args: &Args) -> anyhow::Result<EngineConfig> {
    let mut config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = &args.courses_dir {
        config.data.courses_dir = dir.clone();
    }
    if let Some(path) = &args.embeddings {
        config.data.embeddings_path = path.clone();
    }
    if let Some(path) = &args.overlap {
        config.data.overlap_path = Some(path.clone());
    }
    if let Some(path) = &args.weighted_overlap {
        config.data.weighted_overlap_path = Some(path.clone());
    }
    if let Some(path) = &args.feedback_log {
        config.feedback_log = Some(path.clone());
    }
    Ok(config)
}

fn run(recommender: &Recommender, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Recommend {
            liked,
            disliked,
            skipped,
            count,
            strategy,
            lambda,
            pool_size,
            seed,
        } => {
            let request = RecommendationRequest {
                liked,
                disliked,
                skipped,
                count,
                strategy,
                params: RecommendParams {
                    lambda,
                    pool_size,
                    seed,
                },
            };
            print_json(&recommender.recommend(&request)?)
        }
        Command::Course { code } => print_json(recommender.get_course(&code)?),
        Command::Search { query, limit } => print_json(&recommender.search(&query, limit)),
        Command::Strategies => print_json(&recommender.strategies()),
        Command::Feedback {
            user,
            course,
            action,
            liked,
            disliked,
            skipped,
            strategy,
        } => {
            // Fail on unknown codes rather than logging garbage
            recommender.get_course(&course)?;
            recommender.record_feedback(FeedbackEvent::Recommendation(RecommendationFeedback {
                user_id: user,
                course,
                action: action.into(),
                liked,
                disliked,
                skipped,
                strategy,
            }))?;
            info!("Feedback recorded");
            Ok(())
        }
        Command::Rate {
            user,
            rating,
            faculty,
            text,
        } => {
            recommender.record_feedback(FeedbackEvent::User(UserFeedback {
                user_id: user,
                rating: Some(rating),
                faculty,
                text,
            }))?;
            info!("Rating recorded");
            Ok(())
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// lisabot-server/src/main.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use lisabot_core::model::{ArtifactStore, CorpusRetrainer, EmojiClassifier, ModelHandle};
use lisabot_core::platforms::discord::DiscordRuntime;
use lisabot_core::random::ThreadRandom;
use lisabot_core::recorder::JsonlCorpusRecorder;
use lisabot_core::services::{MessageDispatcher, MessagePipeline, TriggerTable};
use lisabot_core::state::ActivityCounter;
use lisabot_core::tasks::spawn_model_refresh_task;
use lisabot_core::BotConfig;

#[derive(Parser, Debug, Clone)]
#[command(name = "lisabot")]
#[command(author, version, about = "LisaBot - emoji-reacting Discord regular")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Directory holding the four model artifacts
    #[arg(long, default_value = "models")]
    model_dir: PathBuf,

    /// JSONL corpus written by the recorder and read by the retrainer
    #[arg(long, default_value = "data/corpus.jsonl")]
    corpus: PathBuf,

    /// Author whose messages are recorded for training
    #[arg(long, default_value = "lisa38")]
    training_source: String,

    /// Hours between model refreshes
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u64).range(1..))]
    retrain_hours: u64,

    /// Emoji probability threshold (labels strictly above it are used)
    #[arg(long, default_value_t = 0.10)]
    threshold: f64,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Connect to Discord and start responding (default)
    Run,
    /// Fit the model once from the corpus and write the artifacts
    Train,
}

impl Args {
    fn bot_config(&self) -> BotConfig {
        BotConfig {
            emoji_threshold: self.threshold,
            retrain_interval_secs: self.retrain_hours.saturating_mul(60 * 60),
            training_source: self.training_source.clone(),
            ..BotConfig::default()
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("lisabot=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenv::dotenv().ok();
    let args = Args::parse();

    match args.command.clone().unwrap_or(Command::Run) {
        Command::Run => run_bot(args).await,
        Command::Train => train_once(args),
    }
}

fn train_once(args: Args) -> anyhow::Result<()> {
    let store = ArtifactStore::new(&args.model_dir);
    let model = CorpusRetrainer::new(&args.corpus, store)
        .train()
        .with_context(|| format!("training from {}", args.corpus.display()))?;
    info!(
        "Trained {} labels over {} features into {}",
        model.label_map.len(),
        model.vectorizer.vocabulary().len(),
        args.model_dir.display()
    );
    Ok(())
}

async fn run_bot(args: Args) -> anyhow::Result<()> {
    let config = args.bot_config();
    config.validate()?;
    info!(
        "LisaBot starting. model_dir={}, corpus={}, training_source={}, retrain every {:?}",
        args.model_dir.display(),
        args.corpus.display(),
        config.training_source,
        config.retrain_interval()
    );

    let token = std::env::var("TOKEN").context("TOKEN is not set")?;

    // Refuse to start without a usable model.
    let store = ArtifactStore::new(&args.model_dir);
    let bundle = store
        .load_bundle()
        .with_context(|| format!("loading model artifacts from {}", args.model_dir.display()))?;
    let models = Arc::new(ModelHandle::new(bundle));
    let activity = Arc::new(ActivityCounter::new(config.baseline_activity));

    let mut discord = DiscordRuntime::new(token);
    let bot_id = discord.current_user_id().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let refresh_handle = spawn_model_refresh_task(
        Arc::new(CorpusRetrainer::new(&args.corpus, store)),
        models.clone(),
        activity.clone(),
        config.retrain_boost,
        config.retrain_interval(),
        shutdown_rx,
    );

    let pipeline = MessagePipeline::new(
        &config,
        bot_id,
        TriggerTable::builtin(),
        Arc::new(EmojiClassifier::new(models, config.emoji_threshold)),
        activity,
        Box::new(ThreadRandom),
    );
    let dispatcher = MessageDispatcher::new(pipeline, Arc::new(discord.outbound()))
        .with_recorder(Arc::new(JsonlCorpusRecorder::new(&args.corpus)), config.training_source.clone());

    let (tx, rx) = mpsc::unbounded_channel();
    discord.start(tx)?;
    let dispatch_handle = tokio::spawn(dispatcher.run(rx));

    tokio::signal::ctrl_c().await?;
    info!("Ctrl-C received; shutting down.");

    let _ = shutdown_tx.send(true);
    discord.shutdown().await;
    if let Err(e) = dispatch_handle.await {
        error!("Dispatcher task ended abnormally: {:?}", e);
    }
    refresh_handle.abort();
    info!("Main finished. Goodbye!");
    Ok(())
}

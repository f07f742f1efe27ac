use anyhow::Result;
use clap::Parser;
use deck_pacer::{console, Budget, Config, CpalHost, Deck, SegmentStore};
use std::sync::Arc;
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "deck-pacer", version, about = "Record slide narration and fit it to a time budget")]
struct Args {
    /// Config file path, without extension
    #[arg(long, default_value = "config/deck-pacer")]
    config: String,

    /// Number of slides (overrides config)
    #[arg(long)]
    slides: Option<u32>,

    /// Target total as mm:ss (overrides config)
    #[arg(long)]
    target: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let cfg = Config::load(&args.config)?;

    info!("Deck Pacer v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Audio: {}Hz, recordings in {}",
        cfg.audio.sample_rate,
        cfg.recordings_dir().display()
    );

    let mut budget = Budget::new(300, args.slides.unwrap_or(cfg.deck.slide_count));
    budget.set_target_text(args.target.as_deref().unwrap_or(&cfg.deck.target_total));

    let store = SegmentStore::new(cfg.recordings_dir(), cfg.audio.sample_rate);
    let deck = Deck::new(
        Arc::new(CpalHost::new()),
        cfg.stream_settings(),
        store,
        budget,
        cfg.playback_poll(),
    );

    console::run(deck, cfg.progress_interval()).await
}

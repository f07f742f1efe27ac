//! Line-oriented control surface.
//!
//! Each stdin line is parsed as one command; a tokio interval drives the
//! recording progress tick and reaps finished playback in between.

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::deck::{Deck, DeckSummary};
use crate::export::ExportReport;
use crate::mmss::format_mmss;
use crate::session::PlaybackStart;

#[derive(Parser, Debug)]
#[command(multicall = true)]
pub struct ConsoleLine {
    #[command(subcommand)]
    pub command: ConsoleCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    /// Select a slide
    Select { index: u32 },
    /// Set the number of slides
    Slides { count: String },
    /// Set the target total (mm:ss or seconds)
    Target { total: String },
    /// Start or stop recording the selected slide
    Record,
    /// Play or stop the selected slide
    Play,
    /// Delete the selected slide's audio
    Delete,
    /// Stretch the selected slide at a speed in [0.5, 2.0]
    Speed { value: String },
    /// Drop the selected slide's processed audio
    Reset,
    /// Speed up long slides to fit the target
    Fit,
    /// Export all recorded slides plus combined.wav
    Export {
        #[arg(value_enum)]
        mode: ExportKind,
        dir: Option<PathBuf>,
    },
    /// Show the segment table
    Status,
    /// Show the segment table as JSON
    Json,
    /// Leave
    #[command(alias = "exit")]
    Quit,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Uniform,
    AsIs,
}

/// What the loop should do after a command.
#[derive(Debug, PartialEq)]
pub enum Reply {
    Text(String),
    Quit,
}

/// `Ok(None)` for a blank line.
pub fn parse_line(line: &str) -> Result<Option<ConsoleCommand>, clap::Error> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }
    ConsoleLine::try_parse_from(words).map(|l| Some(l.command))
}

pub fn execute(deck: &mut Deck, command: ConsoleCommand) -> Result<Reply> {
    let text = match command {
        ConsoleCommand::Select { index } => match deck.select(index) {
            Some(i) => format!("slide {} selected", i),
            None => format!(
                "no slide {} (1..={})",
                index,
                deck.budget().slide_count()
            ),
        },
        ConsoleCommand::Slides { count } => {
            deck.set_slide_count_text(&count);
            render_summary(&deck.summary())
        }
        ConsoleCommand::Target { total } => {
            let target = deck.set_target_text(&total);
            format!("target {}", format_mmss(target as f64))
        }
        ConsoleCommand::Record => match deck.toggle_record()? {
            Some(take) => format!(
                "slide {} saved ({})",
                take.segment,
                format_mmss(take.duration_secs)
            ),
            None if deck.is_recording() => "recording...".to_string(),
            None => "recording stopped, nothing captured".to_string(),
        },
        ConsoleCommand::Play => match deck.toggle_play()? {
            Some(PlaybackStart::Started {
                segment,
                duration_secs,
            }) => format!("playing slide {} ({})", segment, format_mmss(duration_secs)),
            Some(PlaybackStart::AlreadyPlaying) => "already playing".to_string(),
            None => "playback stopped".to_string(),
        },
        ConsoleCommand::Delete => {
            if deck.delete_selected() {
                "deleted".to_string()
            } else {
                "nothing to delete".to_string()
            }
        }
        ConsoleCommand::Speed { value } => {
            let effective = deck.apply_speed_to_selected(&value)?;
            format!("effective {}", format_mmss(effective))
        }
        ConsoleCommand::Reset => match deck.reset_speed_selected() {
            Some(effective) => format!("effective {}", format_mmss(effective)),
            None => "nothing selected".to_string(),
        },
        ConsoleCommand::Fit => {
            let report = deck.fit_to_budget()?;
            let mut text = render_summary(&deck.summary());
            if !report.over_budget.is_empty() {
                let _ = write!(text, "\nstill over budget: {:?}", report.over_budget);
            }
            text
        }
        ConsoleCommand::Export { mode, dir } => {
            let Some(dir) = dir else {
                return Ok(Reply::Text("export cancelled".to_string()));
            };
            let report = match mode {
                ExportKind::Uniform => deck.export_uniform(&dir)?,
                ExportKind::AsIs => deck.export_as_is(&dir)?,
            };
            render_export(&report)
        }
        ConsoleCommand::Status => render_summary(&deck.summary()),
        ConsoleCommand::Json => serde_json::to_string_pretty(&deck.summary())?,
        ConsoleCommand::Quit => return Ok(Reply::Quit),
    };
    Ok(Reply::Text(text))
}

pub fn render_summary(summary: &DeckSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:>8}  {:>12}  {:>12}",
        "slide", "limit", "original", "effective"
    );
    for row in &summary.rows {
        let flag = if row.over_budget { "  over" } else { "" };
        let _ = writeln!(
            out,
            "{:>5}  {:>8}  {:>12}  {:>12}{}",
            row.index, row.limit, row.original, row.effective, flag
        );
    }
    let _ = write!(
        out,
        "total {} -> {} (target {})  [{}] [{}]",
        summary.original_total,
        summary.effective_total,
        summary.target,
        summary.record_label,
        summary.play_label
    );
    out
}

fn render_export(report: &ExportReport) -> String {
    let mut out = String::new();
    for file in &report.files {
        let _ = writeln!(out, "wrote {}", file.display());
    }
    let _ = write!(
        out,
        "wrote {} ({}, rate {:.3})",
        report.combined.display(),
        format_mmss(report.combined_duration_secs),
        report.rate
    );
    out
}

/// Read commands from stdin until `quit` or EOF.
pub async fn run(mut deck: Deck, progress_interval: Duration) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(progress_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    println!("{}", render_summary(&deck.summary()));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Some(stats) = deck.tick() {
                    debug!(
                        segment = stats.segment,
                        buffers = stats.buffers,
                        "Recording {}",
                        format_mmss(stats.elapsed_secs)
                    );
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let command = match parse_line(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        // help and usage errors both land here
                        let _ = e.print();
                        continue;
                    }
                };
                match execute(&mut deck, command) {
                    Ok(Reply::Text(text)) => println!("{}", text),
                    Ok(Reply::Quit) => break,
                    Err(e) => {
                        warn!("{:#}", e);
                        println!("warning: {}", e);
                    }
                }
            }
        }
    }

    deck.stop_playback();
    if deck.is_recording() {
        if let Err(e) = deck.stop_recording() {
            warn!("Failed to save recording on exit: {}", e);
        }
    }
    info!("Bye");
    Ok(())
}

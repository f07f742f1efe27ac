// Console command parsing and dispatch.

mod common;

use common::{settings, tone, ScriptedHost, RATE};
use deck_pacer::budget::Budget;
use deck_pacer::console::{execute, parse_line, ConsoleCommand, ExportKind, Reply};
use deck_pacer::deck::Deck;
use deck_pacer::store::SegmentStore;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

fn text(reply: Reply) -> String {
    match reply {
        Reply::Text(text) => text,
        Reply::Quit => panic!("unexpected quit"),
    }
}

#[test]
fn test_parse_commands() {
    assert_eq!(parse_line("   ").unwrap(), None);
    assert_eq!(
        parse_line("select 3").unwrap(),
        Some(ConsoleCommand::Select { index: 3 })
    );
    assert_eq!(
        parse_line("target 4:30").unwrap(),
        Some(ConsoleCommand::Target {
            total: "4:30".to_string()
        })
    );
    assert_eq!(
        parse_line("export as-is /tmp/out").unwrap(),
        Some(ConsoleCommand::Export {
            mode: ExportKind::AsIs,
            dir: Some(PathBuf::from("/tmp/out")),
        })
    );
    assert_eq!(
        parse_line("export uniform").unwrap(),
        Some(ConsoleCommand::Export {
            mode: ExportKind::Uniform,
            dir: None,
        })
    );
    assert_eq!(parse_line("quit").unwrap(), Some(ConsoleCommand::Quit));
}

#[test]
fn test_parse_rejects_unknown() {
    assert!(parse_line("dance").is_err());
    assert!(parse_line("select two").is_err());
    assert!(parse_line("help").is_err());
}

#[test]
fn test_session_through_console() {
    let dir = TempDir::new().unwrap();
    let host = ScriptedHost::new();
    let mut deck = Deck::new(
        host.clone(),
        settings(),
        SegmentStore::new(dir.path().join("recordings"), RATE),
        Budget::new(60, 2),
        Duration::from_millis(10),
    );

    let reply = execute(&mut deck, ConsoleCommand::Record).unwrap_err();
    assert_eq!(reply.to_string(), "select a slide first");

    text(execute(&mut deck, ConsoleCommand::Select { index: 1 }).unwrap());
    assert_eq!(
        text(execute(&mut deck, ConsoleCommand::Record).unwrap()),
        "recording..."
    );
    host.push(tone(1.0));
    assert_eq!(
        text(execute(&mut deck, ConsoleCommand::Record).unwrap()),
        "slide 1 saved (00:01)"
    );

    let cancelled = execute(
        &mut deck,
        ConsoleCommand::Export {
            mode: ExportKind::AsIs,
            dir: None,
        },
    )
    .unwrap();
    assert_eq!(text(cancelled), "export cancelled");
    assert!(!dir.path().join("out").exists());

    let json = text(execute(&mut deck, ConsoleCommand::Json).unwrap());
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["rows"][0]["original"], "00:01");
    assert_eq!(value["rows"][1]["original"], "not recorded");

    assert_eq!(execute(&mut deck, ConsoleCommand::Quit).unwrap(), Reply::Quit);
}

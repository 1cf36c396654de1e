//! Decodes a timeline dump and reports what the client would see.
//!
//! Usage: `inspect-sync <events.json | -> [config.yaml]`
//!
//! The input is a JSON array of room events (e.g. `chunk` of a
//! `/messages` response). Run with `RUST_LOG=debug` to see dispatch
//! details.

use std::io::Read;
use std::process::ExitCode;
use std::{env, fs, io};

use tessera::config;
use tessera::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut args = env::args().skip(1);
    let Some(input) = args.next() else {
        eprintln!("usage: inspect-sync <events.json | -> [config.yaml]");
        return ExitCode::from(2);
    };

    let cfg = match args.next().map(|path| config::load_from_file(&path)) {
        None => DecodeConfig::default(),
        Some(Ok(cfg)) => cfg,
        Some(Err(e)) => {
            tracing::error!(error = %e, "config load failed");
            return ExitCode::FAILURE;
        }
    };

    let data = match read_input(&input) {
        Ok(data) => data,
        Err(e) => {
            tracing::error!(%input, error = %e, "failed to read input");
            return ExitCode::FAILURE;
        }
    };

    let outcome = match decode_batch_bytes::<ClientEvent>(&data, &cfg) {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!(error = %e, "batch rejected");
            return ExitCode::FAILURE;
        }
    };

    for event in &outcome.events {
        println!("{}", summarize(event));
    }

    tracing::info!(
        decoded = outcome.events.len(),
        dropped = outcome.dropped.len(),
        "done"
    );
    for dropped in &outcome.dropped {
        println!(
            "#{:<4} {:<24} dropped: {}",
            dropped.index,
            dropped.event_id.as_deref().unwrap_or("<no id>"),
            dropped.error
        );
    }

    if outcome.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}

fn read_input(input: &str) -> io::Result<Vec<u8>> {
    if input == "-" {
        let mut data = Vec::new();
        io::stdin().read_to_end(&mut data)?;
        Ok(data)
    } else {
        fs::read(input)
    }
}

fn summarize(event: &ClientEvent) -> String {
    let detail = match &event.content {
        EventContent::Message(message) => {
            format!("[{}] {}", message.msgtype(), message.body())
        }
        EventContent::Encrypted(encrypted) => format!("<{}>", encrypted.algorithm()),
        EventContent::Name(name) => format!("name = {:?}", name.name),
        EventContent::Topic(topic) => format!("topic = {:?}", topic.topic),
        EventContent::Member(member) => format!(
            "{} -> {:?}",
            event.state_key.as_deref().unwrap_or(""),
            member.membership
        ),
        other => other.event_type().to_string(),
    };
    format!(
        "{:<24} {:<22} {}: {}",
        event.event_id,
        event.sender.to_string(),
        event.event_type.to_string(),
        detail
    )
}

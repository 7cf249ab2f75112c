//! Transcript Sidecar - display buffers for PingLearn voice sessions
//!
//! Keeps one deduplicating transcript buffer per voice session and serves it
//! over stdin/stdout JSON IPC. Logs go to stderr.

use clap::Parser;
use log::{error, info};
use pinglearn_transcript::cli::CliArgs;
use pinglearn_transcript::display_buffer::SystemClock;
use pinglearn_transcript::protocol::{Emitter, Response, Sidecar};
use pinglearn_transcript::session::TranscriptSessions;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

fn send_response(response: &Response) {
    let json = match serde_json::to_string(response) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            return;
        }
    };

    let mut stdout = io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{}", json).and_then(|_| stdout.flush()) {
        error!("Failed to write response: {}", e);
    }
}

fn main() {
    let args = CliArgs::parse();

    // Initialize logging
    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .format_target(false)
        .init();

    info!("Transcript sidecar starting...");

    let settings = match args.resolve_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid settings: {:#}", e);
            send_response(&Response::Error {
                message: format!("Invalid settings: {:#}", e),
            });
            std::process::exit(2);
        }
    };
    info!(
        "Buffer settings: capacity={}, dedup_window={}ms",
        settings.max_capacity, settings.dedup_window_ms
    );

    let emit: Emitter = Arc::new(send_response);
    let sessions = TranscriptSessions::new(settings, Arc::new(SystemClock::new()));
    let mut sidecar = Sidecar::new(sessions, emit);

    // Send ready message
    send_response(&Response::Ok {
        message: "Transcript sidecar ready".to_string(),
    });

    // Process requests
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        };

        if !sidecar.handle_line(&line) {
            break;
        }
    }

    info!("Transcript sidecar stopped");
}

//! `g2ctl`: offline diagnostics for the G2 glasses protocol.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use g2_protocol::{
    build_auth_frames, paginate_text, parse_frame, teleprompter_plan, InboundDecoder, ProtocolSession,
    ScrollMode, POST_AUTH_SEQUENCE,
};
use g2_session::{SessionConfig, SessionError};
use serde::Serialize;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Decode, build and inspect G2 glasses protocol frames
#[derive(Parser, Debug)]
#[command(name = "g2ctl", version, about, long_about = None)]
struct Args {
    /// Session configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Parse hex-encoded frames and print the decoded events as JSON
    Decode {
        /// One frame per argument, e.g. aa12010401010101...
        #[arg(required = true)]
        frames: Vec<String>,
    },

    /// Show how text is laid out on the teleprompter
    Paginate {
        /// Text to lay out
        text: String,
    },

    /// Print the frames of a teleprompter stream, as sent right after authentication
    Frames {
        /// Text to send
        text: String,

        /// Use automatic scrolling instead of the configured mode
        #[arg(long, default_value_t = false)]
        auto: bool,
    },

    /// Print the seven authentication frames
    Auth {
        /// Unix timestamp to embed (defaults to now)
        #[arg(long)]
        timestamp: Option<u64>,
    },
}

#[derive(Serialize)]
struct DecodeOutput<'a> {
    input: &'a str,
    #[serde(flatten)]
    result: DecodeResult,
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum DecodeResult {
    Decoded { event: g2_protocol::DecodedEvent },
    Incomplete { pending: usize },
    Invalid { kind: &'static str, error: String },
}

fn main() -> Result<(), SessionError> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
    g2_session::metrics::describe_metrics();

    let config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    debug!("config: {:?}", config);

    match args.command {
        Cmd::Decode { frames } => decode(&frames),
        Cmd::Paginate { text } => paginate(&text),
        Cmd::Frames { text, auto } => {
            let mode = if auto { ScrollMode::Auto } else { config.scroll_mode };
            frames(&text, mode, &config)
        }
        Cmd::Auth { timestamp } => auth(timestamp),
    }
}

fn decode(inputs: &[String]) -> Result<(), SessionError> {
    let mut decoder = InboundDecoder::new();
    for input in inputs {
        let cleaned: String = input.chars().filter(|c| !c.is_whitespace() && *c != ':').collect();
        let result = match hex::decode(&cleaned) {
            Ok(bytes) => match decoder.deliver_bytes(&bytes) {
                Ok(Some(event)) => DecodeResult::Decoded { event },
                Ok(None) => DecodeResult::Incomplete {
                    pending: decoder.pending(),
                },
                Err(e) => DecodeResult::Invalid {
                    kind: e.kind(),
                    error: e.to_string(),
                },
            },
            Err(e) => {
                warn!("not valid hex: {}", input);
                DecodeResult::Invalid {
                    kind: "bad_hex",
                    error: e.to_string(),
                }
            }
        };
        print_json(&DecodeOutput { input, result })?;
    }
    Ok(())
}

fn paginate(text: &str) -> Result<(), SessionError> {
    for (index, page) in paginate_text(text).iter().enumerate() {
        let marker = if page.is_blank() { " (blank)" } else { "" };
        println!("page {:2}{}", index, marker);
        for line in page.lines() {
            println!("  |{}|", line);
        }
    }
    Ok(())
}

fn frames(text: &str, mode: ScrollMode, config: &SessionConfig) -> Result<(), SessionError> {
    let mut session = ProtocolSession::new(config.max_packet_payload)?;

    // Walk the handshake without sending so numbering matches a live session.
    let handshake = session.on_connected(0)?;
    while handshake.next_step().is_some() {
        handshake.mark_sent();
    }
    handshake.complete();
    debug!("authenticated, numbering from sequence {}", POST_AUTH_SEQUENCE);

    for command in teleprompter_plan(text, mode) {
        let frames = session.next_outbound_frames(&command)?;
        for (i, frame) in frames.iter().enumerate() {
            let header = parse_frame(frame)?;
            println!(
                "{:<18} seq={:3} svc={} part={}/{} {}",
                command.name(),
                header.sequence,
                header.service_id,
                i + 1,
                frames.len(),
                hex::encode(frame)
            );
        }
    }
    Ok(())
}

fn auth(timestamp: Option<u64>) -> Result<(), SessionError> {
    let timestamp = timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64);
    println!("timestamp {}", timestamp);
    for frame in build_auth_frames(timestamp)? {
        let header = parse_frame(&frame)?;
        println!("step {} svc={} {}", header.sequence, header.service_id, hex::encode(&frame));
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), SessionError> {
    let json = serde_json::to_string(value)
        .map_err(|e| SessionError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    println!("{}", json);
    Ok(())
}

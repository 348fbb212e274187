//! Headless renderer demo.
//!
//! Starts the server, registers a binding and echoes every frontend call
//! back as a callback result. Browse to the printed URL to connect.
//!
//! Usage:
//!   cargo run --example headless
//!   cargo run --example headless -- --debug --port 0

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use headless_bridge::{AppConfig, Headless, MessageKind, Result};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments.
#[derive(Debug, Clone)]
struct Args {
    debug: bool,
    port: u16,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let port = args
            .iter()
            .position(|a| a == "--port")
            .and_then(|i| args.get(i + 1))
            .and_then(|p| p.parse().ok())
            .unwrap_or(headless_bridge::DEFAULT_PORT);

        Self {
            debug: args.iter().any(|a| a == "--debug"),
            port,
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

fn init_logging(debug: bool) {
    let filter = if debug {
        "headless_bridge=debug"
    } else {
        "headless_bridge=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    let (calls_tx, mut calls) = mpsc::unbounded_channel::<String>();

    let renderer = Headless::builder()
        .config(
            AppConfig::new()
                .with_css("h1 { font-family: sans-serif; color: #336; }")
                .with_html_fragment("<h1>Hello from Rust</h1><p id='ticks'></p>"),
        )
        .port(args.port)
        .dispatcher(move |message: String| {
            let _ = calls_tx.send(message);
        })
        .events(|name: &str| println!("[event] {name}"))
        .build()?;

    renderer.new_binding("main.Echo")?;
    renderer.evaluate("console.log('queued before connect')", MessageKind::Script)?;

    // Echo calls back to the frontend.
    let echo = renderer.clone();
    tokio::spawn(async move {
        while let Some(call) = calls.recv().await {
            println!("[call] {call}");
            if let Err(e) = echo.callback(&call) {
                eprintln!("[call] failed: {e}");
            }
        }
    });

    // Periodic notifications; buffered until a frontend connects.
    let ticker = renderer.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(5));
        for tick in 0u64.. {
            interval.tick().await;
            if let Err(e) = ticker.notify("demo:tick", &tick) {
                eprintln!("[tick] failed: {e}");
            }
        }
    });

    tokio::select! {
        result = renderer.run() => result,
        _ = tokio::signal::ctrl_c() => {
            println!("Shutting down");
            Ok(())
        }
    }
}

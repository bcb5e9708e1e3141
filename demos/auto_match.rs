//! # Auto Match Example
//!
//! Plays a complete best-of-two series between two algorithms on a running
//! game service:
//!
//! 1. Start (or create) a session over HTTP
//! 2. Auto-play game one with team A moving first
//! 3. Swap seats and auto-play game two
//! 4. Print the series winner and shut down
//!
//! ## Running
//!
//! ```sh
//! # Start the game service on localhost:8001, then:
//! cargo run --example auto_match
//!
//! # Override the service URL and the algorithm directories:
//! CUBE_FOUR_URL=http://my-server:8001 \
//! CUBE_FOUR_TEAM_A=teams/alpha CUBE_FOUR_TEAM_B=teams/beta \
//!     cargo run --example auto_match
//! ```

use std::time::Duration;

use cube_four_client::{
    AutoToggle, ControllerConfig, GameController, GameEvent, HttpGameService, Lineup,
    PlaySettings, Seat, Team,
};

/// Default service URL when `CUBE_FOUR_URL` is not set.
const DEFAULT_URL: &str = "http://localhost:8001";

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Initialize tracing. Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let url = env_or("CUBE_FOUR_URL", DEFAULT_URL);
    let team_a = Team::new("Team A", env_or("CUBE_FOUR_TEAM_A", "teams/alpha"));
    let team_b = Team::new("Team B", env_or("CUBE_FOUR_TEAM_B", "teams/beta"));
    tracing::info!("Playing against {url}");

    let service = HttpGameService::new(url);
    let settings = PlaySettings::new(10, Duration::from_millis(300));
    let (controller, mut events) =
        GameController::new(service, ControllerConfig::new(), settings);
    controller.set_lineup(Lineup::new(Some(team_a.clone()), Some(team_b.clone()), Seat::Ai1));

    // ── Event printer ───────────────────────────────────────────────
    // Everything the controller would show on screen arrives here.
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                GameEvent::MoveLogged(entry) => println!("{entry}"),
                GameEvent::LogNote(text) => println!("{text}"),
                GameEvent::Notice(text) => println!("!! {text}"),
                GameEvent::Status(text) => tracing::debug!("status: {text}"),
                GameEvent::SeriesDecided { winner } => {
                    println!("Series winner: {winner}");
                }
                other => tracing::trace!("event: {other:?}"),
            }
        }
    });

    controller.resume_or_start(None).await?;

    // ── Two games ───────────────────────────────────────────────────
    for game in 1..=2 {
        if game == 2 {
            // The second game swaps who moves first.
            controller.set_lineup(Lineup::new(Some(team_a.clone()), Some(team_b.clone()), Seat::Ai2));
            controller.next_game().await?;
        }

        let AutoToggle::Started(handle) = controller.toggle_auto_play() else {
            tracing::error!("Auto-play could not be started");
            break;
        };

        tokio::select! {
            exit = handle => {
                match exit? {
                    Ok(exit) => tracing::info!("Game {game} ended: {exit:?}"),
                    Err(e) => {
                        tracing::error!("Game {game} failed: {e}");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down…");
                break;
            }
        }
    }

    // ── Cleanup ─────────────────────────────────────────────────────
    for result in controller.series() {
        println!("  {} in {} moves", result.winner, result.moves);
    }
    controller.shutdown().await;
    drop(controller);
    printer.abort();
    tracing::info!("Controller shut down. Goodbye!");
    Ok(())
}

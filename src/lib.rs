//! # Cube Four Client
//!
//! Async client for a 3D four-in-a-row game on a 4×4×4 gravity board, played
//! against a remote game service that owns the rules and the AI.
//!
//! The heart of the crate is [`GameController`], which keeps one visible game
//! session consistent while user clicks, AI steps, turn timeouts, auto-play
//! and resets overlap.
//!
//! ## Features
//!
//! - **Service-agnostic**: implement the [`GameService`] trait for any backend
//! - **HTTP built-in**: the default `service-http` feature provides [`HttpGameService`]
//! - **Event-driven**: receive typed [`GameEvent`]s via a channel
//! - **Best-of-two series**: results of both games are aggregated into a winner
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # #[cfg(feature = "service-http")]
//! # async fn demo() -> cube_four_client::Result<()> {
//! use cube_four_client::{
//!     ControllerConfig, GameController, GameEvent, HttpGameService, Lineup, PlaySettings, Seat,
//!     Team,
//! };
//!
//! let service = HttpGameService::new("http://localhost:8001");
//! let (controller, mut events) =
//!     GameController::new(service, ControllerConfig::new(), PlaySettings::default());
//! controller.set_lineup(Lineup::new(
//!     Some(Team::new("Alpha", "teams/alpha")),
//!     Some(Team::new("Beta", "teams/beta")),
//!     Seat::Ai1,
//! ));
//! controller.resume_or_start(None).await?;
//! controller.toggle_auto_play();
//!
//! while let Some(event) = events.recv().await {
//!     if let GameEvent::Status(text) = event {
//!         println!("{text}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod autoplay;
pub mod board;
pub mod classifier;
pub mod controller;
pub mod epoch;
pub mod error;
pub mod event;
pub mod gate;
pub mod lineup;
pub mod protocol;
pub mod series;
pub mod service;
pub mod services;
pub mod settings;
pub mod timer;

// Re-export primary types for ergonomic imports.
pub use autoplay::{AutoExit, AutoState, AutoToggle};
pub use board::{Board, Column, Coord, Side};
pub use classifier::Outcome;
pub use controller::{GameController, StepReport, Submission};
pub use error::{CubeFourError, Result};
pub use event::{GameEvent, LogLine, MoveLogEntry, VisibleState};
pub use lineup::{Lineup, Seat, Team};
pub use protocol::SessionId;
pub use series::{MatchResult, MatchSeries};
pub use service::GameService;
pub use settings::{ControllerConfig, PlaySettings};

#[cfg(feature = "service-http")]
pub use services::HttpGameService;

//! [`GameService`](crate::GameService) implementations.
//!
//! Concrete services live behind feature gates:
//!
//! | Feature        | Service              |
//! |----------------|----------------------|
//! | `service-http` | [`HttpGameService`]  |
//!
//! # Example
//!
//! ```rust,ignore
//! # async fn example() -> cube_four_client::Result<()> {
//! use cube_four_client::{GameService, HttpGameService};
//!
//! let service = HttpGameService::new("http://localhost:8001");
//! let session = service.create_session().await?;
//! let state = service.fetch_state(&session).await?;
//! println!("{:?} to move", state.current_side());
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "service-http")]
pub mod http;

#[cfg(feature = "service-http")]
pub use http::HttpGameService;

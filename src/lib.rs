//! Fanhub session core.
//!
//! Client-side session handling for the Fanhub subscription platform: a
//! persisted token store, the auth controller that logs in, refreshes,
//! verifies and logs out against the platform's `/auth/*` routes, and a
//! route guard that protected views consult before rendering.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use fanhub_session::auth::{AuthController, HttpAuthEndpoint, RouteGuard, SessionState};
//! use fanhub_session::config::SessionConfig;
//!
//! # async fn example() -> fanhub_session::error::Result<()> {
//! let config = SessionConfig::from_env()?;
//! let session = Arc::new(SessionState::restore(Arc::new(config.session_store())));
//! let endpoint = Arc::new(HttpAuthEndpoint::from_config(&config)?);
//! let controller = Arc::new(AuthController::new(session.clone(), endpoint));
//!
//! let _mounted = controller.mount();
//! let mut guard = RouteGuard::new(session.subscribe());
//! println!("guard says {}", guard.resolved().await?);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;

#[cfg(feature = "cli")]
pub mod cli;

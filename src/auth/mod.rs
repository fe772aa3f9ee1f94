//! Session state, token storage and the auth flows built on them.

pub mod controller;
pub mod endpoint;
pub mod error;
pub mod guard;
pub mod navigation;
pub mod session;
pub mod state;
pub mod store;
pub mod token;

pub use controller::{AuthController, MountHandle, INVALID_CREDENTIALS_MESSAGE};
pub use endpoint::{AuthEndpoint, Credentials, HttpAuthEndpoint, LoginResponse, RefreshResponse};
pub use error::AuthError;
pub use guard::{decide, GuardDecision, RouteGuard};
pub use navigation::{Navigator, Route};
pub use session::SessionState;
pub use state::{AuthPatch, AuthState, SessionSnapshot, SessionStatus};
pub use store::{FileSessionStore, MemorySessionStore, SessionStore, SessionStoreConfig};
pub use token::{TokenPair, User, UserId};

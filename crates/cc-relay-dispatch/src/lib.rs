//! The dispatch engine. Assembles per-provider runtime state, the five routing strategies, the
//! circuit-breaker health tracker, the extended-thinking signature cache integration, and the
//! `/v1/messages` orchestrator that ties them together.
//!
//! This crate is deliberately transport-agnostic about everything *except* the one endpoint it
//! owns: `cc-relay-server` builds the rest of the HTTP surface (`/health`, `/v1/models`,
//! `/v1/providers`, client auth, request-id) around the [`state::DispatchState`] and
//! [`handler::messages`]/[`handler::handle`] this crate exposes.

pub mod error;
pub mod handler;
pub mod health;
pub mod keypool;
pub mod model_filter;
pub mod provider;
pub mod proxy;
pub mod router;
pub mod sse;
pub mod state;
pub mod thinking;

pub use error::DispatchError;
pub use handler::{handle, messages};
pub use health::{CircuitState, HealthTracker};
pub use state::{DispatchState, ProviderRuntime};

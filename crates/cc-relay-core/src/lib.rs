//! Shared primitives used across the relay: the error-translation contract, the
//! `anthropic-*` header forwarding rule, model-group derivation and longest-prefix matching.

mod error;
mod headers;
mod model_group;
mod prefix;

pub use error::HttpError;
pub use headers::{CLIENT_AUTH_HEADERS, client_credential, ensure_anthropic_version, forward_anthropic_headers, has_forward_prefix};
pub use model_group::model_group;
pub use prefix::longest_prefix_match;

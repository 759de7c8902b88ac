//! The background health-check task: every `health_check_interval_ms`, every currently-OPEN
//! provider gets one lightweight reachability call; a response (any status — reachability, not
//! correctness, is all a probe claims) reports success back into the tracker, which moves the
//! provider to HALF-OPEN for real traffic to confirm.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::state::SharedState;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

type ProbeFuture = Pin<Box<dyn Future<Output = bool> + Send>>;

/// Builds the closure [`cc_relay_dispatch::health::spawn_prober`] calls on each tick. Reads
/// the provider's base URL out of the *current* snapshot on every call, so a hot-reloaded
/// base URL takes effect on the very next probe rather than requiring a restart.
pub fn make_prober(state: Arc<SharedState>, client: reqwest::Client) -> impl Fn(String) -> ProbeFuture + Send + Sync + 'static {
    move |provider_name: String| {
        let state = Arc::clone(&state);
        let client = client.clone();
        Box::pin(async move {
            let snapshot = state.load();
            let Some(provider) = snapshot.provider(&provider_name) else {
                return false;
            };
            let url = provider.base_url.clone();
            matches!(tokio::time::timeout(PROBE_TIMEOUT, client.get(url).send()).await, Ok(Ok(_)))
        })
    }
}

use std::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use secrecy::SecretString;

const WINDOW: Duration = Duration::from_secs(60);

struct WindowedUsage {
    window_start_ms: AtomicU64,
    input_tokens: AtomicU32,
    output_tokens: AtomicU32,
    requests: AtomicU32,
}

impl WindowedUsage {
    fn new(now_ms: u64) -> Self {
        Self {
            window_start_ms: AtomicU64::new(now_ms),
            input_tokens: AtomicU32::new(0),
            output_tokens: AtomicU32::new(0),
            requests: AtomicU32::new(0),
        }
    }

    fn roll_if_expired(&self, now_ms: u64) {
        let start = self.window_start_ms.load(Ordering::Acquire);
        if now_ms.saturating_sub(start) >= u64::try_from(WINDOW.as_millis()).unwrap_or(u64::MAX)
            && self
                .window_start_ms
                .compare_exchange(start, now_ms, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            self.input_tokens.store(0, Ordering::Release);
            self.output_tokens.store(0, Ordering::Release);
            self.requests.store(0, Ordering::Release);
        }
    }
}

pub struct Credential {
    pub api_key: SecretString,
    pub rpm: Option<u32>,
    pub tpm: Option<u32>,
    usage: WindowedUsage,
}

/// Rotates among a provider's credentials. `next()` is round-robin; a credential whose
/// recorded RPM/TPM usage for the current window exceeds its configured limit is skipped in
/// favor of the next one, falling back to the round-robin pick if every credential is over
/// budget (a hard failure here would be worse than a possible 429 upstream).
pub struct KeyPool {
    start: Instant,
    credentials: Vec<Credential>,
    cursor: AtomicUsize,
}

impl KeyPool {
    #[must_use]
    pub fn new(credentials: Vec<(SecretString, Option<u32>, Option<u32>)>) -> Self {
        let start = Instant::now();
        let now_ms = 0;
        Self {
            start,
            credentials: credentials
                .into_iter()
                .map(|(api_key, rpm, tpm)| Credential {
                    api_key,
                    rpm,
                    tpm,
                    usage: WindowedUsage::new(now_ms),
                })
                .collect(),
            cursor: AtomicUsize::new(0),
        }
    }

    fn now_ms(&self) -> u64 {
        u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    /// Returns the next credential to use, skipping any whose window is currently over budget.
    #[must_use]
    pub fn next(&self) -> Option<&Credential> {
        if self.credentials.is_empty() {
            return None;
        }
        let now_ms = self.now_ms();
        let len = self.credentials.len();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % len;

        for offset in 0..len {
            let idx = (start + offset) % len;
            let candidate = &self.credentials[idx];
            candidate.usage.roll_if_expired(now_ms);
            if !is_over_budget(candidate) {
                return Some(candidate);
            }
        }
        // Every credential is over budget; fall back to round-robin rather than fail outright.
        Some(&self.credentials[start])
    }

    /// Records usage for windowed RPM/TPM accounting against whichever credential handled the
    /// request.
    pub fn report(&self, credential: &Credential, input_tokens: u32, output_tokens: u32) {
        let now_ms = self.now_ms();
        credential.usage.roll_if_expired(now_ms);
        credential.usage.input_tokens.fetch_add(input_tokens, Ordering::AcqRel);
        credential.usage.output_tokens.fetch_add(output_tokens, Ordering::AcqRel);
        credential.usage.requests.fetch_add(1, Ordering::AcqRel);
    }
}

fn is_over_budget(credential: &Credential) -> bool {
    if let Some(rpm) = credential.rpm
        && credential.usage.requests.load(Ordering::Acquire) >= rpm
    {
        return true;
    }
    if let Some(tpm) = credential.tpm {
        let used = credential.usage.input_tokens.load(Ordering::Acquire) + credential.usage.output_tokens.load(Ordering::Acquire);
        if used >= tpm {
            return true;
        }
    }
    false
}

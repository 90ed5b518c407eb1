//! Anti-loop tokens.
//!
//! A token is minted once per client request and travels with every forwarded
//! hop. A node that sees a token it is already serving for the same key
//! refuses the hop with `CircularRequest`.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::error::{CacheError, Result};

static LAST_TOKEN: AtomicU64 = AtomicU64::new(0);

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Mints a token: Unix-epoch nanoseconds, strictly increasing within the
/// process.
pub fn mint_token() -> u64 {
    let now = now_nanos();
    let mut last = LAST_TOKEN.load(Ordering::Relaxed);
    loop {
        let next = now.max(last + 1);
        match LAST_TOKEN.compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return next,
            Err(current) => last = current,
        }
    }
}

/// Time elapsed since `token` was minted, zero for tokens from the future.
pub fn token_age(token: u64) -> Duration {
    Duration::from_nanos(now_nanos().saturating_sub(token))
}

/// Time limits of one peer sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepBudget {
    /// Upper bound for a single peer fetch
    pub hop_timeout: Duration,
    /// Upper bound for the whole sweep, measured from token minting
    pub deadline: Duration,
}

impl Default for SweepBudget {
    fn default() -> Self {
        Self {
            hop_timeout: Duration::from_secs(2),
            deadline: Duration::from_secs(10),
        }
    }
}

impl SweepBudget {
    pub fn new(hop_timeout: Duration, deadline: Duration) -> Self {
        Self {
            hop_timeout,
            deadline,
        }
    }

    /// Absolute deadline of the sweep carrying `token`. Every node the token
    /// reaches computes the same instant, give or take clock skew.
    pub fn deadline_for(&self, token: u64) -> Instant {
        Instant::now() + self.deadline.saturating_sub(token_age(token))
    }

    /// Whether `token` is already older than the whole sweep deadline.
    pub fn is_expired(&self, token: u64) -> bool {
        token_age(token) >= self.deadline
    }
}

/// Per-key sets of tokens currently being served.
#[derive(Debug, Default)]
pub struct ActiveTokens {
    by_key: Mutex<HashMap<String, HashSet<u64>>>,
}

impl ActiveTokens {
    /// Registers `token` for `key`, failing if it is already active.
    pub fn enter(&self, key: &str, token: u64) -> Result<TokenGuard<'_>> {
        let mut by_key = self.by_key.lock();
        if !by_key.entry(key.to_string()).or_default().insert(token) {
            return Err(CacheError::CircularRequest(key.to_string()));
        }
        Ok(TokenGuard {
            tokens: self,
            key: key.to_string(),
            token,
        })
    }

    pub fn is_active(&self, key: &str, token: u64) -> bool {
        self.by_key
            .lock()
            .get(key)
            .is_some_and(|set| set.contains(&token))
    }

    /// Number of keys with at least one active token.
    pub fn keys(&self) -> usize {
        self.by_key.lock().len()
    }

    fn leave(&self, key: &str, token: u64) {
        let mut by_key = self.by_key.lock();
        if let Some(set) = by_key.get_mut(key) {
            set.remove(&token);
            if set.is_empty() {
                by_key.remove(key);
            }
        }
    }
}

/// Releases its token when dropped, whatever the outcome of the load.
#[derive(Debug)]
pub struct TokenGuard<'a> {
    tokens: &'a ActiveTokens,
    key: String,
    token: u64,
}

impl TokenGuard<'_> {
    pub fn token(&self) -> u64 {
        self.token
    }
}

impl Drop for TokenGuard<'_> {
    fn drop(&mut self) {
        self.tokens.leave(&self.key, self.token);
    }
}

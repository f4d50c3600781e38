//! Round-robin API key pool with retry rotation.
//!
//! The pool owns an ordered list of interchangeable API keys and a cursor
//! pointing at the key the next call should use. A successful call advances
//! the cursor so the next unrelated call lands on a fresh key, spreading
//! quota consumption over the pool for the lifetime of the process. A
//! retryable failure (see [`GenError::is_retryable`]) also advances the
//! cursor and the same call moves on to the next key; any other failure
//! propagates immediately, since no key switch can fix it.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::GenError;

/// An ordered, non-empty pool of API keys with a rotating cursor.
///
/// The cursor is a relaxed atomic: concurrent top-level calls may interleave
/// and end up reusing or skipping a key. That only shifts load distribution,
/// never correctness, so no locking is done.
pub struct KeyPool {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl KeyPool {
    /// Create a pool from an ordered key list.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::MissingApiKeys`] for an empty list.
    pub fn new(keys: Vec<String>) -> Result<Self, GenError> {
        if keys.is_empty() {
            return Err(GenError::MissingApiKeys);
        }
        Ok(Self { keys, cursor: AtomicUsize::new(0) })
    }

    /// Number of keys in the pool.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always false: construction rejects empty pools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Current cursor position, `0 <= cursor < len`.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor.load(Ordering::Relaxed) % self.keys.len()
    }

    fn advance(&self) {
        let len = self.keys.len();
        let _ = self
            .cursor
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |i| Some((i + 1) % len));
    }

    /// Run `op` with the current key, rotating through the pool on
    /// key-specific failures.
    ///
    /// `op` may run once per key, so it must be safe to repeat against the
    /// remote service. Keys are tried strictly one at a time; trying them
    /// concurrently would burn several quotas for one logical call.
    ///
    /// # Errors
    ///
    /// Returns [`GenError::PoolExhausted`] once every key has failed
    /// retryably, carrying the last failure as its source. A non-retryable
    /// error from `op` is returned as-is after a single attempt.
    pub async fn call_with_rotation<T, F, Fut>(&self, op: F) -> Result<T, GenError>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = Result<T, GenError>>,
    {
        let pool_size = self.keys.len();
        let mut attempts = 0;
        let mut last_error = None;

        while attempts < pool_size {
            let index = self.cursor();
            let key = self.keys[index].clone();

            match op(key).await {
                Ok(value) => {
                    self.advance();
                    return Ok(value);
                }
                Err(e) if e.is_retryable() => {
                    eprintln!(
                        "Warning: API call with key index {index} failed: {e}. Trying next key."
                    );
                    self.advance();
                    attempts += 1;
                    last_error = Some(e);
                }
                // Not key-related; another key would fail identically.
                Err(e) => return Err(e),
            }
        }

        let Some(source) = last_error else {
            return Err(GenError::MissingApiKeys);
        };
        Err(GenError::PoolExhausted { attempts: pool_size, source: Box::new(source) })
    }
}

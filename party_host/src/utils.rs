//! Small helpers shared across the engine.

use rand::{Rng, distr::Alphanumeric};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> Timestamp {
    chrono::Utc::now().timestamp_millis()
}

/// Random alphanumeric string of `len` characters from the thread-local CSPRNG.
pub fn random_alphanumeric(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

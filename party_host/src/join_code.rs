//! Short, human-typeable join codes.
//!
//! Codes are drawn from an alphabet without the glyphs people confuse when
//! reading a code off a shared screen (`0`/`O`, `1`/`I`).

use rand::Rng;

/// Alphabet used for generated codes.
pub const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of every join code.
pub const JOIN_CODE_LENGTH: usize = 4;

/// Generate a fresh random join code.
pub fn generate_join_code() -> String {
    let mut rng = rand::rng();
    (0..JOIN_CODE_LENGTH)
        .map(|_| JOIN_CODE_ALPHABET[rng.random_range(0..JOIN_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Uppercase a user-entered code and strip anything that isn't `A-Z` or `0-9`.
pub fn normalize_join_code(code: &str) -> String {
    code.chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect()
}

/// Whether `code` normalizes to exactly four uppercase alphanumerics.
pub fn is_valid_join_code(code: &str) -> bool {
    let normalized = normalize_join_code(code);
    normalized.len() == JOIN_CODE_LENGTH
        && normalized
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

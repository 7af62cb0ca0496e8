//! Random short code generation

use rand::distr::{Alphanumeric, SampleString};

/// Number of characters in a generated short code
pub const SHORT_CODE_LENGTH: usize = 8;

/// Characters a generated short code is drawn from
pub const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random short code.
///
/// Each character is sampled uniformly from [`ALPHABET`] using the
/// thread-local generator. Uniqueness is not checked here; the storage
/// layer rejects duplicates and the caller retries.
pub fn generate_short_code() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), SHORT_CODE_LENGTH)
}

//! One-time codes for email verification and password reset.
//!
//! Codes are sent in plaintext and stored as SHA-256 hex digests.

use rand::Rng;
use sha2::{Digest, Sha256};

/// How long a registration OTP stays valid.
pub const OTP_TTL_MINUTES: i64 = 10;

/// How long a password reset token stays valid.
pub const RESET_TOKEN_TTL_MINUTES: i64 = 60;

/// Generate a 6-digit verification code.
#[must_use]
pub fn generate_otp() -> String {
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

/// Generate a 64-character hex reset token.
#[must_use]
pub fn generate_reset_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

/// Digest a code for storage and lookup.
#[must_use]
pub fn hash_code(code: &str) -> String {
    hex::encode(Sha256::digest(code.trim().as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_otp_format() {
        for _ in 0..100 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            let n: u32 = code.parse().unwrap();
            assert!((100_000..1_000_000).contains(&n));
        }
    }

    #[test]
    fn test_reset_token_format() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_reset_token());
    }

    #[test]
    fn test_hash_code_is_stable_and_trimmed() {
        assert_eq!(hash_code("123456"), hash_code(" 123456 "));
        assert_ne!(hash_code("123456"), hash_code("123457"));
        assert_eq!(hash_code("123456").len(), 64);
    }
}

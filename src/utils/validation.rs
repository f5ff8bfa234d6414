//! Input validation for the boundary the core actually guards (spec §8).
//!
//! Everything else validated by the original teacher (username, email,
//! password, contest visibility, ...) belongs to the excluded CRUD/auth
//! layer and was dropped rather than ported.

use crate::constants::{MAX_LANGUAGE_TAG_BYTES, MAX_SUBMISSION_CONTENT_BYTES, MIN_SUBMISSION_CONTENT_BYTES};

/// Validate `Submission.content` length (spec §3, boundary cases in §8):
/// 1..=64,000 bytes inclusive.
pub fn validate_submission_content(content: &str) -> Result<(), &'static str> {
    let len = content.len();
    if len < MIN_SUBMISSION_CONTENT_BYTES {
        return Err("submission content must not be empty");
    }
    if len > MAX_SUBMISSION_CONTENT_BYTES {
        return Err("submission content exceeds 64,000 bytes");
    }
    Ok(())
}

/// Validate a normalized `Submission.language` tag: non-empty, at most
/// 32 bytes. Whether the tag names a *configured* language is a
/// separate question the dispatcher answers by consulting
/// `JudgeConfig` (an unconfigured tag is `UnsupportedLanguage`, not a
/// validation failure).
pub fn validate_language_tag(language: &str) -> Result<(), &'static str> {
    if language.is_empty() {
        return Err("language tag must not be empty");
    }
    if language.len() > MAX_LANGUAGE_TAG_BYTES {
        return Err("language tag exceeds 32 bytes");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_boundary_one_and_max_bytes_accepted() {
        assert!(validate_submission_content("x").is_ok());
        let max = "x".repeat(MAX_SUBMISSION_CONTENT_BYTES);
        assert!(validate_submission_content(&max).is_ok());
    }

    #[test]
    fn content_boundary_zero_and_over_max_rejected() {
        assert!(validate_submission_content("").is_err());
        let over = "x".repeat(MAX_SUBMISSION_CONTENT_BYTES + 1);
        assert!(validate_submission_content(&over).is_err());
    }

    #[test]
    fn language_tag_bounds() {
        assert!(validate_language_tag("python").is_ok());
        assert!(validate_language_tag("").is_err());
        assert!(validate_language_tag(&"x".repeat(33)).is_err());
        assert!(validate_language_tag(&"x".repeat(32)).is_ok());
    }
}

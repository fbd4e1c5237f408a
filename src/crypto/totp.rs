use totp_rs::{Algorithm, Secret, TOTP};

use crate::error::{AppError, Result};

/// Number of digits in a SmartAPI TOTP code.
const TOTP_DIGITS: usize = 6;
/// Time step in seconds.
const TOTP_STEP_SECS: u64 = 30;

/// Generates the TOTP code for `unix_secs` from a base32 shared secret.
///
/// Authenticator apps hand out secrets in mixed case, grouped with spaces and
/// sometimes padded, so those are normalised away before decoding.
pub fn generate_code_at(secret: &str, unix_secs: u64) -> Result<String> {
    let normalized: String = secret
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '=')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if normalized.is_empty() {
        return Err(AppError::Config("TOTP secret is not configured".to_string()));
    }

    let key = Secret::Encoded(normalized)
        .to_bytes()
        .map_err(|e| AppError::Config(format!("TOTP secret is not valid base32: {:?}", e)))?;

    // TOTP::new rejects secrets under 128 bits; the issuer decides the length, not us.
    let totp = TOTP::new_unchecked(Algorithm::SHA1, TOTP_DIGITS, 1, TOTP_STEP_SECS, key);
    Ok(totp.generate(unix_secs))
}

/// Generates the TOTP code for the current time.
pub fn generate_current_code(secret: &str) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let now = u64::try_from(now)
        .map_err(|_| AppError::Internal("System clock is before the unix epoch".to_string()))?;
    generate_code_at(secret, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 appendix B seed "12345678901234567890", SHA-1, truncated to 6 digits.
    const RFC_SECRET: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";

    #[test]
    fn matches_rfc6238_vectors() {
        assert_eq!(generate_code_at(RFC_SECRET, 59).unwrap(), "287082");
        assert_eq!(generate_code_at(RFC_SECRET, 1_111_111_109).unwrap(), "081804");
        assert_eq!(generate_code_at(RFC_SECRET, 1_234_567_890).unwrap(), "005924");
    }

    #[test]
    fn accepts_lowercase_spaced_secrets() {
        let spaced = "gezd gnbv gy3t qojq gezd gnbv gy3t qojq";
        assert_eq!(generate_code_at(spaced, 59).unwrap(), "287082");
    }

    #[test]
    fn same_window_same_code() {
        assert_eq!(
            generate_code_at(RFC_SECRET, 60).unwrap(),
            generate_code_at(RFC_SECRET, 89).unwrap()
        );
    }

    #[test]
    fn invalid_secret_is_a_config_error() {
        assert!(matches!(generate_code_at("not-base32!", 59), Err(AppError::Config(_))));
        assert!(matches!(generate_code_at("  ", 59), Err(AppError::Config(_))));
    }

    #[test]
    fn current_code_is_six_digits() {
        let code = generate_current_code(RFC_SECRET).unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }
}

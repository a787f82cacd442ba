use rand::{rngs::OsRng, Rng};
use time::{Duration, OffsetDateTime};

pub const OTP_DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum OtpError {
    #[error("Invalid Email or OTP")]
    Invalid,
    #[error("OTP has expired")]
    Expired,
}

#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub expires_at: OffsetDateTime,
}

/// Six decimal digits, each drawn uniformly from the OS CSPRNG.
pub fn generate_otp() -> String {
    let mut rng = OsRng;
    (0..OTP_DIGITS)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

pub fn issue_otp(now: OffsetDateTime, ttl: Duration) -> IssuedOtp {
    IssuedOtp {
        code: generate_otp(),
        expires_at: now + ttl,
    }
}

/// Checks a supplied code against the stored pair. Does not clear anything; the caller
/// clears through `UserStore::consume_otp`, which re-checks the code atomically.
pub fn check_otp(
    stored: Option<&str>,
    expires_at: Option<OffsetDateTime>,
    supplied: &str,
    now: OffsetDateTime,
) -> Result<(), OtpError> {
    let (Some(stored), Some(expires_at)) = (stored, expires_at) else {
        return Err(OtpError::Invalid);
    };
    if supplied.is_empty() || !constant_time_eq(stored.as_bytes(), supplied.as_bytes()) {
        return Err(OtpError::Invalid);
    }
    if now >= expires_at {
        return Err(OtpError::Expired);
    }
    Ok(())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

//! Error classification and the fixed-delay retry policy for provider calls.

use std::time::Duration;

/// Classification of a provider failure.
///
/// Drives both the retry decision and the single user-facing message the
/// browser sees. Ordering of the checks in [`ErrorClass::from_parts`] matters:
/// the first match wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// 429 or a "rate limit" message. Retried after the rate-limit delay.
    RateLimited,
    /// 5xx or a "server error" message. Retried after the server-error delay.
    ServerUnavailable,
    /// 401 or an "api key" message.
    Unauthorized,
    /// 403.
    Forbidden,
    /// Quota or billing problem reported without a 429.
    QuotaExceeded,
    /// Anything else, including transport failures with no status.
    Other,
}

impl ErrorClass {
    pub fn from_parts(status: Option<u16>, message: &str) -> Self {
        let msg = message.to_lowercase();

        if status == Some(429) || msg.contains("rate limit") {
            return Self::RateLimited;
        }
        if status.is_some_and(|s| s >= 500) || msg.contains("server error") {
            return Self::ServerUnavailable;
        }
        if status == Some(401) || msg.contains("api key") {
            return Self::Unauthorized;
        }
        if status == Some(403) {
            return Self::Forbidden;
        }
        if msg.contains("quota") || msg.contains("billing") {
            return Self::QuotaExceeded;
        }
        Self::Other
    }

    pub fn is_retryable(self) -> bool {
        matches!(self, Self::RateLimited | Self::ServerUnavailable)
    }

    pub fn user_message(self) -> &'static str {
        match self {
            Self::RateLimited => "Rate limit exceeded. Please try again in a moment.",
            Self::ServerUnavailable => {
                "The AI service is temporarily unavailable. Please try again later."
            }
            Self::Unauthorized => {
                "API key is invalid or missing. Please check your configuration."
            }
            Self::Forbidden => "Access denied. Please check your API key permissions.",
            Self::QuotaExceeded => {
                "API usage limit or billing issue. Please check your provider account."
            }
            Self::Other => "Sorry, I couldn't generate a response. Please try again.",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::ServerUnavailable => "server_unavailable",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::QuotaExceeded => "quota_exceeded",
            Self::Other => "other",
        }
    }
}

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Stop and report the last error.
    GiveUp,
    /// Sleep for the given delay, then attempt again.
    RetryAfter(Duration),
}

/// Bounded attempts with a fixed delay per error class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    pub rate_limit_delay: Duration,
    pub server_error_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_delay: Duration::from_secs(3),
            server_error_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// `attempt` is 1-based. No delay is scheduled after the final attempt.
    pub fn decide(&self, attempt: u32, class: ErrorClass) -> RetryDecision {
        if attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }

        match class {
            ErrorClass::RateLimited => RetryDecision::RetryAfter(self.rate_limit_delay),
            ErrorClass::ServerUnavailable => RetryDecision::RetryAfter(self.server_error_delay),
            _ => RetryDecision::GiveUp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_429_is_rate_limited() {
        assert_eq!(ErrorClass::from_parts(Some(429), "slow down"), ErrorClass::RateLimited);
    }

    #[test]
    fn rate_limit_message_without_status() {
        assert_eq!(
            ErrorClass::from_parts(None, "Rate limit reached for gpt-3.5-turbo"),
            ErrorClass::RateLimited
        );
    }

    #[test]
    fn server_errors_by_status_and_message() {
        assert_eq!(ErrorClass::from_parts(Some(500), "boom"), ErrorClass::ServerUnavailable);
        assert_eq!(ErrorClass::from_parts(Some(503), "overloaded"), ErrorClass::ServerUnavailable);
        assert_eq!(
            ErrorClass::from_parts(None, "The server had an internal server error"),
            ErrorClass::ServerUnavailable
        );
    }

    #[test]
    fn auth_failures() {
        assert_eq!(ErrorClass::from_parts(Some(401), "nope"), ErrorClass::Unauthorized);
        assert_eq!(
            ErrorClass::from_parts(Some(400), "API key not valid. Please pass a valid API key."),
            ErrorClass::Unauthorized
        );
        assert_eq!(ErrorClass::from_parts(Some(403), "denied"), ErrorClass::Forbidden);
    }

    #[test]
    fn quota_without_429_is_not_retried() {
        let class = ErrorClass::from_parts(Some(400), "billing hard limit reached");
        assert_eq!(class, ErrorClass::QuotaExceeded);
        assert!(!class.is_retryable());
    }

    #[test]
    fn quota_with_429_is_rate_limited() {
        assert_eq!(
            ErrorClass::from_parts(Some(429), "You exceeded your current quota"),
            ErrorClass::RateLimited
        );
    }

    #[test]
    fn unknown_errors_are_other() {
        assert_eq!(ErrorClass::from_parts(None, "Connection error."), ErrorClass::Other);
        assert_eq!(ErrorClass::from_parts(Some(400), "bad request"), ErrorClass::Other);
    }

    #[test]
    fn policy_delays_per_class() {
        let p = RetryPolicy::default();
        assert_eq!(
            p.decide(1, ErrorClass::RateLimited),
            RetryDecision::RetryAfter(Duration::from_secs(3))
        );
        assert_eq!(
            p.decide(2, ErrorClass::ServerUnavailable),
            RetryDecision::RetryAfter(Duration::from_secs(2))
        );
        assert_eq!(p.decide(1, ErrorClass::Unauthorized), RetryDecision::GiveUp);
        assert_eq!(p.decide(1, ErrorClass::Other), RetryDecision::GiveUp);
    }

    #[test]
    fn policy_respects_max_attempts() {
        let p = RetryPolicy::default();
        assert_eq!(p.decide(3, ErrorClass::RateLimited), RetryDecision::GiveUp);
        assert_eq!(p.decide(4, ErrorClass::ServerUnavailable), RetryDecision::GiveUp);
    }
}

use chrono::{DateTime, Duration, Utc};

/// Upper bound the provider accepts for a bearer token lifetime (30 days).
pub const MAX_EXPIRE_SECONDS: u32 = 2_592_000;

/// A bearer token obtained from the key-pair exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
    acquired_at: DateTime<Utc>,
    expires_in: Duration,
}

impl Credential {
    /// Returns `None` for a blank token so that a half-valid credential can't exist.
    pub fn new(token: impl Into<String>, acquired_at: DateTime<Utc>, expire_seconds: u32) -> Option<Self> {
        let token = token.into().trim().to_string();
        if token.is_empty() || expire_seconds == 0 {
            return None;
        }

        Some(Self {
            token,
            acquired_at,
            expires_in: Duration::seconds(i64::from(expire_seconds.min(MAX_EXPIRE_SECONDS))),
        })
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn acquired_at(&self) -> DateTime<Utc> {
        self.acquired_at
    }

    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.acquired_at + self.expires_in
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &crate::utils::redact::mask_secret(&self.token))
            .field("acquired_at", &self.acquired_at)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Process-wide credential state. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CredentialState {
    Valid(Credential),
    #[default]
    Absent,
}

impl CredentialState {
    /// The token if present and unexpired at `now`. An expired credential reads as absent.
    pub fn bearer_token_at(&self, now: DateTime<Utc>) -> Option<&str> {
        match self {
            CredentialState::Valid(credential) if !credential.is_expired_at(now) => {
                Some(credential.token())
            }
            _ => None,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.bearer_token_at(now).is_some()
    }
}

impl From<Option<Credential>> for CredentialState {
    fn from(value: Option<Credential>) -> Self {
        value.map(CredentialState::Valid).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap()
    }

    #[test]
    fn blank_token_is_never_a_credential() {
        assert!(Credential::new("   ", at(0), 3600).is_none());
        assert!(Credential::new("bce-v3/abc", at(0), 0).is_none());
    }

    #[test]
    fn expire_seconds_are_capped_at_thirty_days() {
        let credential = Credential::new("bce-v3/abc", at(0), u32::MAX).unwrap();
        assert_eq!(credential.expires_in(), Duration::days(30));
    }

    #[test]
    fn expired_credential_reads_as_absent() {
        let state: CredentialState = Credential::new("bce-v3/abc", at(0), 3600).into();
        assert_eq!(state.bearer_token_at(at(0)), Some("bce-v3/abc"));
        assert!(state.is_valid_at(at(0)));
        assert_eq!(state.bearer_token_at(at(1)), None);
        assert!(!CredentialState::Absent.is_valid_at(at(0)));
    }

    #[test]
    fn debug_output_masks_the_token() {
        let credential = Credential::new("bce-v3/ALTAK-secretsecretsecret", at(0), 60).unwrap();
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("secretsecretsecret"));
    }
}

use std::time::Duration;

use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::Claims;
use crate::{config::JwtConfig, errors::{AppError, TokenError}};

/// Signs and verifies session tokens with the process-wide secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    pub ttl: Duration,
}

impl JwtKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(0) as u64) * 60),
        }
    }

    pub fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, AppError> {
        self.issue_at(user_id, OffsetDateTime::now_utc(), ttl)
    }

    fn issue_at(
        &self,
        user_id: Uuid,
        now: OffsetDateTime,
        ttl: Duration,
    ) -> Result<String, AppError> {
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user_id,
            iat: now.unix_timestamp().max(0) as usize,
            exp: exp.unix_timestamp().max(0) as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("jwt sign failed: {e}")))?;
        debug!(user_id = %user_id, ttl_secs = ttl.as_secs(), "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, TokenError> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => TokenError::Malformed,
                _ => TokenError::Invalid,
            };
            debug!(error = %e, ?reason, "jwt rejected");
            reason
        })?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims.sub)
    }
}

#[cfg(test)]
pub(crate) fn test_keys() -> JwtKeys {
    JwtKeys::new(&JwtConfig {
        secret: "test-secret".into(),
        issuer: "test-issuer".into(),
        audience: "test-aud".into(),
        ttl_minutes: 60,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: 60,
        })
    }

    #[test]
    fn issue_and_verify_token() {
        let keys = test_keys();
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, keys.ttl).expect("issue");
        assert_eq!(keys.verify(&token).expect("verify"), user_id);
    }

    #[test]
    fn default_ttl_comes_from_config() {
        assert_eq!(test_keys().ttl, Duration::from_secs(3600));
    }

    #[test]
    fn expired_token_is_rejected_as_expired() {
        let keys = test_keys();
        let issued = OffsetDateTime::now_utc() - TimeDuration::seconds(3);
        let token = keys
            .issue_at(Uuid::new_v4(), issued, Duration::from_secs(1))
            .unwrap();
        assert_eq!(keys.verify(&token).unwrap_err(), TokenError::Expired);
    }

    #[test]
    fn foreign_secret_is_invalid() {
        let good = make_keys("secret-a", "iss", "aud");
        let bad = make_keys("secret-b", "iss", "aud");
        let token = good.issue(Uuid::new_v4(), good.ttl).unwrap();
        assert_eq!(bad.verify(&token).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn forged_expired_token_reports_signature_not_expiry() {
        let good = make_keys("secret-a", "iss", "aud");
        let bad = make_keys("secret-b", "iss", "aud");
        let issued = OffsetDateTime::now_utc() - TimeDuration::seconds(10);
        let token = good
            .issue_at(Uuid::new_v4(), issued, Duration::from_secs(1))
            .unwrap();
        assert_eq!(bad.verify(&token).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn wrong_issuer_or_audience_is_invalid() {
        let good = make_keys("same-secret", "good-iss", "good-aud");
        let other = make_keys("same-secret", "bad-iss", "bad-aud");
        let token = good.issue(Uuid::new_v4(), good.ttl).unwrap();
        assert_eq!(other.verify(&token).unwrap_err(), TokenError::Invalid);
    }

    #[test]
    fn garbage_is_malformed() {
        let keys = test_keys();
        assert_eq!(keys.verify("not-a-jwt").unwrap_err(), TokenError::Malformed);
        assert_eq!(keys.verify("").unwrap_err(), TokenError::Malformed);
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let keys = test_keys();
        let token = keys.issue(Uuid::new_v4(), keys.ttl).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let other = keys.issue(Uuid::new_v4(), keys.ttl).unwrap();
        let other_payload = other.split('.').nth(1).unwrap().to_string();
        parts[1] = &other_payload;
        let forged = parts.join(".");
        assert_eq!(keys.verify(&forged).unwrap_err(), TokenError::Invalid);
    }
}

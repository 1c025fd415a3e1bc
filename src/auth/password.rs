use std::sync::{Arc, OnceLock};

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

use crate::{config::PasswordConfig, errors::AppError};

/// Salted Argon2id hashing with configurable cost.
#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    dummy_hash: Arc<OnceLock<String>>,
}

impl PasswordHasher {
    pub fn new(cfg: &PasswordConfig) -> anyhow::Result<Self> {
        let params = Params::new(cfg.memory_kib, cfg.iterations, cfg.parallelism, None)
            .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
        Ok(Self {
            params,
            dummy_hash: Arc::new(OnceLock::new()),
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, plain: &str) -> Result<String, AppError> {
        if plain.is_empty() {
            return Err(AppError::InvalidInput("cannot hash an empty password".into()));
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2()
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                AppError::InvalidInput(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    /// Returns false for a mismatch and for any stored hash that does not parse.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "stored password hash is malformed");
                return false;
            }
        };
        self.argon2()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }

    /// Burns one verification so a lookup miss costs the same as a wrong password.
    pub fn verify_dummy(&self, plain: &str) -> bool {
        let hash = self.dummy_hash.get_or_init(|| {
            self.hash("dummy-password-for-timing")
                .unwrap_or_default()
        });
        let _ = self.verify(plain, hash);
        false
    }

    pub async fn hash_blocking(&self, plain: String) -> Result<String, AppError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| AppError::Internal(format!("hash task failed: {e}")))?
    }

    pub async fn verify_blocking(&self, plain: String, hash: Option<String>) -> bool {
        let hasher = self.clone();
        let res = tokio::task::spawn_blocking(move || match hash {
            Some(h) => hasher.verify(&plain, &h),
            None => hasher.verify_dummy(&plain),
        })
        .await;
        match res {
            Ok(ok) => ok,
            Err(e) => {
                error!(error = %e, "verify task failed");
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> PasswordHasher {
    PasswordHasher::new(&PasswordConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    })
    .expect("cheap params are valid")
}

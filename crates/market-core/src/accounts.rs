//! Account rules: registration validation, password hashing, session tokens.

use std::sync::LazyLock;

use regex::Regex;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::ValidationError;

const MAX_USERNAME_LEN: usize = 150;
const MIN_PASSWORD_LEN: usize = 8;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid")
});

/// Registration form as submitted by a prospective user.
#[derive(Debug, Clone)]
pub struct RegistrationInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

impl RegistrationInput {
    /// Trims the identifying fields and checks every constraint, returning the
    /// first violation.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the offending field.
    pub fn validate(self) -> Result<Self, ValidationError> {
        let username = self.username.trim().to_owned();
        let email = self.email.trim().to_owned();

        if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
            return Err(ValidationError::new(
                "username",
                format!("must be 1–{MAX_USERNAME_LEN} characters"),
            ));
        }
        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
        {
            return Err(ValidationError::new(
                "username",
                "may contain only letters, digits and @/./+/-/_",
            ));
        }
        validate_email(&email)?;
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::new(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        if self.password != self.password_confirm {
            return Err(ValidationError::new(
                "password_confirm",
                "passwords do not match",
            ));
        }

        Ok(Self {
            username,
            email,
            password: self.password,
            password_confirm: self.password_confirm,
        })
    }
}

/// Checks that `email` looks like `local@domain.tld`.
///
/// # Errors
///
/// Returns a [`ValidationError`] on the `email` field.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "email",
            format!("'{email}' is not a valid email address"),
        ))
    }
}

/// Stored form of a password: hex SHA-256 digest plus the per-user salt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    pub hash: String,
    pub salt: String,
}

/// Hashes `password` with a fresh random salt and the server-wide `pepper`.
#[must_use]
pub fn hash_password(password: &str, pepper: &str) -> PasswordHash {
    let salt = to_hex(&rand::random::<[u8; 16]>());
    let hash = digest_password(password, &salt, pepper);
    PasswordHash { hash, salt }
}

/// Recomputes the digest for `password` and compares it to `stored` in
/// constant time.
#[must_use]
pub fn verify_password(password: &str, pepper: &str, stored: &PasswordHash) -> bool {
    let candidate = digest_password(password, &stored.salt, pepper);
    candidate.as_bytes().ct_eq(stored.hash.as_bytes()).into()
}

/// Generates an opaque bearer token and the digest under which it is stored.
///
/// Only the digest is persisted; the raw token is returned to the client once.
#[must_use]
pub fn new_session_token() -> (String, String) {
    let token = to_hex(&rand::random::<[u8; 32]>());
    let digest = hash_session_token(&token);
    (token, digest)
}

#[must_use]
pub fn hash_session_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

fn digest_password(password: &str, salt: &str, pepper: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(pepper.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut acc, b| {
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

//! Session cookie settings read from the environment.
//!
//! Variables:
//! - `SESSION_KEY_FILE`: path to the signing key (default
//!   `/var/run/secrets/session_key`). Release builds need at least 64 bytes.
//! - `SESSION_COOKIE_SECURE`: mark cookies `Secure` (default on).
//! - `SESSION_SAMESITE`: `Strict`, `Lax` or `None`.
//! - `SESSION_ALLOW_EPHEMERAL`: permit a generated key when the file is
//!   missing. Rejected in release builds.
//!
//! Debug builds fall back to defaults with a warning; release builds treat
//! a missing or invalid toggle as a startup error.

use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use tracing::warn;
use zeroize::Zeroizing;

const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const SAMESITE_ENV: &str = "SESSION_SAMESITE";
const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
const KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
const KEY_MIN_LEN: usize = 64;
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// How strictly toggles are validated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    /// Mode of the running binary.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Validated cookie session settings.
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

/// Errors raised while validating session settings.
#[derive(Debug, thiserror::Error)]
pub enum SessionConfigError {
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Read and validate session settings.
///
/// # Examples
/// ```
/// use chat_gateway::inbound::http::session_config::{BuildMode, session_settings_from_env};
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|name| match name {
///     "SESSION_COOKIE_SECURE" => Some("0".into()),
///     "SESSION_SAMESITE" => Some("Lax".into()),
///     "SESSION_KEY_FILE" => Some("/nonexistent/session_key".into()),
///     _ => None,
/// });
/// let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");
/// assert!(!settings.cookie_secure);
/// ```
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let reader = EnvReader { env, mode };
    let cookie_secure = reader.flag(COOKIE_SECURE_ENV, true)?;
    let same_site = reader.same_site(cookie_secure)?;
    let allow_ephemeral = reader.flag(ALLOW_EPHEMERAL_ENV, false)?;
    if allow_ephemeral && mode == BuildMode::Release {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let key = reader.key(allow_ephemeral)?;
    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

struct EnvReader<'a, E> {
    env: &'a E,
    mode: BuildMode,
}

impl<E: Env> EnvReader<'_, E> {
    /// Debug builds swallow `error` and return `fallback` after warning.
    fn lenient<T>(&self, fallback: T, error: SessionConfigError) -> Result<T, SessionConfigError> {
        match self.mode {
            BuildMode::Debug => {
                warn!(%error, "session setting defaulted");
                Ok(fallback)
            }
            BuildMode::Release => Err(error),
        }
    }

    fn flag(&self, name: &'static str, default: bool) -> Result<bool, SessionConfigError> {
        let Some(value) = self.env.string(name) else {
            return self.lenient(default, SessionConfigError::MissingEnv { name });
        };
        match parse_bool(&value) {
            Some(flag) => Ok(flag),
            None => self.lenient(
                default,
                SessionConfigError::InvalidEnv {
                    name,
                    value,
                    expected: BOOL_EXPECTED,
                },
            ),
        }
    }

    fn same_site(&self, cookie_secure: bool) -> Result<SameSite, SessionConfigError> {
        let default = match self.mode {
            BuildMode::Debug => SameSite::Lax,
            BuildMode::Release => SameSite::Strict,
        };
        let Some(value) = self.env.string(SAMESITE_ENV) else {
            return self.lenient(default, SessionConfigError::MissingEnv { name: SAMESITE_ENV });
        };
        match value.to_ascii_lowercase().as_str() {
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" if cookie_secure => Ok(SameSite::None),
            "none" => self.lenient(SameSite::None, SessionConfigError::InsecureSameSiteNone),
            _ => self.lenient(
                default,
                SessionConfigError::InvalidEnv {
                    name: SAMESITE_ENV,
                    value,
                    expected: SAMESITE_EXPECTED,
                },
            ),
        }
    }

    fn key(&self, allow_ephemeral: bool) -> Result<Key, SessionConfigError> {
        let path = PathBuf::from(
            self.env
                .string(KEY_FILE_ENV)
                .unwrap_or_else(|| KEY_DEFAULT_PATH.to_owned()),
        );
        match std::fs::read(&path) {
            Ok(bytes) => {
                let bytes = Zeroizing::new(bytes);
                if self.mode == BuildMode::Release && bytes.len() < KEY_MIN_LEN {
                    return Err(SessionConfigError::KeyTooShort {
                        path,
                        length: bytes.len(),
                        min_len: KEY_MIN_LEN,
                    });
                }
                Ok(Key::derive_from(&bytes))
            }
            Err(source) if allow_ephemeral || self.mode == BuildMode::Debug => {
                warn!(path = %path.display(), error = %source, "using temporary session key (dev only)");
                Ok(Key::generate())
            }
            Err(source) => Err(SessionConfigError::KeyRead { path, source }),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

//! Credentials posted to `POST /api/v1/login`.

use zeroize::Zeroizing;

/// Why a login payload was refused before any directory lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LoginValidationError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error("password must not be empty")]
    EmptyPassword,
}

/// A username and password pair ready for [`crate::domain::ports::LoginService`].
///
/// The username is trimmed; the password is kept byte for byte and wiped
/// from memory when the value drops.
///
/// # Examples
/// ```
/// use chat_gateway::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts(" alice ", "wonderland").unwrap();
/// assert_eq!(creds.username(), "alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let username = match username.trim() {
            "" => return Err(LoginValidationError::EmptyUsername),
            trimmed => trimmed.to_owned(),
        };
        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }
        Ok(Self {
            username,
            password: Zeroizing::new(password.to_owned()),
        })
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "wonderland", LoginValidationError::EmptyUsername)]
    #[case(" \t ", "wonderland", LoginValidationError::EmptyUsername)]
    #[case("alice", "", LoginValidationError::EmptyPassword)]
    #[case("", "", LoginValidationError::EmptyUsername)]
    fn blank_fields_are_refused(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        assert_eq!(
            LoginCredentials::try_from_parts(username, password),
            Err(expected)
        );
    }

    #[rstest]
    fn password_is_not_trimmed() {
        let creds = LoginCredentials::try_from_parts("bob", "  builder ").expect("valid");
        assert_eq!(creds.username(), "bob");
        assert_eq!(creds.password(), "  builder ");
    }
}

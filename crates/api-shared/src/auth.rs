use filedrop_types::NonEmptyText;

/// Why a login attempt was refused.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("unknown user")]
    UnknownUser,
    #[error("bad password")]
    BadPassword,
}

/// The single username/password pair granting full read/write access.
#[derive(Clone)]
pub struct SharedCredentials {
    username: NonEmptyText,
    password: String,
}

impl SharedCredentials {
    pub fn new(username: NonEmptyText, password: impl Into<String>) -> Self {
        Self {
            username,
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Validates a login attempt against the configured pair.
    ///
    /// Returns `Ok(())` if both parts match, or the reason the attempt was refused.
    pub fn validate(&self, username: &str, password: Option<&str>) -> Result<(), AuthError> {
        if username != self.username.as_str() {
            return Err(AuthError::UnknownUser);
        }
        match password {
            Some(password) if password == self.password => Ok(()),
            _ => Err(AuthError::BadPassword),
        }
    }
}

impl std::fmt::Debug for SharedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedCredentials")
            .field("username", &self.username.as_str())
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> SharedCredentials {
        SharedCredentials::new(NonEmptyText::new("admin").unwrap(), "s3cret")
    }

    #[test]
    fn accepts_matching_pair() {
        assert_eq!(admin().validate("admin", Some("s3cret")), Ok(()));
    }

    #[test]
    fn rejects_wrong_user_or_password() {
        let creds = admin();
        assert_eq!(
            creds.validate("root", Some("s3cret")),
            Err(AuthError::UnknownUser)
        );
        assert_eq!(
            creds.validate("admin", Some("guess")),
            Err(AuthError::BadPassword)
        );
        assert_eq!(creds.validate("admin", None), Err(AuthError::BadPassword));
    }

    #[test]
    fn debug_hides_password() {
        let rendered = format!("{:?}", admin());
        assert!(!rendered.contains("s3cret"));
    }
}

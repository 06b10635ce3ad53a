use api_shared::{AuthError, SharedCredentials};
use async_trait::async_trait;
use libunftp::auth::{AuthenticationError, Authenticator, Credentials, DefaultUser};

/// Authenticates FTP logins against the shared credential pair.
///
/// A successful login gets full read/write access to the store root.
#[derive(Debug, Clone)]
pub struct SharedCredentialAuthenticator {
    credentials: SharedCredentials,
}

impl SharedCredentialAuthenticator {
    pub fn new(credentials: SharedCredentials) -> Self {
        Self { credentials }
    }
}

#[async_trait]
impl Authenticator<DefaultUser> for SharedCredentialAuthenticator {
    async fn authenticate(
        &self,
        username: &str,
        creds: &Credentials,
    ) -> Result<DefaultUser, AuthenticationError> {
        match self
            .credentials
            .validate(username, creds.password.as_deref())
        {
            Ok(()) => {
                tracing::info!(user = username, source = %creds.source_ip, "FTP login");
                Ok(DefaultUser)
            }
            Err(AuthError::UnknownUser) => {
                tracing::warn!(user = username, source = %creds.source_ip, "FTP login with unknown user");
                Err(AuthenticationError::BadUser)
            }
            Err(AuthError::BadPassword) => {
                tracing::warn!(user = username, source = %creds.source_ip, "FTP login with bad password");
                Err(AuthenticationError::BadPassword)
            }
        }
    }
}

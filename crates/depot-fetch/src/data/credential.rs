use std::fmt;
use std::path::PathBuf;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Basic-auth credential attached to every request of a fetcher.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    user:     String,
    password: String,
}

impl Credential {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user:     user.into(),
            password: password.into(),
        }
    }

    pub fn user(&self) -> &str { &self.user }

    pub fn password(&self) -> &str { &self.password }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:{}", self.user, self.password)))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where a credential may come from: an environment pair, then a properties file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialSource {
    pub user_var:     String,
    pub password_var: String,
    /// Properties file with `user` and `password` keys. `None` disables the file.
    pub path:         Option<PathBuf>,
}

impl CredentialSource {
    pub fn new(user_var: impl Into<String>, password_var: impl Into<String>) -> Self {
        Self {
            user_var:     user_var.into(),
            password_var: password_var.into(),
            path:         None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

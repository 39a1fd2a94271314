use std::io;
use std::path::Path;

use tracing::debug;

use crate::core::parse_properties;
use crate::data::{Credential, CredentialSource};
use crate::error::{FetchError, Result};

const USER_KEY: &str = "user";
const PASSWORD_KEY: &str = "password";

impl CredentialSource {
    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<Option<Credential>> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve with an explicit environment lookup.
    ///
    /// The environment pair wins when both variables are set and the user is
    /// non-empty. Otherwise the properties file is read; a missing file, or one
    /// without a non-empty `user`, yields no credential. A file that exists but
    /// cannot be read or parsed is an error.
    pub fn resolve_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Option<Credential>> {
        if let (Some(user), Some(password)) = (lookup(&self.user_var), lookup(&self.password_var))
            && !user.is_empty()
        {
            debug!("using credential for '{}' from {}", user, self.user_var);
            return Ok(Some(Credential::new(user, password)));
        }

        let Some(path) = self.path.as_deref() else {
            return Ok(None);
        };
        read_credentials_file(path).map_err(|source| FetchError::Credentials {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn read_credentials_file(path: &Path) -> io::Result<Option<Credential>> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!("no credentials file at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    let text = String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    let mut properties = parse_properties(&text)?;

    let user = properties.remove(USER_KEY).unwrap_or_default();
    if user.is_empty() {
        debug!("credentials file {} has no user", path.display());
        return Ok(None);
    }
    let password = properties.remove(PASSWORD_KEY).unwrap_or_default();
    debug!("using credential for '{}' from {}", user, path.display());
    Ok(Some(Credential::new(user, password)))
}

//! API key loading.

use crate::Error;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Variables checked for the API key, in order.
pub const CREDENTIAL_VARS: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// The secret that authorizes calls to the Gemini API.
///
/// Only presence is checked. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a key, treating blank input as absent.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// First non-blank value among [`CREDENTIAL_VARS`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        CREDENTIAL_VARS
            .into_iter()
            .find_map(|var| lookup(var).and_then(Credential::new))
            .ok_or(Error::MissingCredential)
    }

    /// The raw key, for the request header. Never log it.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Key-value pairs read from a `.env`-style file.
#[derive(Debug, Clone, Default)]
pub struct EnvFile {
    vars: HashMap<String, String>,
}

impl EnvFile {
    /// Parse `path` without touching the process environment.
    ///
    /// A missing file yields an empty set.
    pub fn read(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no env file");
            return Ok(Self::default());
        }

        let entries = dotenvy::from_path_iter(path)
            .map_err(|e| Error::config(format!("cannot read {}: {e}", path.display())))?;
        let mut vars = HashMap::new();
        for entry in entries {
            let (key, value) = entry
                .map_err(|e| Error::config(format!("malformed {}: {e}", path.display())))?;
            vars.insert(key, value);
        }
        tracing::debug!(path = %path.display(), entries = vars.len(), "loaded env file");
        Ok(Self { vars })
    }

    /// Value for `key`, if the file defines it.
    pub fn get(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

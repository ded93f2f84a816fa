//! Input validation for the auth and storage-config forms.
//!
//! Checked synchronously so nothing is sent for an incomplete form.

use serde::Serialize;

use crate::error::CoreError;

/// Maximum length of a username.
const MAX_USERNAME_LEN: usize = 64;

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Rules:
    /// - Username must not be blank and must not exceed `MAX_USERNAME_LEN`.
    /// - Password must not be blank.
    pub fn validate(&self) -> Result<(), CoreError> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(CoreError::Validation("Username is required".to_string()));
        }
        if username.len() > MAX_USERNAME_LEN {
            return Err(CoreError::Validation(format!(
                "Username must not exceed {MAX_USERNAME_LEN} characters"
            )));
        }
        if self.password.trim().is_empty() {
            return Err(CoreError::Validation("Password is required".to_string()));
        }
        Ok(())
    }
}

/// Object-storage settings sent to `PATCH /user/config`.
#[derive(Debug, Clone, Serialize)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
}

impl StorageConfig {
    /// Every field is required.
    pub fn validate(&self) -> Result<(), CoreError> {
        let fields = [
            ("bucket", &self.bucket),
            ("region", &self.region),
            ("endpoint", &self.endpoint),
            ("access_key", &self.access_key),
            ("secret_key", &self.secret_key),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(CoreError::Validation(format!("{name} is required")));
            }
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(CoreError::Validation(format!(
                "endpoint must start with http:// or https://, got: '{}'",
                self.endpoint
            )));
        }
        Ok(())
    }
}

/// Normalise a list of tags from user input: trimmed, non-empty, unique.
pub fn normalize_tags<I, S>(tags: I) -> Result<Vec<String>, CoreError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.as_ref().trim();
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    if out.is_empty() {
        return Err(CoreError::Validation("At least one tag is required".to_string()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn storage() -> StorageConfig {
        StorageConfig {
            bucket: "photos".into(),
            region: "eu-west-1".into(),
            endpoint: "https://s3.example.com".into(),
            access_key: "AK".into(),
            secret_key: "SK".into(),
        }
    }

    #[test]
    fn valid_credentials() {
        assert!(Credentials::new("ana", "hunter2").validate().is_ok());
    }

    #[test]
    fn blank_username_rejected() {
        let err = Credentials::new("  ", "pw").validate().unwrap_err();
        assert!(err.to_string().contains("Username"));
    }

    #[test]
    fn missing_password_rejected() {
        assert!(Credentials::new("ana", "").validate().is_err());
    }

    #[test]
    fn overlong_username_rejected() {
        let name = "a".repeat(MAX_USERNAME_LEN + 1);
        assert!(Credentials::new(name, "pw").validate().is_err());
    }

    #[test]
    fn storage_config_requires_every_field() {
        assert!(storage().validate().is_ok());
        let mut cfg = storage();
        cfg.secret_key.clear();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("secret_key"));
    }

    #[test]
    fn storage_endpoint_must_be_http() {
        let mut cfg = storage();
        cfg.endpoint = "s3.example.com".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn normalize_tags_trims_and_dedupes() {
        let tags = normalize_tags([" sea ", "sea", "", "sun"]).unwrap();
        assert_eq!(tags, ["sea", "sun"]);
    }

    #[test]
    fn normalize_tags_rejects_empty() {
        assert!(normalize_tags(["  "]).is_err());
    }
}

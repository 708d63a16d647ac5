use std::fmt;

/// A secret value (typically a password) that never prints its contents.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret for the one place that needs it: the auth handshake.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([redacted])")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

/// Domain-qualified credentials used to authenticate a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub domain: String,
    pub username: String,
    pub secret: Secret,
}

impl Credential {
    pub fn new(domain: impl Into<String>, username: impl Into<String>, secret: Secret) -> Self {
        Self {
            domain: domain.into(),
            username: username.into(),
            secret,
        }
    }

    /// `DOMAIN\username`, or the bare username when no domain is set.
    pub fn qualified_username(&self) -> String {
        if self.domain.is_empty() {
            self.username.clone()
        } else {
            format!("{}\\{}", self.domain, self.username)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid source URL {url:?}: {reason}")]
pub struct UrlError {
    pub url: String,
    pub reason: String,
}

/// An absolute download URL with literal spaces percent-encoded.
///
/// The only constructor is [`SourceUrl::normalize`]. Its output never contains
/// a space, so normalizing twice is a no-op and `%20` is never re-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceUrl(String);

impl SourceUrl {
    pub fn normalize(raw: &str) -> Result<Self, UrlError> {
        let encoded = encode_spaces(raw);

        let parsed = url::Url::parse(&encoded).map_err(|e| UrlError {
            url: raw.to_owned(),
            reason: e.to_string(),
        })?;

        if parsed.cannot_be_a_base() {
            return Err(UrlError {
                url: raw.to_owned(),
                reason: "not a hierarchical URL".into(),
            });
        }

        Ok(Self(encoded))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Replace every literal space with `%20`, leaving all other characters alone.
pub fn encode_spaces(raw: &str) -> String {
    raw.replace(' ', "%20")
}

/// One document from the remote library listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRecord {
    pub category: String,
    pub file_name: String,
    pub source_url: SourceUrl,
}

impl DocumentRecord {
    pub fn new(
        category: impl Into<String>,
        file_name: impl Into<String>,
        source_url: SourceUrl,
    ) -> Self {
        Self {
            category: category.into(),
            file_name: file_name.into(),
            source_url,
        }
    }

    /// Lowercase extension after the last `.` of the file name.
    pub fn file_extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        if ext.is_empty() || stem.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(file_name: &str) -> DocumentRecord {
        DocumentRecord::new(
            "Project Requirements",
            file_name,
            SourceUrl::normalize("http://x/a.xlsx").unwrap(),
        )
    }

    #[test]
    fn normalize_encodes_every_space() {
        let url = SourceUrl::normalize("http://host/Shared Documents/Q1 plan v2.xlsx").unwrap();
        assert_eq!(url.as_str(), "http://host/Shared%20Documents/Q1%20plan%20v2.xlsx");
    }

    #[test]
    fn normalize_leaves_other_characters_alone() {
        let raw = "http://host/docs/a+b%2Cc_(1).xlsx?x=1&y=2";
        let url = SourceUrl::normalize(raw).unwrap();
        assert_eq!(url.as_str(), raw);
    }

    #[test]
    fn normalize_is_idempotent() {
        let once = SourceUrl::normalize("http://host/My Docs/a b.xlsx").unwrap();
        let twice = SourceUrl::normalize(once.as_str()).unwrap();
        assert_eq!(once, twice);
        assert!(!twice.as_str().contains("%2520"));
    }

    #[test]
    fn normalize_rejects_relative_urls() {
        assert!(SourceUrl::normalize("/sites/docs/a.xlsx").is_err());
        assert!(SourceUrl::normalize("mailto:someone@example.com").is_err());
    }

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(record("Budget.XLSX").file_extension().as_deref(), Some("xlsx"));
        assert_eq!(record("archive.tar.gz").file_extension().as_deref(), Some("gz"));
    }

    #[test]
    fn extension_missing_or_empty() {
        assert_eq!(record("README").file_extension(), None);
        assert_eq!(record("trailing.").file_extension(), None);
        assert_eq!(record(".hidden").file_extension(), None);
    }

    #[test]
    fn qualified_username_includes_domain() {
        let cred = Credential::new("AZ", "jdoe", Secret::new("pw"));
        assert_eq!(cred.qualified_username(), "AZ\\jdoe");

        let bare = Credential::new("", "jdoe", Secret::new("pw"));
        assert_eq!(bare.qualified_username(), "jdoe");
    }

    #[test]
    fn secret_never_prints() {
        let cred = Credential::new("AZ", "jdoe", Secret::new("hunter2"));
        let debug = format!("{cred:?}");
        assert!(!debug.contains("hunter2"));
        assert_eq!(cred.secret.to_string(), "[redacted]");
        assert_eq!(cred.secret.expose(), "hunter2");
    }
}

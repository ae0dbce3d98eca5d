//! Parsing of `path:version` model identifiers.

use std::fmt;
use std::str::FromStr;

use crate::api::PredictionError;

/// Identifies one version of one model, written as `"<path>:<version>"`.
///
/// # Example
/// ```
/// use prediction_client::ModelIdentifier;
///
/// let id = ModelIdentifier::parse("stability-ai/sdxl:39ed52f2").unwrap();
/// assert_eq!(id.path, "stability-ai/sdxl");
/// assert_eq!(id.version, "39ed52f2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelIdentifier {
    /// Model path, e.g. `owner/name`.
    pub path: String,
    /// Version hash or tag.
    pub version: String,
}

impl ModelIdentifier {
    /// Create an identifier from its parts.
    pub fn new(path: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            version: version.into(),
        }
    }

    /// Split an identifier on its first `:`.
    ///
    /// Everything after the first separator belongs to the version, so
    /// `"a:b:c"` yields path `a` and version `b:c`. An empty path or
    /// version is rejected.
    pub fn parse(identifier: &str) -> Result<Self, PredictionError> {
        let malformed = || PredictionError::MalformedIdentifier(identifier.to_string());
        let (path, version) = identifier.split_once(':').ok_or_else(malformed)?;

        let path = path.trim_matches('/');
        if path.is_empty() || version.is_empty() {
            return Err(malformed());
        }

        Ok(Self::new(path, version))
    }
}

impl FromStr for ModelIdentifier {
    type Err = PredictionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ModelIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_identifier() {
        let id = ModelIdentifier::parse("owner/model:abc123").unwrap();
        assert_eq!(id.path, "owner/model");
        assert_eq!(id.version, "abc123");
        assert_eq!(id.to_string(), "owner/model:abc123");
    }

    #[test]
    fn test_parse_splits_on_first_separator() {
        let id: ModelIdentifier = "owner/model:v1:extra".parse().unwrap();
        assert_eq!(id.path, "owner/model");
        assert_eq!(id.version, "v1:extra");
    }

    #[test]
    fn test_parse_missing_separator() {
        let err = ModelIdentifier::parse("owner/model").unwrap_err();
        assert!(matches!(err, PredictionError::MalformedIdentifier(ref s) if s == "owner/model"));
    }

    #[test]
    fn test_parse_empty_parts() {
        for bad in [":v1", "owner/model:", "/:v1", ":"] {
            let err = ModelIdentifier::parse(bad).unwrap_err();
            assert!(matches!(err, PredictionError::MalformedIdentifier(ref s) if s == bad));
        }
    }
}

// ABOUTME: DNS-compatible service name validation.
// ABOUTME: Service names become resource name prefixes, so RFC 1123 applies.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceNameError {
    #[error("service name cannot be empty")]
    Empty,

    #[error("service name exceeds maximum length of 63 characters")]
    TooLong,

    #[error("service name cannot begin or end with a hyphen")]
    EdgeHyphen,

    #[error("invalid character in service name: '{0}' (lowercase alphanumeric and '-' only)")]
    InvalidChar(char),
}

/// A validated service name, used as the prefix for every derived resource
/// name (cluster, target groups, deployment group).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(value: &str) -> Result<Self, ServiceNameError> {
        match value {
            "" => return Err(ServiceNameError::Empty),
            v if v.len() > 63 => return Err(ServiceNameError::TooLong),
            v if v.starts_with('-') || v.ends_with('-') => {
                return Err(ServiceNameError::EdgeHyphen);
            }
            _ => {}
        }

        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '-')
        {
            return Err(ServiceNameError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_rfc1123_labels() {
        assert!(ServiceName::new("front").is_ok());
        assert!(ServiceName::new("front-2").is_ok());
    }

    #[test]
    fn rejects_invalid_names() {
        assert!(matches!(ServiceName::new(""), Err(ServiceNameError::Empty)));
        assert!(matches!(
            ServiceName::new("-front"),
            Err(ServiceNameError::EdgeHyphen)
        ));
        assert!(matches!(
            ServiceName::new("Front"),
            Err(ServiceNameError::InvalidChar('F'))
        ));
        assert!(matches!(
            ServiceName::new("front_svc"),
            Err(ServiceNameError::InvalidChar('_'))
        ));
        assert!(ServiceName::new(&"a".repeat(64)).is_err());
    }
}

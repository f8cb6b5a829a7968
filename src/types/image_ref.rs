// ABOUTME: Container image reference parsing and validation.
// ABOUTME: Handles repo, repo:tag, and repo@digest forms for task revisions.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseImageRefError {
    #[error("image reference cannot be empty")]
    Empty,

    #[error("invalid character in image reference: '{0}'")]
    InvalidChar(char),

    #[error("image reference has an empty tag")]
    EmptyTag,

    #[error("image reference has an empty digest")]
    EmptyDigest,
}

/// An addressable, immutable container image reference.
///
/// A task revision points at exactly one of these. Two revisions are the
/// same build when their references are equal, which is what the deployment
/// short-circuit compares.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageRef {
    repository: String,
    tag: Option<String>,
    digest: Option<String>,
}

impl ImageRef {
    pub fn parse(input: &str) -> Result<Self, ParseImageRefError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseImageRefError::Empty);
        }

        if let Some(c) = input
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !"/:.-_@".contains(*c))
        {
            return Err(ParseImageRefError::InvalidChar(c));
        }

        let (rest, digest) = match input.split_once('@') {
            Some((rest, d)) if d.is_empty() => {
                let _ = rest;
                return Err(ParseImageRefError::EmptyDigest);
            }
            Some((rest, d)) => (rest, Some(d.to_string())),
            None => (input, None),
        };

        // A trailing colon segment is a tag unless it contains a slash,
        // in which case the colon belongs to a registry port.
        let (repository, tag) = match rest.rsplit_once(':') {
            Some((_, t)) if t.contains('/') => (rest.to_string(), None),
            Some((_, t)) if t.is_empty() => return Err(ParseImageRefError::EmptyTag),
            Some((repo, t)) => (repo.to_string(), Some(t.to_string())),
            None => (rest.to_string(), None),
        };

        // Untagged, undigested references implicitly mean :latest.
        let tag = match (&tag, &digest) {
            (None, None) => Some("latest".to_string()),
            _ => tag,
        };

        Ok(Self {
            repository,
            tag,
            digest,
        })
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }

    /// The same repository under a different tag, dropping any digest pin.
    pub fn with_tag(&self, tag: impl Into<String>) -> Self {
        Self {
            repository: self.repository.clone(),
            tag: Some(tag.into()),
            digest: None,
        }
    }

    /// Whether the reference is pinned to a content digest rather than a
    /// movable tag.
    pub fn is_pinned(&self) -> bool {
        self.digest.is_some()
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repository)?;
        if let Some(ref tag) = self.tag {
            write!(f, ":{tag}")?;
        }
        if let Some(ref digest) = self.digest {
            write!(f, "@{digest}")?;
        }
        Ok(())
    }
}

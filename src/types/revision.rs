// ABOUTME: Task revision identity: one immutable container build of a service.
// ABOUTME: Superseded by newer revisions, never mutated.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ImageRef;

/// One immutable build of a service's task definition.
///
/// A new revision is minted when a build is promoted; deploying never
/// mutates an existing revision, it registers the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRevision {
    family: String,
    revision: u32,
    image: ImageRef,
}

impl TaskRevision {
    pub fn new(family: impl Into<String>, revision: u32, image: ImageRef) -> Self {
        Self {
            family: family.into(),
            revision,
            image,
        }
    }

    /// Mint the next revision of the same family with a new image.
    pub fn successor(&self, image: ImageRef) -> Self {
        Self {
            family: self.family.clone(),
            revision: self.revision + 1,
            image,
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }
}

impl fmt::Display for TaskRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family, self.revision)
    }
}

impl Serialize for TaskRevision {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{} ({})", self, self.image))
    }
}

impl<'de> Deserialize<'de> for TaskRevision {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        let s = String::deserialize(deserializer)?;
        let (head, image) = s
            .split_once(" (")
            .and_then(|(h, i)| Some((h, i.strip_suffix(')')?)))
            .ok_or_else(|| D::Error::custom("expected 'family:revision (image)'"))?;
        let (family, rev) = head
            .rsplit_once(':')
            .ok_or_else(|| D::Error::custom("expected 'family:revision'"))?;
        let revision: u32 = rev.parse().map_err(D::Error::custom)?;
        let image = ImageRef::parse(image).map_err(D::Error::custom)?;
        Ok(Self::new(family, revision, image))
    }
}

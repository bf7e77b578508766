//! Version-tagged partition names

use serde::Serialize;

use super::route::PartitionKind;

/// Names of the three partitions owned by one worker version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionNames {
    pub static_name: String,
    pub dynamic_name: String,
    pub versioned_name: String,
}

impl PartitionNames {
    /// `<prefix>-static-<version>`, `<prefix>-dynamic-<version>` and
    /// `<prefix>-<version>`
    pub fn new(prefix: &str, version: &str) -> Self {
        Self {
            static_name: format!("{}-static-{}", prefix, version),
            dynamic_name: format!("{}-dynamic-{}", prefix, version),
            versioned_name: format!("{}-{}", prefix, version),
        }
    }

    pub fn name_for(&self, kind: PartitionKind) -> &str {
        match kind {
            PartitionKind::Static => &self.static_name,
            PartitionKind::Dynamic => &self.dynamic_name,
            PartitionKind::Versioned => &self.versioned_name,
        }
    }

    pub fn all(&self) -> [&str; 3] {
        [&self.static_name, &self.dynamic_name, &self.versioned_name]
    }

    /// Whether a partition belongs to this version
    pub fn is_current(&self, name: &str) -> bool {
        self.all().contains(&name)
    }
}

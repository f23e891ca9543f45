//! Configuration for registries and the cloner.
//!
//! All structs deserialize with `serde` and fall back to their `Default`
//! for any missing field, so a partial TOML table is a valid config.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Inheritable page attributes, in lookup order.
pub const INHERITABLE_PAGE_KEYS: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Resolve stream bodies from the file named by the header's `/F` entry.
    pub external_streams: bool,
    /// Directory relative external stream paths are resolved against.
    pub base_dir: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            external_streams: true,
            base_dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloneConfig {
    /// Install the page-consolidation filter.
    pub page_consolidation: bool,
    /// Install the annotation-registration filter.
    pub annotation_registration: bool,
    /// Attributes the page filter copies down from ancestors.
    pub inheritable_keys: Vec<String>,
}

impl Default for CloneConfig {
    fn default() -> Self {
        Self {
            page_consolidation: true,
            annotation_registration: true,
            inheritable_keys: INHERITABLE_PAGE_KEYS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Top-level configuration grouping every section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FolioConfig {
    pub registry: RegistryConfig,
    pub clone: CloneConfig,
}

//! Local bundle storage
//!
//! Bundles are laid out as one file per (component, locale) pair:
//!
//! ```text
//! <bundle_root>/
//!   greeting/
//!     messages_en.properties
//!     messages_fr.properties
//!   menu/
//!     messages_fr.json
//! ```
//!
//! The [`BundleIo`] trait is the seam between the bundle data source and the
//! filesystem; [`FsBundleIo`] is the default implementation.

pub mod bundle;
pub mod properties;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use bundle::{bundle_file_name, parse_bundle_file_name, BundleEntry, BundleIo, FsBundleIo};

/// File name prefix shared by every bundle file
pub const BUNDLE_PREFIX: &str = "messages_";

/// On-disk format of a bundle file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleFormat {
    /// Java properties (`messages_fr.properties`)
    #[default]
    Properties,
    /// JSON document with `component`, `locale` and `messages` fields
    Json,
}

impl BundleFormat {
    /// The format a pair's file is not in
    pub fn other(&self) -> Self {
        match self {
            Self::Properties => Self::Json,
            Self::Json => Self::Properties,
        }
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Properties => "properties",
            Self::Json => "json",
        }
    }

    /// Detect the format from a file extension (case-insensitive)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "properties" => Some(Self::Properties),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

impl fmt::Display for BundleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for BundleFormat {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s.trim())
            .ok_or_else(|| crate::error::Error::config(format!("unknown bundle format: {s}")))
    }
}

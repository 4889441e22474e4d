//! Filesystem access for message bundles

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::{properties, BundleFormat, BUNDLE_PREFIX};
use crate::error::{Error, Result};

/// One decoded bundle file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleEntry {
    pub component: String,
    pub locale: String,
    pub messages: HashMap<String, String>,
}

/// JSON bundle document
#[derive(Debug, Clone, Serialize, Deserialize)]
struct JsonBundle {
    component: String,
    locale: String,
    messages: HashMap<String, String>,
}

/// Read/write access to a bundle folder
#[async_trait]
pub trait BundleIo: Send + Sync {
    /// Read every bundle file under `root`
    ///
    /// Fails with [`Error::BundleFolderMissing`] if `root` does not exist.
    /// Individual unreadable files are skipped. When a pair has files in both
    /// formats, the `prefer` format is read.
    async fn read_all(&self, root: &Path, prefer: BundleFormat) -> Result<Vec<BundleEntry>>;

    /// Read the bundle file of one (component, locale) pair, if present
    async fn read_one(
        &self,
        root: &Path,
        component: &str,
        locale: &str,
        prefer: BundleFormat,
    ) -> Result<Option<HashMap<String, String>>>;

    /// Write the bundle file of one (component, locale) pair
    ///
    /// A file for the same pair in the other format is removed.
    async fn write(
        &self,
        root: &Path,
        component: &str,
        locale: &str,
        messages: &HashMap<String, String>,
        format: BundleFormat,
    ) -> Result<()>;
}

/// Bundle file name for a locale, e.g. `messages_fr.properties`
pub fn bundle_file_name(locale: &str, format: BundleFormat) -> String {
    format!("{BUNDLE_PREFIX}{locale}.{}", format.extension())
}

/// Split a bundle file name into (locale, format)
///
/// Returns `None` for files that are not bundles.
pub fn parse_bundle_file_name(file_name: &str) -> Option<(String, BundleFormat)> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    let format = BundleFormat::from_extension(ext)?;

    let prefix = stem.get(..BUNDLE_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(BUNDLE_PREFIX) {
        return None;
    }

    let locale = &stem[BUNDLE_PREFIX.len()..];
    if locale.is_empty() {
        return None;
    }

    Some((locale.to_string(), format))
}

/// Bundle storage on the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsBundleIo;

impl FsBundleIo {
    /// Create a new filesystem bundle store
    pub fn new() -> Self {
        Self
    }

    async fn decode(path: &Path, format: BundleFormat) -> Result<HashMap<String, String>> {
        let content = tokio::fs::read_to_string(path).await?;

        match format {
            BundleFormat::Properties => {
                properties::parse(&content).map_err(|e| Error::BundleFormat {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
            BundleFormat::Json => {
                let doc: JsonBundle =
                    serde_json::from_str(&content).map_err(|e| Error::BundleFormat {
                        path: path.to_path_buf(),
                        reason: e.to_string(),
                    })?;
                Ok(doc.messages)
            }
        }
    }

    /// Collect (path, component, locale, format) for every bundle file below `root`
    async fn scan(root: &Path) -> Result<Vec<(PathBuf, String, String, BundleFormat)>> {
        let mut found = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if entry.file_type().await?.is_dir() {
                    pending.push(path);
                    continue;
                }

                // Files directly under the root have no component
                if dir == root {
                    continue;
                }

                let file_name = entry.file_name().to_string_lossy().into_owned();
                let Some((locale, format)) = parse_bundle_file_name(&file_name) else {
                    debug!(path = %path.display(), "Skipping non-bundle file");
                    continue;
                };

                let component = dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();

                found.push((path, component, locale, format));
            }
        }

        Ok(found)
    }

    /// Keep one file per (component, locale), the `prefer` format first
    fn pick_preferred(
        files: Vec<(PathBuf, String, String, BundleFormat)>,
        prefer: BundleFormat,
    ) -> Vec<(PathBuf, String, String, BundleFormat)> {
        let mut chosen: HashMap<(String, String), (PathBuf, String, String, BundleFormat)> =
            HashMap::new();

        for file in files {
            let key = (file.1.clone(), file.2.to_ascii_lowercase());
            match chosen.get(&key) {
                Some(existing) if existing.3 == prefer => {
                    debug!(path = %file.0.display(), "Skipping bundle shadowed by preferred format");
                }
                _ => {
                    chosen.insert(key, file);
                }
            }
        }

        chosen.into_values().collect()
    }
}

#[async_trait]
impl BundleIo for FsBundleIo {
    async fn read_all(&self, root: &Path, prefer: BundleFormat) -> Result<Vec<BundleEntry>> {
        if !tokio::fs::try_exists(root).await.unwrap_or(false) {
            return Err(Error::BundleFolderMissing(root.to_path_buf()));
        }

        let files = Self::pick_preferred(Self::scan(root).await?, prefer);
        let mut bundles = Vec::new();
        for (path, component, locale, format) in files {
            match Self::decode(&path, format).await {
                Ok(messages) => bundles.push(BundleEntry {
                    component,
                    locale,
                    messages,
                }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable bundle file");
                }
            }
        }

        Ok(bundles)
    }

    async fn read_one(
        &self,
        root: &Path,
        component: &str,
        locale: &str,
        prefer: BundleFormat,
    ) -> Result<Option<HashMap<String, String>>> {
        let dir = root.join(component);
        if !tokio::fs::try_exists(&dir).await.unwrap_or(false) {
            return Ok(None);
        }

        let mut candidate = None;
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            match parse_bundle_file_name(&file_name) {
                Some((found, format)) if found.eq_ignore_ascii_case(locale) => {
                    if format == prefer {
                        return Self::decode(&entry.path(), format).await.map(Some);
                    }
                    candidate = Some((entry.path(), format));
                }
                _ => {}
            }
        }

        match candidate {
            Some((path, format)) => Self::decode(&path, format).await.map(Some),
            None => Ok(None),
        }
    }

    async fn write(
        &self,
        root: &Path,
        component: &str,
        locale: &str,
        messages: &HashMap<String, String>,
        format: BundleFormat,
    ) -> Result<()> {
        let dir = root.join(component);
        tokio::fs::create_dir_all(&dir).await?;

        let content = match format {
            BundleFormat::Properties => {
                properties::to_string(messages).map_err(|e| Error::BundleFormat {
                    path: dir.clone(),
                    reason: e.to_string(),
                })?
            }
            BundleFormat::Json => serde_json::to_string_pretty(&JsonBundle {
                component: component.to_string(),
                locale: locale.to_string(),
                messages: messages.clone(),
            })?,
        };

        // Readers only ever see complete files
        let path = dir.join(bundle_file_name(locale, format));
        let tmp = dir.join(format!(".{}.tmp", bundle_file_name(locale, format)));
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &path).await?;

        let sibling = dir.join(bundle_file_name(locale, format.other()));
        match tokio::fs::remove_file(&sibling).await {
            Ok(()) => debug!(path = %sibling.display(), "Removed bundle in the other format"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(())
    }
}

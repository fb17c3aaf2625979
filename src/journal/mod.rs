//! Journal files on disk
//!
//! The journal directory is the source of truth; the temporal index is
//! rebuilt from it on every start.
//!
//! - **header**: fixed 64-byte header at the start of every journal file
//! - **JournalScanner**: discovers journal files and turns their headers
//!   into descriptors

mod header;

pub use header::{JournalHeader, HEADER_SIZE};

use crate::config::JournalConfig;
use crate::descriptor::JournalDescriptor;
use crate::error::{IndexError, IndexResult};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Discovers journal files in a directory
#[derive(Debug, Clone)]
pub struct JournalScanner {
    dir: PathBuf,
    extension: String,
    skip_invalid: bool,
}

impl JournalScanner {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            extension: "jnl".to_string(),
            skip_invalid: true,
        }
    }

    pub fn from_config(config: &JournalConfig) -> Self {
        Self {
            dir: PathBuf::from(&config.dir),
            extension: config.extension.clone(),
            skip_invalid: config.skip_invalid,
        }
    }

    /// Builder method: file extension to match (without the dot)
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Builder method: skip unreadable files instead of failing
    pub fn skip_invalid(mut self, skip: bool) -> Self {
        self.skip_invalid = skip;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read every journal header in the directory
    ///
    /// Returns descriptors sorted by create time. A missing directory
    /// holds no journals.
    pub fn scan(&self) -> IndexResult<Vec<JournalDescriptor>> {
        if !self.dir.exists() {
            tracing::debug!("Journal directory {:?} does not exist", self.dir);
            return Ok(Vec::new());
        }

        let mut descriptors = Vec::new();

        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !self.matches(&path) {
                continue;
            }

            match Self::describe(&path) {
                Ok(descriptor) => descriptors.push(descriptor),
                Err(e) if self.skip_invalid => {
                    tracing::warn!("Skipping journal {:?}: {}", path, e);
                }
                Err(e) => return Err(e),
            }
        }

        descriptors.sort_by(|a, b| {
            a.create_time
                .cmp(&b.create_time)
                .then_with(|| a.file.cmp(&b.file))
        });
        let descriptors = self.drop_shared_create_times(descriptors)?;

        tracing::info!(
            "Discovered {} journals in {:?}",
            descriptors.len(),
            self.dir
        );
        Ok(descriptors)
    }

    /// Create a new journal file named after its create time
    pub fn create(&self, create_time: i64) -> IndexResult<JournalDescriptor> {
        if create_time <= 0 {
            return Err(IndexError::InvalidArgument(format!(
                "createTime must be positive, got {}",
                create_time
            )));
        }

        std::fs::create_dir_all(&self.dir)?;
        let path = self
            .dir
            .join(format!("{}.{}", create_time, self.extension));

        let header = JournalHeader::new(create_time);
        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        file.write_all(&header.to_bytes())?;
        file.sync_all()?;

        tracing::info!("Created journal {:?}", path);
        Ok(header.to_descriptor(&path, HEADER_SIZE as u64))
    }

    /// Keep the first file for each create time in sorted order
    fn drop_shared_create_times(
        &self,
        descriptors: Vec<JournalDescriptor>,
    ) -> IndexResult<Vec<JournalDescriptor>> {
        let mut kept: Vec<JournalDescriptor> = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            match kept.last() {
                Some(previous) if previous.create_time == descriptor.create_time => {
                    if !self.skip_invalid {
                        return Err(IndexError::DuplicateKey {
                            create_time: descriptor.create_time,
                        });
                    }
                    tracing::warn!(
                        "Skipping journal {:?}: createTime={} already used by {:?}",
                        descriptor.file,
                        descriptor.create_time,
                        previous.file
                    );
                }
                _ => kept.push(descriptor),
            }
        }

        Ok(kept)
    }

    fn matches(&self, path: &Path) -> bool {
        path.is_file()
            && path
                .extension()
                .map(|ext| ext == self.extension.as_str())
                .unwrap_or(false)
    }

    fn describe(path: &Path) -> IndexResult<JournalDescriptor> {
        let header = JournalHeader::read_from(path)?;
        let size = std::fs::metadata(path)?.len();
        Ok(header.to_descriptor(path, size))
    }
}

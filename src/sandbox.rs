use std::{
    fs,
    io::Write,
    path::PathBuf,
};

use tempfile::NamedTempFile;

use crate::error::SentryResult;

/// Directory where uploads are spooled while they are decoded. A spooled file lives as long as
/// the returned guard
#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    dir: Option<PathBuf>,
}

impl Sandbox {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    pub fn disabled() -> Self {
        Self { dir: None }
    }

    /// Writes the upload to a fresh file in the sandbox. Returns None when spooling is disabled
    pub fn spool(&self, bytes: &[u8]) -> SentryResult<Option<NamedTempFile>> {
        let Some(dir) = &self.dir else {
            return Ok(None);
        };

        fs::create_dir_all(dir)?;
        let mut file = tempfile::Builder::new().prefix("upload-").suffix(".img").tempfile_in(dir)?;
        file.write_all(bytes)?;
        file.flush()?;

        Ok(Some(file))
    }
}

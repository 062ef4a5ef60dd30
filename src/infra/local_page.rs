use crate::app::ports::PageSource;
use crate::error::{EtlError, Result};
use std::fs;

pub const FILE_SCHEME: &str = "file://";

/// Serves `file://` URLs from the local filesystem, for fixture pages.
pub struct LocalFilePageSource;

impl PageSource for LocalFilePageSource {
    fn fetch(&self, url: &str) -> Result<String> {
        let path = url.strip_prefix(FILE_SCHEME).ok_or_else(|| {
            EtlError::Config(format!("'{}' is not a {} URL", url, FILE_SCHEME))
        })?;
        tracing::debug!("Reading page from {}", path);
        Ok(fs::read_to_string(path)?)
    }
}

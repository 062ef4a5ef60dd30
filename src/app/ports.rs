use crate::error::Result;

/// Where the source page comes from. The pipeline only sees HTML text.
pub trait PageSource {
    fn fetch(&self, url: &str) -> Result<String>;
}

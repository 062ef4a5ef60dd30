pub mod http_client;
pub mod local_page;

use crate::app::ports::PageSource;
use crate::config::EtlConfig;
use crate::error::Result;

pub use http_client::ReqwestPageSource;
pub use local_page::LocalFilePageSource;

/// Picks the page source from the URL scheme: `file://` reads from disk,
/// anything else goes over HTTP.
pub fn page_source_for(config: &EtlConfig) -> Result<Box<dyn PageSource>> {
    if config.source_url.starts_with(local_page::FILE_SCHEME) {
        Ok(Box::new(LocalFilePageSource))
    } else {
        Ok(Box::new(ReqwestPageSource::new(
            config.request_timeout(),
            &config.user_agent,
        )?))
    }
}

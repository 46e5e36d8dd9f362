//! Persistent cache of network lookups used by the URL check.

mod fetcher;
mod url_status;

pub use fetcher::{HttpFetcher, UrlFetcher};
pub use url_status::{
    clear_cache_files, UrlStatus, UrlStatusCache, CACHE_FILE_NAME, CACHE_PATH_ENV,
};

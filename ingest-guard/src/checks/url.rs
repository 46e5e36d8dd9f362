//! URL reachability check.

use crate::cache::UrlStatusCache;
use crate::core::{CellError, NoteTemplate, Row, RowCheck};
use crate::logging::truncate_field;
use crate::prelude::*;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Flags cells whose `prefix + value` URL does not return HTTP 200.
///
/// Lookups go through the shared [`UrlStatusCache`], so each distinct URL is
/// fetched at most once per cache lifetime.
#[derive(Debug)]
pub struct UrlCheck {
    prefixes: BTreeMap<String, String>,
    cache: Arc<UrlStatusCache>,
    template: NoteTemplate,
}

impl UrlCheck {
    pub const DEFAULT_TEMPLATE: &'static str = "URL returned {status}: \"{url}\"";

    /// Creates the check from field name -> URL prefix.
    pub fn new(prefixes: BTreeMap<String, String>, cache: Arc<UrlStatusCache>) -> Self {
        Self {
            prefixes,
            cache,
            template: NoteTemplate::new(Self::DEFAULT_TEMPLATE),
        }
    }

    /// Replaces the note template. Placeholders: `{status}`, `{url}`.
    pub fn with_template(mut self, template: impl Into<NoteTemplate>) -> Self {
        self.template = template.into();
        self
    }
}

impl RowCheck for UrlCheck {
    fn name(&self) -> &str {
        "url"
    }

    fn check(&mut self, row: &Row) -> Result<Vec<CellError>> {
        let mut errors = Vec::new();
        for (field, value) in row.iter() {
            if value.is_null() {
                continue;
            }
            let Some(prefix) = self.prefixes.get(field) else {
                continue;
            };
            let url = format!("{prefix}{value}");
            let status = self.cache.resolve(&url)?;
            if !status.is_ok() {
                debug!(
                    row = row.number(),
                    field,
                    url = %truncate_field(&url, 256),
                    %status,
                    "URL check failed"
                );
                let note = self
                    .template
                    .render(&[("status", status.to_string()), ("url", url.clone())]);
                errors.push(CellError::from_row(row, field, note));
            }
        }
        Ok(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::UrlStatus;
    use crate::test_helpers::RecordingFetcher;

    fn check_with(
        dir: &tempfile::TempDir,
        fetcher: RecordingFetcher,
    ) -> (UrlCheck, Arc<UrlStatusCache>) {
        let cache = Arc::new(UrlStatusCache::new(
            dir.path().join("cache.json"),
            Box::new(fetcher),
        ));
        cache.insert("http://x/1", UrlStatus::Code(200)).unwrap();
        cache.insert("http://x/2", UrlStatus::Code(404)).unwrap();
        let prefixes = BTreeMap::from([("link".to_string(), "http://x/".to_string())]);
        (UrlCheck::new(prefixes, cache.clone()), cache)
    }

    #[test]
    fn test_cached_200_passes_and_404_fails() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher::always(500);
        let (mut check, _) = check_with(&dir, fetcher.clone());

        let ok = check.check(&Row::new(2).with_cell("link", "1")).unwrap();
        assert!(ok.is_empty());

        let bad = check.check(&Row::new(3).with_cell("link", "2")).unwrap();
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].field, "link");
        assert_eq!(bad[0].row, 3);
        assert_eq!(bad[0].note, "URL returned 404: \"http://x/2\"");
        assert_eq!(fetcher.calls(), 0);
    }

    #[test]
    fn test_null_and_unconstrained_fields_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher::always(404);
        let (mut check, _) = check_with(&dir, fetcher.clone());

        let row = Row::new(2)
            .with_cell("link", crate::core::Value::Null)
            .with_cell("other", "2");
        assert!(check.check(&row).unwrap().is_empty());
        assert_eq!(fetcher.calls(), 0);
    }

    #[test]
    fn test_uncached_url_fetched_once() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = RecordingFetcher::failing("dns error");
        let (mut check, cache) = check_with(&dir, fetcher.clone());

        for n in 2..5 {
            let errors = check.check(&Row::new(n).with_cell("link", "3")).unwrap();
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].note, "URL returned dns error: \"http://x/3\"");
        }
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(
            cache.get("http://x/3").unwrap(),
            Some(UrlStatus::Failure("dns error".to_string()))
        );
    }

    #[test]
    fn test_non_string_values_are_stringified() {
        let dir = tempfile::tempdir().unwrap();
        let (mut check, _) = check_with(&dir, RecordingFetcher::always(500));
        let errors = check.check(&Row::new(2).with_cell("link", 2_i64)).unwrap();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_custom_template() {
        let dir = tempfile::tempdir().unwrap();
        let (check, _) = check_with(&dir, RecordingFetcher::always(500));
        let mut check = check.with_template("{url} -> {status}");
        let errors = check.check(&Row::new(2).with_cell("link", "2")).unwrap();
        assert_eq!(errors[0].note, "http://x/2 -> 404");
    }
}

//! Version fingerprinting from document metadata.
//!
//! Many publishing platforms announce themselves in a generator marker:
//!
//! ```html
//! <meta name="generator" content="WordPress 5.4">
//! ```
//!
//! [`FingerprintExtractor`] turns such a marker into a set of candidate
//! versions known to the backend. It is a low-precision classifier: extra
//! candidates are acceptable, an empty answer for a recognised product is not.

use crate::backend::Backend;
use crate::error::Result;
use crate::model::SoftwareVersion;
use crate::resource::Resource;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

static META_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta[name]").expect("valid selector"));

pub struct FingerprintExtractor {
    backend: Arc<dyn Backend>,
}

impl FingerprintExtractor {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Fetches `resource` and extracts candidate versions from its content.
    pub async fn extract_resource(&self, resource: &Resource) -> Result<HashSet<SoftwareVersion>> {
        let content = resource.content().await?;
        self.extract(&content).await
    }

    /// Extracts candidate versions from an HTML document.
    ///
    /// Returns an empty set unless the document carries exactly one
    /// non-empty generator marker. The first word of the marker names the
    /// product; a second word, if present, narrows the versions of every
    /// matching package to those whose label contains it. A hint that
    /// matches nothing is ignored.
    pub async fn extract(&self, document: &[u8]) -> Result<HashSet<SoftwareVersion>> {
        let Some(marker) = generator_content(document) else {
            return Ok(HashSet::new());
        };

        let mut tokens = marker.split_whitespace();
        let Some(product) = tokens.next() else {
            return Ok(HashSet::new());
        };
        let hint = tokens.next();

        let packages = self.backend.retrieve_packages_by_name(product).await?;
        let lookups = packages
            .iter()
            .map(|package| self.backend.retrieve_versions(package));
        let version_sets = futures::future::try_join_all(lookups).await?;

        let mut candidates = HashSet::new();
        for versions in version_sets {
            candidates.extend(narrow_by_hint(versions, hint));
        }

        tracing::info!(
            marker = %marker,
            candidates = candidates.len(),
            "generator tag suggests one of: {}",
            format_candidates(&candidates)
        );

        Ok(candidates)
    }
}

/// Content of the single generator marker in `document`, if there is
/// exactly one and it is non-empty.
fn generator_content(document: &[u8]) -> Option<String> {
    let html = Html::parse_document(&String::from_utf8_lossy(document));

    let markers: Vec<_> = html
        .select(&META_SELECTOR)
        .filter(|element| {
            element
                .value()
                .attr("name")
                .is_some_and(|name| name.trim().eq_ignore_ascii_case("generator"))
        })
        .collect();

    // None or several markers are not a reliable source
    if markers.len() != 1 {
        return None;
    }

    let content = markers[0].value().attr("content")?.trim();
    if content.is_empty() {
        None
    } else {
        Some(content.to_string())
    }
}

fn narrow_by_hint(versions: HashSet<SoftwareVersion>, hint: Option<&str>) -> HashSet<SoftwareVersion> {
    let Some(hint) = hint else {
        return versions;
    };

    let matching: HashSet<_> = versions
        .iter()
        .filter(|version| version.matches_hint(hint))
        .cloned()
        .collect();

    if matching.is_empty() {
        versions
    } else {
        matching
    }
}

fn format_candidates(candidates: &HashSet<SoftwareVersion>) -> String {
    let mut sorted: Vec<_> = candidates.iter().collect();
    sorted.sort();
    sorted
        .iter()
        .map(|version| version.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

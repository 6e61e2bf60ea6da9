//! Remote directory listing.
//!
//! The build service publishes images in a plain web directory. Entries
//! are read from the `href` targets of the HTML index, or from the lines of
//! a plain-text listing when the body has no links.

use std::collections::HashSet;
use std::sync::LazyLock;

use obsimg_schema::DownloadTarget;
use regex::Regex;
use tracing::debug;

use crate::{Fetch, ResolveError};

static HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).expect("href pattern is a valid regex")
});

/// Fetch the candidate filenames for `target` with a single GET.
///
/// # Errors
///
/// Returns [`ResolveError::Network`] if the listing cannot be fetched and
/// [`ResolveError::Parse`] if it is not UTF-8.
pub fn list_entries<F: Fetch + ?Sized>(
    fetcher: &F,
    target: &DownloadTarget,
) -> Result<Vec<String>, ResolveError> {
    let url = target.listing_url();
    let body = fetcher.get_text(&url)?;
    let entries = parse_listing(&body);
    debug!("{} entries listed at {url}", entries.len());
    Ok(entries)
}

/// Extract file entries from a directory listing body, in listing order.
pub fn parse_listing(body: &str) -> Vec<String> {
    let links: Vec<&str> = HREF
        .captures_iter(body)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .collect();

    let raw: Vec<&str> = if links.is_empty() {
        body.lines().map(str::trim).collect()
    } else {
        links
    };

    let mut seen = HashSet::new();
    raw.into_iter()
        .filter_map(entry_name)
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Final path segment of a link; `None` for directories and parent links.
fn entry_name(link: &str) -> Option<String> {
    let link = link.split(['?', '#']).next().unwrap_or_default();
    if link.is_empty() || link.ends_with('/') {
        return None;
    }
    let name = link.rsplit('/').next().unwrap_or(link);
    if name.is_empty() || name == ".." || name.contains(char::is_whitespace) {
        return None;
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    const INDEX: &str = r#"<html><body>
        <a href="../">Parent Directory</a>
        <a href="?C=N;O=D">Name</a>
        <a href="Leap.x86_64-1.0.0-Build1.1.raw.xz">Leap.x86_64-1.0.0-Build1.1.raw.xz</a>
        <a href="/repositories/images/Leap.x86_64-1.0.0-Build1.1.raw.xz.sha256">sha</a>
        <a href='Leap.x86_64-1.0.0-Build1.1.packages?mirrorlist'>packages</a>
        <a href="repodata/">repodata/</a>
        <a href="Leap.x86_64-1.0.0-Build1.1.raw.xz">duplicate</a>
    </body></html>"#;

    #[test]
    fn html_listing_keeps_files_only() {
        let entries = parse_listing(INDEX);
        assert_eq!(
            entries,
            vec![
                "Leap.x86_64-1.0.0-Build1.1.raw.xz",
                "Leap.x86_64-1.0.0-Build1.1.raw.xz.sha256",
                "Leap.x86_64-1.0.0-Build1.1.packages",
            ]
        );
    }

    #[test]
    fn uppercase_href_is_not_read_as_plain_lines() {
        let body = "<A HREF = \"Leap.raw.xz\">Leap</A>\nnot-a-file.txt\n";
        assert_eq!(parse_listing(body), vec!["Leap.raw.xz"]);
    }

    #[test]
    fn plain_listing_uses_lines() {
        let entries = parse_listing("a.raw.xz\n\n  b.raw.xz  \nsubdir/\n");
        assert_eq!(entries, vec!["a.raw.xz", "b.raw.xz"]);
    }

    #[test]
    fn list_entries_reads_listing_url() {
        let mut server = Server::new();
        let m = server
            .mock("GET", "/images/")
            .with_status(200)
            .with_body(INDEX)
            .expect(1)
            .create();

        let target = DownloadTarget::new(format!("{}/images", server.url()), "Leap");
        let entries = list_entries(&crate::HttpFetcher::new(), &target).unwrap();

        m.assert();
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn list_entries_surfaces_http_failure() {
        let mut server = Server::new();
        let _m = server.mock("GET", "/images/").with_status(503).create();

        let target = DownloadTarget::new(format!("{}/images", server.url()), "Leap");
        let err = list_entries(&crate::HttpFetcher::new(), &target).unwrap_err();
        assert!(matches!(err, ResolveError::Network { .. }));
    }
}

use std::fmt::Write as _;

use sha2::{Digest, Sha256};
use url::Url;

use super::traits::ContentKind;

/// Canonical form of a locator: lower-cased scheme and host, default port and
/// fragment dropped, query pairs sorted.
pub fn normalize_locator(locator: &str) -> String {
    let trimmed = locator.trim();
    let mut url = match Url::parse(trimmed) {
        Ok(url) if url.has_host() => url,
        _ => return trimmed.to_string(),
    };

    url.set_fragment(None);

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        pairs.sort();
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }

    url.to_string()
}

/// Hex SHA-256 of the normalized locator.
pub fn cache_key(locator: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_locator(locator).as_bytes());
    let digest = hasher.finalize();

    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

pub fn file_name(locator: &str, kind: ContentKind) -> String {
    format!("{}.{}", cache_key(locator), kind.suffix())
}

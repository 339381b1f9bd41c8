//! Page metadata extraction from raw HTML.
//!
//! Tag-level scanning with regular expressions rather than a DOM: only
//! `<meta>`, `<link>` and `<title>` matter, and pages in the wild are rarely
//! well-formed enough for anything stricter to pay off.
//!
//! Precedence per field:
//!
//! | Field | Sources, first non-blank wins |
//! |-------|-------------------------------|
//! | title | `og:title`, `twitter:title`, `<title>`, URL host |
//! | description | `og:description`, `twitter:description`, `description` |
//! | keywords | `keywords` |
//! | image | `og:image`, `twitter:image` (resolved against the page URL) |
//! | favicon | `rel=icon`, `rel="shortcut icon"`, `rel=apple-touch-icon`, then `/favicon.ico` |
//! | author | `author`, `article:author`, `twitter:creator` |
//! | site name | `og:site_name` |

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use reqwest::Url;

use brainshelf_core::ExtractedMetadata;

static META_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<meta\b[^>]*>").unwrap());
static LINK_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<link\b[^>]*>").unwrap());
static TITLE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").unwrap());
static ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .unwrap()
});
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[xX][0-9A-Fa-f]{1,6}|#[0-9]{1,7}|[A-Za-z]{2,8});").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Attributes of one tag, keys lower-cased, values entity-decoded.
type Attributes = HashMap<String, String>;

fn parse_attributes(tag: &str) -> Attributes {
    ATTRIBUTE
        .captures_iter(tag)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map_or("", |m| m.as_str());
            (caps[1].to_ascii_lowercase(), decode_entities(value))
        })
        .collect()
}

/// Decode named, decimal and hex character references. Unknown names are
/// left as written.
pub fn decode_entities(raw: &str) -> String {
    ENTITY
        .replace_all(raw, |caps: &Captures| {
            let body = &caps[1];
            let decoded = if let Some(hex) = body.strip_prefix("#x").or_else(|| body.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = body.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                match body {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some('\u{a0}'),
                    "ndash" => Some('\u{2013}'),
                    "mdash" => Some('\u{2014}'),
                    "hellip" => Some('\u{2026}'),
                    "copy" => Some('\u{a9}'),
                    _ => None,
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), |c| c.to_string())
        })
        .into_owned()
}

fn non_blank(value: &str) -> Option<String> {
    let collapsed = WHITESPACE.replace_all(value.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

/// The parts of an HTML page metadata extraction looks at.
#[derive(Debug, Default)]
pub struct PageDocument {
    metas: Vec<Attributes>,
    links: Vec<Attributes>,
    title: Option<String>,
}

impl PageDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            metas: META_TAG
                .find_iter(html)
                .map(|m| parse_attributes(m.as_str()))
                .collect(),
            links: LINK_TAG
                .find_iter(html)
                .map(|m| parse_attributes(m.as_str()))
                .collect(),
            title: TITLE_TAG
                .captures(html)
                .and_then(|caps| non_blank(&decode_entities(&caps[1]))),
        }
    }

    /// `content` of the first `<meta>` whose `name` or `property` equals
    /// `key` (case-insensitive) and whose content is not blank.
    fn meta(&self, key: &str) -> Option<String> {
        self.metas.iter().find_map(|attrs| {
            let keyed = ["name", "property"].iter().any(|k| {
                attrs
                    .get(*k)
                    .is_some_and(|v| v.trim().eq_ignore_ascii_case(key))
            });
            if keyed {
                attrs.get("content").and_then(|c| non_blank(c))
            } else {
                None
            }
        })
    }

    fn first_meta(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| self.meta(k))
    }

    /// `href` of the first `<link>` whose `rel` equals `rel` exactly
    /// (case-insensitive, whitespace-normalized).
    fn link_href(&self, rel: &str) -> Option<String> {
        self.links.iter().find_map(|attrs| {
            let matches = attrs
                .get("rel")
                .and_then(|r| non_blank(r))
                .is_some_and(|r| r.eq_ignore_ascii_case(rel));
            if matches {
                attrs.get("href").and_then(|h| non_blank(h))
            } else {
                None
            }
        })
    }

    pub fn extract(&self, page_url: &Url) -> ExtractedMetadata {
        let title = self
            .first_meta(&["og:title", "twitter:title"])
            .or_else(|| self.title.clone())
            .or_else(|| page_url.host_str().map(str::to_string));

        let image_url = self
            .first_meta(&["og:image", "twitter:image"])
            .and_then(|href| resolve_url(&href, page_url));

        let favicon_url = ["icon", "shortcut icon", "apple-touch-icon"]
            .iter()
            .find_map(|rel| self.link_href(rel))
            .and_then(|href| resolve_url(&href, page_url))
            .or_else(|| page_url.join("/favicon.ico").ok().map(String::from));

        ExtractedMetadata {
            title,
            description: self.first_meta(&["og:description", "twitter:description", "description"]),
            keywords: self.meta("keywords"),
            image_url,
            favicon_url,
            author: self.first_meta(&["author", "article:author", "twitter:creator"]),
            site_name: self.meta("og:site_name"),
        }
    }
}

/// Absolute URLs pass through; anything else is joined onto `base`.
pub fn resolve_url(href: &str, base: &Url) -> Option<String> {
    match Url::parse(href) {
        Ok(url) => Some(url.into()),
        Err(_) => base.join(href).ok().map(String::from),
    }
}

/// Parse `html` fetched from `page_url` into page metadata.
pub fn extract_metadata(html: &str, page_url: &Url) -> ExtractedMetadata {
    PageDocument::parse(html).extract(page_url)
}

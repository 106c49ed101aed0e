//! Link resolution over darklyrics.com listing pages.

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;
use tracing::debug;

use crate::utils::html::{
    children, find_all_by_class, find_anchor, find_by_class, find_descendant, own_string, Child,
};

/// Song anchors (`#3`) and parent segments (`..`) in album links.
static LINK_NOISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\d+|\.\.").expect("link noise pattern is valid"));

const ARTISTS_HEADING: &str = "Artists:";

/// Find the first artist link on a search result page.
///
/// Only the block introduced by the `Artists:` heading is considered; the walk
/// stops at the next heading.
pub fn resolve_artist_link(page: &str) -> Option<String> {
    let doc = Html::parse_document(page);
    let Some(cont) = find_by_class(&doc, "div", "cont") else {
        debug!("No result container found in search page");
        return None;
    };

    let mut artists_found = false;
    for child in children(cont) {
        let Child::Element(el) = child else {
            continue;
        };

        if el.value().name() == "h3" {
            if own_string(el).is_some_and(|s| s.trim() == ARTISTS_HEADING) {
                artists_found = true;
                continue;
            }
            if artists_found {
                break;
            }
        }

        if artists_found {
            if let Some(href) = find_anchor(el).and_then(|a| a.value().attr("href")) {
                return Some(href.to_string());
            }
        }
    }

    debug!("No artist link found in search page");
    None
}

/// Find the link to `album` on an artist page, as an absolute url under `base_url`.
///
/// Album blocks are `<div class="album">` elements whose `<h2>` (or its `<strong>`)
/// holds the title, optionally in double quotes. The title is used as a pattern
/// without escaping.
pub fn resolve_album_link(page: &str, album: &str, base_url: &str) -> Option<String> {
    let doc = Html::parse_document(page);
    let blocks = find_all_by_class(&doc, "div", "album");
    if blocks.is_empty() {
        debug!("No album blocks found in artist page");
        return None;
    }

    let title = match Regex::new(&format!(r#"^"?{}"?$"#, album)) {
        Ok(re) => re,
        Err(e) => {
            debug!("Album title {:?} is not usable as a pattern: {}", album, e);
            return None;
        }
    };

    for block in blocks {
        let mut album_found = false;
        for child in children(block) {
            let Child::Element(el) = child else {
                continue;
            };

            if el.value().name() == "h2" {
                let heading = own_string(el)
                    .or_else(|| find_descendant(el, "strong").and_then(own_string));
                if heading.is_some_and(|h| title.is_match(h.trim())) {
                    album_found = true;
                    continue;
                }
                if album_found {
                    break;
                }
            }

            if album_found {
                if let Some(href) = find_anchor(el).and_then(|a| a.value().attr("href")) {
                    let path = LINK_NOISE.replace_all(href, "");
                    return Some(format!("{}{}", base_url.trim_end_matches('/'), path));
                }
            }
        }
    }

    debug!("Album {:?} not found in artist page", album);
    None
}

//! Extraction of plain lyric text from lyrics pages.
//!
//! Two page shapes are understood:
//! - a single-song page with the text in `<div class="lyricbox">` (lyrics.wikia.com)
//! - an album page with every song of the album in `<div class="lyrics">`, each song
//!   introduced by an `<h3>N. Title</h3>` heading (darklyrics.com)

use regex::Regex;
use scraper::Html;
use tracing::debug;

use crate::lyrics::LyricsResult;
use crate::utils::html::{children, find_by_class, find_descendant, own_string, Child};

/// Element and text prefix a page uses to flag an instrumental track.
#[derive(Debug, Clone, Copy)]
struct InstrumentalMark {
    tag: &'static str,
    prefix: &'static str,
}

const LYRICBOX_INSTRUMENTAL: InstrumentalMark = InstrumentalMark {
    tag: "b",
    prefix: "Instrumental",
};

const ALBUM_INSTRUMENTAL: InstrumentalMark = InstrumentalMark {
    tag: "i",
    prefix: "[Instrumental]",
};

enum Step {
    Continue,
    Instrumental,
}

/// Parse a single-song lyrics page.
///
/// With `gracenote` set the text lives in the first paragraph of the lyricbox
/// instead of the lyricbox itself.
pub fn parse_lyricbox(page: &str, gracenote: bool) -> LyricsResult {
    let doc = Html::parse_document(page);
    let Some(mut lyricbox) = find_by_class(&doc, "div", "lyricbox") else {
        debug!("No lyricbox found in page");
        return LyricsResult::Absent;
    };

    if gracenote {
        match find_descendant(lyricbox, "p") {
            Some(p) => lyricbox = p,
            None => {
                debug!("No paragraph found in gracenote lyricbox");
                return LyricsResult::Absent;
            }
        }
    }

    let mut lyrics = String::new();
    for child in children(lyricbox) {
        if let Step::Instrumental = append_child(child, &mut lyrics, LYRICBOX_INSTRUMENTAL) {
            return LyricsResult::Instrumental;
        }
    }

    LyricsResult::from_text(lyrics)
}

/// Parse the lyrics of `song` out of an album page.
///
/// `song` is spliced into the heading pattern as-is, so titles containing
/// regex syntax match as patterns. A title that is not a valid pattern finds nothing.
pub fn parse_album_lyrics(page: &str, song: &str) -> LyricsResult {
    let doc = Html::parse_document(page);
    let Some(container) = find_by_class(&doc, "div", "lyrics") else {
        debug!("No lyrics div found in album page");
        return LyricsResult::Absent;
    };

    let heading = match Regex::new(&format!(r"^\d+\.\s+{}$", song)) {
        Ok(re) => re,
        Err(e) => {
            debug!("Song title {:?} is not usable as a heading pattern: {}", song, e);
            return LyricsResult::Absent;
        }
    };

    let mut lyrics = String::new();
    let mut song_found = false;
    for child in children(container) {
        if let Child::Element(el) = child {
            if el.value().name() == "h3" {
                let is_target = own_string(el).is_some_and(|title| heading.is_match(title.trim()));
                if is_target {
                    song_found = true;
                    continue;
                }
                if song_found {
                    // next song starts here
                    break;
                }
            }
        }

        if song_found {
            if let Step::Instrumental = append_child(child, &mut lyrics, ALBUM_INSTRUMENTAL) {
                return LyricsResult::Instrumental;
            }
        }
    }

    LyricsResult::from_text(lyrics)
}

fn append_child(child: Child<'_>, lyrics: &mut String, mark: InstrumentalMark) -> Step {
    match child {
        Child::Text(text) => lyrics.push_str(text.trim()),
        Child::Element(el) => {
            let name = el.value().name();
            let string = own_string(el);

            if name == mark.tag && string.as_deref().is_some_and(|s| s.starts_with(mark.prefix)) {
                return Step::Instrumental;
            }
            if name == "br" {
                lyrics.push('\n');
            }
            if name != "script" {
                if let Some(string) = string {
                    lyrics.push_str(string.trim());
                }
            }
        }
        // comments carry no lyrics
        Child::Other => {}
    }
    Step::Continue
}

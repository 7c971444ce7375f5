//! ASCII-art stand-ins for `<img>` tags.
//!
//! Images are swapped for placeholder tokens before the HTML goes through a
//! backend, and the tokens are swapped for art afterwards, so that every
//! backend wraps text around the image the same way.

use image::imageops::FilterType;
use url::Url;

use crate::app::{Result, TreadError};

const TOKEN_MARK: &str = "TREADIMG";
const ASCII_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];
const BLOCK_RAMP: &[char] = &[' ', '░', '▒', '▓', '█'];

/// Terminal cells are roughly twice as tall as they are wide.
const CELL_ASPECT: u32 = 2;
const MAX_ART_ROWS: u32 = 40;

pub fn placeholder(index: usize) -> String {
    format!("{TOKEN_MARK}{index}{TOKEN_MARK}")
}

/// Replace every `<img>` tag with a placeholder paragraph.
///
/// Returns the rewritten HTML and the image URLs in token order. Sources are
/// resolved against `base` when they are relative.
pub fn substitute(html: &str, base: Option<&str>) -> (String, Vec<String>) {
    let lower = html.to_ascii_lowercase();
    let base = base.and_then(|b| Url::parse(b).ok());

    let mut out = String::with_capacity(html.len());
    let mut urls = Vec::new();
    let mut pos = 0;

    while let Some(found) = lower[pos..].find("<img") {
        let start = pos + found;
        let name_end = start + "<img".len();
        let is_img = lower[name_end..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_whitespace() || c == '/' || c == '>');
        if !is_img {
            out.push_str(&html[pos..name_end]);
            pos = name_end;
            continue;
        }

        let Some(len) = lower[start..].find('>') else {
            break;
        };
        let end = start + len + 1;
        out.push_str(&html[pos..start]);

        let tag = &html[start..end];
        match extract_src(tag) {
            Some(src) => {
                let resolved = match &base {
                    Some(base) => base.join(&src).map(String::from).unwrap_or(src),
                    None => src,
                };
                out.push_str(&format!("<p>{}</p>", placeholder(urls.len())));
                urls.push(resolved);
            }
            None => out.push_str(tag),
        }
        pos = end;
    }

    out.push_str(&html[pos..]);
    (out, urls)
}

/// The `src` attribute of an `<img ...>` tag, entity-decoded. Attributes are
/// walked one by one so that `data-src` or a quoted value containing `src=`
/// is never mistaken for it.
fn extract_src(tag: &str) -> Option<String> {
    let mut rest = tag.get("<img".len()..)?;

    loop {
        rest = rest.trim_start_matches(|c: char| c.is_ascii_whitespace() || c == '/');
        if rest.is_empty() || rest.starts_with('>') {
            return None;
        }

        let name_len = rest
            .find(|c: char| c.is_ascii_whitespace() || matches!(c, '=' | '>' | '/'))
            .unwrap_or(rest.len());
        let name = &rest[..name_len];
        rest = rest[name_len..].trim_start();

        let mut value = None;
        if let Some(after) = rest.strip_prefix('=') {
            let after = after.trim_start();
            let (raw, remaining) = match after.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let inner = &after[1..];
                    let close = inner.find(quote)?;
                    (&inner[..close], &inner[close + 1..])
                }
                _ => {
                    let end = after
                        .find(|c: char| c.is_ascii_whitespace() || c == '>')
                        .unwrap_or(after.len());
                    (&after[..end], &after[end..])
                }
            };
            value = Some(raw);
            rest = remaining;
        }

        if name.eq_ignore_ascii_case("src") {
            return value
                .filter(|v| !v.is_empty())
                .map(|v| html_escape::decode_html_entities(v).to_string());
        }
    }
}

/// Locate the placeholder on a rendered line, if any.
pub fn find_placeholder(line: &str) -> Option<(usize, std::ops::Range<usize>)> {
    let start = line.find(TOKEN_MARK)?;
    let digits_start = start + TOKEN_MARK.len();
    let digits_len = line[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(line.len() - digits_start);
    if digits_len == 0 {
        return None;
    }
    let digits_end = digits_start + digits_len;
    if !line[digits_end..].starts_with(TOKEN_MARK) {
        return None;
    }

    let index = line[digits_start..digits_end].parse().ok()?;
    Some((index, start..digits_end + TOKEN_MARK.len()))
}

/// Decode an image and draw it with characters, at most `width` columns.
pub fn to_ascii(bytes: &[u8], width: usize, blocks: bool) -> Result<Vec<String>> {
    let img = image::load_from_memory(bytes).map_err(|e| TreadError::Render(e.to_string()))?;
    if width == 0 || img.width() == 0 || img.height() == 0 {
        return Ok(Vec::new());
    }

    let cols = img.width().min(width as u32).max(1);
    let rows = (img.height() * cols / img.width() / CELL_ASPECT).clamp(1, MAX_ART_ROWS);
    let gray = img.resize_exact(cols, rows, FilterType::Triangle).to_luma8();

    let ramp = if blocks { BLOCK_RAMP } else { ASCII_RAMP };
    let steps = ramp.len() - 1;

    let lines = gray
        .rows()
        .map(|row| {
            let line: String = row
                .map(|px| ramp[px.0[0] as usize * steps / 255])
                .collect();
            line.trim_end().to_string()
        })
        .collect();

    Ok(lines)
}

use std::io::Write;
use std::process::{Command, Stdio};

use crate::app::{Result, TreadError};

/// The HTML-to-text strategies a user can pick with the `parser` setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Html2Text,
    Lynx,
    W3m,
    /// Kept so that a typo in the config degrades to raw HTML instead of
    /// refusing to start.
    Unsupported(String),
}

impl Backend {
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "html2text" => Backend::Html2Text,
            "lynx" => Backend::Lynx,
            "w3m" => Backend::W3m,
            _ => Backend::Unsupported(name.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Backend::Html2Text => "html2text",
            Backend::Lynx => "lynx",
            Backend::W3m => "w3m",
            Backend::Unsupported(name) => name,
        }
    }

    /// Convert `html` to plain text no wider than `width` columns.
    pub fn render_text(&self, html: &str, width: usize) -> Result<String> {
        match self {
            Backend::Html2Text => html2text::config::plain()
                .string_from_read(html.as_bytes(), width.saturating_sub(1).max(1))
                .map_err(|e| TreadError::Render(e.to_string())),
            Backend::Lynx => {
                let width = (width + 2).to_string();
                let output = run_filter(
                    "lynx",
                    &["-stdin", "-dump", "-width", &width, "-image_links"],
                    &encode_latin1(html),
                )?;
                let mut text = decode_latin1(&output);
                text.push('\n');
                Ok(text)
            }
            Backend::W3m => {
                let width = width.to_string();
                let output = run_filter(
                    "w3m",
                    &["-T", "text/html", "-dump", "-cols", &width],
                    html.as_bytes(),
                )?;
                Ok(String::from_utf8_lossy(&output).into_owned())
            }
            Backend::Unsupported(name) => {
                Err(TreadError::Render(format!("Unsupported parser: {name}")))
            }
        }
    }
}

/// Pipe `input` through `program` and collect its standard output.
fn run_filter(program: &str, args: &[&str], input: &[u8]) -> Result<Vec<u8>> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| TreadError::Render(format!("could not run {program}: {e}")))?;

    // Feed stdin from another thread so a full stdout pipe cannot deadlock us
    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| TreadError::Render(format!("{program} has no stdin")))?;
    let input = input.to_vec();
    let writer = std::thread::spawn(move || stdin.write_all(&input));

    let output = child.wait_with_output()?;
    if let Ok(Err(e)) = writer.join() {
        tracing::debug!(program, error = %e, "short write to renderer");
    }

    if !output.status.success() {
        return Err(TreadError::Render(format!(
            "{program} exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(output.stdout)
}

/// ISO-8859-1 with anything outside it sent as a numeric character reference.
fn encode_latin1(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        let code = c as u32;
        if code <= 0xFF {
            bytes.push(code as u8);
        } else {
            bytes.extend_from_slice(format!("&#{code};").as_bytes());
        }
    }
    bytes
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Backend::from_name("html2text"), Backend::Html2Text);
        assert_eq!(Backend::from_name("Lynx"), Backend::Lynx);
        assert_eq!(Backend::from_name(" w3m "), Backend::W3m);
        assert_eq!(
            Backend::from_name("links"),
            Backend::Unsupported("links".into())
        );
    }

    #[test]
    fn test_html2text_respects_width() {
        let html = "<p>The quick brown fox jumps over the lazy dog and keeps on running \
                    through the field until the sun goes down.</p>";
        let text = Backend::Html2Text.render_text(html, 20).unwrap();

        assert!(text.contains("quick"));
        assert!(text.lines().count() > 1);
        assert!(text
            .lines()
            .all(|l| unicode_width::UnicodeWidthStr::width(l) <= 20));
    }

    #[test]
    fn test_unsupported_is_an_error() {
        let result = Backend::Unsupported("links".into()).render_text("<p>x</p>", 40);
        assert!(matches!(result, Err(TreadError::Render(_))));
    }

    #[test]
    fn test_latin1_encoding_uses_character_references() {
        let encoded = encode_latin1("café ✓");
        assert_eq!(encoded, b"caf\xe9 &#10003;".to_vec());
        assert_eq!(decode_latin1(b"caf\xe9"), "café");
    }

    #[test]
    fn test_missing_program_is_render_error() {
        let result = run_filter("tread-no-such-program", &[], b"");
        assert!(matches!(result, Err(TreadError::Render(_))));
    }
}

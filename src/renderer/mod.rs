//! Article HTML to fixed-width text.
//!
//! - [`Backend`]: the conversion strategy picked by the `parser` setting
//! - [`images`]: optional ASCII-art rendering of inline images

pub mod backend;
pub mod images;

use std::sync::Arc;
use std::time::Duration;

pub use backend::Backend;

use crate::fetcher::Fetcher;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageOptions {
    pub enabled: bool,
    /// Shade blocks instead of the ASCII ramp.
    pub blocks: bool,
}

pub struct ContentRenderer {
    backend: Backend,
    images: ImageOptions,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    timeout: Duration,
}

impl ContentRenderer {
    pub fn new(
        backend: Backend,
        images: ImageOptions,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        timeout: Duration,
    ) -> Self {
        Self {
            backend,
            images,
            fetcher,
            timeout,
        }
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Render `html` for a pane `width` columns wide.
    ///
    /// Never fails: an unusable backend yields the HTML unchanged and a broken
    /// image yields a `[image: url]` line. Problems are reported through `log`.
    pub async fn render(
        &self,
        html: &str,
        width: usize,
        base_url: Option<&str>,
        log: &mut dyn FnMut(String),
    ) -> String {
        let (source, urls) = if self.images.enabled {
            images::substitute(html, base_url)
        } else {
            (html.to_string(), Vec::new())
        };

        let text = match self.backend.render_text(&source, width) {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(backend = self.backend.name(), error = %e, "render failed");
                log(e.to_string());
                return html.to_string();
            }
        };

        if urls.is_empty() {
            return text;
        }
        self.expand_images(&text, &urls, width, log).await
    }

    async fn expand_images(
        &self,
        text: &str,
        urls: &[String],
        width: usize,
        log: &mut dyn FnMut(String),
    ) -> String {
        let mut out = String::with_capacity(text.len());

        for line in text.lines() {
            let Some((index, range)) = images::find_placeholder(line) else {
                out.push_str(line);
                out.push('\n');
                continue;
            };
            let Some(url) = urls.get(index) else {
                out.push_str(line);
                out.push('\n');
                continue;
            };

            match self.fetch_art(url, width).await {
                Ok(art) => {
                    for art_line in art {
                        out.push_str(&art_line);
                        out.push('\n');
                    }
                }
                Err(e) => {
                    tracing::debug!(url, error = %e, "image skipped");
                    log(format!("Could not render image {url}: {e}"));
                    out.push_str(&line[..range.start]);
                    out.push_str(&format!("[image: {url}]"));
                    out.push_str(&line[range.end..]);
                    out.push('\n');
                }
            }
        }

        out
    }

    async fn fetch_art(&self, url: &str, width: usize) -> crate::app::Result<Vec<String>> {
        let bytes = self.fetcher.fetch(url, self.timeout).await?;
        images::to_ascii(&bytes, width, self.images.blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refresher::tests::MockFetcher;
    use image::{GrayImage, ImageFormat, Luma};
    use std::io::Cursor;

    fn renderer(backend: Backend, images: bool) -> (Arc<MockFetcher>, ContentRenderer) {
        let fetcher = Arc::new(MockFetcher::default());
        let renderer = ContentRenderer::new(
            backend,
            ImageOptions {
                enabled: images,
                blocks: false,
            },
            fetcher.clone(),
            Duration::from_secs(1),
        );
        (fetcher, renderer)
    }

    #[tokio::test]
    async fn test_render_html2text() {
        let (_, renderer) = renderer(Backend::Html2Text, false);
        let mut log = Vec::new();

        let text = renderer
            .render("<p>Hello <b>world</b></p>", 40, None, &mut |m| log.push(m))
            .await;

        assert!(text.contains("Hello"));
        assert!(!text.contains("<p>"));
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_backend_returns_html() {
        let (_, renderer) = renderer(Backend::Unsupported("links".into()), false);
        let mut log = Vec::new();

        let text = renderer
            .render("<p>raw</p>", 40, None, &mut |m| log.push(m))
            .await;

        assert_eq!(text, "<p>raw</p>");
        assert_eq!(log, vec!["Render error: Unsupported parser: links".to_string()]);
    }

    #[tokio::test]
    async fn test_broken_image_leaves_marker() {
        let (_, renderer) = renderer(Backend::Html2Text, true);
        let mut log = Vec::new();

        let text = renderer
            .render(
                r#"<p>Look:</p><img src="https://example.com/missing.png"><p>Done</p>"#,
                40,
                None,
                &mut |m| log.push(m),
            )
            .await;

        assert!(text.contains("[image: https://example.com/missing.png]"));
        assert!(text.contains("Look:"));
        assert!(text.contains("Done"));
        assert!(!text.contains("TREADIMG"));
        assert_eq!(log.len(), 1);
    }

    #[tokio::test]
    async fn test_image_replaced_by_art() {
        let (fetcher, renderer) = renderer(Backend::Html2Text, true);

        let img = GrayImage::from_pixel(8, 8, Luma([255]));
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();
        fetcher
            .bodies
            .lock()
            .unwrap()
            .insert("https://example.com/img/a.png".into(), png);

        let text = renderer
            .render(
                r#"<img src="a.png">"#,
                20,
                Some("https://example.com/img/post"),
                &mut |_| {},
            )
            .await;

        assert!(text.contains("@@@@@@@@"));
        assert!(!text.contains("TREADIMG"));
        assert_eq!(
            fetcher.requests.lock().unwrap().as_slice(),
            ["https://example.com/img/a.png".to_string()]
        );
    }
}

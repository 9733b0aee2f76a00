use scraper::{Html, Node};
use tracing::{debug, info};

use crate::config::FetchConfig;
use crate::error::InformeError;
use crate::model::{SourceKind, TabularResult};
use crate::readers::PageFetcher;

/// Elements whose text is never shown to a reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Blocking HTTP fetcher backed by reqwest.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, InformeError> {
        // None disables reqwest's default 30s timeout
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .timeout(config.timeout)
            .build()
            .map_err(|e| InformeError::read(SourceKind::WebPage, format!("HTTP client setup: {e}")))?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, InformeError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| InformeError::read(SourceKind::WebPage, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InformeError::read(
                SourceKind::WebPage,
                format!("HTTP {status} for {url}"),
            ));
        }

        response
            .text()
            .map_err(|e| InformeError::read(SourceKind::WebPage, format!("reading body: {e}")))
    }

    fn backend_name(&self) -> &str {
        "reqwest"
    }
}

/// Fetch `url` and keep only its visible text, one text node per line.
pub fn read_web(url: &str, fetcher: &dyn PageFetcher) -> Result<TabularResult, InformeError> {
    info!(url, backend = fetcher.backend_name(), "fetching web page");
    let html = fetcher.fetch(url)?;
    let text = visible_text(&html);
    debug!(bytes = html.len(), chars = text.len(), "extracted visible text");
    Ok(TabularResult::single_text(SourceKind::WebPage, text))
}

/// Strip markup from an HTML document, keeping trimmed, non-empty text nodes
/// outside scripts and styles, joined by newlines.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut lines: Vec<&str> = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let hidden = node.ancestors().any(|ancestor| match ancestor.value() {
            Node::Element(element) => HIDDEN_ELEMENTS.contains(&element.name()),
            _ => false,
        });
        if hidden {
            continue;
        }
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            lines.push(trimmed);
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_text_skips_scripts_and_styles() {
        let html = r#"<!DOCTYPE html>
<html>
  <head>
    <title>Resultados</title>
    <style>body { color: red; }</style>
    <script>var x = 1;</script>
  </head>
  <body>
    <h1>Ventas  del trimestre</h1>
    <p>Crecimiento de <b>12%</b> en la zona norte.</p>
    <noscript>Activa JavaScript</noscript>
  </body>
</html>"#;
        assert_eq!(
            visible_text(html),
            "Resultados\nVentas  del trimestre\nCrecimiento de\n12%\nen la zona norte."
        );
    }

    #[test]
    fn test_visible_text_of_empty_document() {
        assert_eq!(visible_text(""), "");
    }
}

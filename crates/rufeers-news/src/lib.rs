//! RUFEERS News - Related headline search
//!
//! Fetches a news search results page for a query and scrapes the
//! headline (`<h3>`) elements from it.

use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;

use rufeers_core::{NewsConfig, Result, RufeersError};

/// Source of headlines related to a query
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<String>>;
}

// ============================================================================
// HTTP client
// ============================================================================

/// News search over HTTP
pub struct NewsClient {
    client: Client,
    base_url: String,
    max_headlines: usize,
}

impl NewsClient {
    /// Create a new client for `base_url`
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::from_config(&NewsConfig {
            base_url: base_url.into(),
            ..NewsConfig::default()
        })
    }

    /// Create from config
    pub fn from_config(config: &NewsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| RufeersError::News(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            max_headlines: config.max_headlines,
        })
    }
}

#[async_trait]
impl NewsSource for NewsClient {
    async fn search(&self, query: &str) -> Result<Vec<String>> {
        tracing::debug!(query, url = %self.base_url, "Fetching related news");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", query)])
            .send()
            .await
            .map_err(|e| RufeersError::News(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RufeersError::News(format!(
                "News search returned {status}"
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RufeersError::News(format!("Failed to read response: {e}")))?;

        let mut headlines = parse_headlines(&body);
        headlines.truncate(self.max_headlines);
        tracing::debug!(query, count = headlines.len(), "Fetched headlines");
        Ok(headlines)
    }
}

// ============================================================================
// Scraping
// ============================================================================

static H3: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<h3\b[^>]*>(.*?)</h3\s*>").unwrap());
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").unwrap());

/// Text of every `<h3>` element in `html`, in document order
///
/// Nested tags are stripped, character references decoded and whitespace
/// collapsed. Empty headings are dropped.
pub fn parse_headlines(html: &str) -> Vec<String> {
    H3.captures_iter(html)
        .filter_map(|caps| {
            let inner = caps.get(1)?.as_str();
            let text = TAG.replace_all(inner, " ");
            let text = decode_entities(&text);
            let text = SPACE.replace_all(text.trim(), " ").into_owned();
            (!text.is_empty()).then_some(text)
        })
        .collect()
}

fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse().ok().and_then(char::from_u32)
            } else {
                match name {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    "apos" => Some('\''),
                    "nbsp" => Some(' '),
                    _ => None,
                }
            };
            decoded
                .map(String::from)
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_headlines() {
        let html = r#"
            <html><body>
            <article><h3 class="ipQwMb"><a href="./articles/1">Khan arrested at High Court</a></h3></article>
            <article><H3>Court  adjourns
                hearing</H3></article>
            <h2>Not a headline</h2>
            </body></html>
        "#;

        assert_eq!(
            parse_headlines(html),
            vec![
                "Khan arrested at High Court".to_string(),
                "Court adjourns hearing".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_headlines_decodes_entities() {
        let html = "<h3>Q&amp;A: &quot;What&#39;s next&quot; &#x2014; analysis &bogus;</h3>";
        assert_eq!(
            parse_headlines(html),
            vec!["Q&A: \"What's next\" \u{2014} analysis &bogus;".to_string()]
        );
    }

    #[test]
    fn test_parse_headlines_skips_empty() {
        assert!(parse_headlines("<h3> <span></span> </h3>").is_empty());
        assert!(parse_headlines("no headings here").is_empty());
    }

    #[test]
    fn test_client_from_config() {
        let config = NewsConfig {
            base_url: "http://localhost:9/search".to_string(),
            max_headlines: 3,
            ..NewsConfig::default()
        };
        let client = NewsClient::from_config(&config).unwrap();
        assert_eq!(client.max_headlines, 3);
        assert_eq!(client.base_url, "http://localhost:9/search");
    }

    struct StaticSource(Vec<String>);

    #[async_trait]
    impl NewsSource for StaticSource {
        async fn search(&self, _query: &str) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_news_source_trait_object() {
        let source: Box<dyn NewsSource> =
            Box::new(StaticSource(vec!["Headline".to_string()]));
        let headlines = source.search("Khan").await.unwrap();
        assert_eq!(headlines, vec!["Headline".to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_host_is_news_error() {
        // Port 9 (discard) is not expected to serve HTTP
        let client = NewsClient::new("http://127.0.0.1:9/search").unwrap();
        let err = client.search("Khan").await.unwrap_err();
        assert!(matches!(err, RufeersError::News(_)));
    }
}

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;

use caterpillar::config::ServiceConfig;
use caterpillar::error::{AppError, Result};
use caterpillar::model::{FeatureModel, Features, Sentiment};
use caterpillar::scraper::{ArticleSource, RawArticle};
use caterpillar::sentences::UnicodeSegmenter;
use caterpillar::servicer::Servicer;
use caterpillar::summary::FrequencySummarizer;

/// Serves canned articles keyed off the link:
/// links containing `fail` error, links containing `short` return too little text.
#[derive(Default)]
pub struct StubSource {
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl StubSource {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ArticleSource for StubSource {
    async fn fetch(&self, link: &str, _config: &ServiceConfig) -> Result<RawArticle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;

        if link.contains("fail") {
            return Err(AppError::Fetch("connection refused".to_string()));
        }
        if link.contains("short") {
            return Ok(RawArticle {
                title: "Headline".to_string(),
                text: "tiny".to_string(),
                canonical: link.to_string(),
                published: None,
                authors: vec!["Jane Roe".to_string()],
            });
        }

        let published = if link.contains("dated") {
            DateTime::parse_from_rfc3339("2020-05-06T07:08:09+00:00").ok()
        } else {
            None
        };
        Ok(RawArticle {
            title: format!("Title of {}", link),
            text: format!("Body text of the article found at {}.", link),
            canonical: format!("{}#canonical", link),
            published,
            authors: vec![format!("Author of {}", link)],
        })
    }
}

pub struct StubModel {
    pub fail: bool,
}

#[async_trait]
impl FeatureModel for StubModel {
    async fn features(&self, text: &str) -> Result<Features> {
        if self.fail {
            return Err(AppError::Model("model unavailable".to_string()));
        }
        Ok(Features {
            tokens: text.split_whitespace().map(|word| vec![word.len() as f32]).collect(),
            sentiment: Sentiment {
                label: "POSITIVE".to_string(),
                score: 0.75,
            },
        })
    }
}

pub fn servicer_with(source: Arc<StubSource>) -> Servicer {
    Servicer::new(
        ServiceConfig::default(),
        source,
        Arc::new(UnicodeSegmenter),
        Arc::new(FrequencySummarizer),
    )
}

pub fn servicer() -> Servicer {
    servicer_with(Arc::new(StubSource::default()))
}

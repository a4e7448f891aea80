use std::sync::Arc;

use url::Url;

use crate::api::models::{NewspaperReply, NewspaperRequest, SentenceReply, SummaryReply, TextRequest};
use crate::config::{Config, ServiceConfig};
use crate::error::{AppError, Result, Status};
use crate::extract::extract;
use crate::model::{FeatureModel, Features, HttpFeatureModel, extract_features};
use crate::scraper::{ArticleSource, HtmlArticleSource};
use crate::sentences::{Segmenter, UnicodeSegmenter, segment};
use crate::summary::{FrequencySummarizer, Summarizer, summarize};

const PREVIEW_CHARS: usize = 48;

/// A reply message paired with its call status. The message is always present;
/// on failure it is the zero value of its type.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcReply<T> {
    pub status: Status,
    pub message: T,
}

impl<T> RpcReply<T> {
    pub fn ok(message: T) -> Self {
        Self {
            status: Status::Ok,
            message,
        }
    }
}

/// Routes each RPC method to its capability adapter.
pub struct Servicer {
    config: Arc<ServiceConfig>,
    articles: Arc<dyn ArticleSource>,
    segmenter: Arc<dyn Segmenter>,
    summarizer: Arc<dyn Summarizer>,
    feature_model: Option<Arc<dyn FeatureModel>>,
}

impl Servicer {
    pub fn new(
        config: ServiceConfig,
        articles: Arc<dyn ArticleSource>,
        segmenter: Arc<dyn Segmenter>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            articles,
            segmenter,
            summarizer,
            feature_model: None,
        }
    }

    pub fn with_feature_model(mut self, model: Arc<dyn FeatureModel>) -> Self {
        self.feature_model = Some(model);
        self
    }

    /// Builds the servicer with the stock collaborators.
    pub fn from_config(config: &Config) -> Result<Self> {
        let servicer = Servicer::new(
            config.service.clone(),
            Arc::new(HtmlArticleSource::new()?),
            Arc::new(UnicodeSegmenter),
            Arc::new(FrequencySummarizer),
        );

        Ok(match &config.model {
            Some(model) => servicer.with_feature_model(Arc::new(HttpFeatureModel::new(model.clone())?)),
            None => {
                tracing::info!("feature model not configured, feature extraction disabled");
                servicer
            }
        })
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub async fn newspaper(&self, request: NewspaperRequest) -> RpcReply<NewspaperReply> {
        let result = match validate_link(&request.link) {
            Ok(()) => extract(self.articles.as_ref(), &request.link, &self.config).await,
            Err(err) => Err(err),
        };
        finish("Newspaper", &request.link, result)
    }

    pub async fn sentences(&self, request: TextRequest) -> RpcReply<SentenceReply> {
        let input = preview(&request.text);
        let result = match validate_text(&request.text) {
            Ok(()) => {
                let segmenter = Arc::clone(&self.segmenter);
                let text = request.text;
                run_blocking(move || segment(segmenter.as_ref(), &text))
                    .await
                    .map(|sentences| SentenceReply { sentences })
            }
            Err(err) => Err(err),
        };
        finish("Sentences", &input, result)
    }

    pub async fn summary(&self, request: TextRequest) -> RpcReply<SummaryReply> {
        self.summary_with_features(request).await.0
    }

    /// Same as [`Servicer::summary`], also handing back the feature model output
    /// computed before summarizing. `None` when no model is configured or it failed.
    pub async fn summary_with_features(
        &self,
        request: TextRequest,
    ) -> (RpcReply<SummaryReply>, Option<Features>) {
        let input = preview(&request.text);
        if let Err(err) = validate_text(&request.text) {
            return (finish("Summary", &input, Err(err)), None);
        }

        let features = self.features(&request.text, &input).await;

        let summarizer = Arc::clone(&self.summarizer);
        let text = request.text;
        let result = run_blocking(move || summarize(summarizer.as_ref(), &text))
            .await
            .map(|summary| SummaryReply {
                summary: summary.summary,
                keywords: summary.keywords,
            });

        (finish("Summary", &input, result), features)
    }

    async fn features(&self, text: &str, input: &str) -> Option<Features> {
        let model = self.feature_model.as_ref()?;
        match extract_features(model.as_ref(), text).await {
            Ok(features) => {
                tracing::debug!(
                    input,
                    tokens = features.tokens.len(),
                    sentiment = %features.sentiment.label,
                    score = features.sentiment.score,
                    "feature extraction finished"
                );
                Some(features)
            }
            Err(err) => {
                tracing::warn!(input, error = %err, "feature extraction failed");
                None
            }
        }
    }
}

/// Logs a failed call and swaps its error for a status and an empty message.
fn finish<T: Default>(method: &'static str, input: &str, result: Result<T>) -> RpcReply<T> {
    match result {
        Ok(message) => RpcReply::ok(message),
        Err(err) => {
            let status = err.status();
            match status {
                Status::InvalidArgument => {
                    tracing::warn!(method, input, error = %err, "rejected request")
                }
                _ => tracing::error!(method, input, error = %err, "call failed"),
            }
            RpcReply {
                status,
                message: T::default(),
            }
        }
    }
}

async fn run_blocking<T, F>(work: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::Model(format!("worker task failed: {}", e)))?
}

fn validate_link(link: &str) -> Result<()> {
    if link.trim().is_empty() {
        return Err(AppError::Validation("link is required".to_string()));
    }
    let url = Url::parse(link.trim())
        .map_err(|e| AppError::Validation(format!("link is not a valid URL: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(AppError::Validation(format!("unsupported link scheme: {}", scheme))),
    }
}

fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(AppError::Validation("text is required".to_string()));
    }
    Ok(())
}

fn preview(text: &str) -> String {
    let count = text.chars().count();
    if count <= PREVIEW_CHARS {
        return text.to_string();
    }
    let head: String = text.chars().take(PREVIEW_CHARS).collect();
    format!("{}... ({} chars)", head, count)
}

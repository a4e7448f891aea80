use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use once_cell::sync::Lazy;
use reqwest::header::USER_AGENT;
use reqwest::{Client, ClientBuilder};
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use url::Url;

use crate::config::ServiceConfig;
use crate::error::{AppError, Result};

/// What the article collaborator hands back for a single link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawArticle {
    pub title: String,
    pub text: String,
    pub canonical: String,
    pub published: Option<DateTime<FixedOffset>>,
    pub authors: Vec<String>,
}

/// Downloads and parses an article. Implementations must not retry.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    async fn fetch(&self, link: &str, config: &ServiceConfig) -> Result<RawArticle>;
}

// Create static selectors to avoid recompiling them each time
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("title").expect("Failed to parse title selector")
});
static OG_TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[property="og:title"]"#).expect("Failed to parse og:title selector")
});
static CANONICAL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"link[rel="canonical"]"#).expect("Failed to parse canonical selector")
});
static OG_URL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[property="og:url"]"#).expect("Failed to parse og:url selector")
});
static DATE_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        r#"meta[property="article:published_time"], meta[name="pubdate"], meta[name="publishdate"], meta[name="date"], meta[itemprop="datePublished"], time[datetime]"#,
    )
    .expect("Failed to parse date selector")
});
static AUTHOR_META_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"meta[name="author"], meta[property="article:author"]"#)
        .expect("Failed to parse author meta selector")
});
static AUTHOR_ELEMENT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[rel="author"], [itemprop="author"]"#)
        .expect("Failed to parse author element selector")
});
static ARTICLE_PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("article p").expect("Failed to parse article paragraph selector")
});
static BODY_PARAGRAPH_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("body p").expect("Failed to parse body paragraph selector")
});
static META_REFRESH_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[http-equiv]").expect("Failed to parse meta refresh selector")
});

/// Fetches pages with `reqwest` and reads article metadata with `scraper`.
pub struct HtmlArticleSource {
    client: Client,
}

impl HtmlArticleSource {
    pub fn new() -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn fetch_html(&self, url: &str, config: &ServiceConfig) -> Result<String> {
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, config.user_agent.as_str())
            .send()
            .await?
            .error_for_status()?;
        let html = response.text().await?;
        Ok(html)
    }
}

#[async_trait]
impl ArticleSource for HtmlArticleSource {
    async fn fetch(&self, link: &str, config: &ServiceConfig) -> Result<RawArticle> {
        let base = Url::parse(link)
            .map_err(|e| AppError::Fetch(format!("Invalid link {}: {}", link, e)))?;
        let html = self.fetch_html(base.as_str(), config).await?;

        if config.follow_meta_refresh {
            if let Some(target) = meta_refresh_target(&html, &base) {
                tracing::debug!(link, target = %target, "following meta refresh");
                let html = self.fetch_html(target.as_str(), config).await?;
                return Ok(parse_article(&html, &target));
            }
        }

        Ok(parse_article(&html, &base))
    }
}

/// Reads title, body text, canonical link, publish date and authors from a page.
pub fn parse_article(html: &str, url: &Url) -> RawArticle {
    let document = Html::parse_document(html);

    let title = meta_content(&document, &OG_TITLE_SELECTOR)
        .or_else(|| {
            document
                .select(&TITLE_SELECTOR)
                .next()
                .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        })
        .unwrap_or_default();

    let canonical = document
        .select(&CANONICAL_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .chain(
            document
                .select(&OG_URL_SELECTOR)
                .filter_map(|element| element.value().attr("content")),
        )
        .find_map(|href| url.join(href.trim()).ok())
        .map(|canonical| canonical.to_string())
        .unwrap_or_default();

    let published = document
        .select(&DATE_SELECTOR)
        .filter_map(|element| {
            element
                .value()
                .attr("content")
                .or_else(|| element.value().attr("datetime"))
        })
        .find_map(parse_date);

    RawArticle {
        title,
        text: body_text(&document),
        canonical,
        published,
        authors: authors(&document),
    }
}

fn meta_content(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .filter_map(|element| element.value().attr("content"))
        .map(collapse_whitespace)
        .find(|content| !content.is_empty())
}

// Paragraphs inside <article> win; otherwise every paragraph in the body.
fn body_text(document: &Html) -> String {
    let mut paragraphs = collect_paragraphs(document.select(&ARTICLE_PARAGRAPH_SELECTOR));
    if paragraphs.is_empty() {
        paragraphs = collect_paragraphs(document.select(&BODY_PARAGRAPH_SELECTOR));
    }
    paragraphs.join("\n\n")
}

fn collect_paragraphs<'a>(elements: impl Iterator<Item = ElementRef<'a>>) -> Vec<String> {
    elements
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

fn authors(document: &Html) -> Vec<String> {
    let from_meta = document
        .select(&AUTHOR_META_SELECTOR)
        .filter_map(|element| element.value().attr("content"))
        .map(str::to_string);
    let from_elements = document
        .select(&AUTHOR_ELEMENT_SELECTOR)
        .map(|element| element.text().collect::<String>());

    let mut authors: Vec<String> = Vec::new();
    for candidate in from_meta.chain(from_elements) {
        let name = clean_author(&candidate);
        if name.is_empty() || name.starts_with("http://") || name.starts_with("https://") {
            continue;
        }
        if !authors.iter().any(|known| known.eq_ignore_ascii_case(&name)) {
            authors.push(name);
        }
    }
    authors
}

fn clean_author(raw: &str) -> String {
    let name = collapse_whitespace(raw);
    let has_byline = name
        .get(..3)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("by "));
    if has_byline {
        name[3..].trim().to_string()
    } else {
        name
    }
}

fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date);
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Some(date);
    }
    let utc = FixedOffset::east_opt(0)?;
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return utc.from_local_datetime(&naive).single();
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return utc.from_local_datetime(&day.and_hms_opt(0, 0, 0)?).single();
    }
    None
}

/// Target of a `<meta http-equiv="refresh">` redirect, when it points somewhere else.
pub fn meta_refresh_target(html: &str, base: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let content = document
        .select(&META_REFRESH_SELECTOR)
        .find(|element| {
            element
                .value()
                .attr("http-equiv")
                .is_some_and(|equiv| equiv.eq_ignore_ascii_case("refresh"))
        })?
        .value()
        .attr("content")?;

    let lower = content.to_ascii_lowercase();
    let start = lower.find("url=")? + "url=".len();
    let target = content[start..].trim().trim_matches(|c| c == '\'' || c == '"');
    let target = base.join(target).ok()?;
    (target != *base).then_some(target)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

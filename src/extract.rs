use crate::api::models::NewspaperReply;
use crate::config::ServiceConfig;
use crate::error::Result;
use crate::scraper::{ArticleSource, RawArticle};

const MIN_TEXT_CHARS: usize = 10;
const MIN_TITLE_CHARS: usize = 3;

/// Fetches `link` once and turns the article into a reply.
///
/// A page that downloads fine but carries too little text or title yields a reply
/// with only `link` set. That is a successful call, not an error.
pub async fn extract(
    source: &dyn ArticleSource,
    link: &str,
    config: &ServiceConfig,
) -> Result<NewspaperReply> {
    let article = source.fetch(link, config).await?;
    Ok(into_reply(link, article))
}

fn into_reply(link: &str, article: RawArticle) -> NewspaperReply {
    if article.text.chars().count() < MIN_TEXT_CHARS
        || article.title.chars().count() < MIN_TITLE_CHARS
    {
        tracing::debug!(link, "insufficient article content");
        return NewspaperReply {
            link: link.to_string(),
            ..NewspaperReply::default()
        };
    }

    NewspaperReply {
        link: link.to_string(),
        title: article.title,
        text: article.text,
        canonical: article.canonical,
        // published date is commonly missing
        pubdate: article
            .published
            .map(|date| date.to_rfc3339())
            .unwrap_or_default(),
        authors: article.authors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn article(title: &str, text: &str) -> RawArticle {
        RawArticle {
            title: title.to_string(),
            text: text.to_string(),
            canonical: "https://example.com/a".to_string(),
            published: None,
            authors: vec!["Jane Roe".to_string()],
        }
    }

    #[test]
    fn short_text_keeps_only_link() {
        let reply = into_reply("https://example.com/a", article("Headline", "too short"));
        assert_eq!(
            reply,
            NewspaperReply {
                link: "https://example.com/a".to_string(),
                ..NewspaperReply::default()
            }
        );
    }

    #[test]
    fn short_title_keeps_only_link() {
        let reply = into_reply("https://example.com/a", article("Hi", "Long enough body text."));
        assert_eq!(reply.link, "https://example.com/a");
        assert!(reply.title.is_empty());
        assert!(reply.text.is_empty());
        assert!(reply.authors.is_empty());
    }

    #[test]
    fn length_thresholds_are_inclusive() {
        let reply = into_reply("l", article("abc", "0123456789"));
        assert_eq!(reply.title, "abc");
        assert_eq!(reply.text, "0123456789");
    }

    #[test]
    fn thresholds_count_characters_not_bytes() {
        // 9 characters, 18 bytes
        let reply = into_reply("l", article("Título", "ééééééééé"));
        assert!(reply.text.is_empty());
    }

    #[test]
    fn missing_date_becomes_empty_pubdate() {
        let reply = into_reply("l", article("Headline", "Long enough body text."));
        assert_eq!(reply.pubdate, "");
        assert_eq!(reply.canonical, "https://example.com/a");
        assert_eq!(reply.authors, vec!["Jane Roe".to_string()]);
    }

    #[test]
    fn present_date_is_iso_formatted() {
        let mut raw = article("Headline", "Long enough body text.");
        raw.published = Some(DateTime::parse_from_rfc3339("2020-01-02T03:04:05+00:00").unwrap());
        let reply = into_reply("l", raw);
        assert_eq!(reply.pubdate, "2020-01-02T03:04:05+00:00");
    }
}

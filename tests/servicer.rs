mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use caterpillar::api::models::{NewspaperReply, NewspaperRequest, SentenceReply, SummaryReply, TextRequest};
use caterpillar::error::Status;

use common::{StubModel, StubSource, servicer, servicer_with};

fn link(link: &str) -> NewspaperRequest {
    NewspaperRequest {
        link: link.to_string(),
    }
}

fn text(text: &str) -> TextRequest {
    TextRequest {
        text: text.to_string(),
    }
}

#[tokio::test]
async fn newspaper_populates_every_field() {
    let reply = servicer().newspaper(link("https://example.com/dated")).await;

    assert_eq!(reply.status, Status::Ok);
    assert_eq!(
        reply.message,
        NewspaperReply {
            link: "https://example.com/dated".to_string(),
            title: "Title of https://example.com/dated".to_string(),
            text: "Body text of the article found at https://example.com/dated.".to_string(),
            canonical: "https://example.com/dated#canonical".to_string(),
            pubdate: "2020-05-06T07:08:09+00:00".to_string(),
            authors: vec!["Author of https://example.com/dated".to_string()],
        }
    );
}

#[tokio::test]
async fn newspaper_without_date_has_empty_pubdate() {
    let reply = servicer().newspaper(link("https://example.com/a")).await;
    assert_eq!(reply.status, Status::Ok);
    assert_eq!(reply.message.pubdate, "");
    assert!(!reply.message.title.is_empty());
}

#[tokio::test]
async fn insufficient_content_is_a_partial_success() {
    let reply = servicer().newspaper(link("https://example.com/short")).await;

    assert_eq!(reply.status, Status::Ok);
    assert_eq!(
        reply.message,
        NewspaperReply {
            link: "https://example.com/short".to_string(),
            ..NewspaperReply::default()
        }
    );
}

#[tokio::test]
async fn fetch_failure_is_internal_with_empty_reply() {
    let source = Arc::new(StubSource::default());
    let reply = servicer_with(source.clone())
        .newspaper(link("https://example.com/fail"))
        .await;

    assert_eq!(reply.status, Status::Internal);
    assert_eq!(reply.message, NewspaperReply::default());
    // no retries
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalid_link_never_reaches_the_source() {
    let source = Arc::new(StubSource::default());
    let servicer = servicer_with(source.clone());

    for bad in ["", "   ", "not a url", "mailto:someone@example.com"] {
        let reply = servicer.newspaper(link(bad)).await;
        assert_eq!(reply.status, Status::InvalidArgument, "link {:?}", bad);
        assert_eq!(reply.message, NewspaperReply::default());
    }
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn sentences_partition_the_text() {
    let input = "The market opened higher. Oil fell 2%! Will it last?";
    let reply = servicer().sentences(text(input)).await;

    assert_eq!(reply.status, Status::Ok);
    assert_eq!(reply.message.sentences.len(), 3);
    assert_eq!(reply.message.sentences.concat(), input);
}

#[tokio::test]
async fn blank_text_is_rejected() {
    let servicer = servicer();

    let sentences = servicer.sentences(text("  \n ")).await;
    assert_eq!(sentences.status, Status::InvalidArgument);
    assert_eq!(sentences.message, SentenceReply::default());

    let summary = servicer.summary(text("")).await;
    assert_eq!(summary.status, Status::InvalidArgument);
    assert_eq!(summary.message, SummaryReply::default());
}

#[tokio::test]
async fn short_summary_keeps_the_whole_text() {
    let input = "Rain is expected tomorrow. Farmers welcomed the rain after a dry month.";
    let reply = servicer().summary(text(input)).await;

    assert_eq!(reply.status, Status::Ok);
    assert_eq!(reply.message.summary, input);
    assert_eq!(reply.message.keywords.first().map(String::as_str), Some("rain"));
}

#[tokio::test]
async fn summary_hands_back_features_when_a_model_is_configured() {
    let servicer = servicer().with_feature_model(Arc::new(StubModel { fail: false }));

    let (reply, features) = servicer
        .summary_with_features(text("Stocks climbed. Traders cheered."))
        .await;

    assert_eq!(reply.status, Status::Ok);
    let features = features.unwrap();
    assert_eq!(features.tokens.len(), 4);
    assert_eq!(features.sentiment.label, "POSITIVE");
}

#[tokio::test]
async fn feature_model_failure_does_not_fail_the_summary() {
    let servicer = servicer().with_feature_model(Arc::new(StubModel { fail: true }));

    let (reply, features) = servicer
        .summary_with_features(text("Stocks climbed. Traders cheered."))
        .await;

    assert_eq!(reply.status, Status::Ok);
    assert!(!reply.message.summary.is_empty());
    assert!(features.is_none());
}

#[tokio::test]
async fn repeated_calls_are_identical() {
    let servicer = servicer();
    let long_text: String = (0..40)
        .map(|i| format!("Report {} covers the council budget and local schools. ", i))
        .collect();

    assert_eq!(
        servicer.newspaper(link("https://example.com/dated")).await,
        servicer.newspaper(link("https://example.com/dated")).await
    );
    assert_eq!(
        servicer.sentences(text(&long_text)).await,
        servicer.sentences(text(&long_text)).await
    );
    assert_eq!(
        servicer.summary(text(&long_text)).await,
        servicer.summary(text(&long_text)).await
    );
}

#[tokio::test]
async fn concurrent_calls_do_not_mix_replies() {
    let source = Arc::new(StubSource::with_delay(Duration::from_millis(50)));
    let servicer = Arc::new(servicer_with(source));

    let mut extractions = Vec::new();
    for name in ["first", "second"] {
        let servicer = Arc::clone(&servicer);
        extractions.push(tokio::spawn(async move {
            let url = format!("https://example.com/{}", name);
            (url.clone(), servicer.newspaper(link(&url)).await)
        }));
    }

    let mut segmentations = Vec::new();
    for i in 0..10 {
        let servicer = Arc::clone(&servicer);
        segmentations.push(tokio::spawn(async move {
            let input = format!("Call {} starts. Call {} ends.", i, i);
            (input.clone(), servicer.sentences(text(&input)).await)
        }));
    }

    for handle in segmentations {
        let (input, reply) = handle.await.unwrap();
        assert_eq!(reply.status, Status::Ok);
        assert_eq!(reply.message.sentences.concat(), input);
    }

    for handle in extractions {
        let (url, reply) = handle.await.unwrap();
        assert_eq!(reply.status, Status::Ok);
        let message = reply.message;
        assert_eq!(message.link, url);
        assert_eq!(message.title, format!("Title of {}", url));
        assert_eq!(message.canonical, format!("{}#canonical", url));
        assert_eq!(message.authors, vec![format!("Author of {}", url)]);
    }
}

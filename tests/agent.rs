//! End-to-end behaviour of the bot with deterministic model doubles.

mod common;

use anyhow::Result;
use async_trait::async_trait;
use common::{bot_from_text, faq_bot, EchoQa, FailingQa, FAQ};
use support_bot::embedding::Embedder;
use support_bot::agent::{SupportBot, FALLBACK_ANSWER};
use support_bot::document::{Corpus, CorpusStatus};
use support_bot::feedback::Feedback;
use tempfile::TempDir;

#[tokio::test]
async fn test_answers_from_most_similar_section() {
    let (bot, qa) = faq_bot().await;

    let reply = bot.respond("How long for a refund?").await.unwrap();
    assert_eq!(reply.answer, "Refunds are processed within 5 business days.");
    let retrieval = reply.retrieval.unwrap();
    assert_eq!(retrieval.index, 0);
    assert!((retrieval.similarity - 1.0).abs() < 1e-6);

    let answer = bot.answer("When will my order ship?").await.unwrap();
    assert_eq!(answer, "Shipping takes 3-7 days depending on your location.");

    assert_eq!(
        qa.questions(),
        vec!["How long for a refund?", "When will my order ship?"]
    );
}

#[tokio::test]
async fn test_unrelated_question_gets_fallback_without_qa() {
    let (bot, qa) = faq_bot().await;

    let reply = bot.respond("What color is the sky?").await.unwrap();
    assert_eq!(reply.answer, FALLBACK_ANSWER);
    assert!(reply.retrieval.is_none());
    assert!(qa.questions().is_empty());
}

#[tokio::test]
async fn test_mixed_question_below_threshold_falls_back() {
    // [1, 1, 1] against any one-keyword section: cos = 1/sqrt(3) < 0.6
    let qa = EchoQa::default();
    let bot = SupportBot::build(
        Corpus::from_text("faq.txt", FAQ),
        Box::new(common::KeywordEmbedder),
        Box::new(qa.clone()),
        0.6,
    )
    .await
    .unwrap();

    let answer = bot
        .answer("refund, shipping or password?")
        .await
        .unwrap();
    assert_eq!(answer, FALLBACK_ANSWER);
    assert!(qa.questions().is_empty());
}

#[tokio::test]
async fn test_empty_document_always_falls_back() {
    let qa = EchoQa::default();
    let bot = bot_from_text("  \n\n  ", Box::new(qa.clone())).await;

    assert!(bot.corpus().is_empty());
    for query in ["refund?", "", "shipping"] {
        assert_eq!(bot.answer(query).await.unwrap(), FALLBACK_ANSWER);
    }
    assert!(qa.questions().is_empty());
}

#[tokio::test]
async fn test_missing_document_is_explicit_and_falls_back() {
    let tmp = TempDir::new().unwrap();
    let corpus = Corpus::load(&tmp.path().join("nope.txt")).unwrap();
    assert_eq!(corpus.status(), CorpusStatus::Missing);

    let bot = SupportBot::build(
        corpus,
        Box::new(common::KeywordEmbedder),
        Box::new(EchoQa::default()),
        0.5,
    )
    .await
    .unwrap();

    assert_eq!(bot.corpus().status(), CorpusStatus::Missing);
    assert_eq!(bot.answer("refund?").await.unwrap(), FALLBACK_ANSWER);
}

#[tokio::test]
async fn test_tie_goes_to_first_section() {
    let bot = bot_from_text(
        "Refund policy one.\n\nRefund policy two.",
        Box::new(EchoQa::default()),
    )
    .await;

    let retrieval = bot.find_relevant_section("refund").await.unwrap().unwrap();
    assert_eq!(retrieval.index, 0);
    assert_eq!(retrieval.text, "Refund policy one.");
}

#[tokio::test]
async fn test_qa_failure_propagates() {
    let bot = bot_from_text(FAQ, Box::new(FailingQa)).await;

    let err = bot.answer("refund?").await.unwrap_err();
    assert!(err.to_string().contains("qa backend unavailable"));

    // No relevant section means the QA model is never reached.
    assert_eq!(bot.answer("hello").await.unwrap(), FALLBACK_ANSWER);
}

#[tokio::test]
async fn test_too_vague_appends_section() {
    let (bot, _) = faq_bot().await;

    let adjusted = bot
        .adjust("refund timing?", "5 business days", &Feedback::TooVague)
        .await
        .unwrap();
    assert_eq!(
        adjusted,
        "5 business days (For more context: Refunds are processed within 5 business days.)"
    );
}

#[tokio::test]
async fn test_too_vague_without_section_is_unchanged() {
    let (bot, _) = faq_bot().await;

    let adjusted = bot
        .adjust("what color?", FALLBACK_ANSWER, &Feedback::TooVague)
        .await
        .unwrap();
    assert_eq!(adjusted, FALLBACK_ANSWER);
}

#[tokio::test]
async fn test_not_helpful_reasks_rephrased_question() {
    let (bot, qa) = faq_bot().await;

    let adjusted = bot
        .adjust(
            "How do I get a refund",
            "something unhelpful",
            &Feedback::NotHelpful,
        )
        .await
        .unwrap();

    assert_eq!(adjusted, "Refunds are processed within 5 business days.");
    assert_eq!(
        qa.questions(),
        vec!["Can you give me more details about  get a refund?"]
    );
}

#[tokio::test]
async fn test_not_helpful_can_fall_back() {
    let (bot, _) = faq_bot().await;

    let adjusted = bot
        .adjust("How do I paint?", "blue", &Feedback::NotHelpful)
        .await
        .unwrap();
    assert_eq!(adjusted, FALLBACK_ANSWER);
}

#[tokio::test]
async fn test_other_feedback_is_noop() {
    let (bot, qa) = faq_bot().await;

    let adjusted = bot
        .adjust("refund?", "5 days", &Feedback::parse("thanks!"))
        .await
        .unwrap();
    assert_eq!(adjusted, "5 days");
    assert!(qa.questions().is_empty());
}

/// Puts blank text and questions on one axis, everything else on the other.
struct BlankMatchingEmbedder;

#[async_trait]
impl Embedder for BlankMatchingEmbedder {
    fn model_name(&self) -> &str {
        "blank-matching"
    }

    fn dims(&self) -> usize {
        2
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|t| {
                if t.trim().is_empty() || t.ends_with('?') {
                    vec![1.0, 0.0]
                } else {
                    vec![0.0, 1.0]
                }
            })
            .collect())
    }
}

#[tokio::test]
async fn test_blank_section_match_falls_back() {
    let qa = EchoQa::default();
    let bot = SupportBot::build(
        Corpus::from_text("faq.txt", "a\n\n\n\nb"),
        Box::new(BlankMatchingEmbedder),
        Box::new(qa.clone()),
        0.5,
    )
    .await
    .unwrap();

    let found = bot.find_relevant_section("what?").await.unwrap().unwrap();
    assert_eq!(found.index, 1);
    assert_eq!(found.text, "");

    let reply = bot.respond("what?").await.unwrap();
    assert_eq!(reply.answer, FALLBACK_ANSWER);
    assert!(reply.retrieval.is_none());

    let adjusted = bot
        .adjust("what?", "original", &Feedback::TooVague)
        .await
        .unwrap();
    assert_eq!(adjusted, "original");
    assert!(qa.questions().is_empty());
}

#[tokio::test]
async fn test_padded_feedback_label_is_noop() {
    let (bot, _) = faq_bot().await;

    let adjusted = bot
        .adjust("refund?", "5 days", &Feedback::parse(" too vague "))
        .await
        .unwrap();
    assert_eq!(adjusted, "5 days");
}

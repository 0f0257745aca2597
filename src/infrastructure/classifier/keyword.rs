//! Built-in heuristic classifier
//!
//! Scores text by spam vocabulary, repeated exclamation marks, links and
//! shouting, then maps the score to a probability with `1 - e^-score`.

use async_trait::async_trait;

use crate::domain::{Classification, Classifier, GatewayError, GatewayResult, Label};

const SPAM_WORDS: &[&str] = &[
    "buy", "cash", "click", "credit", "deal", "discount", "free", "guarantee", "limited", "money",
    "now", "offer", "prize", "subscribe", "urgent", "win", "winner",
];

const KEYWORD_WEIGHT: f64 = 1.0;
const EXCLAMATION_WEIGHT: f64 = 0.5;
const LINK_WEIGHT: f64 = 0.5;
const SHOUTING_WEIGHT: f64 = 1.0;

const MIN_PROBABILITY: f64 = 0.01;
const MAX_PROBABILITY: f64 = 0.99;

#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    fn score(text: &str) -> f64 {
        let lower = text.to_lowercase();

        let keyword_hits = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| SPAM_WORDS.contains(word))
            .count();

        let mut score = keyword_hits as f64 * KEYWORD_WEIGHT;

        if text.contains("!!") {
            score += EXCLAMATION_WEIGHT;
        }
        if lower.contains("http://") || lower.contains("https://") || lower.contains("www.") {
            score += LINK_WEIGHT;
        }

        let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
        let upper = letters.iter().filter(|c| c.is_uppercase()).count();
        if letters.len() >= 8 && upper * 10 >= letters.len() * 7 {
            score += SHOUTING_WEIGHT;
        }

        score
    }

    /// Spam probability in `[0.01, 0.99]`
    pub fn spam_probability(text: &str) -> f64 {
        (1.0 - (-Self::score(text)).exp()).clamp(MIN_PROBABILITY, MAX_PROBABILITY)
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, text: &str) -> GatewayResult<Classification> {
        if text.trim().is_empty() {
            return Err(GatewayError::InferenceFailure("text is empty".to_string()));
        }

        let p_spam = Self::spam_probability(text);
        let classification = if p_spam >= 0.5 {
            Classification {
                label: Label::Spam,
                confidence: p_spam,
            }
        } else {
            Classification {
                label: Label::Human,
                confidence: 1.0 - p_spam,
            }
        };
        Ok(classification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn promotional_text_is_spam() {
        let result = KeywordClassifier::new().classify("buy now!!!").await.unwrap();
        assert_eq!(result.label, Label::Spam);
        assert!(result.confidence > 0.5 && result.confidence <= MAX_PROBABILITY);
    }

    #[tokio::test]
    async fn conversational_text_is_human() {
        let result = KeywordClassifier::new()
            .classify("See you at lunch tomorrow, I'll bring the notes.")
            .await
            .unwrap();
        assert_eq!(result.label, Label::Human);
        assert!((result.confidence - (1.0 - MIN_PROBABILITY)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn blank_text_fails() {
        let err = KeywordClassifier::new().classify("   \n").await.unwrap_err();
        assert!(matches!(err, GatewayError::InferenceFailure(_)));
    }

    #[test]
    fn shouting_and_links_raise_the_score() {
        let calm = KeywordClassifier::spam_probability("see the page at example");
        let loud = KeywordClassifier::spam_probability("SEE THE PAGE AT https://example.com");
        assert!(loud > calm);
    }
}

//! Keyphrase extraction for transcript segments.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use reel_models::Transcript;

static TOKEN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-z0-9]+").unwrap());

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "could", "did", "do", "does", "doing", "don", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "let", "ll", "me", "more", "most", "my", "myself", "no", "nor", "not",
    "now", "of", "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out",
    "over", "own", "re", "s", "same", "she", "should", "so", "some", "such", "t", "than", "that",
    "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this",
    "those", "through", "to", "too", "under", "until", "up", "ve", "very", "was", "we", "were",
    "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
    "you", "your", "yours", "yourself", "yourselves",
];

/// Pulls the most salient phrases out of a piece of text.
pub trait KeywordExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<String>;
}

/// Ranks 1- and 2-word phrases by how often they occur.
///
/// Tokens are lowercase alphanumeric runs. Stop words are dropped before
/// pairing, so bigrams join content words that were separated only by stop
/// words. Ties keep the phrase that appeared first.
#[derive(Debug, Clone)]
pub struct FrequencyKeywordExtractor {
    top_k: usize,
}

impl Default for FrequencyKeywordExtractor {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

impl FrequencyKeywordExtractor {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }
}

impl KeywordExtractor for FrequencyKeywordExtractor {
    fn extract(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        let tokens: Vec<&str> = TOKEN_REGEX
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|t| !STOP_WORDS.contains(t))
            .collect();

        // phrase -> (count, first position)
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut position = 0usize;
        let mut bump = |phrase: String| {
            let entry = counts.entry(phrase).or_insert((0, position));
            entry.0 += 1;
            position += 1;
        };

        for (i, token) in tokens.iter().enumerate() {
            bump(token.to_string());
            if let Some(next) = tokens.get(i + 1) {
                bump(format!("{token} {next}"));
            }
        }

        let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
        ranked
            .into_iter()
            .take(self.top_k)
            .map(|(phrase, _)| phrase)
            .collect()
    }
}

/// Fill in `keywords` for every segment of `transcript`.
pub fn annotate_keywords(transcript: &mut Transcript, extractor: &dyn KeywordExtractor) {
    for segment in &mut transcript.segments {
        segment.keywords = extractor.extract(&segment.text);
    }
}

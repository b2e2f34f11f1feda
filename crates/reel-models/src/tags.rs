//! Hashtag and mention extraction from reel captions.

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static HASHTAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"#(\w+)").unwrap());
static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"@(\w+)").unwrap());

/// Tags found in a caption, in order of appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Tags {
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
}

impl Tags {
    pub fn from_caption(caption: &str) -> Self {
        let capture = |re: &Regex| -> Vec<String> {
            re.captures_iter(caption)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .collect()
        };
        Self {
            hashtags: capture(&HASHTAG),
            mentions: capture(&MENTION),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hashtags.is_empty() && self.mentions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_in_order() {
        let tags = Tags::from_caption("Morning run #fitness with @coach_amy #run2024 cc @Bob!");
        assert_eq!(tags.hashtags, vec!["fitness", "run2024"]);
        assert_eq!(tags.mentions, vec!["coach_amy", "Bob"]);
    }

    #[test]
    fn test_empty_caption() {
        let tags = Tags::from_caption("no tags here # @ ");
        assert!(tags.is_empty());
    }

    #[test]
    fn test_keeps_duplicates() {
        let tags = Tags::from_caption("#a #a");
        assert_eq!(tags.hashtags, vec!["a", "a"]);
    }
}

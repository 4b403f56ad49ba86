use serde::{Deserialize, Serialize};

/// Default minimum number of characters for usable content.
pub const DEFAULT_MIN_CHARS: usize = 100;

/// Default minimum number of whitespace-delimited words for usable content.
pub const DEFAULT_MIN_WORDS: usize = 50;

/// Minimum-content thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    #[serde(default = "default_min_chars")]
    pub min_chars: usize,
    #[serde(default = "default_min_words")]
    pub min_words: usize,
}

fn default_min_chars() -> usize {
    DEFAULT_MIN_CHARS
}

fn default_min_words() -> usize {
    DEFAULT_MIN_WORDS
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self {
            min_chars: DEFAULT_MIN_CHARS,
            min_words: DEFAULT_MIN_WORDS,
        }
    }
}

/// Result of checking normalized text against a [`ValidationPolicy`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationOutcome {
    pub is_valid: bool,
    pub reason: Option<String>,
    pub word_count: usize,
}

/// Number of whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

impl ValidationPolicy {
    /// Checks `clean` (already normalized) text.
    pub fn validate(&self, clean: &str) -> ValidationOutcome {
        let words = word_count(clean);

        if clean.chars().count() < self.min_chars {
            return ValidationOutcome {
                is_valid: false,
                reason: Some(format!(
                    "Text too short (less than {} characters)",
                    self.min_chars
                )),
                word_count: words,
            };
        }

        if words < self.min_words {
            return ValidationOutcome {
                is_valid: false,
                reason: Some(format!("Not enough words (less than {})", self.min_words)),
                word_count: words,
            };
        }

        ValidationOutcome {
            is_valid: true,
            reason: None,
            word_count: words,
        }
    }
}

/// Validates with the default policy.
pub fn validate(clean: &str) -> ValidationOutcome {
    ValidationPolicy::default().validate(clean)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::normalize;

    /// 60 words, exactly 300 characters.
    fn sixty_word_passage() -> String {
        let mut words = vec!["abcd"; 59];
        words.push("abcde");
        let passage = words.join(" ");
        assert_eq!(passage.chars().count(), 300);
        passage
    }

    #[test]
    fn test_validate_empty() {
        let outcome = validate("");
        assert!(!outcome.is_valid);
        assert_eq!(
            outcome.reason.as_deref(),
            Some("Text too short (less than 100 characters)")
        );
        assert_eq!(outcome.word_count, 0);
    }

    #[test]
    fn test_validate_spaces_only_after_normalize() {
        let clean = normalize(&" ".repeat(150));
        assert!(clean.chars().count() <= 1);

        let outcome = validate(&clean);
        assert!(!outcome.is_valid);
        assert!(outcome.reason.unwrap().contains("too short"));
    }

    #[test]
    fn test_validate_few_distinct_words_repeated() {
        let base = ["photosynthesis", "chlorophyll", "sunlight"];
        let mut text = String::new();
        let mut i = 0;
        while text.chars().count() < 120 {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(base[i % base.len()]);
            i += 1;
        }
        assert!(text.chars().count() >= 100);

        let outcome = validate(&text);
        assert!(!outcome.is_valid);
        assert_eq!(outcome.reason.as_deref(), Some("Not enough words (less than 50)"));
        assert_eq!(outcome.word_count, i);
    }

    #[test]
    fn test_validate_sixty_word_passage() {
        let outcome = validate(&sixty_word_passage());
        assert!(outcome.is_valid);
        assert!(outcome.reason.is_none());
        assert_eq!(outcome.word_count, 60);
    }

    #[test]
    fn test_validate_boundaries() {
        let policy = ValidationPolicy {
            min_chars: 10,
            min_words: 2,
        };
        assert!(!policy.validate("abcdefghi").is_valid);
        assert_eq!(
            policy.validate("abcdefghij").reason.as_deref(),
            Some("Not enough words (less than 2)")
        );
        assert!(policy.validate("abcd efghi").is_valid);
    }

    #[test]
    fn test_validate_counts_characters_not_bytes() {
        let policy = ValidationPolicy {
            min_chars: 5,
            min_words: 1,
        };
        // Four characters, eight bytes.
        assert!(!policy.validate("éééé").is_valid);
    }

    #[test]
    fn test_policy_deserialize_defaults() {
        let policy: ValidationPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(policy, ValidationPolicy::default());

        let policy: ValidationPolicy = serde_json::from_str(r#"{"min_chars": 5}"#).unwrap();
        assert_eq!(policy.min_chars, 5);
        assert_eq!(policy.min_words, DEFAULT_MIN_WORDS);
    }
}

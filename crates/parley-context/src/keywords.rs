// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a user message into a lexical search query.

use std::collections::HashSet;

use parley_config::model::{BotConfig, RetrievalConfig, default_name_variants, default_stop_words};
use regex::Regex;

/// Tokens shorter than this many characters are noise.
const MIN_TOKEN_CHARS: usize = 3;

/// Strips bot names, punctuation and stop words from free text.
///
/// Unlike the classifier, name variants are removed only as whole words.
#[derive(Debug, Clone)]
pub struct KeywordExtractor {
    names: Option<Regex>,
    stop_words: HashSet<String>,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new(default_name_variants(), default_stop_words())
    }
}

impl KeywordExtractor {
    pub fn new<N, S>(name_variants: N, stop_words: S) -> Self
    where
        N: IntoIterator,
        N::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let mut names: Vec<String> = name_variants
            .into_iter()
            .map(|n| n.as_ref().trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        // Longest first, so "жориком" is stripped whole rather than as "жорик".
        names.sort_by_key(|n| std::cmp::Reverse(n.chars().count()));
        let names = (!names.is_empty())
            .then(|| {
                let alternation = names
                    .iter()
                    .map(|n| regex::escape(n))
                    .collect::<Vec<_>>()
                    .join("|");
                Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).ok()
            })
            .flatten();

        let stop_words = stop_words
            .into_iter()
            .map(|w| w.as_ref().to_lowercase())
            .collect();

        Self { names, stop_words }
    }

    pub fn from_config(bot: &BotConfig, retrieval: &RetrievalConfig) -> Self {
        Self::new(&bot.name_variants, &retrieval.stop_words)
    }

    /// Returns the search query for `text`; never fails.
    ///
    /// Two or more surviving content words are joined in their original
    /// order. A single survivor falls back to the whole cleaned message, and
    /// no survivors at all yields an empty query.
    pub fn extract(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let without_names = match &self.names {
            Some(re) => re.replace_all(text, " "),
            None => text.into(),
        };

        let cleaned = without_names
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { ' ' })
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");

        let keywords: Vec<&str> = cleaned
            .split(' ')
            .filter(|t| t.chars().count() >= MIN_TOKEN_CHARS && !self.stop_words.contains(*t))
            .collect();

        match keywords.len() {
            0 => String::new(),
            1 => cleaned.clone(),
            _ => keywords.join(" "),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn extract(text: &str) -> String {
        KeywordExtractor::default().extract(text)
    }

    #[test]
    fn drops_stop_words_and_short_tokens() {
        assert_eq!(extract("Как дела с проектом?"), "дела проектом");
    }

    #[test]
    fn strips_bot_name() {
        assert_eq!(extract("Жорик, что ты думаешь о погоде?"), "думаешь погоде");
        assert_eq!(extract("Жорик, что думаешь о погоде?"), "думаешь погоде");
    }

    #[test]
    fn keeps_latin_words_lowercased() {
        assert_eq!(
            extract("Помнишь, мы говорили о том Docker контейнере?"),
            "помнишь говорили docker контейнере"
        );
    }

    #[test]
    fn empty_input_gives_empty_query() {
        assert_eq!(extract(""), "");
        assert_eq!(extract("   "), "");
    }

    #[test]
    fn only_stop_words_gives_empty_query() {
        assert_eq!(extract("что как где когда"), "");
        assert_eq!(extract("Жорик!!!"), "");
    }

    #[test]
    fn single_keyword_falls_back_to_cleaned_text() {
        assert_eq!(extract("Как дела?"), "как дела");
    }

    #[test]
    fn names_are_removed_only_as_whole_words() {
        // "жорикович" is not a variant, so it survives as a token.
        assert_eq!(extract("жорикович жорика видел вчера"), "жорикович видел вчера");
    }

    #[test]
    fn longer_variant_wins_over_its_prefix() {
        assert_eq!(extract("с Жориком обсуждали машину"), "обсуждали машину");
    }

    #[test]
    fn custom_lists_are_honoured() {
        let extractor = KeywordExtractor::new(["parley"], ["the", "about"]);
        assert_eq!(
            extractor.extract("Parley, what about the weather today?"),
            "what weather today"
        );
    }

    proptest! {
        #[test]
        fn extract_never_panics_and_output_is_clean(text in "\\PC{0,80}") {
            let out = KeywordExtractor::default().extract(&text);
            prop_assert!(out.chars().all(|c| c.is_alphanumeric() || c == ' '));
            prop_assert!(!out.starts_with(' ') && !out.ends_with(' '));
        }
    }
}

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

/// Removes banned terms from message text.
///
/// A term is only removed when it stands as a whole word: the match must be
/// bounded by `\b` on both sides (Unicode word characters), so `BinanceCoin`
/// survives a `Binance` rule. Matching is case-insensitive. After removal the
/// result is trimmed at both ends; inner whitespace is kept as-is.
#[derive(Debug, Clone)]
pub struct ContentFilter {
    pattern: Option<Regex>,
}

impl ContentFilter {
    pub fn new<S: AsRef<str>>(words: &[S]) -> Result<Self> {
        let alternatives: Vec<String> = words
            .iter()
            .map(|w| w.as_ref().trim())
            .filter(|w| !w.is_empty())
            .map(regex::escape)
            .collect();

        if alternatives.is_empty() {
            return Ok(Self { pattern: None });
        }

        let source = format!(r"\b(?:{})\b", alternatives.join("|"));
        let pattern = RegexBuilder::new(&source)
            .case_insensitive(true)
            .build()
            .with_context(|| format!("Failed to compile filter pattern: {}", source))?;

        Ok(Self {
            pattern: Some(pattern),
        })
    }

    pub fn apply(&self, text: &str) -> String {
        match &self.pattern {
            Some(pattern) => pattern.replace_all(text, "").trim().to_string(),
            None => text.trim().to_string(),
        }
    }
}

/// One-shot form of [`ContentFilter::apply`].
#[allow(dead_code)]
pub fn filter<S: AsRef<str>>(text: &str, words: &[S]) -> Result<String> {
    Ok(ContentFilter::new(words)?.apply(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WORDS: [&str; 4] = ["Binance", "Futures", "Kucoin", "ByBit"];

    fn run(text: &str) -> String {
        filter(text, &WORDS).unwrap()
    }

    #[test]
    fn test_removes_leading_word() {
        assert_eq!(run("Binance pumped 10%"), "pumped 10%");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(run("BINANCE and bybit listed it"), "and  listed it");
    }

    #[test]
    fn test_removes_every_occurrence() {
        assert_eq!(run("Kucoin, Kucoin and kucoin"), ",  and");
    }

    #[test]
    fn test_keeps_words_containing_a_term() {
        assert_eq!(run("BinanceCoin is up"), "BinanceCoin is up");
        assert_eq!(run("preFutures talk"), "preFutures talk");
        assert_eq!(run("bybits"), "bybits");
    }

    #[test]
    fn test_punctuation_is_a_boundary() {
        assert_eq!(run("(Binance) #Futures!"), "() #!");
    }

    #[test]
    fn test_inner_whitespace_not_collapsed() {
        assert_eq!(run("long Futures position"), "long  position");
    }

    #[test]
    fn test_only_banned_words_yields_empty() {
        assert_eq!(run("  Binance Futures  "), "");
    }

    #[test]
    fn test_idempotent() {
        for text in [
            "Binance pumped 10%",
            "Kucoin, Kucoin and kucoin",
            "BinanceCoin is up on Binance",
            "  plain text  ",
            "",
        ] {
            let once = run(text);
            assert_eq!(run(&once), once, "not idempotent for {:?}", text);
        }
    }

    #[test]
    fn test_result_has_no_whole_word_match() {
        let filter = ContentFilter::new(&WORDS).unwrap();
        let out = filter.apply("Futures: Binance vs ByBit vs Kucoin");
        for word in out.split(|c: char| !c.is_alphanumeric()) {
            assert!(
                !WORDS.iter().any(|w| w.eq_ignore_ascii_case(word)),
                "{:?} still present in {:?}",
                word,
                out
            );
        }
    }

    #[test]
    fn test_terms_are_escaped() {
        let filter = ContentFilter::new(&["a.b"]).unwrap();
        assert_eq!(filter.apply("a.b axb"), "axb");
    }

    #[test]
    fn test_empty_word_list_only_trims() {
        let filter = ContentFilter::new::<&str>(&[]).unwrap();
        assert_eq!(filter.apply("  Binance pumped "), "Binance pumped");

        let filter = ContentFilter::new(&["", "  "]).unwrap();
        assert_eq!(filter.apply("Binance"), "Binance");
    }
}

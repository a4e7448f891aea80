use std::collections::HashMap;

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{AppError, Result};
use crate::sentences::{Segmenter, UnicodeSegmenter};

pub const MAX_KEYWORDS: usize = 20;

/// Upper bound on text length (in characters) and the share of sentences kept.
/// The first bound the text fits under wins.
const RATIO_TABLE: [(usize, f64); 4] = [(280, 1.0), (1000, 0.7), (3000, 0.5), (10000, 0.3)];
const LONG_TEXT_RATIO: f64 = 0.1;

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few",
    "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "me", "more", "most", "my", "myself", "no", "nor", "not", "now", "of",
    "off", "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own",
    "said", "same", "she", "should", "so", "some", "such", "than", "that", "the", "their",
    "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those", "through",
    "to", "too", "under", "until", "up", "very", "was", "we", "were", "what", "when", "where",
    "which", "while", "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
    "yourself", "yourselves",
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    pub summary: String,
    pub keywords: Vec<String>,
}

/// Extractive summarization plus keyword extraction.
pub trait Summarizer: Send + Sync {
    /// Keeps roughly `ratio` of the sentences and returns at most `max_keywords` keywords.
    fn summarize(&self, text: &str, ratio: f64, max_keywords: usize) -> Result<Summary>;
}

/// Share of sentences to keep for a text of this length.
pub fn ratio_for(text: &str) -> f64 {
    let length = text.chars().count();
    RATIO_TABLE
        .iter()
        .find(|(bound, _)| length <= *bound)
        .map(|(_, ratio)| *ratio)
        .unwrap_or(LONG_TEXT_RATIO)
}

pub fn summarize(summarizer: &dyn Summarizer, text: &str) -> Result<Summary> {
    let ratio = ratio_for(text);
    let summary = summarizer.summarize(text, ratio, MAX_KEYWORDS)?;
    if summary.summary.trim().is_empty() && summary.keywords.is_empty() {
        return Err(AppError::Model(format!(
            "no summary or keywords for {} chars of text (ratio {})",
            text.chars().count(),
            ratio
        )));
    }
    Ok(summary)
}

/// Scores sentences by the frequency of the content words they contain.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrequencySummarizer;

impl Summarizer for FrequencySummarizer {
    fn summarize(&self, text: &str, ratio: f64, max_keywords: usize) -> Result<Summary> {
        let segments = UnicodeSegmenter.segment(text);
        let sentences: Vec<&str> = segments
            .iter()
            .map(|sentence| sentence.trim())
            .filter(|sentence| sentence.unicode_words().next().is_some())
            .collect();

        let frequencies = lemma_frequencies(text);

        Ok(Summary {
            summary: select_sentences(&sentences, &frequencies, ratio).join(" "),
            keywords: top_keywords(&frequencies, max_keywords),
        })
    }
}

/// Lemma -> (count, position of first occurrence).
fn lemma_frequencies(text: &str) -> HashMap<String, (usize, usize)> {
    let mut frequencies: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, lemma) in content_lemmas(text).enumerate() {
        frequencies.entry(lemma).or_insert((0, position)).0 += 1;
    }
    frequencies
}

fn content_lemmas(text: &str) -> impl Iterator<Item = String> + '_ {
    text.unicode_words()
        .filter(|word| word.chars().count() > 1 && word.chars().all(is_word_char))
        .map(lemma)
        .filter(|lemma| !STOPWORDS.contains(&lemma.as_str()))
}

fn is_word_char(c: char) -> bool {
    c.is_alphabetic() || c == '\'' || c == '’'
}

fn select_sentences<'a>(
    sentences: &[&'a str],
    frequencies: &HashMap<String, (usize, usize)>,
    ratio: f64,
) -> Vec<&'a str> {
    if sentences.is_empty() {
        return Vec::new();
    }
    let keep = ((sentences.len() as f64) * ratio).ceil().max(1.0) as usize;
    if keep >= sentences.len() {
        return sentences.to_vec();
    }

    let peak = frequencies
        .values()
        .map(|(count, _)| *count)
        .max()
        .unwrap_or(1) as f64;

    let mut scored: Vec<(usize, f64)> = sentences
        .iter()
        .enumerate()
        .map(|(index, sentence)| {
            let score = content_lemmas(sentence)
                .filter_map(|lemma| frequencies.get(&lemma))
                .map(|(count, _)| *count as f64 / peak)
                .sum::<f64>();
            (index, score)
        })
        .collect();

    // highest score first, earlier sentence on ties
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    let mut kept: Vec<usize> = scored.into_iter().take(keep).map(|(index, _)| index).collect();
    kept.sort_unstable();
    kept.into_iter().map(|index| sentences[index]).collect()
}

fn top_keywords(frequencies: &HashMap<String, (usize, usize)>, max_keywords: usize) -> Vec<String> {
    let mut ranked: Vec<(&String, &(usize, usize))> = frequencies.iter().collect();
    ranked.sort_by(|a, b| b.1.0.cmp(&a.1.0).then(a.1.1.cmp(&b.1.1)));
    ranked
        .into_iter()
        .take(max_keywords)
        .map(|(lemma, _)| lemma.clone())
        .collect()
}

/// Lowercases and strips possessives and regular plural endings.
fn lemma(word: &str) -> String {
    let word = word.to_lowercase();
    let word = word
        .strip_suffix("'s")
        .or_else(|| word.strip_suffix("’s"))
        .unwrap_or(&word);
    let length = word.chars().count();

    if length > 4 && word.ends_with("ies") {
        format!("{}y", &word[..word.len() - 3])
    } else if word.ends_with("sses") {
        word[..word.len() - 2].to_string()
    } else if length > 3
        && word.ends_with('s')
        && !(word.ends_with("ss") || word.ends_with("us") || word.ends_with("is"))
    {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

use unicode_segmentation::UnicodeSegmentation;

use crate::error::{AppError, Result};

/// Sentence-boundary detection. Segments are returned as found, without cleaning.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Vec<String>;
}

// Abbreviations that precede a name and never end a sentence.
const TITLES: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "mt", "rev", "hon", "gen", "gov", "sen",
    "rep", "col", "lt", "capt", "cpt", "sgt", "maj", "cmdr", "adm", "pres", "supt", "messrs",
    "vs", "fr",
];

// Abbreviations that precede a number.
const NUMBERED: &[&str] = &["no", "nos", "vol", "vols", "fig", "figs", "p", "pp", "art", "sec", "ch"];

/// English sentence splitter. Starts from Unicode (UAX #29) sentence boundaries and rejoins
/// the breaks that follow a title, an initial, or a numbering abbreviation.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeSegmenter;

impl Segmenter for UnicodeSegmenter {
    fn segment(&self, text: &str) -> Vec<String> {
        let mut sentences: Vec<String> = Vec::new();
        for piece in text.split_sentence_bounds() {
            match sentences.last_mut() {
                Some(last) if continues_after(last, piece) => last.push_str(piece),
                _ => sentences.push(piece.to_string()),
            }
        }
        sentences
    }
}

fn continues_after(sentence: &str, next: &str) -> bool {
    let Some(stem) = sentence.trim_end().strip_suffix('.') else {
        return false;
    };
    let word = stem
        .rsplit(|c: char| c.is_whitespace() || matches!(c, '(' | '[' | '"' | '\''))
        .next()
        .unwrap_or(stem);
    let lower = word.to_lowercase();
    if TITLES.contains(&lower.as_str()) {
        return true;
    }

    // A lone capital is an initial, as in "J. R. R. Tolkien". "I" is left alone.
    let mut chars = word.chars();
    if let (Some(initial), None) = (chars.next(), chars.next()) {
        if initial.is_uppercase() && initial != 'I' {
            return true;
        }
    }

    NUMBERED.contains(&lower.as_str())
        && next.trim_start().starts_with(|c: char| c.is_ascii_digit())
}

pub fn segment(segmenter: &dyn Segmenter, text: &str) -> Result<Vec<String>> {
    let sentences = segmenter.segment(text);
    if sentences.is_empty() && !text.is_empty() {
        return Err(AppError::Model(format!(
            "segmenter returned no sentences for {} chars of text",
            text.chars().count()
        )));
    }
    Ok(sentences)
}

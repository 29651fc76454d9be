use regex::Regex;

/// Lower-cases and trims text for case-insensitive comparisons.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

pub fn contains_phrase(haystack: &str, keyphrase: &str) -> bool {
    let keyphrase = normalize(keyphrase);
    !keyphrase.is_empty() && normalize(haystack).contains(&keyphrase)
}

/// Raw whitespace-delimited token count; punctuation is not stripped.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Keyphrase words longer than two characters.
pub fn significant_words(keyphrase: &str) -> Vec<String> {
    normalize(keyphrase)
        .split_whitespace()
        .filter(|word| word.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

/// True when every significant keyphrase word appears in `text`.
pub fn contains_all_words(text: &str, words: &[String]) -> bool {
    let text = normalize(text);
    !words.is_empty() && words.iter().all(|word| text.contains(word.as_str()))
}

/// Whole-word, case-insensitive occurrences of `keyphrase` in `content`.
pub fn count_occurrences(content: &str, keyphrase: &str) -> usize {
    let keyphrase = normalize(keyphrase);
    if keyphrase.is_empty() {
        return 0;
    }
    let pattern = format!(r"\b{}\b", regex::escape(&keyphrase));
    match Regex::new(&pattern) {
        Ok(re) => re.find_iter(&normalize(content)).count(),
        Err(_) => 0,
    }
}

/// Keyphrase density as a percentage of total words.
pub fn keyphrase_density(content: &str, keyphrase: &str) -> f64 {
    let total = word_count(content);
    if total == 0 {
        return 0.0;
    }
    let occurrences = count_occurrences(content, keyphrase);
    let phrase_words = word_count(keyphrase);
    (occurrences * phrase_words) as f64 / total as f64 * 100.0
}

/// Truncates to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

//! Small text helpers for run reporting.

/// Whitespace-delimited word count.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_whitespace_separated_words() {
        assert_eq!(count_words("one two  three\nfour"), 4);
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   "), 0);
    }
}

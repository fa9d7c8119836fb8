use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Case-insensitive key used by text filters.
pub fn casefold(text: &str) -> String {
    if text.is_ascii() {
        text.to_ascii_lowercase()
    } else {
        text.to_lowercase()
    }
}

fn base_letters(text: &str) -> impl Iterator<Item = char> + '_ {
    text.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

/// Collation for displayed text: accents and case are ignored first, then
/// unaccented before accented, then lowercase before uppercase, then code
/// points so the order stays total.
pub fn collate(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| accent_rank(a).cmp(&accent_rank(b)))
        .then_with(|| case_rank(a).cmp(&case_rank(b)))
        .then_with(|| a.cmp(b))
}

fn accent_rank(text: &str) -> usize {
    text.nfkd().filter(|c| is_combining_mark(*c)).count()
}

fn case_rank(text: &str) -> Vec<bool> {
    text.chars().map(char::is_uppercase).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casefold_handles_non_ascii() {
        assert_eq!(casefold("ÉCOLE"), "école");
        assert_eq!(casefold("Joan"), "joan");
    }

    #[test]
    fn collation_ignores_case_and_accents_first() {
        assert_eq!(collate("apple", "Banana"), Ordering::Less);
        assert_eq!(collate("école", "ecole"), Ordering::Greater);
        assert_eq!(collate("école", "ezra"), Ordering::Less);
        assert_eq!(collate("amy", "Amy"), Ordering::Less);
        assert_eq!(collate("Amy", "Amy"), Ordering::Equal);
    }
}

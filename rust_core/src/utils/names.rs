//! Player-name normalization.
//!
//! Produces the `nameKey` used by the roster index. Feed names and roster
//! names go through the same function, so every rule here must be stable
//! under repetition.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Generational suffixes dropped from the end of a name.
const NAME_SUFFIXES: &[&str] = &["jr", "sr", "ii", "iii", "iv", "v"];

/// Normalize a player name for lookup.
///
/// - strips diacritics (NFKD, combining marks removed)
/// - lowercases
/// - drops punctuation other than hyphen and apostrophe
/// - collapses whitespace
/// - drops the trailing generational suffix token, keeping at least one token
///
/// Suffix stripping repeats until the last token is not a suffix, so a
/// stacked "Jr. III" goes entirely. Stripping only one would leave "jr"
/// behind and a second pass would change the key.
pub fn normalize_name(raw: &str) -> String {
    let decomposed: String = raw
        .trim()
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let cleaned: String = decomposed
        .to_lowercase()
        .chars()
        .map(|c| if c == '\u{2019}' { '\'' } else { c })
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '_' | '\'' | '-'))
        .collect();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    while tokens.len() > 1 {
        match tokens.last() {
            Some(last) if NAME_SUFFIXES.contains(last) => {
                tokens.pop();
            }
            _ => break,
        }
    }

    tokens.join(" ")
}

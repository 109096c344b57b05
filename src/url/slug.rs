//! Category name to slug transliteration
//!
//! Slugs are the only key category lookup accepts and the first path segment
//! of every search address.

/// Characters the site spells out as ASCII in its slugs
const REPLACEMENTS: [(char, &str); 5] = [
    ('đ', "dj"),
    ('š', "s"),
    ('ž', "z"),
    ('ć', "c"),
    ('č', "c"),
];

/// Transforms a human-readable category name into its URL slug
///
/// Lower-cases the input, collapses every whitespace run into a single `-` and
/// transliterates `đ š ž ć č`. Every other character passes through unchanged,
/// so the transform is total and idempotent on its own output.
///
/// # Examples
///
/// ```
/// use kp_harvest::url::transform;
///
/// assert_eq!(transform("Alati i oruđa"), "alati-i-orudja");
/// assert_eq!(transform(""), "");
/// ```
pub fn transform(display_name: &str) -> String {
    let lowered = display_name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut in_whitespace = false;

    for c in lowered.chars() {
        if is_separator(c) {
            if !in_whitespace {
                slug.push('-');
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;

        match REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => slug.push_str(to),
            None => slug.push(c),
        }
    }

    slug
}

/// Whitespace as ECMAScript's `\s` class defines it
///
/// Unicode `White_Space` plus the byte order mark, minus NEL (U+0085).
fn is_separator(c: char) -> bool {
    c == '\u{feff}' || (c.is_whitespace() && c != '\u{85}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_category_name() {
        assert_eq!(transform("Alati i oruđa"), "alati-i-orudja");
    }

    #[test]
    fn test_all_diacritics() {
        assert_eq!(transform("đšžćč"), "djszcc");
        assert_eq!(transform("ĐŠŽĆČ"), "djszcc");
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        assert_eq!(transform("Kuća  i\tbašta"), "kuca-i-basta");
        assert_eq!(transform(" Mobilni telefoni "), "-mobilni-telefoni-");
    }

    #[test]
    fn test_other_characters_untouched() {
        assert_eq!(transform("Audio, TV & foto"), "audio,-tv-&-foto");
        assert_eq!(transform("ÄÖ"), "äö");
    }

    #[test]
    fn test_byte_order_mark_is_whitespace() {
        assert_eq!(transform("\u{feff}Automobili"), "-automobili");
        assert_eq!(transform("Kuća\u{feff}\u{a0}i bašta"), "kuca-i-basta");
    }

    #[test]
    fn test_next_line_is_kept() {
        assert_eq!(transform("a\u{85}b"), "a\u{85}b");
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(transform(""), "");
    }

    #[test]
    fn test_idempotent() {
        let samples = [
            "Alati i oruđa",
            "Automobili",
            "Kuća i bašta",
            "Odeća | Ženska",
            "  Sport   i  razonoda ",
            "already-a-slug",
            "Čćžšđ ČĆŽŠĐ",
            "",
        ];

        for sample in samples {
            let once = transform(sample);
            assert_eq!(transform(&once), once, "not idempotent for {:?}", sample);
        }
    }
}

use std::sync::OnceLock;

use regex::Regex;

/// Zero-width and otherwise invisible characters removed from extracted text.
const INVISIBLE_CHARS: &[char] = &[
    '\u{200B}', // zero width space
    '\u{200C}', // zero width non-joiner
    '\u{200D}', // zero width joiner
    '\u{2060}', // word joiner
    '\u{FEFF}', // byte order mark
    '\u{00AD}', // soft hyphen
];

fn whitespace_run() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+").expect("whitespace pattern is valid"))
}

fn blank_lines() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\n{3,}").expect("newline pattern is valid"))
}

/// Cleans raw extracted text into its canonical form.
///
/// Never fails and is idempotent. Invisible characters go first so that
/// removing them can never leave a fresh whitespace run behind.
pub fn normalize(raw: &str) -> String {
    let visible: String = raw.chars().filter(|c| !INVISIBLE_CHARS.contains(c)).collect();
    let collapsed = whitespace_run().replace_all(&visible, " ");
    let paragraphs = blank_lines().replace_all(&collapsed, "\n\n");
    paragraphs.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  Fractions\t\tand \n\n\n\n decimals  "), "Fractions and decimals");
    }

    #[test]
    fn test_normalize_strips_invisible_characters() {
        assert_eq!(normalize("Geo\u{200B}metry\u{FEFF}"), "Geometry");
        assert_eq!(normalize("a \u{200B} b"), "a b");
        assert_eq!(normalize("\u{FEFF}\u{200D}"), "");
    }

    #[test]
    fn test_normalize_empty_and_blank() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize(&" ".repeat(150)), "");
        assert_eq!(normalize("\n\r\n\t"), "");
    }

    #[test]
    fn test_normalize_unicode_whitespace() {
        assert_eq!(normalize("Newton\u{00A0}\u{2003}laws"), "Newton laws");
    }

    #[test]
    fn test_normalize_idempotent() {
        let samples = [
            "",
            "   ",
            "plain",
            "Unit 1\n\n\n\nUnit 2",
            "tab\tseparated\tvalues",
            "a \u{200B} b \u{FEFF} c",
            " \u{00AD}soft\u{00AD}hyphen ",
            "mixed\r\nline\rendings\n",
            "\u{200B} leading invisible",
        ];

        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", sample);
        }
    }
}

//! Permissive cell-value parsing.
//!
//! Every parser here returns `None` for placeholders (`—`, `-`, blank,
//! `NP`...) so that "unknown" never collapses into a numeric zero.

use regex::Regex;
use std::sync::OnceLock;

static SEX_AGE_RE: OnceLock<Regex> = OnceLock::new();
static CHRONO_RE: OnceLock<Regex> = OnceLock::new();
static ICON_RE: OnceLock<Regex> = OnceLock::new();

/// Banner/placeholder strings that client-side rendering can leave in a title.
const PLACEHOLDER_TITLES: [&str; 5] = [
    "privacy",
    "vie privée",
    "respectons",
    "cookies",
    "loading",
];

/// Normalize cell text: drop icon-font glyphs, turn newlines and
/// non-breaking spaces into plain spaces, trim.
pub fn clean_text(raw: &str) -> String {
    let icons = ICON_RE.get_or_init(|| Regex::new(r"[\u{e900}-\u{f8ff}]").expect("valid icon regex"));
    icons
        .replace_all(raw, "")
        .replace(['\n', '\r', '\t', '\u{a0}'], " ")
        .trim()
        .to_string()
}

/// Integer from the digits of a token; `None` when it has no digits.
pub fn parse_int(raw: &str) -> Option<u32> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Decimal number with a comma or dot separator.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{202f}')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Odds are only meaningful above evens.
pub fn parse_odds(raw: &str) -> Option<f64> {
    parse_decimal(raw).filter(|v| *v > 1.0)
}

/// Money amount such as `151 180` with any kind of thousands space.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{202f}' && *c != '€')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Sex/age token: `F5` -> (`F`, 5), `H10` -> (`H`, 10).
pub fn parse_sex_age(raw: &str) -> (Option<String>, Option<u32>) {
    let re = SEX_AGE_RE.get_or_init(|| Regex::new(r"^([A-Za-z]+)(\d+)").expect("valid sex/age regex"));
    match re.captures(raw.trim()) {
        Some(caps) => (Some(caps[1].to_uppercase()), caps[2].parse().ok()),
        None => (None, None),
    }
}

/// Elapsed time, kept only in the `1'13''8` notation.
pub fn parse_chrono(raw: &str) -> Option<String> {
    let re = CHRONO_RE.get_or_init(|| Regex::new(r"\d+'\d+''").expect("valid chrono regex"));
    let raw = raw.trim();
    if re.is_match(raw) {
        Some(raw.to_string())
    } else {
        None
    }
}

/// Form string (`8a6a(25)7a`); must carry at least one digit.
pub fn parse_form(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.chars().any(|c| c.is_ascii_digit()) {
        Some(raw.to_string())
    } else {
        None
    }
}

/// `prix-de-grenade` -> `Prix De Grenade`
pub fn title_case(slug: &str) -> String {
    slug.split(['-', ' '])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn is_placeholder_title(text: &str) -> bool {
    let lower = text.to_lowercase();
    PLACEHOLDER_TITLES.iter().any(|p| lower.contains(p))
}

fn fold_accent(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ä' | 'ã' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'ö' | 'õ' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

/// Matching key for race names coming from different page types.
///
/// Case, accents, punctuation and whitespace runs are all ignored:
/// `Prix d'Amérique` and `prix-d-amerique` share the key `prix d amerique`.
pub fn normalize_key(name: &str) -> String {
    let folded: String = name
        .to_lowercase()
        .chars()
        .map(fold_accent)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_unknown() {
        for token in ["—", "-", "", "  ", "NP", "n/a"] {
            assert_eq!(parse_int(token), None, "{:?}", token);
            assert_eq!(parse_decimal(token), None, "{:?}", token);
            assert_eq!(parse_odds(token), None, "{:?}", token);
        }
    }

    #[test]
    fn test_zero_is_a_real_value() {
        assert_eq!(parse_int("0"), Some(0));
        assert_eq!(parse_decimal("0"), Some(0.0));
    }

    #[test]
    fn test_parse_decimal_comma() {
        assert_eq!(parse_decimal("12,5"), Some(12.5));
        assert_eq!(parse_decimal(" 3.4 "), Some(3.4));
        assert_eq!(parse_odds("1"), None);
        assert_eq!(parse_odds("7,2"), Some(7.2));
    }

    #[test]
    fn test_parse_amount_spaces() {
        assert_eq!(parse_amount("151 180"), Some(151180.0));
        assert_eq!(parse_amount("151\u{a0}180"), Some(151180.0));
        assert_eq!(parse_amount("151\u{202f}180 €"), Some(151180.0));
        assert_eq!(parse_amount("—"), None);
    }

    #[test]
    fn test_parse_sex_age() {
        assert_eq!(parse_sex_age("F5"), (Some("F".to_string()), Some(5)));
        assert_eq!(parse_sex_age("h10"), (Some("H".to_string()), Some(10)));
        assert_eq!(parse_sex_age("—"), (None, None));
    }

    #[test]
    fn test_parse_chrono() {
        assert_eq!(parse_chrono("1'13''8"), Some("1'13''8".to_string()));
        assert_eq!(parse_chrono("DAI"), None);
    }

    #[test]
    fn test_parse_form() {
        assert_eq!(parse_form("8a6a(25)7a"), Some("8a6a(25)7a".to_string()));
        assert_eq!(parse_form("inédit"), None);
    }

    #[test]
    fn test_clean_text_strips_icons() {
        assert_eq!(clean_text("\u{e901} Bold Eagle\n"), "Bold Eagle");
        assert_eq!(clean_text("A\u{a0}B"), "A B");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("prix-de-grenade"), "Prix De Grenade");
        assert_eq!(title_case("CAGNES-SUR-MER"), "Cagnes Sur Mer");
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("Prix d'Amérique"), "prix d amerique");
        assert_eq!(normalize_key("prix-d-amerique"), "prix d amerique");
        assert_eq!(normalize_key("  PRIX   De Grenade "), "prix de grenade");
    }

    #[test]
    fn test_placeholder_title() {
        assert!(is_placeholder_title("We respect your privacy"));
        assert!(!is_placeholder_title("Prix de Grenade"));
    }
}

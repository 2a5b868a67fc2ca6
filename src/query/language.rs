use std::borrow::Cow;

/// Language codes the mobile app offers, plus other common Indian languages.
const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("en", "English"),
    ("hi", "Hindi"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("kn", "Kannada"),
    ("bn", "Bengali"),
    ("mr", "Marathi"),
    ("gu", "Gujarati"),
    ("ml", "Malayalam"),
    ("pa", "Punjabi"),
    ("or", "Odia"),
    ("ur", "Urdu"),
];

/// Resolve a requested language to the name used in the prompt.
///
/// Known ISO 639-1 codes (case-insensitive, region suffix ignored) become
/// English language names; anything else is passed through trimmed. Blank
/// input falls back to `default`.
pub fn language_name<'a>(requested: Option<&'a str>, default: &'a str) -> Cow<'a, str> {
    let code = requested
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .unwrap_or(default);

    let primary = code.split(['-', '_']).next().unwrap_or(code);
    LANGUAGE_NAMES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(primary))
        .map(|(_, name)| Cow::Borrowed(*name))
        .unwrap_or(Cow::Borrowed(code))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("hi"), "Hindi")]
    #[case(Some("TA"), "Tamil")]
    #[case(Some("te-IN"), "Telugu")]
    #[case(Some("en_US"), "English")]
    #[case(Some("Kannada"), "Kannada")]
    #[case(Some("  fr  "), "fr")]
    #[case(Some(""), "English")]
    #[case(None, "English")]
    fn test_language_name(#[case] requested: Option<&str>, #[case] expected: &str) {
        assert_eq!(language_name(requested, "en"), expected);
    }

    #[test]
    fn test_unknown_default_passes_through() {
        assert_eq!(language_name(None, "Swahili"), "Swahili");
    }
}

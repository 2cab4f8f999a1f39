const ALIASES: &[(&str, &str)] = &[
    ("kr", "ko"),
    ("kor", "ko"),
    ("jp", "ja"),
    ("jap", "ja"),
    ("cn", "zh"),
    ("chs", "zh"),
    ("chi", "zh"),
    ("fil", "tl"),
];

/// Lowercased, trimmed language code with the backend's aliases folded in.
pub fn canonical_language(code: &str) -> String {
    let code = code.trim().to_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == code)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(code)
}

/// Parses a comma separated `target_langs` form value. Never returns an empty
/// list; the backend treats a missing value as English.
pub fn parse_target_languages(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for code in raw.split(',').map(canonical_language) {
        if !code.is_empty() && !out.contains(&code) {
            out.push(code);
        }
    }
    if out.is_empty() {
        out.push("en".to_string());
    }
    out
}

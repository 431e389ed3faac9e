use once_cell::sync::Lazy;
use regex::Regex;

/// Recognised detachment layouts, tried in priority order
const DETACHMENT_PATTERNS: [&str; 5] = [
    // "+ DETACHMENT: Gladius Task Force" (app export header)
    r"(?im)^[ \t]*[+#*•-]+[ \t]*detachment[ \t]*:[ \t]*(.+)$",
    // "DETACHMENT: Gladius Task Force"
    r"(?im)^[ \t]*detachment[ \t]*:[ \t]*(.+)$",
    // "Faction: Space Marines | Detachment: Gladius Task Force"
    r"(?i)\bdetachment[ \t]*:[ \t]*([^|,;\r\n]+)",
    // "-- Gladius Task Force Detachment --"
    r"(?im)^[ \t]*-{2,}[ \t]*(.+?)[ \t]+detachment[ \t]*-{2,}[ \t\r]*$",
    // "Detachment - Gladius Task Force"
    r"(?im)^[ \t]*detachment[ \t]*[-–—][ \t]*(.+)$",
];

static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    DETACHMENT_PATTERNS
        .iter()
        .map(|pattern| Regex::new(pattern).expect("detachment pattern is valid"))
        .collect()
});

/// Find the detachment named in a free-form army list.
///
/// Returns the first non-empty match across the recognised layouts, trimmed.
pub fn extract_detachment(list_text: &str) -> Option<String> {
    if list_text.trim().is_empty() {
        return None;
    }

    PATTERNS
        .iter()
        .find_map(|pattern| first_capture(pattern, list_text))
}

fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|name| !name.is_empty())
        .map(str::to_string)
}

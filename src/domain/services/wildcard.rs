//! Single-directory-level `*` wildcard expansion.
//!
//! Only one wildcard shape is supported: `*` matches any run of
//! characters within one path component. There is no `**`/recursive
//! wildcard. Grounded on `__process_wildcards`/`__regexsearch` in the
//! original tool this system is modeled on.

/// One component of a parsed source pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// A component with no `*` in it; matched literally (case-insensitive).
    Literal(String),
    /// A component containing `*`; matched against candidate names.
    Wildcard(String),
}

/// Splits a path (already separated into components) into segments,
/// tagging each component as literal or wildcard.
pub fn split_components(components: &[String]) -> Vec<PatternSegment> {
    components
        .iter()
        .map(|component| {
            if component.contains('*') {
                PatternSegment::Wildcard(component.clone())
            } else {
                PatternSegment::Literal(component.clone())
            }
        })
        .collect()
}

/// Case-insensitive glob match of a single component against a single
/// `*`-bearing pattern. `*` matches zero or more characters and never
/// crosses a path separator (the caller only ever hands us one
/// component at a time, so that is automatic here).
pub fn matches(pattern: &str, candidate: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let candidate: Vec<char> = candidate.to_lowercase().chars().collect();
    matches_recursive(&pattern, &candidate)
}

fn matches_recursive(pattern: &[char], candidate: &[char]) -> bool {
    match pattern.first() {
        None => candidate.is_empty(),
        Some('*') => {
            if matches_recursive(&pattern[1..], candidate) {
                return true;
            }
            !candidate.is_empty() && matches_recursive(pattern, &candidate[1..])
        }
        Some(&c) => candidate.first() == Some(&c) && matches_recursive(&pattern[1..], &candidate[1..]),
    }
}

//! Shared "which name wins" heuristic.
//!
//! NTFS directories carry both an 8.3 short name and a long name for
//! the same file. The directory resolver and the path cache both need
//! to pick a single display name when two entries resolve to the same
//! record; both use this rule. Grounded on the naming heuristic in
//! `__getChildIndex` of the original tool this system is modeled on:
//! an 8.3 short name is recognizable by the `~` generation-number
//! marker, and a non-`~` name seen later overrides it.
pub fn is_short_name(name: &str) -> bool {
    name.contains('~')
}

/// True if `candidate` should replace `current` as the preferred
/// display name for the same record.
pub fn prefer(candidate: &str, current: &str) -> bool {
    is_short_name(current) && !is_short_name(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_name_replaces_short_name() {
        assert!(prefer("Program Files", "PROGRA~1"));
    }

    #[test]
    fn short_name_does_not_replace_long_name() {
        assert!(!prefer("PROGRA~1", "Program Files"));
    }

    #[test]
    fn identical_kind_does_not_replace() {
        assert!(!prefer("Windows", "windows"));
    }
}

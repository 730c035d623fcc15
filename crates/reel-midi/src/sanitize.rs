//! Filename sanitization shared by every split-export path.
//!
//! Grounded on `midi/export_zip.py`'s `sanitize_filename`.

/// Replaces filesystem-hostile characters with `_`, trims leading/trailing
/// spaces and dots, truncates to 100 characters, and falls back to
/// `"untitled"` if nothing is left.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| if "<>:\"/\\|?*".contains(c) { '_' } else { c })
        .collect();
    let trimmed = replaced.trim_matches(|c: char| c == ' ' || c == '.');
    let truncated: String = trimmed.chars().take(100).collect();
    if truncated.is_empty() {
        "untitled".to_string()
    } else {
        truncated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_reserved_characters() {
        assert_eq!(sanitize_filename("drums: A/B|C"), "drums_ A_B_C");
    }

    #[test]
    fn trims_leading_and_trailing_dots_and_spaces() {
        assert_eq!(sanitize_filename("  ..lead sheet..  "), "lead sheet");
    }

    #[test]
    fn falls_back_to_untitled_when_empty() {
        assert_eq!(sanitize_filename("   ..."), "untitled");
    }

    #[test]
    fn truncates_to_one_hundred_characters() {
        let long = "x".repeat(250);
        assert_eq!(sanitize_filename(&long).len(), 100);
    }
}

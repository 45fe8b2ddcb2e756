//! Shared validation predicates for entity fields.

/// Validation predicate: letters and single spaces only.
///
/// Used for person names, which must not carry digits or punctuation.
pub(crate) fn letters_and_spaces(s: &str) -> bool {
    s.chars().any(char::is_alphabetic) && s.chars().all(|c| c.is_alphabetic() || c == ' ')
}

/// Trim optional free text, treating blank input as absent.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn names_with_letters_and_spaces_pass() {
        assert!(letters_and_spaces("Ada Lovelace"));
        assert!(letters_and_spaces("José Ñúñez"));
    }

    #[test]
    fn names_with_digits_or_punctuation_fail() {
        assert!(!letters_and_spaces("R2D2"));
        assert!(!letters_and_spaces("Dr. Who"));
        assert!(!letters_and_spaces("   "));
    }

    #[test]
    fn blank_optional_text_is_absent() {
        assert_eq!(optional_text(Some("  ".to_string())), None);
        assert_eq!(optional_text(Some(" Go ".to_string())), Some("Go".to_string()));
        assert_eq!(optional_text(None), None);
    }

    proptest! {
        #[test]
        fn any_ascii_letter_run_passes(s in "[a-zA-Z]{1,20}( [a-zA-Z]{1,20}){0,3}") {
            prop_assert!(letters_and_spaces(&s));
        }

        #[test]
        fn any_digit_fails(prefix in "[a-zA-Z]{0,10}", digit in "[0-9]", suffix in "[a-zA-Z]{0,10}") {
            let name = format!("{prefix}{digit}{suffix}");
            prop_assert!(!letters_and_spaces(&name));
        }
    }
}

//! Phone-number normalization and area-code extraction
//!
//! Shared by the Allocator (destination validation, area-code matching)
//! and the Pool Store adapter (deriving `area_code` for a `CallerId` on
//! admin creation). Kept free of any store dependency so both layers can
//! call it without an `AppError` round trip through the database.

/// Strip everything but ASCII digits from a raw phone number string.
pub fn normalize(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Strip a single leading country code `1` off an 11-digit NANP number.
///
/// `spec.md` §4.1 Phase 2: "if the destination has 11 digits starting
/// with `1`, the leading `1` is stripped first."
pub fn strip_leading_country_code(digits: &str) -> &str {
    if digits.len() == 11 && digits.starts_with('1') {
        &digits[1..]
    } else {
        digits
    }
}

/// Validate a normalized destination per `spec.md` §4.1: 7-15 digits.
pub fn is_valid_destination(digits: &str) -> bool {
    (7..=15).contains(&digits.len())
}

/// Validate a normalized caller-ID number per `spec.md` §3: 10-15 digits.
pub fn is_valid_caller_id_number(digits: &str) -> bool {
    (10..=15).contains(&digits.len())
}

/// Derive the 3-digit NANP area code from a normalized number, following
/// the 11-digit-leading-1 stripping rule. Returns `None` when the number
/// isn't a 10-digit (post-stripping) NANP number — e.g. a 7-digit local
/// destination or an international number.
pub fn area_code(digits: &str) -> Option<String> {
    let stripped = strip_leading_country_code(digits);
    if stripped.len() == 10 {
        Some(stripped[..3].to_string())
    } else {
        None
    }
}

/// `true` if `s` is non-empty after trimming ASCII whitespace.
pub fn is_non_empty_trimmed(s: &str) -> bool {
    !s.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_non_digits() {
        assert_eq!(normalize("+1 (212) 555-1234"), "12125551234");
    }

    #[test]
    fn test_strip_leading_country_code() {
        assert_eq!(strip_leading_country_code("12125551234"), "2125551234");
        assert_eq!(strip_leading_country_code("2125551234"), "2125551234");
        // 11 digits not starting with 1 are left alone
        assert_eq!(strip_leading_country_code("22125551234"), "22125551234");
    }

    #[test]
    fn test_area_code_from_10_digit() {
        assert_eq!(area_code("2125551234").as_deref(), Some("212"));
    }

    #[test]
    fn test_area_code_from_11_digit_with_country_code() {
        assert_eq!(area_code("12125551234").as_deref(), Some("212"));
    }

    #[test]
    fn test_area_code_absent_for_short_destination() {
        // 7-digit local destination: no area-code tier-1 match possible
        assert_eq!(area_code("5551234"), None);
    }

    #[test]
    fn test_area_code_absent_for_international() {
        assert_eq!(area_code("442079460000"), None);
    }

    #[test]
    fn test_is_valid_destination_bounds() {
        assert!(is_valid_destination("5551234")); // 7 digits
        assert!(is_valid_destination("123456789012345")); // 15 digits
        assert!(!is_valid_destination("123456")); // 6 digits
        assert!(!is_valid_destination("1234567890123456")); // 16 digits
        assert!(!is_valid_destination("")); // no digits
    }

    #[test]
    fn test_is_valid_caller_id_number_bounds() {
        assert!(is_valid_caller_id_number("2125551234")); // 10 digits
        assert!(!is_valid_caller_id_number("125551234")); // 9 digits
    }

    #[test]
    fn test_is_non_empty_trimmed() {
        assert!(is_non_empty_trimmed("campaign-1"));
        assert!(!is_non_empty_trimmed("   "));
        assert!(!is_non_empty_trimmed(""));
    }
}

//! NIK and phone number rules

/// A NIK is exactly sixteen digits once whitespace is removed
#[must_use]
pub fn is_valid_nik(nik: &str) -> bool {
    let mut count = 0usize;
    for c in nik.chars().filter(|c| !c.is_whitespace()) {
        if !c.is_ascii_digit() {
            return false;
        }
        count += 1;
    }
    count == 16
}

/// Replace every digit that is immediately followed by four more digits with `*`
///
/// Leaves the trailing four digits of each digit run visible. Applying it to an
/// already-masked value changes nothing.
#[must_use]
pub fn mask_digits(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    chars
        .iter()
        .enumerate()
        .map(|(i, &c)| {
            let followed_by_four = chars.len() > i + 4
                && chars[i + 1..=i + 4].iter().all(char::is_ascii_digit);
            if c.is_ascii_digit() && followed_by_four {
                '*'
            } else {
                c
            }
        })
        .collect()
}

/// Strip everything but digits
#[must_use]
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn masks_all_but_last_four() {
        assert_eq!(mask_digits("3271011234560001"), "************0001");
        assert_eq!(mask_digits("08123450001"), "*******0001");
    }

    #[test]
    fn short_values_are_untouched() {
        assert_eq!(mask_digits("1234"), "1234");
        assert_eq!(mask_digits(""), "");
    }

    #[test]
    fn separated_runs_mask_independently() {
        assert_eq!(mask_digits("0812-3450001"), "0812-***0001");
    }

    #[test]
    fn nik_validation() {
        assert!(is_valid_nik("3271011234560001"));
        assert!(is_valid_nik("3271 0112 3456 0001"));
        assert!(!is_valid_nik("327101123456000"));
        assert!(!is_valid_nik("32710112345600O1"));
    }

    #[test]
    fn phone_normalization() {
        assert_eq!(normalize_phone("+62 812-3450"), "628123450");
    }

    proptest! {
        #[test]
        fn prop_mask_is_idempotent(s in "[0-9* -]{0,24}") {
            let once = mask_digits(&s);
            prop_assert_eq!(mask_digits(&once), once.clone());
        }

        #[test]
        fn prop_mask_keeps_last_four_of_nik(nik in "[0-9]{16}") {
            let masked = mask_digits(&nik);
            prop_assert!(masked.ends_with(&nik[12..]));
            prop_assert_eq!(masked.matches('*').count(), 12);
        }
    }
}

//! RPM-style version ordering.
//!
//! Image versions (`1.15.3`), build numbers (`3.12`) and package
//! version/release strings are all compared with the same segment rules:
//!
//! - runs of digits compare numerically (`10 > 9`, leading zeros ignored)
//! - runs of letters compare lexicographically
//! - a numeric run is newer than an alphabetic one at the same position
//! - `~` sorts before anything, including the end of the string
//! - any other character only separates segments

use std::cmp::Ordering;

/// Compare two version strings segment by segment.
///
/// # Example
///
/// ```
/// use std::cmp::Ordering;
/// use obsimg_schema::version::compare_versions;
///
/// assert_eq!(compare_versions("1.10", "1.9"), Ordering::Greater);
/// assert_eq!(compare_versions("1.0~rc1", "1.0"), Ordering::Less);
/// ```
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    if left == right {
        return Ordering::Equal;
    }

    let mut a = left;
    let mut b = right;

    loop {
        a = a.trim_start_matches(is_separator);
        b = b.trim_start_matches(is_separator);

        match (a.strip_prefix('~'), b.strip_prefix('~')) {
            (Some(rest_a), Some(rest_b)) => {
                a = rest_a;
                b = rest_b;
                continue;
            }
            (Some(_), None) => return Ordering::Less,
            (None, Some(_)) => return Ordering::Greater,
            (None, None) => {}
        }

        if a.is_empty() || b.is_empty() {
            break;
        }

        let numeric = a.starts_with(|c: char| c.is_ascii_digit());
        let (seg_a, rest_a) = split_segment(a, numeric);
        let (seg_b, rest_b) = split_segment(b, numeric);

        // Segment types differ: numbers beat letters
        if seg_b.is_empty() {
            return if numeric {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }

        let ord = if numeric {
            compare_numeric(seg_a, seg_b)
        } else {
            seg_a.cmp(seg_b)
        };
        if ord != Ordering::Equal {
            return ord;
        }

        a = rest_a;
        b = rest_b;
    }

    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, _) => Ordering::Greater,
    }
}

/// Returns true if `candidate` orders strictly after `current`.
pub fn is_newer(current: &str, candidate: &str) -> bool {
    compare_versions(candidate, current) == Ordering::Greater
}

fn is_separator(c: char) -> bool {
    !c.is_ascii_alphanumeric() && c != '~'
}

fn split_segment(s: &str, numeric: bool) -> (&str, &str) {
    let end = s
        .find(|c: char| {
            if numeric {
                !c.is_ascii_digit()
            } else {
                !c.is_ascii_alphabetic()
            }
        })
        .unwrap_or(s.len());
    s.split_at(end)
}

fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_segments_compare_as_numbers() {
        assert_eq!(compare_versions("1.10.0", "1.9.9"), Ordering::Greater);
        assert_eq!(compare_versions("3.12", "3.5"), Ordering::Greater);
        assert_eq!(compare_versions("007", "7"), Ordering::Equal);
    }

    #[test]
    fn longer_version_wins_on_common_prefix() {
        assert_eq!(compare_versions("1.0", "1.0.1"), Ordering::Less);
        assert_eq!(compare_versions("1.0.1", "1.0"), Ordering::Greater);
    }

    #[test]
    fn numbers_are_newer_than_letters() {
        assert_eq!(compare_versions("1.0.1", "1.0.a"), Ordering::Greater);
        assert_eq!(compare_versions("1.0.a", "1.0.1"), Ordering::Less);
        assert_eq!(compare_versions("1.0a", "1.0b"), Ordering::Less);
    }

    #[test]
    fn tilde_sorts_before_release() {
        assert_eq!(compare_versions("2.0~beta1", "2.0"), Ordering::Less);
        assert_eq!(compare_versions("2.0~beta2", "2.0~beta1"), Ordering::Greater);
    }

    #[test]
    fn separators_are_interchangeable() {
        assert_eq!(compare_versions("1_2", "1.2"), Ordering::Equal);
        assert!(is_newer("150500.55.39", "150500.55.44"));
        assert!(!is_newer("1.2", "1.2"));
    }
}

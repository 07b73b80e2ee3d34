/// Finds `suffix` in a range response body and returns its breach count.
///
/// Response format: "SUFFIX:COUNT\r\n" per line. Padded responses contain
/// decoy lines with a count of 0, so a match with count 0 is reported as
/// `Some(0)` and left to the caller to classify.
///
/// The part before the separator has to equal `suffix` in full; a line that
/// merely starts with it does not match. Returns `None` when no line matches
/// or the matched count does not parse.
pub fn find_occurrences(body: &str, suffix: &str) -> Option<u64> {
    body.lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(line_suffix, _)| line_suffix.trim().eq_ignore_ascii_case(suffix))
        .and_then(|(_, count)| count.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PASSWORD_SUFFIX: &str = "1E4C9B93F3F0682250B6CF8331B7EE68FD8";

    #[test]
    fn test_find_occurrences() {
        let body = "0018A45C4D1DEF81644B54AB7F969B88D65:1\r\n\
                    1E4C9B93F3F0682250B6CF8331B7EE68FD8:37854\r\n\
                    1E4FA36A26C8D85B3F1FA8C382D1C94E682:2";

        assert_eq!(find_occurrences(body, PASSWORD_SUFFIX), Some(37854));
        assert_eq!(find_occurrences(body, "0018A45C4D1DEF81644B54AB7F969B88D65"), Some(1));
        assert_eq!(find_occurrences(body, "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFF"), None);
    }

    #[test]
    fn test_padding_line_reports_zero() {
        let body = "1E4C9B93F3F0682250B6CF8331B7EE68FD8:0\r\n";
        assert_eq!(find_occurrences(body, PASSWORD_SUFFIX), Some(0));
    }

    #[test]
    fn test_lowercase_body_matches() {
        let body = "1e4c9b93f3f0682250b6cf8331b7ee68fd8:100";
        assert_eq!(find_occurrences(body, PASSWORD_SUFFIX), Some(100));
    }

    #[test]
    fn test_partial_suffix_does_not_match() {
        // Line prefix only; must not be treated as a hit.
        let body = "1E4C9B93F3F0682250B6CF8331B7EE68FD8AB:5\n1E4C9B93F3:7";
        assert_eq!(find_occurrences(body, PASSWORD_SUFFIX), None);
    }

    #[test]
    fn test_unparseable_count() {
        let body = "1E4C9B93F3F0682250B6CF8331B7EE68FD8:lots";
        assert_eq!(find_occurrences(body, PASSWORD_SUFFIX), None);
    }

    #[test]
    fn test_empty_and_malformed_lines() {
        let body = "\n\nnot a record\n:\n1E4C9B93F3F0682250B6CF8331B7EE68FD8:3\n";
        assert_eq!(find_occurrences(body, PASSWORD_SUFFIX), Some(3));
        assert_eq!(find_occurrences("", PASSWORD_SUFFIX), None);
    }
}

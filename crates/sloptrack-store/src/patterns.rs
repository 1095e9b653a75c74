//! Ignore-pattern and selector matching.
//!
//! Three pattern shapes, disambiguated by content:
//! * contains `*` or `?` -> wildcard match against the finding ID when the
//!   pattern carries a `::`, otherwise against the file path
//! * contains `::` -> finding-ID prefix
//! * otherwise -> exact file path

/// Minimal wildcard matcher: `*` matches any run (including `/`), `?`
/// matches one character. Everything else is literal.
pub fn wildcard_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    // Iterative backtracking over the last `*` seen.
    let (mut t, mut p) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = star {
            p = star_p + 1;
            t = star_t + 1;
            star = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }
    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }
    p == pattern.len()
}

/// Return the ignore pattern that matched, if any.
pub fn matched_ignore_pattern<'a>(
    finding_id: &str,
    file: &str,
    patterns: &'a [String],
) -> Option<&'a str> {
    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') {
            let target = if pattern.contains("::") { finding_id } else { file };
            if wildcard_match(target, pattern) {
                return Some(pattern);
            }
            continue;
        }

        if pattern.contains("::") {
            // Prefix matches stop at a `::` boundary so `d::src/a.rs`
            // cannot swallow `d::src/a.rs2`.
            if finding_id == pattern
                || finding_id.starts_with(&format!("{pattern}::"))
            {
                return Some(pattern);
            }
            continue;
        }

        if file == pattern {
            return Some(pattern);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcard_star_spans_separators() {
        assert!(wildcard_match("smells::src/a.rs::f", "smells::*"));
        assert!(wildcard_match("src/deep/nested/file.rs", "src/*.rs"));
        assert!(!wildcard_match("tests/a.rs", "src/*"));
    }

    #[test]
    fn wildcard_question_matches_one_char() {
        assert!(wildcard_match("a.rs", "?.rs"));
        assert!(!wildcard_match("ab.rs", "?.rs"));
    }

    #[test]
    fn wildcard_trailing_stars_collapse() {
        assert!(wildcard_match("abc", "abc**"));
        assert!(wildcard_match("", "*"));
    }

    #[test]
    fn id_glob_targets_the_id() {
        let patterns = vec!["smells::*".to_string()];
        assert_eq!(
            matched_ignore_pattern("smells::src/a.rs", "src/a.rs", &patterns),
            Some("smells::*")
        );
        assert_eq!(
            matched_ignore_pattern("unused::src/a.rs", "src/a.rs", &patterns),
            None
        );
    }

    #[test]
    fn file_glob_targets_the_file() {
        let patterns = vec!["vendor/*".to_string()];
        assert!(matched_ignore_pattern("d::vendor/x.js", "vendor/x.js", &patterns).is_some());
        assert!(matched_ignore_pattern("d::src/x.js", "src/x.js", &patterns).is_none());
    }

    #[test]
    fn id_prefix_without_glob() {
        let patterns = vec!["smells::src/a.rs".to_string()];
        assert!(matched_ignore_pattern("smells::src/a.rs", "src/a.rs", &patterns).is_some());
        assert!(matched_ignore_pattern("smells::src/a.rs::f", "src/a.rs", &patterns).is_some());
    }

    #[test]
    fn id_prefix_stops_at_segment_boundary() {
        let patterns = vec!["smells::src/a.rs".to_string()];
        assert!(matched_ignore_pattern("smells::src/a.rs2::f", "src/a.rs2", &patterns).is_none());
        assert!(matched_ignore_pattern("smells::src/a.rs2", "src/a.rs2", &patterns).is_none());
    }

    #[test]
    fn bare_pattern_is_exact_file() {
        let patterns = vec!["src/a.rs".to_string()];
        assert!(matched_ignore_pattern("d::src/a.rs", "src/a.rs", &patterns).is_some());
        assert!(matched_ignore_pattern("d::src/a/b.rs", "src/a/b.rs", &patterns).is_none());
    }
}

//! Tag label normalization

/// Trim every label, keeping order and duplicates
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    tags.iter().map(|t| t.as_ref().trim().to_string()).collect()
}

/// Split a comma-separated tag field into trimmed labels
///
/// Empty labels (`"a,,b"`, trailing commas) are dropped. Duplicates within the
/// field are kept; de-duplication only happens in blog-wide tag listings.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Render labels back into the comma-separated form used by edit forms
pub fn join_tags(tags: &[String]) -> String {
    tags.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tags() {
        assert_eq!(split_tags("b, a"), vec!["b", "a"]);
        assert_eq!(split_tags(" rust ,, web ,"), vec!["rust", "web"]);
        assert!(split_tags("").is_empty());
        assert!(split_tags(" , ").is_empty());
    }

    #[test]
    fn test_split_keeps_duplicates() {
        assert_eq!(split_tags("a, a"), vec!["a", "a"]);
    }

    #[test]
    fn test_normalize_trims_only() {
        let tags = normalize_tags(&[" a ", "b", "  "]);
        assert_eq!(tags, vec!["a", "b", ""]);
    }

    #[test]
    fn test_join_tags() {
        assert_eq!(join_tags(&["a".to_string(), "b".to_string()]), "a, b");
    }
}

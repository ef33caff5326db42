//! URL and company-name canonicalization used by deduplication and
//! enrichment. Pure functions, no provider calls.

use url::Url;

/// Corporate suffix tokens stripped during name normalization. Empirical
/// list carried over from production; tune alongside the similarity
/// threshold in `PipelineConfig`, not here alone.
const CORPORATE_SUFFIXES: &[&str] = &["inc", "corp", "llc", "ltd", "limited", "group"];

/// Reduce a URL to its bare host for duplicate detection: scheme gone,
/// leading `www.` gone, path and trailing slash gone.
///
/// `https://www.lithia.com/california` and `https://lithia.com` both
/// normalize to `lithia.com`.
pub fn normalize_url_host(raw: &str) -> String {
    let host = extract_domain(raw);
    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    host.trim_end_matches('/').to_string()
}

/// Pull the host out of a URL string. Tolerates scheme-less input like
/// `lithia.com/about`. Returns an empty string when nothing host-like is
/// present.
pub fn extract_domain(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if let Ok(url) = Url::parse(trimmed) {
        if let Some(host) = url.host_str() {
            return host.to_string();
        }
    }

    // No scheme: take everything up to the first slash.
    let candidate = trimmed
        .split('/')
        .next()
        .unwrap_or_default()
        .trim();
    if candidate.contains('.') && !candidate.contains(' ') {
        candidate.to_string()
    } else {
        String::new()
    }
}

/// Canonicalize a company name for fuzzy comparison: lowercase, corporate
/// suffixes removed, only alphanumerics kept.
pub fn normalize_company_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let kept: Vec<&str> = lowered
        .split_whitespace()
        .filter(|token| {
            let bare: String = token.chars().filter(|c| c.is_alphanumeric()).collect();
            !CORPORATE_SUFFIXES.contains(&bare.as_str())
        })
        .collect();
    kept.join("")
        .chars()
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Two normalized names are "similar" when one contains the other, or
/// their normalized Levenshtein ratio exceeds `threshold`. Both rules are
/// contract points for reproducible dedup; the threshold itself is a
/// tunable (see `PipelineConfig::name_similarity_threshold`).
pub fn names_similar(a: &str, b: &str, threshold: f64) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a.contains(b) || b.contains(a) {
        return true;
    }
    strsim::normalized_levenshtein(a, b) > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_host_drops_scheme_www_and_path() {
        assert_eq!(
            normalize_url_host("https://www.lithia.com/california"),
            "lithia.com"
        );
        assert_eq!(normalize_url_host("https://lithia.com"), "lithia.com");
        assert_eq!(normalize_url_host("http://Example.COM/"), "example.com");
        assert_eq!(normalize_url_host("vanhorn.com/locations"), "vanhorn.com");
    }

    #[test]
    fn extract_domain_handles_schemeless_and_garbage() {
        assert_eq!(extract_domain("https://www.foo.org/bar"), "www.foo.org");
        assert_eq!(extract_domain("foo.org/bar"), "foo.org");
        assert_eq!(extract_domain("not a url"), "");
        assert_eq!(extract_domain(""), "");
    }

    #[test]
    fn name_normalization_strips_suffixes_and_punctuation() {
        assert_eq!(normalize_company_name("Lithia Motors, Inc."), "lithiamotors");
        assert_eq!(normalize_company_name("Van Horn Group"), "vanhorn");
        assert_eq!(normalize_company_name("ACME Corp"), "acme");
        assert_eq!(normalize_company_name("Sonic Automotive"), "sonicautomotive");
    }

    #[test]
    fn suffix_stripping_is_token_based() {
        // "Incline" contains "inc" but is not a suffix token.
        assert_eq!(normalize_company_name("Incline Motors"), "inclinemotors");
    }

    #[test]
    fn substring_names_are_similar() {
        let a = normalize_company_name("Lithia Motors Inc");
        let b = normalize_company_name("Lithia");
        assert!(names_similar(&a, &b, 0.8));
    }

    #[test]
    fn near_identical_names_are_similar_at_threshold() {
        assert!(names_similar("lithiamotors", "lithiamotor", 0.8));
        assert!(!names_similar("lithiamotors", "sonicautomotive", 0.8));
    }

    #[test]
    fn empty_names_never_match() {
        assert!(!names_similar("", "lithia", 0.8));
        assert!(!names_similar("lithia", "", 0.8));
    }

    #[test]
    fn threshold_is_respected() {
        // One edit apart on short strings: ratio 0.8 exactly with len 5.
        // Strictly-greater comparison means 0.8 does not pass at 0.8.
        let sim = strsim::normalized_levenshtein("abcde", "abcdx");
        assert!((sim - 0.8).abs() < 1e-9);
        assert!(!names_similar("abcde", "abcdx", 0.8));
        assert!(names_similar("abcde", "abcdx", 0.79));
    }
}

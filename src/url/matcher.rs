/// Checks if a domain matches a glob pattern
///
/// `*` matches any run of characters, including dots, so a single pattern can
/// cover every TLD and subdomain of a site:
///
/// 1. Exact match: "etherscan.io" matches only "etherscan.io"
/// 2. Subdomain match: "*.etherscan.io" matches "etherscan.io" itself as well as
///    "api.etherscan.io"
/// 3. Free-form match: "*etherscan.*" matches "etherscan.io", "etherscan.com"
///    and "goerli.etherscan.io"
///
/// Matching is ASCII case-insensitive.
///
/// # Examples
///
/// ```
/// use token_sifter::url::matches_glob;
///
/// assert!(matches_glob("*etherscan.*", "etherscan.io"));
/// assert!(matches_glob("*etherscan.*", "goerli.etherscan.io"));
/// assert!(matches_glob("*.example.com", "example.com"));
/// assert!(!matches_glob("*etherscan.*", "bscscan.com"));
/// ```
pub fn matches_glob(pattern: &str, candidate: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let candidate = candidate.to_ascii_lowercase();

    if let Some(base) = pattern.strip_prefix("*.") {
        if candidate == base {
            return true;
        }
    }

    glob_match(pattern.as_bytes(), candidate.as_bytes())
}

/// Iterative wildcard match with single-star backtracking
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut star_text = 0;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            star = Some(p);
            star_text = t;
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some(star_pos) = star {
            p = star_pos + 1;
            star_text += 1;
            t = star_text;
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}

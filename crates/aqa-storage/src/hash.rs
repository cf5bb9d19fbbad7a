//! Plan cache fingerprinting.

use sha2::{Digest, Sha256};

/// `requirement|base_url[|provider:X][|model:Y]`, each component trimmed and
/// lowercased, hashed with SHA-256, truncated to the first 16 hex chars.
pub fn fingerprint(requirement: &str, base_url: &str, provider: Option<&str>, model: Option<&str>) -> String {
    let mut parts = vec![
        requirement.trim().to_lowercase(),
        base_url.trim().to_lowercase(),
    ];
    if let Some(p) = provider {
        parts.push(format!("provider:{}", p.trim().to_lowercase()));
    }
    if let Some(m) = model {
        parts.push(format!("model:{}", m.trim().to_lowercase()));
    }
    let normalized = parts.join("|");

    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    let digest = hasher.finalize();
    let hex = digest.iter().map(|b| format!("{b:02x}")).collect::<String>();
    hex[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_stable_and_case_insensitive() {
        let a = fingerprint("Test API Login", "HTTPS://api.example.com/ ", None, None);
        let b = fingerprint("test api login", "https://api.example.com/", None, None);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn provider_and_model_change_the_fingerprint() {
        let bare = fingerprint("req", "url", None, None);
        let with_provider = fingerprint("req", "url", Some("openai"), None);
        let with_both = fingerprint("req", "url", Some("openai"), Some("gpt-5"));
        assert_ne!(bare, with_provider);
        assert_ne!(with_provider, with_both);
    }
}

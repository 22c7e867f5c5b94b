//! Request identification headers shared by page and image fetches.
//!
//! Target sites commonly refuse non-browser clients for media, so both the
//! extractor and the download engine present as a desktop browser.

/// Browser User-Agent sent on every request.
pub(crate) const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// `Accept` header for image requests.
pub(crate) const IMAGE_ACCEPT: &str = "image/webp,*/*";

/// `Accept-Language` header for image requests (Thai first, then English).
pub(crate) const ACCEPT_LANGUAGE: &str = "th-TH,th;q=0.9,en-US;q=0.8,en;q=0.7";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_user_agent_looks_like_a_browser() {
        assert!(BROWSER_USER_AGENT.starts_with("Mozilla/5.0"));
        assert!(BROWSER_USER_AGENT.contains("Chrome"));
        assert!(!BROWSER_USER_AGENT.contains("  "));
    }
}

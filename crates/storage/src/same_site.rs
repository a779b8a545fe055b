//! User agents that mishandle `SameSite=None`.
//!
//! Affected clients either reject the cookie outright or treat `None` as
//! `Strict`, so the attribute is left off for them.  Kept as data so new
//! entries do not touch the write path.

/// A user-agent pattern.  Matches when every `contains_all` substring is
/// present, the UA ends with `ends_with` (if set), and no `excludes`
/// substring is present.
#[derive(Debug, Clone, Copy)]
pub struct UaRule {
    pub name: &'static str,
    pub contains_all: &'static [&'static str],
    pub ends_with: Option<&'static str>,
    pub excludes: &'static [&'static str],
}

impl UaRule {
    pub fn matches(&self, user_agent: &str) -> bool {
        self.contains_all.iter().all(|s| user_agent.contains(s))
            && self.ends_with.map_or(true, |s| user_agent.ends_with(s))
            && !self.excludes.iter().any(|s| user_agent.contains(s))
    }
}

const fn contains(name: &'static str, contains_all: &'static [&'static str]) -> UaRule {
    UaRule {
        name,
        contains_all,
        ends_with: None,
        excludes: &[],
    }
}

pub static SAME_SITE_NONE_EXCEPTIONS: &[UaRule] = &[
    // Everything on the iOS 12 networking stack: Safari, WKWebView, Chrome.
    contains("ios12-iphone", &["CPU iPhone OS 12"]),
    contains("ios12-ipad", &["iPad; CPU OS 12"]),
    // Safari on macOS 10.14.
    contains(
        "macos1014-safari",
        &["Macintosh; Intel Mac OS X 10_14", "Version/", "Safari"],
    ),
    // Embedded browsers on macOS 10.14.
    UaRule {
        name: "macos1014-webview",
        contains_all: &["Macintosh; Intel Mac OS X 10_14"],
        ends_with: Some("AppleWebKit/605.1.15 (KHTML, like Gecko)"),
        excludes: &[],
    },
    // Chrome 50-69.
    contains("chrome5x", &["Chrome/5"]),
    contains("chrome6x", &["Chrome/6"]),
    // Unreal Engine before 4.23 runs Chromium 59 without saying so.
    UaRule {
        name: "unreal-engine",
        contains_all: &["UnrealEngine"],
        ends_with: None,
        excludes: &["Chrome"],
    },
    // UC Browser before 12.13.2.
    contains("ucbrowser12", &["UCBrowser/12"]),
    contains("ucbrowser11", &["UCBrowser/11"]),
];

/// The first exception rule matching `user_agent`, if any.
pub fn matching_rule(user_agent: &str) -> Option<&'static UaRule> {
    SAME_SITE_NONE_EXCEPTIONS
        .iter()
        .find(|rule| rule.matches(user_agent))
}

pub fn ua_disallows_same_site_none(user_agent: &str) -> bool {
    matching_rule(user_agent).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ios12_is_excluded() {
        let ua = "Mozilla/5.0 (iPhone; CPU iPhone OS 12_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/12.0 Mobile/15E148 Safari/604.1";
        assert_eq!(matching_rule(ua).map(|r| r.name), Some("ios12-iphone"));
    }

    #[test]
    fn ipad_ios12_is_excluded() {
        let ua = "Mozilla/5.0 (iPad; CPU OS 12_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Mobile/15E148";
        assert!(ua_disallows_same_site_none(ua));
    }

    #[test]
    fn mojave_safari_is_excluded() {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/12.1.2 Safari/605.1.15";
        assert!(ua_disallows_same_site_none(ua));
    }

    #[test]
    fn mojave_webview_is_excluded() {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_6) AppleWebKit/605.1.15 (KHTML, like Gecko)";
        assert_eq!(matching_rule(ua).map(|r| r.name), Some("macos1014-webview"));
    }

    #[test]
    fn mojave_chrome_is_allowed() {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/85.0.4183.121 Safari/537.36";
        assert!(!ua_disallows_same_site_none(ua));
    }

    #[test]
    fn old_chrome_is_excluded() {
        let ua = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/67.0.3396.99 Safari/537.36";
        assert!(ua_disallows_same_site_none(ua));
    }

    #[test]
    fn unreal_without_chrome_is_excluded() {
        assert!(ua_disallows_same_site_none("Mozilla/5.0 UnrealEngine/4.22"));
        assert!(!ua_disallows_same_site_none(
            "Mozilla/5.0 UnrealEngine/4.23 Chrome/72.0.3626.121"
        ));
    }

    #[test]
    fn uc_browser_11_and_12_are_excluded() {
        assert!(ua_disallows_same_site_none("Mozilla/5.0 UCBrowser/12.10.8.1172"));
        assert!(ua_disallows_same_site_none("Mozilla/5.0 UCBrowser/11.3.8.976"));
        assert!(!ua_disallows_same_site_none("Mozilla/5.0 UCBrowser/13.0.0.0"));
    }

    #[test]
    fn modern_firefox_is_allowed() {
        let ua = "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";
        assert!(!ua_disallows_same_site_none(ua));
    }
}

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Host environment
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Facts about the page hosting the stores.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// User agent of the hosting browser, checked against the SameSite
    /// exception table.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// `true` when the page was served over `https:`.  Only secure pages get
    /// the `secure` and `SameSite=None` cookie attributes.
    #[serde(default)]
    pub secure_context: bool,
}

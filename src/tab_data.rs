/// Tab and window data structures exchanged with the host tabs API
use serde::{Deserialize, Serialize};

/// Information about a browser tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabInfo {
    pub id: i32,
    pub index: u32,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub title: String,
}

/// A browser window populated with its tabs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: i32,
    #[serde(default)]
    pub tabs: Vec<TabInfo>,
}

impl WindowInfo {
    pub fn active_tab(&self) -> Option<&TabInfo> {
        self.tabs.iter().find(|tab| tab.active)
    }
}

/// Properties for `tabs.create`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTabProperties {
    pub url: String,
    pub index: u32,
    pub active: bool,
}

/// Tabs to create for an `open` request: appended after `existing_tabs`, in
/// input order, only the first one active unless opened in the background
pub fn plan_open(urls: &[String], existing_tabs: usize, background: bool) -> Vec<CreateTabProperties> {
    urls.iter()
        .enumerate()
        .map(|(offset, url)| CreateTabProperties {
            url: url.clone(),
            index: (existing_tabs + offset) as u32,
            active: !background && offset == 0,
        })
        .collect()
}

//! Host platform boundary.
//!
//! Everything the background process needs from the browser goes through the
//! traits below. The wasm build implements them over `bridge.js`
//! (see `browser`); tests implement them in memory.
//!
//! The runtime is single-threaded, so none of these futures are `Send`.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::bookmarks::{BookmarkNode, CreateDetails, Destination};
use crate::error::Result;
use crate::tab_data::{CreateTabProperties, TabInfo, WindowInfo};

/// The host bookmark store
#[async_trait(?Send)]
pub trait Bookmarks {
    /// The whole tree, as a list of root nodes
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>>;

    /// The node `id` with all of its descendants
    async fn get_subtree(&self, id: &str) -> Result<Vec<BookmarkNode>>;

    async fn create(&self, details: &CreateDetails) -> Result<BookmarkNode>;

    async fn move_node(&self, id: &str, destination: &Destination) -> Result<BookmarkNode>;
}

/// Tab and window management
#[async_trait(?Send)]
pub trait Tabs {
    /// The current window, populated with its tabs
    async fn current_window(&self) -> Result<WindowInfo>;

    async fn update_url(&self, tab_id: i32, url: &str) -> Result<TabInfo>;

    async fn create_tab(&self, properties: &CreateTabProperties) -> Result<TabInfo>;
}

/// Extension runtime: messaging and self-description
#[async_trait(?Send)]
pub trait Runtime {
    /// Send a one-shot message to every extension page listening on the runtime bus
    async fn send_message(&self, message: &Value) -> Result<Value>;

    /// Send a one-shot message to another extension
    async fn send_external(&self, extension_id: &str, message: &Value) -> Result<Value>;

    /// Localized extension name
    fn extension_name(&self) -> String;

    /// The `icons` entry of the manifest
    fn manifest_icons(&self) -> Value;

    /// Base URL of this extension's pages, e.g. `moz-extension://<uuid>/`
    fn base_url(&self) -> String;
}

/// Persistent storage backing the configuration store
#[async_trait(?Send)]
pub trait ConfigStorage {
    async fn load(&self) -> Result<Map<String, Value>>;

    async fn save(&self, key: &str, value: &Value) -> Result<()>;
}

/// One end of a long-lived channel to a panel page
pub trait PanelPort {
    fn post_message(&self, message: &Value) -> Result<()>;
}

/// Everything the dispatcher talks to
pub trait Host: Bookmarks + Tabs + Runtime + ConfigStorage {}

impl<T: Bookmarks + Tabs + Runtime + ConfigStorage> Host for T {}

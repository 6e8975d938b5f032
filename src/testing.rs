/// In-memory host used by the unit tests
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};

use crate::bookmarks::{BookmarkNode, BookmarkType, CreateDetails, Destination};
use crate::error::{Error, Result};
use crate::host::{Bookmarks, ConfigStorage, PanelPort, Runtime, Tabs};
use crate::tab_data::{CreateTabProperties, TabInfo, WindowInfo};

pub const ROOT_ID: &str = "root________";
pub const TOOLBAR_ID: &str = "toolbar_____";
pub const UNFILED_ID: &str = "unfiled_____";

struct Record {
    node: BookmarkNode,
    children: Vec<String>,
}

struct State {
    nodes: HashMap<String, Record>,
    next_id: u32,
    create_calls: Vec<CreateDetails>,
    created_ids: Vec<String>,
    window: WindowInfo,
    next_tab_id: i32,
    tab_creations: Vec<CreateTabProperties>,
    runtime_messages: Vec<Value>,
    external_messages: Vec<(String, Value)>,
    peer_installed: bool,
    runtime_listeners: bool,
    base_url: String,
    stored: Map<String, Value>,
    storage_loads: usize,
    failing_saves: Vec<String>,
}

impl State {
    fn insert(&mut self, details: &CreateDetails) -> Result<String> {
        let parent_is_folder = self
            .nodes
            .get(&details.parent_id)
            .is_some_and(|parent| parent.node.kind == BookmarkType::Folder);
        if !parent_is_folder {
            return Err(Error::Host(format!("Invalid bookmark parent: {}", details.parent_id)));
        }

        self.next_id += 1;
        let id = format!("node-{}", self.next_id);
        let kind = details.kind.unwrap_or(if details.url.is_some() {
            BookmarkType::Bookmark
        } else {
            BookmarkType::Folder
        });
        let node = BookmarkNode {
            id: id.clone(),
            parent_id: Some(details.parent_id.clone()),
            title: details.title.clone(),
            url: details.url.clone(),
            kind,
            index: None,
            date_added: Some(1698508200000.0),
            children: None,
        };
        self.nodes.insert(id.clone(), Record { node, children: Vec::new() });
        self.attach(&id, &details.parent_id, details.index);
        Ok(id)
    }

    fn attach(&mut self, id: &str, parent_id: &str, index: Option<u32>) {
        if let Some(parent) = self.nodes.get_mut(parent_id) {
            let position = index.map_or(parent.children.len(), |i| (i as usize).min(parent.children.len()));
            parent.children.insert(position, id.to_string());
        }
        if let Some(record) = self.nodes.get_mut(id) {
            record.node.parent_id = Some(parent_id.to_string());
        }
    }

    fn detach(&mut self, id: &str) {
        let Some(parent_id) = self.nodes.get(id).and_then(|r| r.node.parent_id.clone()) else {
            return;
        };
        if let Some(parent) = self.nodes.get_mut(&parent_id) {
            parent.children.retain(|child| child != id);
        }
    }

    fn build(&self, id: &str) -> Option<BookmarkNode> {
        let record = self.nodes.get(id)?;
        let mut node = record.node.clone();
        node.index = node
            .parent_id
            .as_ref()
            .and_then(|p| self.nodes.get(p))
            .and_then(|parent| parent.children.iter().position(|c| c == id))
            .map(|i| i as u32);
        if node.kind == BookmarkType::Folder {
            node.children = Some(record.children.iter().filter_map(|c| self.build(c)).collect());
        }
        Some(node)
    }
}

/// Bookmarks, tabs, runtime and storage kept in memory, recording every call
pub struct MockHost {
    state: RefCell<State>,
}

impl MockHost {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        for (id, parent, title) in [
            (ROOT_ID, None, ""),
            (TOOLBAR_ID, Some(ROOT_ID), "Bookmarks Toolbar"),
            (UNFILED_ID, Some(ROOT_ID), "Other Bookmarks"),
        ] {
            let node = BookmarkNode {
                id: id.to_string(),
                parent_id: parent.map(str::to_string),
                title: title.to_string(),
                url: None,
                kind: BookmarkType::Folder,
                index: None,
                date_added: None,
                children: None,
            };
            nodes.insert(id.to_string(), Record { node, children: Vec::new() });
        }
        if let Some(root) = nodes.get_mut(ROOT_ID) {
            root.children = vec![TOOLBAR_ID.to_string(), UNFILED_ID.to_string()];
        }

        MockHost {
            state: RefCell::new(State {
                nodes,
                next_id: 0,
                create_calls: Vec::new(),
                created_ids: Vec::new(),
                window: WindowInfo { id: 1, tabs: Vec::new() },
                next_tab_id: 100,
                tab_creations: Vec::new(),
                runtime_messages: Vec::new(),
                external_messages: Vec::new(),
                peer_installed: true,
                runtime_listeners: true,
                base_url: "moz-extension://0b7c5a2e-test/".to_string(),
                stored: Map::new(),
                storage_loads: 0,
                failing_saves: Vec::new(),
            }),
        }
    }

    fn seed(&self, parent_id: &str, title: &str, kind: BookmarkType, url: Option<&str>) -> String {
        let details = CreateDetails {
            parent_id: parent_id.to_string(),
            title: title.to_string(),
            kind: Some(kind),
            url: url.map(str::to_string),
            index: None,
        };
        self.state.borrow_mut().insert(&details).unwrap()
    }

    pub fn add_folder(&self, parent_id: &str, title: &str) -> String {
        self.seed(parent_id, title, BookmarkType::Folder, None)
    }

    pub fn add_bookmark(&self, parent_id: &str, title: &str, url: &str) -> String {
        self.seed(parent_id, title, BookmarkType::Bookmark, Some(url))
    }

    pub fn add_separator(&self, parent_id: &str) -> String {
        self.seed(parent_id, "", BookmarkType::Separator, None)
    }

    pub fn subtree(&self, id: &str) -> BookmarkNode {
        self.state.borrow().build(id).unwrap()
    }

    pub fn subtree_ids(&self, id: &str) -> Vec<String> {
        fn collect(node: &BookmarkNode, out: &mut Vec<String>) {
            out.push(node.id.clone());
            for child in node.children() {
                collect(child, out);
            }
        }
        let mut ids = Vec::new();
        collect(&self.subtree(id), &mut ids);
        ids
    }

    pub fn create_calls(&self) -> Vec<CreateDetails> {
        self.state.borrow().create_calls.clone()
    }

    pub fn created_ids(&self) -> Vec<String> {
        self.state.borrow().created_ids.clone()
    }

    /// Fill the current window with tabs, `active` being the index of the active one
    pub fn open_tabs(&self, urls: &[&str], active: usize) {
        let mut state = self.state.borrow_mut();
        for (index, url) in urls.iter().enumerate() {
            state.next_tab_id += 1;
            let tab = TabInfo {
                id: state.next_tab_id,
                index: index as u32,
                active: index == active,
                url: Some(url.to_string()),
                title: String::new(),
            };
            state.window.tabs.push(tab);
        }
    }

    pub fn window(&self) -> WindowInfo {
        self.state.borrow().window.clone()
    }

    pub fn tab_creations(&self) -> Vec<CreateTabProperties> {
        self.state.borrow().tab_creations.clone()
    }

    pub fn runtime_messages(&self) -> Vec<Value> {
        self.state.borrow().runtime_messages.clone()
    }

    pub fn external_messages(&self) -> Vec<(String, Value)> {
        self.state.borrow().external_messages.clone()
    }

    pub fn set_peer_installed(&self, installed: bool) {
        self.state.borrow_mut().peer_installed = installed;
    }

    pub fn set_runtime_listeners(&self, listening: bool) {
        self.state.borrow_mut().runtime_listeners = listening;
    }

    pub fn set_base_url(&self, url: &str) {
        self.state.borrow_mut().base_url = url.to_string();
    }

    pub fn store_config(&self, key: &str, value: Value) {
        self.state.borrow_mut().stored.insert(key.to_string(), value);
    }

    pub fn stored_config(&self, key: &str) -> Option<Value> {
        self.state.borrow().stored.get(key).cloned()
    }

    /// Make every later `save` of `key` fail
    pub fn fail_saves_for(&self, key: &str) {
        self.state.borrow_mut().failing_saves.push(key.to_string());
    }

    pub fn storage_loads(&self) -> usize {
        self.state.borrow().storage_loads
    }
}

#[async_trait(?Send)]
impl Bookmarks for MockHost {
    async fn get_tree(&self) -> Result<Vec<BookmarkNode>> {
        Ok(self.state.borrow().build(ROOT_ID).into_iter().collect())
    }

    async fn get_subtree(&self, id: &str) -> Result<Vec<BookmarkNode>> {
        self.state
            .borrow()
            .build(id)
            .map(|node| vec![node])
            .ok_or_else(|| Error::Host(format!("Bookmark not found: {}", id)))
    }

    async fn create(&self, details: &CreateDetails) -> Result<BookmarkNode> {
        let mut state = self.state.borrow_mut();
        state.create_calls.push(details.clone());
        let id = state.insert(details)?;
        state.created_ids.push(id.clone());
        state.build(&id).ok_or(Error::NotFound(id))
    }

    async fn move_node(&self, id: &str, destination: &Destination) -> Result<BookmarkNode> {
        let mut state = self.state.borrow_mut();
        if !state.nodes.contains_key(id) {
            return Err(Error::Host(format!("Bookmark not found: {}", id)));
        }
        if !state.nodes.contains_key(&destination.parent_id) {
            return Err(Error::Host(format!("Invalid bookmark parent: {}", destination.parent_id)));
        }
        state.detach(id);
        state.attach(id, &destination.parent_id, destination.index);
        state.build(id).ok_or_else(|| Error::NotFound(id.to_string()))
    }
}

#[async_trait(?Send)]
impl Tabs for MockHost {
    async fn current_window(&self) -> Result<WindowInfo> {
        Ok(self.state.borrow().window.clone())
    }

    async fn update_url(&self, tab_id: i32, url: &str) -> Result<TabInfo> {
        let mut state = self.state.borrow_mut();
        let tab = state
            .window
            .tabs
            .iter_mut()
            .find(|tab| tab.id == tab_id)
            .ok_or_else(|| Error::Host(format!("Invalid tab ID: {}", tab_id)))?;
        tab.url = Some(url.to_string());
        Ok(tab.clone())
    }

    async fn create_tab(&self, properties: &CreateTabProperties) -> Result<TabInfo> {
        let mut state = self.state.borrow_mut();
        state.tab_creations.push(properties.clone());
        state.next_tab_id += 1;
        let tab = TabInfo {
            id: state.next_tab_id,
            index: properties.index,
            active: properties.active,
            url: Some(properties.url.clone()),
            title: String::new(),
        };
        let tabs = &mut state.window.tabs;
        if tab.active {
            tabs.iter_mut().for_each(|t| t.active = false);
        }
        let position = (properties.index as usize).min(tabs.len());
        tabs.insert(position, tab.clone());
        for (index, t) in tabs.iter_mut().enumerate() {
            t.index = index as u32;
        }
        Ok(tab)
    }
}

#[async_trait(?Send)]
impl Runtime for MockHost {
    async fn send_message(&self, message: &Value) -> Result<Value> {
        let mut state = self.state.borrow_mut();
        if !state.runtime_listeners {
            return Err(Error::Host("Could not establish connection. Receiving end does not exist.".to_string()));
        }
        state.runtime_messages.push(message.clone());
        Ok(Value::Null)
    }

    async fn send_external(&self, extension_id: &str, message: &Value) -> Result<Value> {
        let mut state = self.state.borrow_mut();
        if !state.peer_installed {
            return Err(Error::Host("Could not establish connection. Receiving end does not exist.".to_string()));
        }
        state.external_messages.push((extension_id.to_string(), message.clone()));
        Ok(json!(true))
    }

    fn extension_name(&self) -> String {
        "Bookmarks Panel".to_string()
    }

    fn manifest_icons(&self) -> Value {
        json!({ "32": "/resources/icon.svg" })
    }

    fn base_url(&self) -> String {
        self.state.borrow().base_url.clone()
    }
}

#[async_trait(?Send)]
impl ConfigStorage for MockHost {
    async fn load(&self) -> Result<Map<String, Value>> {
        let mut state = self.state.borrow_mut();
        state.storage_loads += 1;
        Ok(state.stored.clone())
    }

    async fn save(&self, key: &str, value: &Value) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if state.failing_saves.iter().any(|k| k == key) {
            return Err(Error::Host(format!("QuotaExceededError while saving {}", key)));
        }
        state.stored.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// A panel port that records what it receives
pub struct RecordingPort {
    received: RefCell<Vec<Value>>,
    closed: bool,
    on_delivery: Option<Box<dyn Fn()>>,
}

impl RecordingPort {
    fn build(closed: bool, on_delivery: Option<Box<dyn Fn()>>) -> Rc<Self> {
        Rc::new(RecordingPort {
            received: RefCell::new(Vec::new()),
            closed,
            on_delivery,
        })
    }

    pub fn new() -> Rc<Self> {
        Self::build(false, None)
    }

    /// A port whose other end is gone
    pub fn closed() -> Rc<Self> {
        Self::build(true, None)
    }

    /// A port that runs `hook` after each delivery
    pub fn on_delivery(hook: impl Fn() + 'static) -> Rc<Self> {
        Self::build(false, Some(Box::new(hook)))
    }

    pub fn received(&self) -> Vec<Value> {
        self.received.borrow().clone()
    }
}

impl PanelPort for RecordingPort {
    fn post_message(&self, message: &Value) -> Result<()> {
        if self.closed {
            return Err(Error::Closed("Attempt to postMessage on disconnected port".to_string()));
        }
        self.received.borrow_mut().push(message.clone());
        if let Some(hook) = &self.on_delivery {
            hook();
        }
        Ok(())
    }
}

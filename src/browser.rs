/// Host traits implemented over the WebExtension APIs exposed by `bridge.js`
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::bookmarks::{BookmarkNode, CreateDetails, Destination};
use crate::error::{self, Error};
use crate::host::{Bookmarks, ConfigStorage, PanelPort, Runtime, Tabs};
use crate::tab_data::{CreateTabProperties, TabInfo, WindowInfo};

// Import JS bridge functions
#[wasm_bindgen(module = "/bridge.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn getTree() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getSubTree(id: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn createBookmark(details: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn moveBookmark(id: &str, destination: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn getCurrentWindow() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn updateTabUrl(tab_id: i32, url: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn createTab(properties: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendRuntimeMessage(message: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn sendExternalMessage(extension_id: &str, message: JsValue) -> Result<JsValue, JsValue>;

    fn getExtensionName() -> String;

    fn getManifestIcons() -> JsValue;

    #[wasm_bindgen(catch)]
    async fn getStorage() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn setStorage(key: &str, value: JsValue) -> Result<(), JsValue>;
}

#[wasm_bindgen]
extern "C" {
    /// A `runtime.Port` opened by a panel page
    pub type Port;

    #[wasm_bindgen(method, catch, js_name = postMessage)]
    fn post_message(this: &Port, message: &JsValue) -> Result<(), JsValue>;
}

/// Plain JS objects, never `Map`s, so the host APIs accept them
pub fn to_js<T: Serialize + ?Sized>(value: &T) -> error::Result<JsValue> {
    Ok(value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

pub fn from_js<T: DeserializeOwned>(value: JsValue) -> error::Result<T> {
    Ok(serde_wasm_bindgen::from_value(value)?)
}

pub fn host_error(error: JsValue) -> Error {
    match error.dyn_ref::<js_sys::Error>() {
        Some(e) => Error::Host(String::from(e.message())),
        None => Error::Host(error.as_string().unwrap_or_else(|| format!("{:?}", error))),
    }
}

/// The real browser
pub struct BrowserHost;

#[async_trait(?Send)]
impl Bookmarks for BrowserHost {
    async fn get_tree(&self) -> error::Result<Vec<BookmarkNode>> {
        from_js(getTree().await.map_err(host_error)?)
    }

    async fn get_subtree(&self, id: &str) -> error::Result<Vec<BookmarkNode>> {
        from_js(getSubTree(id).await.map_err(host_error)?)
    }

    async fn create(&self, details: &CreateDetails) -> error::Result<BookmarkNode> {
        from_js(createBookmark(to_js(details)?).await.map_err(host_error)?)
    }

    async fn move_node(&self, id: &str, destination: &Destination) -> error::Result<BookmarkNode> {
        from_js(moveBookmark(id, to_js(destination)?).await.map_err(host_error)?)
    }
}

#[async_trait(?Send)]
impl Tabs for BrowserHost {
    async fn current_window(&self) -> error::Result<WindowInfo> {
        from_js(getCurrentWindow().await.map_err(host_error)?)
    }

    async fn update_url(&self, tab_id: i32, url: &str) -> error::Result<TabInfo> {
        from_js(updateTabUrl(tab_id, url).await.map_err(host_error)?)
    }

    async fn create_tab(&self, properties: &CreateTabProperties) -> error::Result<TabInfo> {
        from_js(createTab(to_js(properties)?).await.map_err(host_error)?)
    }
}

#[async_trait(?Send)]
impl Runtime for BrowserHost {
    async fn send_message(&self, message: &Value) -> error::Result<Value> {
        let reply = sendRuntimeMessage(to_js(message)?).await.map_err(host_error)?;
        if reply.is_undefined() {
            return Ok(Value::Null);
        }
        from_js(reply)
    }

    async fn send_external(&self, extension_id: &str, message: &Value) -> error::Result<Value> {
        let reply = sendExternalMessage(extension_id, to_js(message)?)
            .await
            .map_err(host_error)?;
        if reply.is_undefined() {
            return Ok(Value::Null);
        }
        from_js(reply)
    }

    fn extension_name(&self) -> String {
        getExtensionName()
    }

    fn manifest_icons(&self) -> Value {
        from_js(getManifestIcons()).unwrap_or(Value::Null)
    }

    fn base_url(&self) -> String {
        web_sys::window()
            .and_then(|window| {
                let location = window.location();
                Some(format!("{}//{}/", location.protocol().ok()?, location.host().ok()?))
            })
            .unwrap_or_default()
    }
}

#[async_trait(?Send)]
impl ConfigStorage for BrowserHost {
    async fn load(&self) -> error::Result<Map<String, Value>> {
        let stored = getStorage().await.map_err(host_error)?;
        if stored.is_null() || stored.is_undefined() {
            return Ok(Map::new());
        }
        from_js(stored)
    }

    async fn save(&self, key: &str, value: &Value) -> error::Result<()> {
        setStorage(key, to_js(value)?).await.map_err(host_error)
    }
}

/// A panel port wrapped for the connection registry
pub struct BrowserPort(pub Port);

impl PanelPort for BrowserPort {
    fn post_message(&self, message: &Value) -> error::Result<()> {
        self.0
            .post_message(&to_js(message)?)
            .map_err(|e| Error::Closed(format!("{:?}", e)))
    }
}

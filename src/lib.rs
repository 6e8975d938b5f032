/// Bookmarks Panel - background process of the bookmarks sidebar extension
/// Built with Rust + WASM; `bridge.js` forwards browser events to the exports below

pub mod bookmarks;
pub mod browser;
pub mod config;
pub mod connections;
pub mod copier;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod messages;
pub mod registration;
pub mod tab_data;

#[cfg(test)]
mod testing;

use std::rc::Rc;

use log::{debug, error};
use serde_json::Value;
use uuid::Uuid;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use browser::{BrowserHost, BrowserPort, Port, from_js, to_js};
use dispatcher::{Background, expects_reply};
use messages::{BookmarkEvent, Command};

thread_local! {
    static BACKGROUND: Rc<Background<BrowserHost>> = Rc::new(Background::new(Rc::new(BrowserHost)));
}

fn background() -> Rc<Background<BrowserHost>> {
    BACKGROUND.with(Rc::clone)
}

// Set up panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::default());
}

/// Load configs, notify panels and register with the external peer.
/// Called by the glue once every listener is attached.
#[wasm_bindgen]
pub fn start_background() {
    let background = background();
    spawn_local(async move { background.start().await });
}

/// `runtime.onMessage` entry point.
///
/// Returns a promise for commands that reply and `undefined` otherwise, so
/// other listeners stay free to answer.
#[wasm_bindgen]
pub fn on_message(message: JsValue) -> JsValue {
    let command = match from_js::<Value>(message).and_then(Command::parse) {
        Ok(Some(command)) => command,
        Ok(None) => return JsValue::UNDEFINED,
        Err(e) => {
            error!("malformed message: {}", e);
            return JsValue::UNDEFINED;
        }
    };

    let background = background();
    if !expects_reply(&command) {
        spawn_local(async move { background.perform(command).await });
        return JsValue::UNDEFINED;
    }

    future_to_promise(async move {
        let reply = background
            .execute(command)
            .await
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        to_js(&reply.unwrap_or(Value::Null)).map_err(|e| JsValue::from_str(&e.to_string()))
    })
    .into()
}

/// `runtime.onConnect` entry point; the returned id identifies the port later
#[wasm_bindgen]
pub fn on_connect(port: Port) -> String {
    background().connections().connect(Rc::new(BrowserPort(port))).to_string()
}

#[wasm_bindgen]
pub fn on_port_message(message: JsValue) {
    match from_js::<Value>(message) {
        Ok(message) => {
            let background = background();
            spawn_local(async move { background.handle_port_message(message).await });
        }
        Err(e) => error!("malformed port message: {}", e),
    }
}

#[wasm_bindgen]
pub fn on_disconnect(connection_id: &str) {
    match Uuid::parse_str(connection_id) {
        Ok(id) => {
            background().connections().disconnect(&id);
        }
        Err(e) => debug!("unknown connection {}: {}", connection_id, e),
    }
}

/// `bookmarks.on{Created,Removed,Moved,Changed}` entry point
#[wasm_bindgen]
pub fn on_bookmark_event(event: &str, id: String, detail: JsValue) {
    let Some(event) = BookmarkEvent::from_name(event) else {
        debug!("ignoring bookmark event {}", event);
        return;
    };
    let result = from_js::<Value>(detail)
        .and_then(|detail| background().relay_bookmark_event(event, id, detail));
    if let Err(e) = result {
        error!("failed to relay bookmark event: {}", e);
    }
}

/// `runtime.onMessageExternal` entry point
#[wasm_bindgen]
pub fn on_message_external(message: JsValue, sender_id: String) {
    let Ok(message) = from_js::<Value>(message) else {
        return;
    };
    let background = background();
    spawn_local(async move {
        registration::handle_external(background.host(), &sender_id, message).await;
    });
}

/// Sub-panel registration with the external tab-management extension
use log::{debug, info};
use serde_json::Value;
use url::Url;

use crate::error::Result;
use crate::host::Runtime;
use crate::messages::{ExternalMessage, RegisterSelf, SubPanel};

/// Extension id of the external peer hosting our sub-panel
pub const PEER_ID: &str = "treestyletab@piro.sakura.ne.jp";

pub const SUB_PANEL_TITLE: &str = "Bookmarks";

/// Panel page, relative to the extension base URL
pub const SUB_PANEL_PATH: &str = "panel/panel.html";

/// Build the self-description sent to the peer
pub fn self_description(runtime: &dyn Runtime) -> Result<RegisterSelf> {
    let panel_url = Url::parse(&runtime.base_url())?.join(SUB_PANEL_PATH)?;
    Ok(RegisterSelf {
        name: runtime.extension_name(),
        icons: runtime.manifest_icons(),
        sub_panel: SubPanel {
            title: SUB_PANEL_TITLE.to_string(),
            url: panel_url.to_string(),
        },
    })
}

/// Announce ourselves to the peer.
///
/// The peer is optional: any failure is logged and swallowed. Returns whether
/// the message was delivered.
pub async fn register(runtime: &dyn Runtime) -> bool {
    match try_register(runtime).await {
        Ok(()) => {
            info!("registered sub-panel with {}", PEER_ID);
            true
        }
        Err(e) => {
            debug!("{} is not available: {}", PEER_ID, e);
            false
        }
    }
}

async fn try_register(runtime: &dyn Runtime) -> Result<()> {
    let message = serde_json::to_value(self_description(runtime)?)?;
    runtime.send_external(PEER_ID, &message).await?;
    Ok(())
}

/// React to a message from another extension.
///
/// Only a `ready` from the peer triggers a new registration; returns whether
/// one was attempted.
pub async fn handle_external(runtime: &dyn Runtime, sender_id: &str, message: Value) -> bool {
    if sender_id != PEER_ID {
        return false;
    }
    let Ok(message) = serde_json::from_value::<ExternalMessage>(message) else {
        return false;
    };
    match message.kind.as_str() {
        "ready" => {
            register(runtime).await;
            true
        }
        _ => false,
    }
}

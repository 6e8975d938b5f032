/// Wire contract between the background process, panel pages and the external peer
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::bookmarks::{CreateDetails, Destination, null_as_default};
use crate::error::Result;

/// Inbound message types understood by the dispatcher
pub const COMMAND_TYPES: &[&str] = &[
    "get-configs",
    "set-configs",
    "get-all",
    "load",
    "open",
    "create",
    "move",
    "copy",
];

/// A request from a panel page, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Command {
    GetConfigs {
        keys: Vec<String>,
    },
    SetConfigs {
        values: Map<String, Value>,
    },
    GetAll {},
    Load {
        url: String,
    },
    Open {
        urls: Vec<String>,
        #[serde(default, deserialize_with = "null_as_default")]
        background: bool,
    },
    Create {
        details: CreateDetails,
    },
    Move {
        id: String,
        destination: Destination,
    },
    Copy {
        id: String,
        destination: Destination,
    },
}

impl Command {
    /// Parse a raw message.
    ///
    /// Messages whose `type` is not a command (including ones without a
    /// `type`) yield `Ok(None)`; a known type with a bad payload is an error.
    pub fn parse(message: Value) -> Result<Option<Command>> {
        let known = message
            .get("type")
            .and_then(Value::as_str)
            .is_some_and(|kind| COMMAND_TYPES.contains(&kind));
        if !known {
            return Ok(None);
        }
        Ok(Some(serde_json::from_value(message)?))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::GetConfigs { .. } => "get-configs",
            Command::SetConfigs { .. } => "set-configs",
            Command::GetAll {} => "get-all",
            Command::Load { .. } => "load",
            Command::Open { .. } => "open",
            Command::Create { .. } => "create",
            Command::Move { .. } => "move",
            Command::Copy { .. } => "copy",
        }
    }
}

/// Host bookmark events relayed to panels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkEvent {
    Created,
    Removed,
    Moved,
    Changed,
}

impl BookmarkEvent {
    /// Map a host event name (`created`, `removed`, `moved`, `changed`)
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "created" => Some(BookmarkEvent::Created),
            "removed" => Some(BookmarkEvent::Removed),
            "moved" => Some(BookmarkEvent::Moved),
            "changed" => Some(BookmarkEvent::Changed),
            _ => None,
        }
    }

    pub fn notification(self, id: String, detail: Value) -> Notification {
        match self {
            BookmarkEvent::Created => Notification::BookmarkCreated { id, bookmark: detail },
            BookmarkEvent::Removed => Notification::BookmarkRemoved { id, remove_info: detail },
            BookmarkEvent::Moved => Notification::BookmarkMoved { id, move_info: detail },
            BookmarkEvent::Changed => Notification::BookmarkChanged { id, change_info: detail },
        }
    }
}

/// A message pushed from the background process to every open panel.
///
/// Bookmark events carry the host listener arguments under their own names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Notification {
    ReadyNotify,
    ConfigUpdated { values: Map<String, Value> },
    BookmarkCreated { id: String, bookmark: Value },
    BookmarkRemoved { id: String, remove_info: Value },
    BookmarkMoved { id: String, move_info: Value },
    BookmarkChanged { id: String, change_info: Value },
}

/// Sub-panel descriptor offered to the external peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubPanel {
    pub title: String,
    pub url: String,
}

/// Self-description sent to the external peer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "register-self", rename_all = "camelCase")]
pub struct RegisterSelf {
    pub name: String,
    pub icons: Value,
    pub sub_panel: SubPanel,
}

/// A message received from another extension; only its `type` matters
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExternalMessage {
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Routes panel commands to the host and relays host events back to panels
use std::rc::Rc;

use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use tokio::sync::OnceCell;

use crate::config::ConfigStore;
use crate::connections::ConnectionRegistry;
use crate::copier::{CopySource, copy_subtree};
use crate::error::{Error, Result};
use crate::host::Host;
use crate::messages::{BookmarkEvent, Command, Notification};
use crate::registration;
use crate::tab_data::plan_open;

/// Background process state: the host, the shared configs and the open panels
pub struct Background<H> {
    host: Rc<H>,
    configs: ConfigStore,
    configs_loaded: OnceCell<()>,
    connections: ConnectionRegistry,
}

impl<H: Host + 'static> Background<H> {
    pub fn new(host: Rc<H>) -> Self {
        let configs = ConfigStore::new();
        let connections = ConnectionRegistry::new();

        configs.observe({
            let connections = connections.clone();
            move |key: &str, value: &Value| {
                let mut values = Map::new();
                values.insert(key.to_string(), value.clone());
                if let Err(e) = connections.broadcast(&Notification::ConfigUpdated { values }) {
                    warn!("failed to broadcast config change for {}: {}", key, e);
                }
            }
        });

        Background {
            host,
            configs,
            configs_loaded: OnceCell::new(),
            connections,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn configs(&self) -> &ConfigStore {
        &self.configs
    }

    pub fn connections(&self) -> &ConnectionRegistry {
        &self.connections
    }

    /// Load configs, announce readiness to panels and register with the peer
    pub async fn start(&self) {
        self.configs_ready().await;
        self.announce_ready().await;
        registration::register(self.host.as_ref()).await;
        info!("background ready");
    }

    /// Resolves once stored configs are loaded; the first caller loads them
    pub async fn configs_ready(&self) {
        self.configs_loaded
            .get_or_init(|| async move {
                if let Err(e) = self.configs.load(self.host.as_ref()).await {
                    warn!("using default configs, storage unavailable: {}", e);
                }
            })
            .await;
    }

    async fn announce_ready(&self) {
        match serde_json::to_value(Notification::ReadyNotify) {
            Ok(message) => {
                // Nobody listening yet is the normal case at startup.
                if let Err(e) = self.host.send_message(&message).await {
                    debug!("ready notification not delivered: {}", e);
                }
            }
            Err(e) => warn!("failed to encode ready notification: {}", e),
        }
        if let Err(e) = self.connections.broadcast(&Notification::ReadyNotify) {
            warn!("failed to broadcast ready notification: {}", e);
        }
    }

    /// Run a command and return its reply, if it has one
    pub async fn execute(&self, command: Command) -> Result<Option<Value>> {
        self.configs_ready().await;
        debug!("dispatching {}", command.name());
        match command {
            Command::GetConfigs { keys } => Ok(Some(Value::Object(self.configs.get_many(&keys)))),
            Command::SetConfigs { values } => {
                for (key, value) in &values {
                    self.configs.set(key, value.clone());
                }
                for (key, value) in &values {
                    if let Err(e) = self.host.save(key, value).await {
                        warn!("failed to persist config {}: {}", key, e);
                    }
                }
                Ok(Some(Value::Bool(true)))
            }
            Command::GetAll {} => {
                let tree = self.host.get_tree().await?;
                Ok(Some(serde_json::to_value(tree)?))
            }
            Command::Load { url } => {
                self.load(&url).await?;
                Ok(None)
            }
            Command::Open { urls, background } => {
                self.open(&urls, background).await?;
                Ok(None)
            }
            Command::Create { details } => {
                self.host.create(&details).await?;
                Ok(None)
            }
            Command::Move { id, destination } => {
                self.host.move_node(&id, &destination).await?;
                Ok(None)
            }
            Command::Copy { id, destination } => {
                copy_subtree(self.host.as_ref(), CopySource::Id(id), &destination).await?;
                Ok(None)
            }
        }
    }

    /// Run a command whose outcome nobody waits for; failures are only logged
    pub async fn perform(&self, command: Command) {
        let name = command.name();
        if let Err(e) = self.execute(command).await {
            error!("{} failed: {}", name, e);
        }
    }

    /// Handle a message arriving on a panel port
    pub async fn handle_port_message(&self, message: Value) {
        match Command::parse(message) {
            Ok(Some(command)) => self.perform(command).await,
            Ok(None) => debug!("ignoring unknown port message"),
            Err(e) => error!("malformed port message: {}", e),
        }
    }

    /// Broadcast a host bookmark event to every open panel, payload untouched
    pub fn relay_bookmark_event(&self, event: BookmarkEvent, id: String, detail: Value) -> Result<usize> {
        self.connections.broadcast(&event.notification(id, detail))
    }

    async fn load(&self, url: &str) -> Result<()> {
        let window = self.host.current_window().await?;
        let tab = window.active_tab().ok_or(Error::NoActiveTab)?;
        self.host.update_url(tab.id, url).await?;
        Ok(())
    }

    async fn open(&self, urls: &[String], background: bool) -> Result<()> {
        let window = self.host.current_window().await?;
        for properties in plan_open(urls, window.tabs.len(), background) {
            self.host.create_tab(&properties).await?;
        }
        Ok(())
    }
}

/// Whether the sender of a one-shot message waits for a reply
pub fn expects_reply(command: &Command) -> bool {
    matches!(
        command,
        Command::GetConfigs { .. } | Command::SetConfigs { .. } | Command::GetAll {}
    )
}

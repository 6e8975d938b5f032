/// Registry of open panel ports and best-effort fan-out to them
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::host::PanelPort;
use crate::messages::Notification;

/// Identifies one open panel port
pub type ConnectionId = Uuid;

/// Set of currently connected panel ports.
///
/// Cloning yields another handle to the same registry.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    ports: Rc<RefCell<HashMap<ConnectionId, Rc<dyn PanelPort>>>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self, port: Rc<dyn PanelPort>) -> ConnectionId {
        let id = Uuid::new_v4();
        self.ports.borrow_mut().insert(id, port);
        debug!("panel connected: {} ({} open)", id, self.len());
        id
    }

    pub fn disconnect(&self, id: &ConnectionId) -> bool {
        let removed = self.ports.borrow_mut().remove(id).is_some();
        if removed {
            debug!("panel disconnected: {} ({} open)", id, self.len());
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.ports.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ports.borrow().is_empty()
    }

    /// Post `notification` to every open port, returning how many accepted it.
    ///
    /// Ports are snapshotted first; a port may disconnect (even from inside
    /// its own delivery) without affecting the rest of the fan-out.
    pub fn broadcast(&self, notification: &Notification) -> Result<usize> {
        let message = serde_json::to_value(notification)?;
        let targets: Vec<(ConnectionId, Rc<dyn PanelPort>)> = self
            .ports
            .borrow()
            .iter()
            .map(|(id, port)| (*id, Rc::clone(port)))
            .collect();

        let mut delivered = 0;
        for (id, port) in targets {
            if !self.ports.borrow().contains_key(&id) {
                continue;
            }
            match port.post_message(&message) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("dropping message for panel {}: {}", id, e),
            }
        }
        Ok(delivered)
    }
}

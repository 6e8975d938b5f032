/// Shared configuration store with change observers
use std::cell::RefCell;
use std::rc::Rc;

use log::debug;
use serde_json::{Map, Value, json};

use crate::error::Result;
use crate::host::ConfigStorage;

/// Built-in values used until storage says otherwise
pub fn default_configs() -> Map<String, Value> {
    let defaults = json!({
        "openInTabAlways": false,
        "openAsActiveTab": true,
        "openedFolders": [],
        "scrollPosition": 0,
        "debug": false,
    });
    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

type Observer = Rc<dyn Fn(&str, &Value)>;

#[derive(Default)]
struct Inner {
    values: Map<String, Value>,
    observers: Vec<Observer>,
}

/// Key/value configuration shared by every handler.
///
/// Cloning yields another handle to the same store.
#[derive(Clone, Default)]
pub struct ConfigStore {
    inner: Rc<RefCell<Inner>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::with_values(default_configs())
    }

    pub fn with_values(values: Map<String, Value>) -> Self {
        ConfigStore {
            inner: Rc::new(RefCell::new(Inner {
                values,
                observers: Vec::new(),
            })),
        }
    }

    /// Overlay persisted values on top of the current ones, without notifying
    pub async fn load(&self, storage: &dyn ConfigStorage) -> Result<()> {
        let stored = storage.load().await?;
        debug!("loaded {} stored config values", stored.len());
        self.inner.borrow_mut().values.extend(stored);
        Ok(())
    }

    /// Current value of `key`, `Null` when unset
    pub fn get(&self, key: &str) -> Value {
        self.inner.borrow().values.get(key).cloned().unwrap_or(Value::Null)
    }

    pub fn get_many(&self, keys: &[String]) -> Map<String, Value> {
        let inner = self.inner.borrow();
        keys.iter()
            .map(|key| (key.clone(), inner.values.get(key).cloned().unwrap_or(Value::Null)))
            .collect()
    }

    /// Store `value` under `key` and notify every observer
    pub fn set(&self, key: &str, value: Value) {
        self.inner.borrow_mut().values.insert(key.to_string(), value.clone());
        let observers: Vec<Observer> = self.inner.borrow().observers.clone();
        for observer in observers {
            observer(key, &value);
        }
    }

    /// Register a callback run after each `set`
    pub fn observe(&self, observer: impl Fn(&str, &Value) + 'static) {
        self.inner.borrow_mut().observers.push(Rc::new(observer));
    }
}

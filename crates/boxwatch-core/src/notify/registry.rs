// Transport capability lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::Notification;
use crate::error::CoreError;
use crate::model::{TransportConfig, TransportKind};

/// A configured transport, ready to deliver.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn submit(&self, notification: &Notification) -> Result<(), CoreError>;
}

/// A registered delivery mechanism.
///
/// `configure` validates the per-box options and returns a ready notifier;
/// credentials and protocol details stay inside the implementation.
pub trait Transport: Send + Sync {
    fn kind(&self) -> TransportKind;

    fn configure(&self, config: &TransportConfig) -> Result<Box<dyn Notifier>, CoreError>;
}

/// Maps transport names to their implementation.
#[derive(Clone, Default)]
pub struct NotifierRegistry {
    transports: HashMap<TransportKind, Arc<dyn Transport>>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transport, replacing any previous one of the same kind.
    pub fn register(&mut self, transport: impl Transport + 'static) -> &mut Self {
        self.transports.insert(transport.kind(), Arc::new(transport));
        self
    }

    /// Registered transport kinds, sorted by name.
    pub fn kinds(&self) -> Vec<TransportKind> {
        let mut kinds: Vec<_> = self.transports.keys().copied().collect();
        kinds.sort_by_key(|k| <&'static str>::from(*k));
        kinds
    }

    pub fn is_empty(&self) -> bool {
        self.transports.is_empty()
    }

    /// Build a notifier for the given box configuration.
    pub fn resolve(&self, config: Option<&TransportConfig>) -> Result<Box<dyn Notifier>, CoreError> {
        let config = config.ok_or_else(|| {
            CoreError::configuration("no notification transport configured for this box")
        })?;
        let kind = config.kind();
        let transport = self.transports.get(&kind).ok_or_else(|| {
            CoreError::configuration(format!(
                "transport '{kind}' is not set up; add a [{kind}] section to the configuration"
            ))
        })?;
        transport.configure(config)
    }
}

impl fmt::Debug for NotifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierRegistry")
            .field("transports", &self.kinds())
            .finish()
    }
}

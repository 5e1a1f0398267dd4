//! Structured change events emitted after successful symbol mutations.

use parking_lot::Mutex;

use crate::address::Address;
use crate::symbol::{Namespace, ProxyKey, SourceType};

/// What changed about a symbol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolChange {
    Added,
    Renamed { old: String, new: String },
    NamespaceChanged { old: Namespace, new: Namespace },
    AddressChanged { old: Address, new: Address },
    SourceChanged { old: SourceType, new: SourceType },
    DataChanged,
    AnchoredFlagChanged { pinned: bool },
    PrimaryChanged { previous: Option<ProxyKey> },
    Removed { name: String },
}

/// One change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub symbol: ProxyKey,
    pub address: Address,
    pub change: SymbolChange,
}

/// Receiver of change events. Delivery beyond this call is the receiver's business.
pub trait ChangeNotifier: Send + Sync {
    fn emit(&self, event: &ChangeEvent);
}

/// Logs every event through `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl ChangeNotifier for TracingNotifier {
    fn emit(&self, event: &ChangeEvent) {
        tracing::debug!(symbol = %event.symbol, address = %event.address, change = ?event.change, "symbol changed");
    }
}

/// Collects events in memory (thread-safe).
#[derive(Debug, Default)]
pub struct EventLog {
    pending: Mutex<Vec<ChangeEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all collected events.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }
}

impl ChangeNotifier for EventLog {
    fn emit(&self, event: &ChangeEvent) {
        self.pending.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolId;

    #[test]
    fn event_log_drains() {
        let log = EventLog::new();
        let event = ChangeEvent {
            symbol: ProxyKey::Persisted(SymbolId::new(1).unwrap()),
            address: Address::ram(0),
            change: SymbolChange::DataChanged,
        };
        log.emit(&event);
        log.emit(&event);
        assert_eq!(log.len(), 2);
        assert_eq!(log.drain(), vec![event.clone(), event]);
        assert!(log.is_empty());
    }
}

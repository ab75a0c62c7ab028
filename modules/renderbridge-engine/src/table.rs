//! The dispatch table: message type name → route.
//!
//! Built once with `DispatchTable::builder()` and immutable afterwards, so
//! the supported message surface is a literal list that can be audited and
//! tested.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use renderbridge_common::BridgeError;
use serde_json::Value;

use crate::gate::CapabilityGate;

/// A synchronous handler. Asynchronous work must be detached by the handler.
pub type HandlerFn<C> = Box<dyn Fn(&C, Value) -> Result<()> + Send + Sync>;

pub struct Route<C> {
    pub(crate) handler: HandlerFn<C>,
    pub(crate) gate: Option<Arc<dyn CapabilityGate>>,
    pub(crate) deprecated: bool,
}

impl<C> Route<C> {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&C, Value) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            gate: None,
            deprecated: false,
        }
    }

    /// Skip the handler whenever `gate` is closed.
    pub fn gated(mut self, gate: Arc<dyn CapabilityGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Still routed, but every use is reported.
    pub fn deprecated(mut self) -> Self {
        self.deprecated = true;
        self
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    pub fn gate_name(&self) -> Option<&str> {
        self.gate.as_deref().map(|g| g.name())
    }
}

pub struct DispatchTable<C> {
    routes: HashMap<String, Route<C>>,
}

impl<C> DispatchTable<C> {
    pub fn builder() -> DispatchTableBuilder<C> {
        DispatchTableBuilder { routes: Vec::new() }
    }

    pub fn get(&self, message_type: &str) -> Option<&Route<C>> {
        self.routes.get(message_type)
    }

    pub fn contains(&self, message_type: &str) -> bool {
        self.routes.contains_key(message_type)
    }

    /// Every routed message type, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.routes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

pub struct DispatchTableBuilder<C> {
    routes: Vec<(String, Route<C>)>,
}

impl<C> DispatchTableBuilder<C> {
    pub fn route<F>(self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&C, Value) -> Result<()> + Send + Sync + 'static,
    {
        self.add(name, Route::new(handler))
    }

    pub fn add(mut self, name: impl Into<String>, route: Route<C>) -> Self {
        self.routes.push((name.into(), route));
        self
    }

    /// Fails if any name was registered twice.
    pub fn build(self) -> Result<DispatchTable<C>, BridgeError> {
        let mut routes = HashMap::with_capacity(self.routes.len());
        for (name, route) in self.routes {
            if routes.contains_key(&name) {
                return Err(BridgeError::DuplicateRoute(name));
            }
            routes.insert(name, route);
        }
        Ok(DispatchTable { routes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::FlagGate;
    use std::sync::atomic::AtomicBool;

    fn noop(_: &(), _: Value) -> Result<()> {
        Ok(())
    }

    #[test]
    fn duplicate_names_fail_the_build() {
        let result = DispatchTable::<()>::builder()
            .route("LogOut", noop)
            .route("LogOut", noop)
            .build();
        assert!(matches!(result, Err(BridgeError::DuplicateRoute(name)) if name == "LogOut"));
    }

    #[test]
    fn names_are_sorted_and_auditable() {
        let gate = Arc::new(FlagGate::new("channels", Arc::new(AtomicBool::new(true))));
        let table = DispatchTable::<()>::builder()
            .route("b", noop)
            .add("a", Route::new(noop).deprecated())
            .add("c", Route::new(noop).gated(gate))
            .build()
            .unwrap();

        assert_eq!(table.names(), vec!["a", "b", "c"]);
        assert!(table.get("a").unwrap().is_deprecated());
        assert_eq!(table.get("c").unwrap().gate_name(), Some("channels"));
        assert!(!table.contains("d"));
        assert_eq!(table.len(), 3);
    }
}

// Test harness for the kernel.
//
// `TestKernel` wires a full router over recording collaborators and an
// in-memory telemetry sink, so a test can send renderer messages and then
// assert on store actions, collaborator calls and emitted telemetry.

use std::sync::Arc;

use renderbridge_common::{Config, StoreAction, TelemetryEvent};
use renderbridge_engine::{MemoryTelemetry, MessageRouter, Outcome};
use serde_json::Value;

use crate::kernel::{build_router, Kernel, KernelDeps};
use crate::recording::{RecordingServices, RecordingStore, ServiceCall};
use crate::traits::SessionSnapshot;

pub struct TestKernel {
    pub router: MessageRouter<Kernel>,
    pub store: Arc<RecordingStore>,
    pub services: Arc<RecordingServices>,
    pub telemetry: Arc<MemoryTelemetry>,
}

impl TestKernel {
    /// Development defaults: strict protocol, channels off, world explorer on.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_channels() -> Self {
        let mut config = Config::default();
        config.channels_enabled = true;
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        Self::build(config, RecordingServices::new())
    }

    /// Start from pre-configured services (failing methods, loaded scenes).
    pub fn with_services(services: RecordingServices) -> Self {
        Self::build(Config::default(), services)
    }

    fn build(config: Config, services: RecordingServices) -> Self {
        let store = Arc::new(RecordingStore::new());
        let services = Arc::new(services);
        let telemetry = Arc::new(MemoryTelemetry::new());

        let deps = KernelDeps {
            store: store.clone(),
            friends: services.clone(),
            channels: services.clone(),
            teleport: services.clone(),
            world: services.clone(),
            host: services.clone(),
            renderer: services.clone(),
        };
        let router = match build_router(deps, &config, telemetry.clone()) {
            Ok(router) => router,
            Err(err) => panic!("kernel dispatch table failed to build: {err}"),
        };

        Self {
            router,
            store,
            services,
            telemetry,
        }
    }

    pub fn kernel(&self) -> &Kernel {
        self.router.context()
    }

    pub fn login(&self, user_id: &str, has_wallet: bool) {
        self.store.set_session(SessionSnapshot {
            user_id: Some(user_id.to_string()),
            has_wallet,
        });
    }

    pub fn send(&self, message_type: &str, payload: Value) -> Outcome {
        self.router.handle(message_type, payload)
    }

    /// Wait for every detached handler task to finish.
    pub async fn settle(&self) {
        self.kernel().tasks().settle().await;
    }

    pub fn actions(&self) -> Vec<StoreAction> {
        self.store.actions()
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.services.calls()
    }

    pub fn calls_to(&self, method: &str) -> Vec<ServiceCall> {
        self.services.calls_to(method)
    }

    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.telemetry.events()
    }

    pub fn events_of(&self, event_type: &str) -> Vec<TelemetryEvent> {
        self.telemetry.of_type(event_type)
    }
}

impl Default for TestKernel {
    fn default() -> Self {
        Self::new()
    }
}

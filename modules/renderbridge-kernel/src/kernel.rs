//! Kernel context and router wiring.
//!
//! `KernelDeps` holds every collaborator the handlers talk to. The router
//! is built via `build_router()`, which wires the dispatch table, the
//! capability gates and the pending-call registry around one `Kernel`.

use std::sync::Arc;

use renderbridge_common::{BridgeError, Config};
use renderbridge_engine::{
    CallId, DetachedTasks, MessageRouter, PendingCall, PendingCallRegistry, TelemetrySink,
};

use crate::capabilities::Capabilities;
use crate::handlers;
use crate::latch::Latch;
use crate::traits::{
    ChannelsService, FriendsService, HostServices, RendererOutbound, StateStore, TeleportService,
    WorldService,
};

/// Collaborators shared by all handlers.
#[derive(Clone)]
pub struct KernelDeps {
    pub store: Arc<dyn StateStore>,
    pub friends: Arc<dyn FriendsService>,
    pub channels: Arc<dyn ChannelsService>,
    pub teleport: Arc<dyn TeleportService>,
    pub world: Arc<dyn WorldService>,
    pub host: Arc<dyn HostServices>,
    pub renderer: Arc<dyn RendererOutbound>,
}

/// The context every handler receives.
pub struct Kernel {
    pub(crate) deps: KernelDeps,
    pub(crate) calls: Arc<PendingCallRegistry>,
    pub(crate) tasks: DetachedTasks,
    pub(crate) telemetry: Arc<dyn TelemetrySink>,
    pub(crate) capabilities: Capabilities,
    /// Opened by the renderer's first system info report.
    pub(crate) started: Latch,
    /// Opened by the host on the first user gesture.
    pub(crate) user_interaction: Latch,
}

impl Kernel {
    pub fn new(
        deps: KernelDeps,
        config: &Config,
        capabilities: Capabilities,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        let calls = PendingCallRegistry::new(config.protocol_policy, telemetry.clone())
            .with_timeout(config.pending_call_timeout);
        Self {
            deps,
            calls: Arc::new(calls),
            tasks: DetachedTasks::new(telemetry.clone()),
            telemetry,
            capabilities,
            started: Latch::new(),
            user_interaction: Latch::new(),
        }
    }

    pub fn deps(&self) -> &KernelDeps {
        &self.deps
    }

    pub fn calls(&self) -> &Arc<PendingCallRegistry> {
        &self.calls
    }

    pub fn tasks(&self) -> &DetachedTasks {
        &self.tasks
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Open a request the renderer will answer with a correlated message
    /// (screenshot, mouse position, camera target, web3 confirmation).
    pub fn begin_call(&self) -> (CallId, PendingCall) {
        self.calls.create()
    }

    pub fn signal_user_interaction(&self) {
        self.user_interaction.open();
    }

    pub fn has_started(&self) -> bool {
        self.started.is_open()
    }
}

/// Build a fully-wired router for one renderer session.
pub fn build_router(
    deps: KernelDeps,
    config: &Config,
    telemetry: Arc<dyn TelemetrySink>,
) -> Result<MessageRouter<Kernel>, BridgeError> {
    let capabilities = Capabilities::from_config(config);
    let table = handlers::dispatch_table(&capabilities)?;
    let kernel = Kernel::new(deps, config, capabilities, telemetry.clone());

    Ok(MessageRouter::new(kernel, table, telemetry)
        .with_unknown_policy(config.unknown_message_policy))
}

//! Renderer message routing core.
//!
//! A `MessageRouter` owns an immutable `DispatchTable` that maps message
//! type names to handlers. Handlers run synchronously; anything
//! asynchronous goes through `DetachedTasks`, which reports failures to a
//! `TelemetrySink` instead of letting them vanish. Request/response
//! exchanges with the renderer are correlated by the `PendingCallRegistry`.

pub mod gate;
pub mod pending;
pub mod router;
pub mod table;
pub mod tasks;
pub mod telemetry;

pub use gate::{CapabilityGate, FlagGate};
pub use pending::{CallError, CallId, PendingCall, PendingCallRegistry, Settlement};
pub use router::{MessageRouter, Outcome};
pub use table::{DispatchTable, DispatchTableBuilder, HandlerFn, Route};
pub use tasks::DetachedTasks;
pub use telemetry::{FanoutSink, MemoryTelemetry, TelemetrySink, TracingSink};

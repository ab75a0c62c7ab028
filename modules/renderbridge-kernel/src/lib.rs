pub mod capabilities;
pub mod handlers;
pub mod kernel;
pub mod latch;
pub mod recording;
pub mod replay;
pub mod traits;

#[cfg(feature = "test-support")]
pub mod testing;

pub use capabilities::Capabilities;
pub use kernel::{build_router, Kernel, KernelDeps};
pub use latch::Latch;
pub use recording::{RecordingServices, RecordingStore, ServiceCall};

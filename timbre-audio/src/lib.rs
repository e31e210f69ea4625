pub mod assets;
pub mod compose;
pub mod config;
pub mod context;
pub mod diagnostics;
pub mod engine;
pub mod ids;
pub mod interpreter;
pub mod osc_client;
pub mod osc_sender;
pub mod paths;
pub mod session;

pub use assets::{AssetDelivery, AssetError, DirAssetDelivery, NoAssets};
pub use config::Config;
pub use context::SynthContext;
pub use diagnostics::{FanoutSink, LogSink, MemorySink};
pub use engine::{AudioBackend, BackendError, BackendResult, ScBackend, ScServer, TestBackend, TestOp};
pub use interpreter::{interpret, ParseFailure, ParsedArgs};
pub use osc_client::OscClient;
pub use session::{HostEvent, InstrumentSession, SessionState};

pub mod backend;
pub mod server;

pub use backend::{AudioBackend, BackendError, BackendResult, ScBackend, TestBackend, TestOp};
pub use server::ScServer;

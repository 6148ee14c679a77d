// appliprobe-core: Session state machine and inspection logic between
// appliprobe-api and the CLI.

pub mod config;
pub mod directory;
pub mod error;
pub mod export;
pub mod model;
pub mod service;
pub mod session;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{ClientConfig, TlsVerification};
pub use directory::Directory;
pub use error::CoreError;
pub use service::ApplianceService;
pub use session::{
    CommandReport, Directive, Input, Reply, Session, SessionContext, SessionCounters,
    SessionOptions, SessionState,
};

pub use model::{
    Access, ApplianceDetails, ApplianceInfo, ApplianceRecord, CapabilityCatalog,
    CapabilityDescriptor, CommandRequest, CommandResult, CommandValue, ConnectionState,
    PreflightNote, StateSnapshot, ValueType,
};

// Transport types the CLI and config crates build on.
pub use appliprobe_api::{ApplianceClient, Credentials, DEFAULT_BASE_URL};

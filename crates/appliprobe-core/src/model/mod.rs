// ── Domain model ──
//
// Appliance identity, capability catalog, command payloads, and reported
// state. Nothing in here performs I/O.

pub mod appliance;
pub mod capability;
pub mod command;
pub mod info;
pub mod state;

// ── Re-exports ──────────────────────────────────────────────────────

pub use appliance::{
    ApplianceRecord, ConnectionState, PNC_MIN_DIGITS, UNKNOWN, resolve_model, strip_pnc_prefix,
};
pub use capability::{
    Access, CapabilityCatalog, CapabilityDescriptor, NoteKind, PreflightNote, ValueType,
};
pub use command::{CommandRequest, CommandResult, CommandValue};
pub use info::{ApplianceDetails, ApplianceInfo, DEFAULT_BRAND};
pub use state::StateSnapshot;

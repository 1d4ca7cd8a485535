use thiserror::Error;

/// Errors a telemetry store operation can return.
///
/// The store performs no I/O and parses no external input, so misuse of an
/// argument and addressing a missing tree are the only failure modes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryError {
    /// An argument fell outside its documented domain (zero tree count,
    /// zero histogram bins, unknown enum label).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An irrigation command addressed a tree id not present in the snapshot.
    #[error("unknown tree id {0}")]
    UnknownTree(u32),
}

// ===========================================================================
// Tests
// ===========================================================================

use thiserror::Error;

/// Non-protocol faults inside the engine, mostly mapped from the HAL
/// trait boundary.
#[derive(Debug, Error, Clone)]
pub enum MachineError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid state: {0}")]
    State(String),
}

/// A structurally valid command with bad contents. Reported to the host
/// via the error reply shape; never fatal.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{category} max={max}")]
    OverMax { category: &'static str, max: u8 },
    #[error("no device count set")]
    AllZero,
    #[error("only cup+cooker can be combined")]
    CupCookerOnly,
    #[error("invalid combination (only cup+cooker together; others solo)")]
    BadCombination,
    #[error("invalid {category} control num")]
    ControlOutOfRange { category: &'static str },
    #[error("'time' 0 or missing")]
    BadDuration,
}

/// A message the dispatcher cannot interpret at all. Reported, never fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("json parse fail")]
    Malformed,
    #[error("unsupported device field")]
    UnknownDevice,
    #[error("unknown {category} function")]
    UnknownFunction { category: &'static str },
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;

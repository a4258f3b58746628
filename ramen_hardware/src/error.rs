use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("pin {0} not configured")]
    PinNotConfigured(u8),
    #[error("pin {0} is not an {1}")]
    WrongMode(u8, &'static str),
    #[error("unsupported on this backend: {0}")]
    Unsupported(&'static str),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;

pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Role assigned to a GPIO pin when a station configuration is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    /// Plain digital input (externally driven signal line).
    Input,
    /// Digital input with internal pull-up (switches, photo sensors).
    InputPullup,
    /// Digital output (motor drivers, valves, induction enables).
    Output,
}

/// Result type at the hardware trait boundary.
pub type HalResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Callback invoked from interrupt context on a pin edge. Receives the
/// sampled level of the pin that fired. Must stay minimal: read pins,
/// update atomics, return.
pub type EdgeHandler = Box<dyn FnMut(bool) + Send>;

/// Hardware capability interface consumed by the control engine.
///
/// Digital reads are *logical*: `true` means the sensor condition is
/// asserted (limit reached, item present, data not ready, ...).
/// Implementations absorb electrical polarity so the engine never deals
/// with active-low wiring.
///
/// Methods take `&self` so a single `Arc<dyn Hal>` can be shared with
/// edge handlers; implementations use interior mutability.
pub trait Hal: Send + Sync {
    /// Configure a pin's role. Idempotent; safe to call repeatedly.
    fn set_mode(&self, pin: u8, mode: PinMode) -> HalResult<()>;
    fn read_digital(&self, pin: u8) -> HalResult<bool>;
    fn write_digital(&self, pin: u8, level: bool) -> HalResult<()>;
    /// Read an ADC channel. Channel numbering is board-specific.
    fn read_analog(&self, channel: u8) -> HalResult<i32>;
    /// Busy-wait for `us` microseconds (bit-banged protocols only).
    fn delay_micros(&self, us: u64);
    /// Register an edge-triggered handler on a pin. The handler may run
    /// on an interrupt thread and preempt the polling loop at any point.
    fn on_edge(&self, pin: u8, handler: EdgeHandler) -> HalResult<()>;
}

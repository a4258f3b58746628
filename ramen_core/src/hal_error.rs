//! Maps `Box<dyn Error>` from the HAL trait boundary to typed `MachineError`.
//!
//! `ramen_traits::Hal` uses `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `ramen_hardware::HwError` downcasting.

use crate::error::MachineError;

/// Map a trait-boundary error to a typed `MachineError`.
pub fn map_hal_error(e: &(dyn std::error::Error + 'static)) -> MachineError {
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<ramen_hardware::error::HwError>() {
            return match hw {
                ramen_hardware::error::HwError::PinNotConfigured(_)
                | ramen_hardware::error::HwError::WrongMode(..) => {
                    MachineError::Config(hw.to_string())
                }
                other => MachineError::HardwareFault(other.to_string()),
            };
        }
    }
    MachineError::Hardware(e.to_string())
}

/// Lift a HAL result into the crate result type.
pub fn hal<T>(res: ramen_traits::HalResult<T>) -> crate::error::Result<T> {
    res.map_err(|e| eyre::Report::new(map_hal_error(&*e)))
}

//! Raspberry Pi GPIO backend (`hardware` feature, Linux only).
//!
//! Pins are claimed lazily on `set_mode`, matching the engine's
//! configuration-driven pin setup. The Pi has no on-chip ADC, so
//! `read_analog` reports `HwError::Unsupported`; the sensor pipeline
//! degrades to the last good value for those channels.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use ramen_traits::{EdgeHandler, Hal, HalResult, PinMode};
use rppal::gpio::{Gpio, InputPin, Level, OutputPin, Trigger};
use tracing::warn;

use crate::error::HwError;

enum AnyPin {
    In(InputPin),
    Out(OutputPin),
}

pub struct GpioHal {
    gpio: Gpio,
    pins: Mutex<HashMap<u8, AnyPin>>,
}

impl GpioHal {
    pub fn new() -> crate::error::Result<Self> {
        let gpio = Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
        Ok(Self {
            gpio,
            pins: Mutex::new(HashMap::new()),
        })
    }

    fn lock_pins(&self) -> crate::error::Result<std::sync::MutexGuard<'_, HashMap<u8, AnyPin>>> {
        self.pins
            .lock()
            .map_err(|_| HwError::Gpio("pin table poisoned".into()))
    }
}

impl Hal for GpioHal {
    fn set_mode(&self, pin: u8, mode: PinMode) -> HalResult<()> {
        let mut pins = self.lock_pins()?;
        // Re-claiming an already-configured pin is allowed; drop the old
        // handle first so the kernel releases it.
        pins.remove(&pin);
        let claimed = self
            .gpio
            .get(pin)
            .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))?;
        let any = match mode {
            PinMode::Input => AnyPin::In(claimed.into_input()),
            PinMode::InputPullup => AnyPin::In(claimed.into_input_pullup()),
            PinMode::Output => AnyPin::Out(claimed.into_output_low()),
        };
        pins.insert(pin, any);
        Ok(())
    }

    fn read_digital(&self, pin: u8) -> HalResult<bool> {
        let pins = self.lock_pins()?;
        match pins.get(&pin) {
            Some(AnyPin::In(p)) => Ok(p.read() == Level::High),
            Some(AnyPin::Out(p)) => Ok(p.is_set_high()),
            None => Err(Box::new(HwError::PinNotConfigured(pin))),
        }
    }

    fn write_digital(&self, pin: u8, level: bool) -> HalResult<()> {
        let mut pins = self.lock_pins()?;
        match pins.get_mut(&pin) {
            Some(AnyPin::Out(p)) => {
                p.write(if level { Level::High } else { Level::Low });
                Ok(())
            }
            Some(AnyPin::In(_)) => Err(Box::new(HwError::WrongMode(pin, "output"))),
            None => Err(Box::new(HwError::PinNotConfigured(pin))),
        }
    }

    fn read_analog(&self, channel: u8) -> HalResult<i32> {
        let _ = channel;
        Err(Box::new(HwError::Unsupported(
            "analog input requires an external adc",
        )))
    }

    fn delay_micros(&self, us: u64) {
        // Short enough to spin; sleeping would wreck bit-bang timing.
        let deadline = Instant::now() + Duration::from_micros(us);
        while Instant::now() < deadline {
            std::hint::spin_loop();
        }
    }

    fn on_edge(&self, pin: u8, mut handler: EdgeHandler) -> HalResult<()> {
        let mut pins = self.lock_pins()?;
        match pins.get_mut(&pin) {
            Some(AnyPin::In(p)) => {
                p.set_async_interrupt(Trigger::Both, move |level| {
                    handler(level == Level::High);
                })
                .map_err(|e| -> Box<dyn std::error::Error + Send + Sync> {
                    warn!(pin, error = %e, "edge registration failed");
                    Box::new(HwError::Gpio(e.to_string()))
                })?;
                Ok(())
            }
            Some(AnyPin::Out(_)) => Err(Box::new(HwError::WrongMode(pin, "input"))),
            None => Err(Box::new(HwError::PinNotConfigured(pin))),
        }
    }
}

//! Station-count configuration and its validation rules.

use crate::error::ValidationError;
use ramen_config::{MAX_COOKER, MAX_CUP, MAX_OUTLET, MAX_POWDER, MAX_RAMEN};

/// Configured slot count per device category. Replaced wholesale on a
/// `setting` command; read by every controller to bound loop ranges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Setting {
    pub cup: u8,
    pub ramen: u8,
    pub powder: u8,
    pub cooker: u8,
    pub outlet: u8,
}

impl Setting {
    /// Check the category maxima and the exclusivity rule: either exactly
    /// one category is nonzero, or cup and cooker are both nonzero with
    /// everything else zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let over = |category, value: u8, max: usize| {
            if usize::from(value) > max {
                Err(ValidationError::OverMax {
                    category,
                    max: max as u8,
                })
            } else {
                Ok(())
            }
        };
        over("cup", self.cup, MAX_CUP)?;
        over("ramen", self.ramen, MAX_RAMEN)?;
        over("powder", self.powder, MAX_POWDER)?;
        over("cooker", self.cooker, MAX_COOKER)?;
        over("outlet", self.outlet, MAX_OUTLET)?;

        let nonzero = [self.cup, self.ramen, self.powder, self.cooker, self.outlet]
            .iter()
            .filter(|&&n| n > 0)
            .count();
        if nonzero == 0 {
            return Err(ValidationError::AllZero);
        }
        if self.cup > 0 && self.cooker > 0 {
            if self.ramen == 0 && self.powder == 0 && self.outlet == 0 {
                return Ok(());
            }
            return Err(ValidationError::CupCookerOnly);
        }
        if nonzero == 1 {
            return Ok(());
        }
        Err(ValidationError::BadCombination)
    }

    /// Counts clamped to the category maxima. Every per-slot array is
    /// sized to those maxima, so anything stored as the live
    /// configuration must pass through here first.
    pub fn clamped(&self) -> Self {
        let cap = |v: u8, max: usize| v.min(max as u8);
        Self {
            cup: cap(self.cup, MAX_CUP),
            ramen: cap(self.ramen, MAX_RAMEN),
            powder: cap(self.powder, MAX_POWDER),
            cooker: cap(self.cooker, MAX_COOKER),
            outlet: cap(self.outlet, MAX_OUTLET),
        }
    }
}

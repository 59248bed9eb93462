use std::{fmt, str::FromStr};

use crate::{
    clock::{DEFAULT_CPU_CLOCK_HZ, TIMER_CLOCK_HZ},
    error::Chip8Error,
    quirks::System,
};

/// Preset emulation speeds offered to users.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EmulatorSpeed {
    Half,
    #[default]
    Full,
    OneAndHalf,
    Double,
}

impl EmulatorSpeed {
    pub const ALL: [EmulatorSpeed; 4] = [
        EmulatorSpeed::Half,
        EmulatorSpeed::Full,
        EmulatorSpeed::OneAndHalf,
        EmulatorSpeed::Double,
    ];

    /// The factor both clocks are scaled by.
    pub const fn factor(self) -> f32 {
        match self {
            EmulatorSpeed::Half => 0.5,
            EmulatorSpeed::Full => 1.0,
            EmulatorSpeed::OneAndHalf => 1.5,
            EmulatorSpeed::Double => 2.0,
        }
    }

    /// Label shown to users, e.g. `1.5X`.
    pub fn label(self) -> String {
        format!("{}X", self.factor())
    }

    /// Labels of all presets, in order.
    pub fn all_labels() -> Vec<String> {
        Self::ALL.iter().map(|speed| speed.label()).collect()
    }

    /// The preset at `index`, or [`EmulatorSpeed::Full`] if out of range.
    pub fn from_index(index: usize) -> Self {
        Self::ALL.get(index).copied().unwrap_or_default()
    }

    /// The preset with the given factor, or [`EmulatorSpeed::Full`].
    pub fn from_factor(factor: f32) -> Self {
        Self::ALL
            .into_iter()
            .find(|speed| speed.factor() == factor)
            .unwrap_or_default()
    }
}

impl fmt::Display for EmulatorSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for EmulatorSpeed {
    type Err = Chip8Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "half" => return Ok(EmulatorSpeed::Half),
            "full" | "normal" => return Ok(EmulatorSpeed::Full),
            "one_and_half" => return Ok(EmulatorSpeed::OneAndHalf),
            "double" => return Ok(EmulatorSpeed::Double),
            _ => {}
        }
        normalized
            .trim_end_matches('x')
            .parse::<f32>()
            .ok()
            .and_then(|factor| Self::ALL.into_iter().find(|speed| speed.factor() == factor))
            .ok_or_else(|| Chip8Error::UnknownSpeed(s.to_string()))
    }
}

/// Check that `factor` can scale a clock period.
pub fn validate_speed_factor(factor: f32) -> Result<f32, Chip8Error> {
    if factor.is_finite() && factor > 0.0 {
        Ok(factor)
    } else {
        Err(Chip8Error::InvalidSpeedFactor(factor))
    }
}

/// Settings an [`crate::Emulator`] is created with.
#[derive(Clone, Debug, PartialEq)]
pub struct EmulatorConfig {
    pub system: System,
    pub cpu_clock_hz: u32,
    pub timer_clock_hz: u32,
    pub speed_factor: f32,
    pub sound_enabled: bool,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            system: System::default(),
            cpu_clock_hz: DEFAULT_CPU_CLOCK_HZ,
            timer_clock_hz: TIMER_CLOCK_HZ,
            speed_factor: EmulatorSpeed::Full.factor(),
            sound_enabled: true,
        }
    }
}

impl EmulatorConfig {
    pub fn with_system(mut self, system: System) -> Self {
        self.system = system;
        self
    }

    pub fn with_cpu_clock_hz(mut self, hz: u32) -> Self {
        self.cpu_clock_hz = hz;
        self
    }

    pub fn with_timer_clock_hz(mut self, hz: u32) -> Self {
        self.timer_clock_hz = hz;
        self
    }

    pub fn with_speed_factor(mut self, factor: f32) -> Self {
        self.speed_factor = factor;
        self
    }

    pub fn with_sound_enabled(mut self, enabled: bool) -> Self {
        self.sound_enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_presets() {
        assert_eq!(EmulatorSpeed::from_index(2), EmulatorSpeed::OneAndHalf);
        assert_eq!(EmulatorSpeed::from_index(99), EmulatorSpeed::Full);
        assert_eq!(EmulatorSpeed::from_factor(0.5), EmulatorSpeed::Half);
        assert_eq!(EmulatorSpeed::from_factor(3.0), EmulatorSpeed::Full);
        assert_eq!(EmulatorSpeed::all_labels(), vec!["0.5X", "1X", "1.5X", "2X"]);
    }

    #[test]
    fn test_speed_parse() {
        assert_eq!("double".parse::<EmulatorSpeed>().unwrap(), EmulatorSpeed::Double);
        assert_eq!("one-and-half".parse::<EmulatorSpeed>().unwrap(), EmulatorSpeed::OneAndHalf);
        assert_eq!("1.5X".parse::<EmulatorSpeed>().unwrap(), EmulatorSpeed::OneAndHalf);
        assert_eq!("0.5".parse::<EmulatorSpeed>().unwrap(), EmulatorSpeed::Half);
        assert!(matches!(
            "ludicrous".parse::<EmulatorSpeed>(),
            Err(Chip8Error::UnknownSpeed(_))
        ));
    }

    #[test]
    fn test_validate_speed_factor() {
        assert_eq!(validate_speed_factor(1.5).unwrap(), 1.5);
        assert!(validate_speed_factor(0.0).is_err());
        assert!(validate_speed_factor(-1.0).is_err());
        assert!(validate_speed_factor(f32::NAN).is_err());
        assert!(validate_speed_factor(f32::INFINITY).is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = EmulatorConfig::default()
            .with_system(System::XoChip)
            .with_cpu_clock_hz(500)
            .with_speed_factor(2.0)
            .with_sound_enabled(false);
        assert_eq!(config.system, System::XoChip);
        assert_eq!(config.cpu_clock_hz, 500);
        assert_eq!(config.timer_clock_hz, 60);
        assert_eq!(config.speed_factor, 2.0);
        assert!(!config.sound_enabled);
    }
}

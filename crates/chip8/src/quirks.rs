use std::{fmt, str::FromStr};

use crate::error::Chip8Error;

/// Behavioural differences between the interpreters a ROM may target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Quirks {
    /// `8xy1`, `8xy2` and `8xy3` clear VF.
    pub vf_reset: bool,
    /// `Fx55` and `Fx65` leave I pointing past the last register.
    pub memory: bool,
    /// Drawing stalls the processor until the next timer tick.
    pub display_wait: bool,
    /// Sprites are cut at the screen edge instead of wrapping around.
    pub clipping: bool,
    /// `8xy6` and `8xyE` shift VX in place and ignore VY.
    pub shifting: bool,
    /// `Bnnn` jumps to `nnn + VX` instead of `nnn + V0`.
    pub jumping: bool,
}

/// A named interpreter variant with a fixed set of quirks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum System {
    /// The original COSMAC VIP interpreter.
    #[default]
    Chip8,
    /// SUPER-CHIP 1.1 on the HP48.
    SuperChipLegacy,
    /// SUPER-CHIP as implemented by modern interpreters such as Octo.
    SuperChipModern,
    /// XO-CHIP.
    XoChip,
}

impl System {
    pub const ALL: [System; 4] = [
        System::Chip8,
        System::SuperChipLegacy,
        System::SuperChipModern,
        System::XoChip,
    ];

    /// The quirks this system runs with.
    pub const fn quirks(self) -> Quirks {
        match self {
            System::Chip8 => Quirks {
                vf_reset: true,
                memory: true,
                display_wait: true,
                clipping: true,
                shifting: false,
                jumping: false,
            },
            System::SuperChipLegacy => Quirks {
                vf_reset: false,
                memory: false,
                display_wait: true,
                clipping: true,
                shifting: true,
                jumping: true,
            },
            System::SuperChipModern => Quirks {
                vf_reset: false,
                memory: false,
                display_wait: false,
                clipping: true,
                shifting: true,
                jumping: true,
            },
            System::XoChip => Quirks {
                vf_reset: false,
                memory: true,
                display_wait: false,
                clipping: false,
                shifting: false,
                jumping: false,
            },
        }
    }

    /// Short name, as accepted by [`System::from_str`].
    pub const fn name(self) -> &'static str {
        match self {
            System::Chip8 => "chip8",
            System::SuperChipLegacy => "schip-legacy",
            System::SuperChipModern => "schip-modern",
            System::XoChip => "xochip",
        }
    }
}

impl fmt::Display for System {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for System {
    type Err = Chip8Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "chip8" | "chip-8" => Ok(System::Chip8),
            "schip-legacy" | "superchip-legacy" => Ok(System::SuperChipLegacy),
            "schip-modern" | "superchip-modern" | "schip" | "superchip" => {
                Ok(System::SuperChipModern)
            }
            "xochip" | "xo-chip" => Ok(System::XoChip),
            _ => Err(Chip8Error::UnknownSystem(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profiles() {
        let chip8 = System::Chip8.quirks();
        assert!(chip8.vf_reset && chip8.memory && chip8.display_wait && chip8.clipping);
        assert!(!chip8.shifting && !chip8.jumping);

        let legacy = System::SuperChipLegacy.quirks();
        assert!(legacy.display_wait && legacy.shifting && legacy.jumping);

        let modern = System::SuperChipModern.quirks();
        assert!(!modern.display_wait && modern.clipping && modern.shifting);

        let xo = System::XoChip.quirks();
        assert_eq!(xo, Quirks { memory: true, ..Default::default() });
    }

    #[test]
    fn test_parse_names() {
        for system in System::ALL {
            assert_eq!(system.to_string().parse::<System>().unwrap(), system);
        }
        assert_eq!("SUPERCHIP_LEGACY".parse::<System>().unwrap(), System::SuperChipLegacy);
        assert_eq!("XO-CHIP".parse::<System>().unwrap(), System::XoChip);
        assert!(matches!(
            "gameboy".parse::<System>(),
            Err(Chip8Error::UnknownSystem(name)) if name == "gameboy"
        ));
    }
}

use std::path::PathBuf;

use chip8::{clock::DEFAULT_CPU_CLOCK_HZ, EmulatorSpeed, System};
use clap::{ArgAction, Parser};

mod app;

/// Run a CHIP-8, SUPER-CHIP or XO-CHIP ROM headless and print the final screen.
#[derive(Parser, Debug)]
#[command(name = "chip8", version, about, long_about = None)]
pub struct Args {
    /// Path to the ROM file to run
    pub rom: PathBuf,

    /// Interpreter to emulate: chip8, schip-legacy, schip-modern or xochip
    #[arg(long, default_value = "chip8")]
    pub system: System,

    /// Emulation speed: half, full, one-and-half, double or a factor like 1.5x
    #[arg(long, default_value = "full")]
    pub speed: EmulatorSpeed,

    /// Instructions per second at full speed
    #[arg(long, default_value_t = DEFAULT_CPU_CLOCK_HZ)]
    pub cpu_hz: u32,

    /// Don't report sound
    #[arg(long)]
    pub mute: bool,

    /// Run in real time for this many milliseconds
    #[arg(long, default_value_t = 1000, conflicts_with = "cycles")]
    pub duration_ms: u64,

    /// Run exactly this many instructions on a simulated clock instead of in real time
    #[arg(long)]
    pub cycles: Option<u64>,

    /// Seed for the random number instruction, for reproducible runs
    #[arg(long)]
    pub seed: Option<u32>,

    /// Hex keys to press one after another, e.g. `5,A,0`
    #[arg(long, value_delimiter = ',', value_parser = parse_key)]
    pub keys: Vec<u8>,

    /// Log more, can be repeated
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

fn parse_key(s: &str) -> Result<u8, String> {
    let key = u8::from_str_radix(s.trim().trim_start_matches("0x"), 16)
        .map_err(|e| format!("`{s}` is not a hex key: {e}"))?;
    if key > 0xF {
        return Err(format!("key `{s}` is out of range, expected 0 to F"));
    }
    Ok(key)
}

fn setup_logger(verbosity: u8) -> Result<(), log::SetLoggerError> {
    let level = match verbosity {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    setup_logger(args.verbose)?;

    let mut app = app::App::new(&args)?;
    let report = app.run(&args)?;
    print!("{report}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key() {
        assert_eq!(parse_key("a"), Ok(0xA));
        assert_eq!(parse_key("0xF"), Ok(0xF));
        assert!(parse_key("10").is_err());
        assert!(parse_key("z").is_err());
    }

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from([
            "chip8",
            "game.ch8",
            "--system",
            "schip-modern",
            "--speed",
            "2x",
            "--cycles",
            "500",
            "--keys",
            "5,a",
            "-vv",
        ]);
        assert_eq!(args.system, System::SuperChipModern);
        assert_eq!(args.speed, EmulatorSpeed::Double);
        assert_eq!(args.cycles, Some(500));
        assert_eq!(args.keys, vec![5, 0xA]);
        assert_eq!(args.verbose, 2);
        assert!(!args.mute);
    }

    #[test]
    fn test_duration_conflicts_with_cycles() {
        let result =
            Args::try_parse_from(["chip8", "game.ch8", "--cycles", "5", "--duration-ms", "5"]);
        assert!(result.is_err());
    }
}

use std::{
    sync::mpsc::Receiver,
    thread,
    time::{Duration, Instant},
};

use anyhow::Context;
use chip8::{Chip8, Emulator, EmulatorConfig, KeyEvent, SeededRandom, VirtualClock};

use crate::Args;

/// How long each scripted key stays down, and the gap after it.
const KEY_HOLD: Duration = Duration::from_millis(100);

/// How often the sound stream is drained during a real time run.
const DRAIN_INTERVAL: Duration = Duration::from_millis(50);

/// The main application state.
///
/// Drives an [`Emulator`] headless, either in real time on its own clock
/// threads or on a [`VirtualClock`], and renders the result as text.
pub struct App {
    emulator: Emulator,
    sound: Receiver<bool>,
    sound_ticks: usize,
}

impl App {
    /// Create the emulator described by `args` and load its ROM.
    pub fn new(args: &Args) -> anyhow::Result<Self> {
        let config = EmulatorConfig::default()
            .with_system(args.system)
            .with_cpu_clock_hz(args.cpu_hz)
            .with_speed_factor(args.speed.factor())
            .with_sound_enabled(!args.mute);

        let mut emulator = match args.seed {
            Some(seed) => Emulator::with_random_source(config, Box::new(SeededRandom::new(seed))),
            None => Emulator::new(config),
        }
        .context("Failed to create the emulator")?;

        let rom = std::fs::read(&args.rom)
            .with_context(|| format!("Failed to read ROM from {}", args.rom.display()))?;
        emulator
            .load_rom(&rom)
            .with_context(|| format!("Failed to load ROM {}", args.rom.display()))?;

        let sound = emulator.subscribe_sound();
        Ok(Self {
            emulator,
            sound,
            sound_ticks: 0,
        })
    }

    /// Run the loaded ROM and return the report to print.
    pub fn run(&mut self, args: &Args) -> anyhow::Result<String> {
        match args.cycles {
            Some(cycles) => self.run_cycles(cycles, &args.keys, args.cpu_hz),
            None => self.run_for(Duration::from_millis(args.duration_ms), &args.keys)?,
        }
        self.drain_sound();
        Ok(self.report())
    }

    /// Count the sounding ticks published since the last drain.
    ///
    /// The subscription is bounded, so this has to keep up with the timer.
    fn drain_sound(&mut self) {
        self.sound_ticks += self.sound.try_iter().filter(|&on| on).count();
    }

    /// Sleep until `deadline`, draining the sound stream along the way.
    fn wait_until(&mut self, deadline: Instant) {
        loop {
            self.drain_sound();
            let Some(left) = deadline.checked_duration_since(Instant::now()) else {
                break;
            };
            thread::sleep(left.min(DRAIN_INTERVAL));
        }
    }

    /// Run on the emulator's clock threads for `duration` of wall time.
    fn run_for(&mut self, duration: Duration, keys: &[u8]) -> anyhow::Result<()> {
        let started = Instant::now();
        self.emulator.start()?;

        for &key in keys {
            self.wait_until(Instant::now() + KEY_HOLD);
            self.emulator.on_key(key, KeyEvent::Down);
            self.wait_until(Instant::now() + KEY_HOLD);
            self.emulator.on_key(key, KeyEvent::Up);
        }
        self.wait_until(started + duration);

        self.emulator.pause();
        log::debug!("Ran for {:?}", started.elapsed());
        Ok(())
    }

    /// Run exactly `cycles` instructions on a simulated clock.
    fn run_cycles(&mut self, cycles: u64, keys: &[u8], cpu_hz: u32) {
        let mut clock = VirtualClock::new(cpu_hz, chip8::clock::TIMER_CLOCK_HZ);
        let hold = u64::from(cpu_hz) * KEY_HOLD.as_millis() as u64 / 1000;

        let mut remaining = cycles;
        for &key in keys {
            self.run_ticks(&mut clock, &mut remaining, cpu_hz, hold);
            self.emulator.on_key(key, KeyEvent::Down);
            self.run_ticks(&mut clock, &mut remaining, cpu_hz, hold);
            self.emulator.on_key(key, KeyEvent::Up);
        }
        self.run_ticks(&mut clock, &mut remaining, cpu_hz, u64::MAX);
        log::debug!("Ran {} cycles and {} timer ticks", clock.cpu_ticks(), clock.timer_ticks());
    }

    /// Run up to `count` of the `remaining` cycles, half a simulated second
    /// at a time so the sound stream never fills up.
    fn run_ticks(
        &mut self,
        clock: &mut VirtualClock,
        remaining: &mut u64,
        cpu_hz: u32,
        count: u64,
    ) {
        let chunk = u64::from(cpu_hz / 2).max(1);
        let mut count = count.min(*remaining);
        while count > 0 {
            let step = count.min(chunk);
            clock.run_cpu_ticks(&mut self.emulator, step);
            self.drain_sound();
            count -= step;
            *remaining -= step;
        }
    }

    /// The final screen followed by a dump of the machine state.
    pub fn report(&self) -> String {
        let mut out = self.emulator.frame().to_ascii();
        out.push_str(&self.emulator.with_machine(|machine| registers(machine)));
        out.push_str(&format!("sound ticks: {}\n", self.sound_ticks));
        out
    }
}

fn registers(machine: &Chip8) -> String {
    let p = &machine.processor;
    let v: Vec<String> = p
        .v
        .iter()
        .enumerate()
        .map(|(i, v)| format!("V{i:X}={v:02X}"))
        .collect();
    format!(
        "system: {}  pc: {:#06X}  i: {:#06X}  opcode: {:04X} at {:#06X}\n{}\n\
         dt: {}  st: {}  stack depth: {}  resolution: {:?}\n",
        machine.system(),
        p.pc,
        p.i,
        p.last_opcode,
        p.last_opcode_addr,
        v.join(" "),
        machine.bus.timers.delay,
        machine.bus.timers.sound,
        p.stack.len(),
        p.resolution
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use super::*;

    fn args_for(rom: &str, extra: &[&str]) -> Args {
        let mut argv = vec!["chip8".to_string(), rom.to_string()];
        argv.extend(extra.iter().map(|s| s.to_string()));
        Args::parse_from(argv)
    }

    fn ibm_logo_path() -> String {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../chip8/roms/ibm_logo.ch8")
            .display()
            .to_string()
    }

    #[test]
    fn test_cycles_run_is_reproducible() {
        let args = args_for(&ibm_logo_path(), &["--cycles", "1000", "--seed", "1"]);
        let first = App::new(&args).unwrap().run(&args).unwrap();
        let second = App::new(&args).unwrap().run(&args).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("pc: 0x0228"));
        assert!(first.lines().nth(8).unwrap().contains("########"));
    }

    #[test]
    fn test_keys_in_cycles_run() {
        // wait for a key into V0, then loop
        let dir = std::env::temp_dir().join(format!("chip8-frontend-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let rom = dir.join("wait_key.ch8");
        std::fs::write(&rom, [0xF0, 0x0A, 0x12, 0x02]).unwrap();

        let rom = rom.display().to_string();
        let args = args_for(&rom, &["--cycles", "500", "--keys", "b"]);
        let report = App::new(&args).unwrap().run(&args).unwrap();
        assert!(report.contains("V0=0B"));
        assert!(report.contains("pc: 0x0202"));
    }

    #[test]
    fn test_sound_ticks_counted_past_channel_capacity() {
        // V0 = 200, ST = V0, loop
        let dir = std::env::temp_dir().join(format!("chip8-sound-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let rom = dir.join("long_tone.ch8");
        std::fs::write(&rom, [0x60, 0xC8, 0xF0, 0x18, 0x12, 0x04]).unwrap();

        let rom = rom.display().to_string();
        let args = args_for(&rom, &["--cycles", "5000"]);
        let report = App::new(&args).unwrap().run(&args).unwrap();
        assert!(report.ends_with("sound ticks: 200\n"), "{report}");
        assert!(report.contains("st: 0"));
    }

    #[test]
    fn test_muted_run_reports_no_sound() {
        let dir = std::env::temp_dir().join(format!("chip8-mute-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let rom = dir.join("long_tone.ch8");
        std::fs::write(&rom, [0x60, 0xC8, 0xF0, 0x18, 0x12, 0x04]).unwrap();

        let rom = rom.display().to_string();
        let args = args_for(&rom, &["--cycles", "5000", "--mute"]);
        let report = App::new(&args).unwrap().run(&args).unwrap();
        assert!(report.ends_with("sound ticks: 0\n"), "{report}");
    }

    #[test]
    fn test_missing_rom_is_an_error() {
        let args = args_for("/definitely/not/here.ch8", &[]);
        let err = App::new(&args).err().unwrap();
        assert!(format!("{err:#}").contains("Failed to read ROM"));
    }
}

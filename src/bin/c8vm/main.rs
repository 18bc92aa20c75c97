// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! c8vm: runs a Chip-8 program in the terminal
//!
//! The program runs headless for a fixed number of frames, and the screen is
//! printed when it stops.

mod host;

use c8vm::*;
use gumdrop::*;
use host::{Bell, Dirty};
use owo_colors::OwoColorize;
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

/// Frames per second. The timers count down once per frame.
const FRAME_RATE: u64 = 60;

pub fn main() -> Result<()> {
    let options = Arguments::parse_args_default_or_exit();
    let (keys, output, audio) = (Keys::new(), Dirty::default(), Bell::default());
    let mut state = State::new(options, Io::new(&keys, &output, &audio))?;
    if let Some(key) = state.key {
        keys.press(key as usize)?;
    }
    while let Some(result) = state.next() {
        if let Err(e) = result {
            state.report(&e);
            break;
        }
        if state.watch && output.take() {
            state.ch8.cpu.screen().print_screen();
        }
    }
    state.ch8.cpu.screen().print_screen();
    if state.ch8.cpu.flags.debug {
        state.ch8.cpu.dump();
    }
    Ok(())
}

/// Parses a hexadecimal string into a u8
fn parse_hex(value: &str) -> std::result::Result<u8, std::num::ParseIntError> {
    u8::from_str_radix(value, 16)
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Options, Hash)]
struct Arguments {
    #[options(help = "Load a ROM to run on c8vm.", required, free)]
    pub file: PathBuf,
    #[options(help = "Print this help message.")]
    help: bool,
    #[options(help = "Enable debug mode at startup.")]
    pub debug: bool,

    #[options(
        short = "r",
        help = "Set the instruction clock, in Hz.",
        default = "500",
        meta = "HZ"
    )]
    pub clock: u64,
    #[options(
        short = "n",
        help = "Stop after this many frames.",
        default = "600",
        meta = "N"
    )]
    pub frames: u64,
    #[options(
        short = "k",
        help = "Hold KEY down, and deliver it to every wait-for-key.",
        parse(try_from_str = "parse_hex"),
        meta = "KEY"
    )]
    pub key: Option<u8>,

    #[options(
        short = "c",
        help = "Use CHIP-48 style DMA instructions, which don't touch I."
    )]
    pub memory: bool,
    #[options(short = "i", help = "Don't set vF when adding to I overflows.")]
    pub index: bool,

    #[options(short = "f", help = "Run as fast as possible, instead of in realtime.")]
    pub fast: bool,
    #[options(short = "w", help = "Print the screen after every frame that drew to it.")]
    pub watch: bool,
}

/// Turns a clock rate into a whole number of steps per frame, carrying the remainder
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
struct Scheduler {
    clock: u64,
    credit: u64,
}

impl Scheduler {
    fn new(clock: u64) -> Self {
        Self { clock, credit: 0 }
    }
    /// Gets the number of steps to run in the next frame
    fn steps(&mut self) -> usize {
        self.credit = self.credit.saturating_add(self.clock);
        let steps = self.credit / FRAME_RATE;
        self.credit %= FRAME_RATE;
        steps as usize
    }
}

#[derive(Debug)]
struct State<'a> {
    pub ch8: Chip8<'a>,
    pub scheduler: Scheduler,
    pub key: Option<u8>,
    pub frames: u64,
    pub fast: bool,
    pub watch: bool,
    pub ft: Instant,
}

impl<'a> State<'a> {
    fn new(options: Arguments, io: Io<'a>) -> Result<Self> {
        let mut state = State {
            ch8: Chip8::with_flags(
                io,
                Flags {
                    debug: options.debug,
                    quirks: Quirks {
                        dma_inc: options.memory,
                        add_i_flag: options.index,
                    },
                    ..Default::default()
                },
            ),
            scheduler: Scheduler::new(options.clock),
            key: options.key,
            frames: options.frames,
            fast: options.fast,
            watch: options.watch,
            ft: Instant::now(),
        };
        state.ch8.load_program(&options.file)?;
        Ok(state)
    }
    fn tick_cpu(&mut self) -> Result<()> {
        let steps = self.scheduler.steps();
        self.ch8.multistep(steps)?;
        if let Some(key) = self.key {
            self.ch8.resolve_keypress(key)?;
        }
        Ok(())
    }
    fn wait_for_next_frame(&mut self) {
        if self.fast {
            return;
        }
        let rate = Duration::from_nanos(1_000_000_000 / FRAME_RATE + 1);
        std::thread::sleep(rate.saturating_sub(self.ft.elapsed()));
        self.ft += rate;
    }
    /// Prints a fatal error, and the instruction which caused it
    fn report(&self, e: &Error) {
        let cpu = &self.ch8.cpu;
        eprintln!("{}", e.bold().red());
        eprintln!(
            "{:03x}: {} {:04x}",
            cpu.pc(),
            Dis::default().once(cpu.mem().read_word(cpu.pc())),
            cpu.mem().read_word(cpu.pc()).bright_black(),
        );
    }
}

impl Iterator for State<'_> {
    type Item = Result<()>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.frames == 0 {
            return None;
        }
        self.frames -= 1;
        self.wait_for_next_frame();
        Some(self.tick_cpu())
    }
}

// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! This crate implements a Chip-8 interpreter as if it were a real CPU architecture.
//!
//! The [CPU] owns its memory, registers, timers and display buffer. Everything
//! outside the machine (keypad, pixels, tone) lives behind the ports in [io],
//! which the host implements and lends to the VM as an [Io] bundle.
//!
//! The VM does no scheduling of its own: the host calls [Chip8::step] at the
//! instruction clock, and [Chip8::tick] at 60Hz.
//!
//! # Examples
//! ```rust
//! # use c8vm::*;
//! # fn main() -> Result<()> {
//! let mut chip8 = Chip8::new(Io::default());
//! chip8.load_program_bytes(&[
//!     0x6a, 0x05, // ld  va, #05
//!     0x6b, 0x07, // ld  vb, #07
//!     0x8a, 0xb4, // add va, vb
//! ])?;
//! chip8.multistep(3)?;
//! assert_eq!(0x0c, chip8.cpu.v()[0xa]);
//! assert_eq!(0x00, chip8.cpu.v()[0xf]);
//! assert_eq!(0x206, chip8.cpu.pc());
//! # Ok(())
//! # }
//! ```

pub mod cpu;
pub mod error;
pub mod io;
pub mod screen;

use std::path::Path;

pub use cpu::{
    flags::Flags,
    instruction::{
        disassembler::{Dis, Disassembler},
        Insn,
    },
    mem::{Mem, MemWindow, Region, Region::*, FONT, MEM_SIZE},
    quirks::Quirks,
    State, CPU, STACK_DEPTH,
};
pub use error::{Error, Result};
pub use io::{Audio, Headless, Input, Io, Keys, Output};
pub use screen::Screen;

/// A [CPU], and the [Io] ports it talks to
#[derive(Clone, Debug)]
pub struct Chip8<'a> {
    /// The interpreter
    pub cpu: CPU,
    io: Io<'a>,
}

impl<'a> Chip8<'a> {
    /// Creates a VM with default [Flags] which talks to the provided ports
    pub fn new(io: Io<'a>) -> Self {
        Self::with_flags(io, Flags::default())
    }

    /// Creates a VM with the provided [Flags]
    pub fn with_flags(io: Io<'a>, flags: Flags) -> Self {
        Chip8 {
            cpu: CPU::new(flags),
            io,
        }
    }

    /// Gets the ports this VM talks to
    pub fn io(&self) -> Io<'a> {
        self.io
    }

    /// Reads a program from disk, loads it into program memory, and resets the VM
    pub fn load_program(&mut self, rom: impl AsRef<Path>) -> Result<&mut Self> {
        self.cpu.load_program(rom, &self.io)?;
        Ok(self)
    }

    /// Loads a program image into program memory, and resets the VM
    ///
    /// See [CPU::load_program_bytes]
    pub fn load_program_bytes(&mut self, rom: &[u8]) -> Result<&mut Self> {
        self.cpu.load_program_bytes(rom, &self.io)?;
        Ok(self)
    }

    /// Resets the VM, and reloads the current program
    pub fn reset(&mut self) -> &mut Self {
        self.cpu.reset(&self.io);
        self
    }

    /// Executes a single instruction
    pub fn step(&mut self) -> Result<&mut Self> {
        self.cpu.step(&self.io)?;
        Ok(self)
    }

    /// Counts the timers down once
    pub fn tick(&mut self) -> &mut Self {
        self.cpu.tick(&self.io);
        self
    }

    /// Executes `steps` instructions, then ticks the timers once
    pub fn multistep(&mut self, steps: usize) -> Result<&mut Self> {
        self.cpu.multistep(steps, &self.io)?;
        Ok(self)
    }

    /// Delivers a keypress to a pending wait-for-key
    ///
    /// See [CPU::resolve_keypress]
    pub fn resolve_keypress(&mut self, key: u8) -> Result<bool> {
        self.cpu.resolve_keypress(key)
    }
}

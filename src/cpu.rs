// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Decodes and runs instructions


pub mod behavior;
pub mod flags;
pub mod instruction;
pub mod mem;
pub mod quirks;
pub mod timer;

use self::{
    behavior::Flow,
    flags::Flags,
    instruction::{
        disassembler::{Dis, Disassembler},
        Insn,
    },
    mem::{Mem, Region},
    quirks::Quirks,
    timer::Timers,
};
use crate::{
    error::{Error, Result},
    io::Io,
    screen::Screen,
};
use imperative_rs::InstructionSet;
use owo_colors::OwoColorize;
use std::fmt::Debug;

type Reg = usize;
type Adr = u16;
type Nib = u8;

/// Maximum number of return addresses on the stack
pub const STACK_DEPTH: usize = 16;

/// Whether the CPU is executing, or waiting on a keypress
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum State {
    /// Fetching and executing instructions
    #[default]
    Running,
    /// Waiting for a keypress, which will be stored in v`target`
    Halted {
        /// The register awaiting the key
        target: usize,
    },
}

/// Represents the internal state of the CPU interpreter
#[derive(Clone, PartialEq)]
pub struct CPU {
    /// Flags that control how the CPU behaves, but which aren't inherent to the
    /// chip-8. Includes [Quirks], debug mode, etc.
    pub flags: Flags,
    // memory
    mem: Mem,
    screen: Screen,
    font: Adr,
    rom: Vec<u8>,
    stack: Vec<Adr>,
    // registers
    pc: Adr,
    i: Adr,
    v: [u8; 16],
    timers: Timers,
    // Execution data
    state: State,
    cycle: usize,
    disassembler: Dis,
}

// public interface
impl CPU {
    /// Constructs a new CPU with the provided [Flags]
    /// # Examples
    /// ```rust
    /// # use c8vm::*;
    /// let cpu = CPU::new(Flags {
    ///     quirks: Quirks::from(true),
    ///     ..Default::default()
    /// });
    /// dbg!(cpu);
    /// ```
    pub fn new(flags: Flags) -> Self {
        CPU {
            flags,
            ..Default::default()
        }
    }

    /// Loads a program into the CPU's program space, and resets the CPU
    pub fn load_program(&mut self, rom: impl AsRef<std::path::Path>, io: &Io) -> Result<&mut Self> {
        self.load_program_bytes(&std::fs::read(rom)?, io)
    }

    /// Loads bytes into the CPU's program space, and resets the CPU.
    ///
    /// If the program doesn't fit, returns [Error::RomTooLarge], and the CPU is untouched.
    /// # Examples
    /// ```rust
    /// # use c8vm::*;
    /// # fn main() -> Result<()> {
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[0x00, 0xe0], &Io::default())?;
    /// assert_eq!(&[0x00, 0xe0], &cpu.mem().get_region(Program)[0..2]);
    ///
    /// // There's only 0xe00 bytes of program memory
    /// let error = cpu.load_program_bytes(&[0; 0xe01], &Io::default()).unwrap_err();
    /// assert!(matches!(error, Error::RomTooLarge { size: 0xe01, max: 0xe00 }));
    /// assert_eq!(&[0x00, 0xe0], &cpu.mem().get_region(Program)[0..2]);
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_program_bytes(&mut self, rom: &[u8], io: &Io) -> Result<&mut Self> {
        if rom.len() > Region::Program.len() {
            return Err(Error::RomTooLarge {
                size: rom.len(),
                max: Region::Program.len(),
            });
        }
        self.rom = rom.to_vec();
        Ok(self.reset(io))
    }

    /// Resets the emulator, and reloads the current program.
    ///
    /// Touches the stack, pc, registers, timers, halt state, screen, memory and cycle count.
    /// Silences the tone if it was playing, and tells the [Output](crate::io::Output) the screen was cleared.
    ///
    /// Does not touch [Flags].
    pub fn reset(&mut self, io: &Io) -> &mut Self {
        if self.timers.sound() > 0 {
            io.audio.stop();
        }
        // clear the stack
        self.stack.truncate(0);
        // Reset the program counter
        self.pc = Region::Program.start();
        // Zero the registers
        self.i = 0;
        self.v = [0; 16];
        self.timers = Timers::default();
        self.state = State::Running;
        // Execution data
        self.cycle = 0;
        self.clear_screen(io);
        self.mem.reset();
        self.mem
            .load_region(Region::Program, &self.rom)
            .expect("rom size should be checked when it's loaded");
        self
    }

    /// Sets a general purpose register in the CPU.
    /// If the register doesn't exist, returns [Error::InvalidRegister]
    /// # Examples
    /// ```rust
    /// # use c8vm::*;
    /// // Create a new CPU, and set v4 to 0x41
    /// let mut cpu = CPU::default();
    /// cpu.set_v(0x4, 0x41).unwrap();
    /// assert_eq!(0x41, cpu.v()[4]);
    /// assert!(cpu.set_v(0x10, 0x41).is_err());
    /// ```
    pub fn set_v(&mut self, reg: Reg, value: u8) -> Result<()> {
        if let Some(gpr) = self.v.get_mut(reg) {
            *gpr = value;
            Ok(())
        } else {
            Err(Error::InvalidRegister { reg })
        }
    }

    /// Gets a slice of the entire general purpose registers
    pub fn v(&self) -> &[u8] {
        self.v.as_slice()
    }

    /// Gets the program counter
    /// # Examples
    /// ```rust
    /// # use c8vm::*;
    /// let cpu = CPU::default();
    /// assert_eq!(0x200, cpu.pc());
    /// ```
    pub fn pc(&self) -> Adr {
        self.pc
    }

    /// Gets the I register
    pub fn i(&self) -> Adr {
        self.i
    }

    /// Gets the value in the Sound Timer register
    pub fn sound(&self) -> u8 {
        self.timers.sound()
    }

    /// Gets the value in the Delay Timer register
    pub fn delay(&self) -> u8 {
        self.timers.delay()
    }

    /// Gets the return addresses on the stack, oldest first
    pub fn stack(&self) -> &[Adr] {
        self.stack.as_slice()
    }

    /// Gets the number of instructions the CPU has executed
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Gets the [State] of the CPU
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns true if the CPU is waiting on a keypress
    pub fn is_halted(&self) -> bool {
        matches!(self.state, State::Halted { .. })
    }

    /// Gets the display buffer
    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    /// Gets the CPU's memory
    pub fn mem(&self) -> &Mem {
        &self.mem
    }

    /// Gets the CPU's memory, mutably
    pub fn mem_mut(&mut self) -> &mut Mem {
        &mut self.mem
    }

    /// Resolves a pending wait-for-key (`Fx0A`), storing `key` in the waiting register.
    ///
    /// Returns true if the CPU was waiting, and is now running again.
    /// If key is outside range `0..=0xF`, returns [Error::InvalidKey].
    /// # Examples
    /// ```rust
    /// # use c8vm::*;
    /// # fn main() -> Result<()> {
    /// let io = Io::default();
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[0xf3, 0x0a], &io)?; // ld v3, K
    /// cpu.step(&io)?;
    /// assert!(cpu.is_halted());
    /// // Stepping while halted does nothing
    /// cpu.step(&io)?;
    /// assert_eq!(0x200, cpu.pc());
    ///
    /// assert!(cpu.resolve_keypress(0xa)?);
    /// assert_eq!(0xa, cpu.v()[3]);
    /// assert_eq!(0x202, cpu.pc());
    /// // Nobody's waiting anymore
    /// assert!(!cpu.resolve_keypress(0xb)?);
    /// # Ok(())
    /// # }
    /// ```
    pub fn resolve_keypress(&mut self, key: u8) -> Result<bool> {
        if key > 0xf {
            return Err(Error::InvalidKey { key: key as usize });
        }
        match self.state {
            State::Halted { target } => {
                self.v[target] = key;
                self.state = State::Running;
                self.pc = self.pc.wrapping_add(2) & 0xfff;
                Ok(true)
            }
            State::Running => Ok(false),
        }
    }

    /// Counts the delay and sound timers down. Call this at 60Hz.
    ///
    /// Stops the tone when the sound timer reaches zero.
    /// Does nothing while [paused](Flags::pause).
    pub fn tick(&mut self, io: &Io) -> &mut Self {
        if self.flags.pause {
            return self;
        }
        if self.timers.tick() {
            io.audio.stop();
        }
        self
    }

    /// Runs `steps` instructions, then ticks the timers once
    /// # Examples
    /// ```rust
    /// # use c8vm::*;
    /// let io = Io::default();
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[
    ///     0x00, 0xe0, // cls
    ///     0x12, 0x02, // jp $202
    /// ], &io).unwrap();
    /// cpu.multistep(0x20, &io)
    ///     .expect("The program should only have valid opcodes.");
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(0x20, cpu.cycle());
    /// ```
    pub fn multistep(&mut self, steps: usize, io: &Io) -> Result<&mut Self> {
        for _ in 0..steps {
            self.step(io)?;
        }
        Ok(self.tick(io))
    }

    /// Executes a single instruction
    ///
    /// Does nothing while [paused](Flags::pause) or [halted](State::Halted).
    ///
    /// Returns [Error::UnknownInstruction] if the instruction at `pc` is not a Chip-8 instruction.
    /// After an error, the pc still points at the instruction which caused it.
    /// # Examples
    /// ```rust
    /// # use c8vm::*;
    /// let io = Io::default();
    /// let mut cpu = CPU::default();
    /// cpu.load_program_bytes(&[
    ///     0x00, 0xe0, // cls
    ///     0x12, 0x02, // jp $202
    /// ], &io).unwrap();
    /// cpu.step(&io)
    ///     .expect("0x00e0 (cls) should be a valid opcode.");
    /// assert_eq!(0x202, cpu.pc());
    /// assert_eq!(1, cpu.cycle());
    /// ```
    /// Returns [Error::UnknownInstruction] if the instruction is not implemented.
    /// ```rust
    /// # use c8vm::*;
    /// let io = Io::default();
    /// let mut cpu = CPU::default();
    /// # cpu.flags.debug = true;        // enable live disassembly
    /// cpu.load_program_bytes(&[
    ///     0xff, 0xff, // invalid!
    ///     0x12, 0x02, // jp $202
    /// ], &io).unwrap();
    /// dbg!(cpu.step(&io))
    ///     .expect_err("Should return Error::UnknownInstruction { 0xffff }");
    /// assert_eq!(0x200, cpu.pc());
    /// ```
    pub fn step(&mut self, io: &Io) -> Result<&mut Self> {
        // Do nothing if paused or waiting for a key
        if self.flags.pause || self.is_halted() {
            return Ok(self);
        }
        // fetch opcode
        let word = self.mem.read_word(self.pc);

        // Print opcode disassembly:
        if self.flags.debug {
            std::println!(
                "{:3} {:03x}: {:<36}",
                self.cycle.bright_black(),
                self.pc,
                self.disassembler.once(word)
            );
        }

        // decode opcode
        let (_, insn) = Insn::decode(&word.to_be_bytes()).map_err(|_| Error::UnknownInstruction {
            word,
            addr: self.pc,
        })?;

        // execute, then move to whichever instruction comes next
        let next = match self.execute(insn, io)? {
            Flow::Next => self.pc.wrapping_add(2),
            Flow::Skip => self.pc.wrapping_add(4),
            Flow::Jump(addr) => addr,
            Flow::Wait => self.pc,
        };
        self.pc = next & 0xfff;
        self.cycle += 1;
        Ok(self)
    }

    /// Dumps the current state of all CPU registers, and the cycle count
    /// # Examples
    /// ```rust
    /// # use c8vm::*;
    /// let mut cpu = CPU::default();
    /// cpu.dump();
    /// ```
    /// outputs
    /// ```text
    /// PC: 0200, SP: 0000, I: 0000
    /// v0: 00 v1: 00 v2: 00 v3: 00
    /// v4: 00 v5: 00 v6: 00 v7: 00
    /// v8: 00 v9: 00 vA: 00 vB: 00
    /// vC: 00 vD: 00 vE: 00 vF: 00
    /// DLY: 0, SND: 0, CYC:      0
    /// ```
    pub fn dump(&self) {
        std::println!(
            "PC: {:04x}, SP: {:04x}, I: {:04x}\n{}DLY: {}, SND: {}, CYC: {:6}",
            self.pc,
            self.stack.len(),
            self.i,
            self.v
                .into_iter()
                .enumerate()
                .map(|(i, gpr)| {
                    format!(
                        "v{i:X}: {gpr:02x} {}",
                        match i % 4 {
                            3 => "\n",
                            _ => "",
                        }
                    )
                })
                .collect::<String>(),
            self.timers.delay(),
            self.timers.sound(),
            self.cycle,
        );
    }
}

impl Debug for CPU {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CPU")
            .field("flags", &self.flags)
            .field("font", &self.font)
            .field("stack", &self.stack)
            .field("pc", &self.pc)
            .field("i", &self.i)
            .field("v", &self.v)
            .field("timers", &self.timers)
            .field("state", &self.state)
            .field("cycle", &self.cycle)
            .field("disassembler", &self.disassembler)
            .finish_non_exhaustive()
    }
}

impl Default for CPU {
    /// Constructs a new CPU with sane defaults
    ///
    /// | value  | default | description
    /// |--------|---------|------------
    /// | font   |`0x0050` | Location of font memory.
    /// | pc     |`0x0200` | Start location.
    ///
    /// # Examples
    /// ```rust
    /// use c8vm::*;
    /// let mut cpu = CPU::default();
    /// ```
    fn default() -> Self {
        CPU {
            flags: Flags::default(),
            mem: Mem::new(),
            screen: Screen::new(),
            font: Region::Charset.start(),
            rom: vec![],
            stack: Vec::with_capacity(STACK_DEPTH),
            pc: Region::Program.start(),
            i: 0,
            v: [0; 16],
            timers: Timers::default(),
            state: State::Running,
            cycle: 0,
            disassembler: Dis::default(),
        }
    }
}

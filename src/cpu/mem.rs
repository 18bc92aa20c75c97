// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! The Mem represents the CPU's memory
//!
//! Contains some handy utils for reading and writing.
//! Every address is taken modulo [MEM_SIZE], so the VM can never fault on a
//! memory access.

use crate::error::{Error, Result};
use owo_colors::{OwoColorize, Style};
use std::{
    fmt::{Debug, Display, Formatter},
    ops::Range,
};

/// Size of Chip-8 memory, in bytes
pub const MEM_SIZE: usize = 0x1000;

/// The built-in hexadecimal font: sixteen 4x5 glyphs, five bytes each
pub const FONT: [u8; 80] = [
    0xf0, 0x90, 0x90, 0x90, 0xf0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xf0, 0x10, 0xf0, 0x80, 0xf0, // 2
    0xf0, 0x10, 0xf0, 0x10, 0xf0, // 3
    0x90, 0x90, 0xf0, 0x10, 0x10, // 4
    0xf0, 0x80, 0xf0, 0x10, 0xf0, // 5
    0xf0, 0x80, 0xf0, 0x90, 0xf0, // 6
    0xf0, 0x10, 0x20, 0x40, 0x40, // 7
    0xf0, 0x90, 0xf0, 0x90, 0xf0, // 8
    0xf0, 0x90, 0xf0, 0x10, 0xf0, // 9
    0xf0, 0x90, 0xf0, 0x90, 0x90, // A
    0xe0, 0x90, 0xe0, 0x90, 0xe0, // B
    0xf0, 0x80, 0x80, 0x80, 0xf0, // C
    0xe0, 0x90, 0x90, 0x90, 0xe0, // D
    0xf0, 0x80, 0xf0, 0x80, 0xf0, // E
    0xf0, 0x80, 0xf0, 0x80, 0x80, // F
];

/// Represents a named region in memory
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    /// Character ROM (but writable!)
    Charset,
    /// Program memory
    Program,
}

impl Region {
    /// Gets the range of addresses covered by this [Region]
    /// # Examples
    /// ```rust
    /// # use c8vm::*;
    /// assert_eq!(0x050..0x0a0, Charset.range());
    /// assert_eq!(0x200..0x1000, Program.range());
    /// ```
    pub const fn range(self) -> Range<usize> {
        match self {
            Region::Charset => 0x050..0x0a0,
            Region::Program => 0x200..MEM_SIZE,
        }
    }

    /// Gets the first address of this [Region]
    pub const fn start(self) -> u16 {
        self.range().start as u16
    }

    /// Gets the size of this [Region], in bytes
    pub const fn len(self) -> usize {
        self.range().end - self.range().start
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Region::Charset => "Charset",
                Region::Program => "Program",
            }
        )
    }
}

/// 4 KiB of byte-addressable memory, with the font preloaded into [Region::Charset]
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Mem {
    memory: Vec<u8>,
}

impl Mem {
    /// Constructs a new mem, with the font loaded
    /// # Examples
    /// ```rust
    ///# use c8vm::*;
    ///     let mem = Mem::new();
    ///     assert_eq!(0x1000, mem.len());
    ///     assert_eq!(&FONT, mem.get_region(Charset));
    /// ```
    pub fn new() -> Self {
        let mut mem = Mem {
            memory: vec![0; MEM_SIZE],
        };
        mem.reset();
        mem
    }

    /// Gets the length of the mem' backing memory
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if the backing memory contains no elements
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Zeroes all of memory, then reloads the font
    pub fn reset(&mut self) -> &mut Self {
        self.memory.fill(0);
        self.memory[Region::Charset.range()].copy_from_slice(&FONT);
        self
    }

    /// Reads the byte at `addr`, wrapping around the end of memory
    #[inline(always)]
    pub fn read(&self, addr: impl Into<usize>) -> u8 {
        self.memory[addr.into() % MEM_SIZE]
    }

    /// Writes the byte at `addr`, wrapping around the end of memory
    #[inline(always)]
    pub fn write(&mut self, addr: impl Into<usize>, data: u8) {
        self.memory[addr.into() % MEM_SIZE] = data;
    }

    /// Reads a big-endian word at `addr`. Both bytes wrap independently.
    /// # Examples
    /// ```rust
    ///# use c8vm::*;
    ///     let mut mem = Mem::new();
    ///     mem.write(0xfffu16, 0x12);
    ///     mem.write(0x000u16, 0x34);
    ///     assert_eq!(0x1234, mem.read_word(0xfffu16));
    /// ```
    pub fn read_word(&self, addr: impl Into<usize>) -> u16 {
        let addr = addr.into();
        u16::from_be_bytes([self.read(addr), self.read(addr + 1)])
    }

    /// Reads `len` consecutive bytes starting at `addr`, wrapping around the end of memory
    pub fn bytes(&self, addr: impl Into<usize>, len: usize) -> impl Iterator<Item = u8> + '_ {
        let addr = addr.into();
        (addr..addr + len).map(|addr| self.read(addr))
    }

    /// Loads data into a named [Region]
    ///
    /// If the data doesn't fit, returns [Error::RomTooLarge] without touching memory.
    /// # Examples
    /// ```rust
    ///# use c8vm::*;
    ///# fn main() -> Result<()> {
    ///     let mut mem = Mem::new();
    ///     mem.load_region(Program, b"Hello, world!")?;
    ///     assert!(mem.get_region(Program).starts_with(b"Hello, world!"));
    ///     assert!(mem.load_region(Program, &[0; 0xe01]).is_err());
    ///#    Ok(())
    ///# }
    /// ```
    pub fn load_region(&mut self, name: Region, data: &[u8]) -> Result<&mut Self> {
        if data.len() > name.len() {
            return Err(Error::RomTooLarge {
                size: data.len(),
                max: name.len(),
            });
        }
        let start = name.range().start;
        self.memory[start..start + data.len()].copy_from_slice(data);
        Ok(self)
    }

    /// Fills a [Region] with zeroes
    pub fn clear_region(&mut self, name: Region) -> &mut Self {
        self.get_region_mut(name).fill(0);
        self
    }

    /// Gets a slice of a named [Region] of memory
    #[inline(always)]
    pub fn get_region(&self, name: Region) -> &[u8] {
        &self.memory[name.range()]
    }

    /// Gets a mutable slice of a named region of memory
    #[inline(always)]
    pub fn get_region_mut(&mut self, name: Region) -> &mut [u8] {
        &mut self.memory[name.range()]
    }

    /// Creates a window into the Mem which implements Display
    ///
    /// The range is clipped to the end of memory.
    pub fn window(&self, range: Range<usize>) -> MemWindow {
        let end = range.end.min(self.memory.len());
        let start = range.start.min(end);
        MemWindow {
            start,
            mem: &self.memory[start..end],
        }
    }
}

impl Default for Mem {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Mem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mem")
            .field("len", &self.memory.len())
            .finish_non_exhaustive()
    }
}

impl Display for Mem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.window(0..self.len()))
    }
}

/// A hexdump of part of a [Mem]
pub struct MemWindow<'a> {
    start: usize,
    mem: &'a [u8],
}

impl<'a> Display for MemWindow<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Green phosphor style formatting, for taste
        let term: Style = Style::new().bold().green().on_black();
        for (index, byte) in self.mem.iter().enumerate() {
            if index % 16 == 0 {
                write!(
                    f,
                    "{:>03x}{} ",
                    (self.start + index).style(term),
                    ":".style(term)
                )?
            }
            write!(f, "{byte:02x}")?;
            write!(
                f,
                "{}",
                match index % 16 {
                    0xf => "\n",
                    0x7 => "  ",
                    _ if index % 2 == 1 => " ",
                    _ => "",
                }
            )?
        }
        Ok(())
    }
}

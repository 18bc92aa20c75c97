// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)
#![allow(clippy::bad_bit_mask)]
//! Contains the definition of a Chip-8 [Insn]
//!
//! The decoder is derived from each variant's opcode pattern: hex digits are
//! matched literally, and the remaining letters are the variant's operands.
//! `x`/`y` are register nibbles, `n` is a nibble, `B` is a byte and `A` is a
//! 12-bit address.

pub mod disassembler;

use imperative_rs::InstructionSet;
use std::fmt::Display;

#[allow(non_camel_case_types, non_snake_case, missing_docs)]
#[derive(Clone, Copy, Debug, InstructionSet, PartialEq, Eq, Hash)]
/// A decoded Chip-8 instruction, with its operands
pub enum Insn {
    /// | 00e0 | Clear screen memory to 0s
    #[opcode = "0x00e0"]
    cls,
    /// | 00ee | Return from subroutine
    #[opcode = "0x00ee"]
    ret,
    /// | 1aaa | Jumps to an absolute address
    #[opcode = "0x1AAA"]
    jp { A: u16 },
    /// | 2aaa | Pushes pc onto the stack, then jumps to a
    #[opcode = "0x2AAA"]
    call { A: u16 },
    /// | 3xbb | Skips next instruction if register X == b
    #[opcode = "0x3xBB"]
    seb { B: u8, x: usize },
    /// | 4xbb | Skips next instruction if register X != b
    #[opcode = "0x4xBB"]
    sneb { B: u8, x: usize },
    /// | 5XY0 | Skip next instruction if vX == vY
    #[opcode = "0x5xy0"]
    se { y: usize, x: usize },
    /// | 6xbb | Loads immediate byte b into register vX
    #[opcode = "0x6xBB"]
    ldb { B: u8, x: usize },
    /// | 7xbb | Adds immediate byte b to register vX
    #[opcode = "0x7xBB"]
    addb { B: u8, x: usize },
    /// | 8xy0 | Loads the value of y into x
    #[opcode = "0x8xy0"]
    ld { y: usize, x: usize },
    /// | 8xy1 | Performs bitwise or of vX and vY, and stores the result in vX
    #[opcode = "0x8xy1"]
    or { y: usize, x: usize },
    /// | 8xy2 | Performs bitwise and of vX and vY, and stores the result in vX
    #[opcode = "0x8xy2"]
    and { y: usize, x: usize },
    /// | 8xy3 | Performs bitwise xor of vX and vY, and stores the result in vX
    #[opcode = "0x8xy3"]
    xor { y: usize, x: usize },
    /// | 8xy4 | Performs addition of vX and vY, and stores the result in vX
    #[opcode = "0x8xy4"]
    add { y: usize, x: usize },
    /// | 8xy5 | Performs subtraction of vX and vY, and stores the result in vX
    #[opcode = "0x8xy5"]
    sub { y: usize, x: usize },
    /// | 8xy6 | Performs bitwise right shift of vX
    #[opcode = "0x8xy6"]
    shr { y: usize, x: usize },
    /// | 8xy7 | Performs subtraction of vX from vY, and stores the result in vX
    #[opcode = "0x8xy7"]
    subn { y: usize, x: usize },
    /// | 8xyE | Performs bitwise left shift of vX
    #[opcode = "0x8xye"]
    shl { y: usize, x: usize },
    /// | 9XY0 | Skip next instruction if vX != vY
    #[opcode = "0x9xy0"]
    sne { y: usize, x: usize },
    /// | Aaaa | Load address #a into register I
    #[opcode = "0xaAAA"]
    ldi { A: u16 },
    /// | Baaa | Jump to &adr + v0
    #[opcode = "0xbAAA"]
    jpr { A: u16 },
    /// | Cxbb | Stores a random number & the provided byte into vX
    #[opcode = "0xcxBB"]
    rnd { B: u8, x: usize },
    /// | Dxyn | Draws n-byte sprite to the screen at coordinates (vX, vY)
    #[opcode = "0xdxyn"]
    drw { y: usize, x: usize, n: u8 },
    /// | eX9e | Skip next instruction if key == vX
    #[opcode = "0xex9e"]
    skp { x: usize },
    /// | eXa1 | Skip next instruction if key != vX
    #[opcode = "0xexa1"]
    sknp { x: usize },
    /// | fX07 | Set vX to value in delay timer
    #[opcode = "0xfx07"]
    lddt { x: usize },
    /// | fX0a | Wait for input, store key in vX
    #[opcode = "0xfx0a"]
    ldk { x: usize },
    /// | fX15 | Set delay timer to the value in vX
    #[opcode = "0xfx15"]
    setdt { x: usize },
    /// | fX18 | Set sound timer to the value in vX
    #[opcode = "0xfx18"]
    setst { x: usize },
    /// | fX1e | Add vX to I
    #[opcode = "0xfx1e"]
    addi { x: usize },
    /// | fX29 | Load sprite for character x into I
    #[opcode = "0xfx29"]
    font { x: usize },
    /// | fX33 | BCD convert X into I[0..3]
    #[opcode = "0xfx33"]
    bcd { x: usize },
    /// | fX55 | DMA Stor from I to registers 0..X
    #[opcode = "0xfx55"]
    store { x: usize },
    /// | fX65 | DMA Load from I to registers 0..X
    #[opcode = "0xfx65"]
    load { x: usize },
}

impl Display for Insn {
    #[rustfmt::skip]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Insn::cls               => write!(f, "cls    "),
            Insn::ret               => write!(f, "ret    "),
            Insn::jp { A }          => write!(f, "jp     ${A:03x}"),
            Insn::call { A }        => write!(f, "call   ${A:03x}"),
            Insn::seb { B, x }      => write!(f, "se     v{x:X}, #{B:02x}"),
            Insn::sneb { B, x }     => write!(f, "sne    v{x:X}, #{B:02x}"),
            Insn::se { y, x }       => write!(f, "se     v{x:X}, v{y:X}"),
            Insn::ldb { B, x }      => write!(f, "ld     v{x:X}, #{B:02x}"),
            Insn::addb { B, x }     => write!(f, "add    v{x:X}, #{B:02x}"),
            Insn::ld { y, x }       => write!(f, "ld     v{x:X}, v{y:X}"),
            Insn::or { y, x }       => write!(f, "or     v{x:X}, v{y:X}"),
            Insn::and { y, x }      => write!(f, "and    v{x:X}, v{y:X}"),
            Insn::xor { y, x }      => write!(f, "xor    v{x:X}, v{y:X}"),
            Insn::add { y, x }      => write!(f, "add    v{x:X}, v{y:X}"),
            Insn::sub { y, x }      => write!(f, "sub    v{x:X}, v{y:X}"),
            Insn::shr { y, x }      => write!(f, "shr    v{x:X}, v{y:X}"),
            Insn::subn { y, x }     => write!(f, "subn   v{x:X}, v{y:X}"),
            Insn::shl { y, x }      => write!(f, "shl    v{x:X}, v{y:X}"),
            Insn::sne { y, x }      => write!(f, "sne    v{x:X}, v{y:X}"),
            Insn::ldi { A }         => write!(f, "ld     I, ${A:03x}"),
            Insn::jpr { A }         => write!(f, "jp     v0, ${A:03x}"),
            Insn::rnd { B, x }      => write!(f, "rnd    v{x:X}, #{B:02x}"),
            Insn::drw { y, x, n }   => write!(f, "drw    v{x:X}, v{y:X}, #{n:x}"),
            Insn::skp { x }         => write!(f, "skp    v{x:X}"),
            Insn::sknp { x }        => write!(f, "sknp   v{x:X}"),
            Insn::lddt { x }        => write!(f, "ld     v{x:X}, DT"),
            Insn::ldk { x }         => write!(f, "ld     v{x:X}, K"),
            Insn::setdt { x }       => write!(f, "ld     DT, v{x:X}"),
            Insn::setst { x }       => write!(f, "ld     ST, v{x:X}"),
            Insn::addi { x }        => write!(f, "add    I, v{x:X}"),
            Insn::font { x }        => write!(f, "ld     F, v{x:X}"),
            Insn::bcd { x }         => write!(f, "ld     B, v{x:X}"),
            Insn::store { x }       => write!(f, "ld     [I], v{x:X}"),
            Insn::load { x }        => write!(f, "ld     v{x:X}, [I]"),
        }
    }
}

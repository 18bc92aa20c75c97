// (c) 2023 John A. Breaux
// This code is licensed under MIT license (see LICENSE for details)

//! Error type for c8vm

use thiserror::Error;

/// Result type, equivalent to [std::result::Result]<T, [enum@Error]>
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for c8vm.
///
/// Every variant is fatal to the running program: the VM never retries,
/// and leaves the program counter on the instruction that failed.
#[derive(Debug, Error)]
pub enum Error {
    /// The decoder found no instruction matching the word at `addr`
    #[error("opcode {word:04x} at {addr:03x} not recognized")]
    UnknownInstruction {
        /// The offending word
        word: u16,
        /// The address it was fetched from
        addr: u16,
    },
    /// A call was made with 16 return addresses already on the stack
    #[error("stack overflow: call at {addr:03x} exceeds 16 return addresses")]
    StackOverflow {
        /// The address of the call instruction
        addr: u16,
    },
    /// A return was made with no return address on the stack
    #[error("stack underflow: return at {addr:03x} with an empty stack")]
    StackUnderflow {
        /// The address of the return instruction
        addr: u16,
    },
    /// The program image doesn't fit in program memory
    #[error("rom is {size} bytes, but only {max} bytes of program memory exist")]
    RomTooLarge {
        /// The size of the rejected image
        size: usize,
        /// The size of program memory
        max: usize,
    },
    /// Tried to press a key that doesn't exist
    #[error("tried to press key {key:X} which does not exist")]
    InvalidKey {
        /// The offending key
        key: usize,
    },
    /// Tried to get/set an out-of-bounds register
    #[error("tried to access register v{reg:X} which does not exist")]
    InvalidRegister {
        /// The offending register
        reg: usize,
    },
    /// Error originated in [std::io]
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

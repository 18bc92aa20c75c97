//! Controls the [Quirks] behavior of the CPU on a granular level.

/// Controls the quirk behavior of the CPU on a granular level.
///
/// `false` is the behavior documented on each instruction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quirks {
    /// Chip-48: DMA instructions `Fx55`/`Fx65` shouldn't change I to I + x + 1
    pub dma_inc: bool,
    /// Chip-48: `Fx1E` shouldn't set vF when I overflows past `0xfff`
    pub add_i_flag: bool,
}

impl From<bool> for Quirks {
    fn from(value: bool) -> Self {
        Quirks {
            dma_inc: value,
            add_i_flag: value,
        }
    }
}

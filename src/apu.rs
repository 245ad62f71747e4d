//! APU register stub.
//!
//! Audio synthesis is out of scope, but the $4000-$4017 window still has to
//! exist: the CPU's power-up sequence silences the APU through the bus, and
//! games poke these registers constantly. Writes are accepted and traced,
//! reads return 0 (the real $4015 status would report channel state).
//!
//! The board registers this device twice, $4000-$4013 and $4015-$4017, so
//! the OAM DMA port at $4014 can sit in between without an overlap.

use log::trace;

use crate::bus::{BusError, BusSlave};

pub struct ApuRegisters {
    /// Window base in CPU space, for log readability only.
    base: u16,
    size: u16,
}

impl ApuRegisters {
    pub fn new(base: u16, size: u16) -> Self {
        Self { base, size }
    }
}

impl BusSlave for ApuRegisters {
    fn footprint(&self) -> u16 {
        self.size
    }

    fn read(&mut self, _offset: u16) -> Result<u8, BusError> {
        Ok(0)
    }

    fn write(&mut self, offset: u16, value: u8) -> Result<(), BusError> {
        trace!(
            "APU write {:#06X} = {:#04X} (ignored)",
            self.base + offset,
            value
        );
        Ok(())
    }
}

//! 2 KiB on-chip work RAM, mirrored four times through $0000-$1FFF.
//!
//! The mirroring itself lives in the board's bus map (four registrations of
//! the same device), so this device only sees offsets inside one 2 KiB bank.

use crate::bus::{BusError, BusSlave};

pub const RAM_SIZE: usize = 0x800;

pub struct OnChipRam {
    bytes: [u8; RAM_SIZE],
}

impl OnChipRam {
    pub fn new() -> Self {
        Self {
            bytes: [0; RAM_SIZE],
        }
    }

    /// Power-on clears the array. Real hardware comes up with garbage, but a
    /// fixed pattern keeps runs reproducible.
    pub fn power_on(&mut self) {
        self.bytes = [0; RAM_SIZE];
    }
}

impl Default for OnChipRam {
    fn default() -> Self {
        Self::new()
    }
}

impl BusSlave for OnChipRam {
    fn footprint(&self) -> u16 {
        RAM_SIZE as u16
    }

    fn read(&mut self, offset: u16) -> Result<u8, BusError> {
        Ok(self.bytes[offset as usize])
    }

    fn write(&mut self, offset: u16, value: u8) -> Result<(), BusError> {
        self.bytes[offset as usize] = value;
        Ok(())
    }
}

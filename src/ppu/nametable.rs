//! Nametable mirroring: 4 logical 1 KiB windows over 2 physical banks.
//!
//! The console only has 2 KiB of VRAM for four addressable nametables; the
//! cartridge decides which pairs of windows share a bank. See
//! <https://www.nesdev.org/wiki/Mirroring>.

use crate::bus::{BusError, BusSlave};
use crate::cartridge::mapper::Mirroring;

const BANK_SIZE: usize = 0x400;

pub struct NametableMirror {
    banks: [[u8; BANK_SIZE]; 2],
    mirroring: Mirroring,
}

impl NametableMirror {
    pub fn new() -> Self {
        Self {
            banks: [[0; BANK_SIZE]; 2],
            mirroring: Mirroring::Horizontal,
        }
    }

    /// Supplied by the cartridge at insertion.
    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        self.mirroring = mirroring;
    }

    /// Logical window (0-3) to physical bank (0-1).
    fn bank(&self, window: usize) -> usize {
        match self.mirroring {
            // Horizontal: {0,1} share bank 0, {2,3} share bank 1.
            Mirroring::Horizontal => window / 2,
            // Vertical: {0,2} share bank 0, {1,3} share bank 1.
            Mirroring::Vertical => window % 2,
        }
    }

    fn locate(&self, offset: u16) -> (usize, usize) {
        let window = (offset as usize / BANK_SIZE) % 4;
        (self.bank(window), offset as usize % BANK_SIZE)
    }
}

impl Default for NametableMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl BusSlave for NametableMirror {
    fn footprint(&self) -> u16 {
        0x1000
    }

    fn read(&mut self, offset: u16) -> Result<u8, BusError> {
        let (bank, index) = self.locate(offset);
        Ok(self.banks[bank][index])
    }

    fn write(&mut self, offset: u16, value: u8) -> Result<(), BusError> {
        let (bank, index) = self.locate(offset);
        self.banks[bank][index] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_pairs_windows_by_row() {
        let mut nt = NametableMirror::new();
        nt.set_mirroring(Mirroring::Horizontal);

        nt.write(0x0005, 0xAA).unwrap();
        assert_eq!(nt.read(0x0405).unwrap(), 0xAA); // window 1 shares bank 0
        assert_eq!(nt.read(0x0805).unwrap(), 0x00); // window 2 is bank 1

        nt.write(0x0C10, 0xBB).unwrap();
        assert_eq!(nt.read(0x0810).unwrap(), 0xBB); // windows 2 and 3 share
    }

    #[test]
    fn vertical_pairs_windows_by_column() {
        let mut nt = NametableMirror::new();
        nt.set_mirroring(Mirroring::Vertical);

        nt.write(0x0005, 0xAA).unwrap();
        assert_eq!(nt.read(0x0805).unwrap(), 0xAA); // window 2 shares bank 0
        assert_eq!(nt.read(0x0405).unwrap(), 0x00); // window 1 is bank 1

        nt.write(0x0410, 0xBB).unwrap();
        assert_eq!(nt.read(0x0C10).unwrap(), 0xBB); // windows 1 and 3 share
    }
}

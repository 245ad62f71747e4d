//! Palette RAM: 32 bytes at $3F00-$3F1F, mirrored through $3FFF.
//!
//! Entries $3F10/$3F14/$3F18/$3F1C alias the backdrop entries
//! $3F00/$3F04/$3F08/$3F0C; sprite palettes share their transparent color
//! with the background.

use crate::bus::{BusError, BusSlave};

pub struct PaletteRam {
    bytes: [u8; 32],
}

impl PaletteRam {
    pub fn new() -> Self {
        Self { bytes: [0; 32] }
    }

    fn index(offset: u16) -> usize {
        let mut index = (offset & 0x1F) as usize;
        if index >= 0x10 && index % 4 == 0 {
            index -= 0x10;
        }
        index
    }
}

impl Default for PaletteRam {
    fn default() -> Self {
        Self::new()
    }
}

impl BusSlave for PaletteRam {
    fn footprint(&self) -> u16 {
        0x100
    }

    fn read(&mut self, offset: u16) -> Result<u8, BusError> {
        Ok(self.bytes[Self::index(offset)])
    }

    fn write(&mut self, offset: u16, value: u8) -> Result<(), BusError> {
        self.bytes[Self::index(offset)] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backdrop_entries_alias_sprite_entries() {
        let mut palette = PaletteRam::new();
        palette.write(0x10, 0x21).unwrap();
        assert_eq!(palette.read(0x00).unwrap(), 0x21);

        palette.write(0x04, 0x15).unwrap();
        assert_eq!(palette.read(0x14).unwrap(), 0x15);
    }

    #[test]
    fn non_backdrop_entries_are_distinct() {
        let mut palette = PaletteRam::new();
        palette.write(0x11, 0x0A).unwrap();
        assert_eq!(palette.read(0x11).unwrap(), 0x0A);
        assert_eq!(palette.read(0x01).unwrap(), 0x00);
    }

    #[test]
    fn window_mirrors_every_32_bytes() {
        let mut palette = PaletteRam::new();
        palette.write(0x01, 0x30).unwrap();
        assert_eq!(palette.read(0x21).unwrap(), 0x30);
        assert_eq!(palette.read(0xE1).unwrap(), 0x30);
    }
}

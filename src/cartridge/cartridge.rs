//! A cartridge bound to both buses: the parsed image behind its mapper.

use std::io::Read;

use thiserror::Error;

use crate::bus::BusError;
use crate::cartridge::mapper::Mirroring;
use crate::cartridge::mapper::mapper::Mapper;
use crate::cartridge::mapper::mapper0::Mapper0;
use crate::cartridge::nes_file::{NesFile, NesFileError};

/// CPU-side window base: the cartridge owns $4020-$FFFF.
const CPU_WINDOW_BASE: u16 = 0x4020;

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("unsupported mapper {id}")]
    UnsupportedMapper { id: u8 },

    #[error(transparent)]
    Image(#[from] NesFileError),
}

/// Sits on the CPU bus at $4020-$FFFF and on the PPU bus at $0000-$1FFF.
/// Bus offsets are translated back to full addresses here, so mappers work
/// in the address space the documentation uses.
pub struct Cartridge {
    mapper: Box<dyn Mapper>,
}

impl Cartridge {
    pub fn new(image: NesFile) -> Result<Self, CartridgeError> {
        let mapper: Box<dyn Mapper> = match image.mapper_id {
            0 => Box::new(Mapper0::new(image)),
            id => return Err(CartridgeError::UnsupportedMapper { id }),
        };
        Ok(Self { mapper })
    }

    /// Parse an iNES image from `reader` and bind its mapper.
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, CartridgeError> {
        Self::new(NesFile::parse(reader)?)
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mapper.mirroring()
    }

    pub fn cpu_read(&mut self, offset: u16) -> Result<u8, BusError> {
        self.mapper.cpu_read(CPU_WINDOW_BASE + offset)
    }

    pub fn cpu_write(&mut self, offset: u16, value: u8) -> Result<(), BusError> {
        self.mapper.cpu_write(CPU_WINDOW_BASE + offset, value)
    }

    pub fn ppu_read(&mut self, offset: u16) -> Result<u8, BusError> {
        self.mapper.ppu_read(offset)
    }

    pub fn ppu_write(&mut self, offset: u16, value: u8) -> Result<(), BusError> {
        self.mapper.ppu_write(offset, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nrom_image(reset_vector: u16) -> Vec<u8> {
        let mut image = vec![0x4E, 0x45, 0x53, 0x1A, 1, 1, 0x01, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        let mut prg = vec![0u8; 16 * 1024];
        prg[0x3FFC] = reset_vector as u8;
        prg[0x3FFD] = (reset_vector >> 8) as u8;
        image.extend(prg);
        image.extend(vec![0u8; 8 * 1024]);
        image
    }

    #[test]
    fn binds_mapper_0_and_translates_cpu_offsets() {
        let image = nrom_image(0xC000);
        let mut cart = Cartridge::from_reader(&mut image.as_slice()).unwrap();

        assert_eq!(cart.mirroring(), Mirroring::Vertical);
        // $FFFC as an offset from the $4020 window base.
        assert_eq!(cart.cpu_read(0xFFFC - 0x4020).unwrap(), 0x00);
        assert_eq!(cart.cpu_read(0xFFFD - 0x4020).unwrap(), 0xC0);
    }

    #[test]
    fn rejects_unknown_mappers() {
        let mut image = nrom_image(0x8000);
        image[6] = 0x10; // mapper 1
        match Cartridge::from_reader(&mut image.as_slice()) {
            Err(CartridgeError::UnsupportedMapper { id }) => assert_eq!(id, 1),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("mapper 1 image was accepted"),
        }
    }
}

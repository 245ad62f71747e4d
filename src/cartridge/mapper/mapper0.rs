//! Mapper 0 (NROM): no bank switching, 16/32 KiB PRG, 8 KiB CHR.

use crate::bus::BusError;
use crate::cartridge::mapper::{Mirroring, mapper::Mapper};
use crate::cartridge::nes_file::NesFile;

const PRG_RAM_BASE: u16 = 0x6000;
const PRG_ROM_BASE: u16 = 0x8000;
const PRG_BANK: usize = 16 * 1024;

/// NROM: fixed PRG at $8000 (a 16 KiB image is mirrored twice), fixed CHR at
/// PPU $0000, optional PRG RAM at $6000. A CHR size of zero in the image
/// means 8 KiB of CHR RAM instead of ROM.
pub struct Mapper0 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_writable: bool,
    prg_ram: Vec<u8>,
    mirroring: Mirroring,
}

impl Mapper0 {
    pub fn new(image: NesFile) -> Self {
        let chr_writable = image.chr_rom.is_empty();
        let chr = if chr_writable {
            vec![0; 8 * 1024]
        } else {
            image.chr_rom
        };
        Self {
            prg_rom: image.prg_rom,
            chr,
            chr_writable,
            prg_ram: vec![0; image.prg_ram_size],
            mirroring: image.mirroring,
        }
    }
}

impl Mapper for Mapper0 {
    fn cpu_read(&mut self, address: u16) -> Result<u8, BusError> {
        match address {
            PRG_RAM_BASE..PRG_ROM_BASE => {
                let index = (address - PRG_RAM_BASE) as usize % self.prg_ram.len();
                Ok(self.prg_ram[index])
            }
            PRG_ROM_BASE..=0xFFFF => {
                let mut index = (address - PRG_ROM_BASE) as usize;
                if self.prg_rom.len() == PRG_BANK {
                    index %= PRG_BANK;
                }
                Ok(self.prg_rom[index])
            }
            _ => Err(BusError::ReadUnsupported { address }),
        }
    }

    fn cpu_write(&mut self, address: u16, value: u8) -> Result<(), BusError> {
        match address {
            PRG_RAM_BASE..PRG_ROM_BASE => {
                let index = (address - PRG_RAM_BASE) as usize % self.prg_ram.len();
                self.prg_ram[index] = value;
                Ok(())
            }
            _ => Err(BusError::WriteUnsupported { address }),
        }
    }

    fn ppu_read(&mut self, address: u16) -> Result<u8, BusError> {
        match self.chr.get((address & 0x1FFF) as usize) {
            Some(&byte) => Ok(byte),
            None => Err(BusError::ReadUnsupported { address }),
        }
    }

    fn ppu_write(&mut self, address: u16, value: u8) -> Result<(), BusError> {
        if !self.chr_writable {
            return Err(BusError::WriteUnsupported { address });
        }
        self.chr[(address & 0x1FFF) as usize] = value;
        Ok(())
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }
}

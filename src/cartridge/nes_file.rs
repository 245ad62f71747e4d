//! iNES image parsing.
//!
//! The [iNES](https://www.nesdev.org/wiki/INES) layout: a 16-byte header
//! starting with magic `NES\x1A`, an optional 512-byte trainer, then PRG ROM
//! and CHR ROM. Sizes come from the header in 16 KiB (PRG) and 8 KiB (CHR)
//! units; a PRG-RAM size of zero still means one 8 KiB unit for
//! compatibility with early dumps.

use std::io::{self, Read};

use thiserror::Error;

use crate::cartridge::mapper::Mirroring;

const MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];
const HEADER_SIZE: usize = 16;
const TRAINER_SIZE: usize = 512;
const PRG_UNIT: usize = 16 * 1024;
const CHR_UNIT: usize = 8 * 1024;
const PRG_RAM_UNIT: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum NesFileError {
    #[error("invalid cartridge image: bad magic {0:02X?}")]
    BadMagic([u8; 4]),

    #[error("truncated cartridge image while reading {section}")]
    Truncated { section: &'static str },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A parsed cartridge image, not yet bound to a mapper.
#[derive(Debug)]
pub struct NesFile {
    pub prg_rom: Vec<u8>,
    pub chr_rom: Vec<u8>,
    pub prg_ram_size: usize,
    pub mapper_id: u8,
    pub mirroring: Mirroring,
}

impl NesFile {
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self, NesFileError> {
        let mut header = [0u8; HEADER_SIZE];
        read_section(reader, &mut header, "header")?;

        let magic: [u8; 4] = [header[0], header[1], header[2], header[3]];
        if magic != MAGIC {
            return Err(NesFileError::BadMagic(magic));
        }

        let prg_rom_size = header[4] as usize * PRG_UNIT;
        let chr_rom_size = header[5] as usize * CHR_UNIT;
        let flags6 = header[6];
        let flags7 = header[7];
        let prg_ram_size = (header[8] as usize).max(1) * PRG_RAM_UNIT;

        let mirroring = if flags6 & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };
        let mapper_id = (flags6 >> 4) | (flags7 & 0xF0);

        // The trainer carries no information this core uses.
        if flags6 & 0x04 != 0 {
            let mut trainer = [0u8; TRAINER_SIZE];
            read_section(reader, &mut trainer, "trainer")?;
        }

        let mut prg_rom = vec![0u8; prg_rom_size];
        read_section(reader, &mut prg_rom, "PRG ROM")?;

        let mut chr_rom = vec![0u8; chr_rom_size];
        read_section(reader, &mut chr_rom, "CHR ROM")?;

        Ok(Self {
            prg_rom,
            chr_rom,
            prg_ram_size,
            mapper_id,
            mirroring,
        })
    }
}

fn read_section<R: Read>(
    reader: &mut R,
    buffer: &mut [u8],
    section: &'static str,
) -> Result<(), NesFileError> {
    reader.read_exact(buffer).map_err(|error| {
        if error.kind() == io::ErrorKind::UnexpectedEof {
            NesFileError::Truncated { section }
        } else {
            NesFileError::Io(error)
        }
    })
}

//! Cartridge mappers: PRG/CHR address translation and banking.
//!
//! Mapper 0 (NROM) and the common types every mapper shares.

/// Nametable mirroring mode for the PPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    Horizontal,
    Vertical,
}

pub mod mapper;

pub mod mapper0;

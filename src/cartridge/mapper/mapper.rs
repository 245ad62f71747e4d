//! Mapper trait: the single seam where cartridge-specific behavior lives.

use crate::bus::BusError;
use crate::cartridge::mapper::Mirroring;

/// A cartridge mapper sees full CPU addresses ($4020-$FFFF) and full PPU
/// pattern-table addresses ($0000-$1FFF). Accesses the board does not decode
/// fail loudly instead of fabricating a byte, so a ROM poking a hole in the
/// map is reported rather than masked.
pub trait Mapper {
    fn cpu_read(&mut self, address: u16) -> Result<u8, BusError>;

    fn cpu_write(&mut self, address: u16, value: u8) -> Result<(), BusError>;

    fn ppu_read(&mut self, address: u16) -> Result<u8, BusError>;

    fn ppu_write(&mut self, address: u16, value: u8) -> Result<(), BusError>;

    /// Nametable mirroring wired by this board.
    fn mirroring(&self) -> Mirroring;
}

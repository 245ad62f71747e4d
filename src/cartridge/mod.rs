//! Cartridge loading and mapping: iNES parsing, the mapper seam, and the
//! object that sits on both the CPU and PPU buses.

pub mod cartridge;
pub mod mapper;
pub mod nes_file;

pub use cartridge::{Cartridge, CartridgeError};
pub use mapper::Mirroring;
pub use nes_file::{NesFile, NesFileError};

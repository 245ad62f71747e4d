//! NES PPU (Picture Processing Unit): per-dot rendering pipeline, vblank
//! NMI signaling, and the $2000-$2007 register file.
//!
//! The PPU owns no video memory directly; pattern tables, nametables and
//! palette RAM sit behind its own bus, so cartridge CHR banking goes through
//! the same dispatch machinery as the CPU side. Pixels leave through the
//! [`PixelSink`] trait, keeping presentation out of the core.

pub mod nametable;
pub mod palette;
pub mod ppu;

pub use nametable::NametableMirror;
pub use palette::PaletteRam;
pub use ppu::{NES_PALETTE_RGB, Ppu};

/// Where emitted pixels go. One `draw_pixel` per visible dot's worth of
/// output, one `frame_complete` at the start of each vertical blank.
pub trait PixelSink {
    fn draw_pixel(&mut self, x: u8, y: u8, rgb: u32);

    /// The frame is done; the host may present it.
    fn frame_complete(&mut self);
}

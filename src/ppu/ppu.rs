//! PPU engine: the (scanline, dot) state machine and the register file.
//!
//! Timing follows <https://www.nesdev.org/wiki/PPU_rendering>: 341 dots per
//! scanline, 262 scanlines per frame; scanlines 0-239 are visible, 240 is
//! post-render, 241-260 vertical blank, 261 pre-render. Background fetches
//! run as an 8-step issue/consume pipeline over dots 1-256 of each visible
//! line, with all video memory traffic going through the PPU's own bus.

use log::debug;

use crate::bus::{BusError, BusMaster};
use crate::ppu::PixelSink;

/// NES 2C02-style 64-color palette (0xRRGGBB). Index 0 = backdrop.
pub const NES_PALETTE_RGB: [u32; 64] = [
    0x545454, 0x001E74, 0x081090, 0x300088, 0x440064, 0x5C0030, 0x540400, 0x3C1800, 0x202A00,
    0x083A00, 0x004000, 0x003C00, 0x00302C, 0x000000, 0x000000, 0x000000, 0x989698, 0x084CC4,
    0x3032EC, 0x5C1EE4, 0x8814B0, 0xA01464, 0x982220, 0x783C00, 0x545A00, 0x287200, 0x087C00,
    0x007628, 0x006678, 0x000000, 0x000000, 0x000000, 0xECEEEC, 0x3C7EEC, 0x5C5CEC, 0x8844EC,
    0xB02CEC, 0xE028B0, 0xD83C50, 0xC45400, 0xAC7000, 0x808800, 0x409C30, 0x20A458, 0x209A88,
    0x404040, 0x000000, 0x000000, 0xECEEEC, 0xA8BCEC, 0xBCACEC, 0xD4A0EC, 0xEC94EC, 0xEC90D4,
    0xEC9CB4, 0xE4B090, 0xDCC878, 0xD4DC78, 0xB8EC98, 0xA8ECBC, 0xA0E4E4, 0xA0A0A0, 0x000000,
    0x000000,
];

/// $2000 PPUCTRL.
#[derive(Debug, Clone, Copy, Default)]
pub struct Controller(u8);

impl Controller {
    pub fn bits(self) -> u8 {
        self.0
    }

    /// Base nametable address from bits 0-1.
    pub fn nametable_base(self) -> u16 {
        0x2000 | (u16::from(self.0 & 0x03) << 10)
    }

    /// $2007 address increment: 1 (across) or 32 (down).
    pub fn vram_increment(self) -> u16 {
        if self.0 & 0x04 != 0 { 32 } else { 1 }
    }

    pub fn background_pattern_base(self) -> u16 {
        if self.0 & 0x10 != 0 { 0x1000 } else { 0x0000 }
    }

    /// Bit 7: generate an NMI at the start of vertical blank.
    pub fn nmi_enabled(self) -> bool {
        self.0 & 0x80 != 0
    }
}

/// $2001 PPUMASK. Stored for completeness; this core always renders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Mask(u8);

impl Mask {
    pub fn bits(self) -> u8 {
        self.0
    }
}

/// $2002 PPUSTATUS.
#[derive(Debug, Clone, Copy, Default)]
pub struct Status(u8);

impl Status {
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn vblank(self) -> bool {
        self.0 & 0x80 != 0
    }

    pub fn set_vblank(&mut self, value: bool) {
        if value {
            self.0 |= 0x80;
        } else {
            self.0 &= !0x80;
        }
    }
}

/// Background fetch pipeline: each byte takes an issue tick (drive the read
/// onto the PPU bus) and a consume tick (latch the bus value). The consume
/// of the high pattern plane completes a tile and emits its 8 pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum TileFetch {
    #[default]
    IssueNametable,
    ConsumeNametable,
    IssueAttribute,
    ConsumeAttribute,
    IssuePatternLow,
    ConsumePatternLow,
    IssuePatternHigh,
    ConsumePatternHigh,
}

pub struct Ppu {
    pub scanline: u16,
    pub dot: u16,

    ctrl: Controller,
    mask: Mask,
    status: Status,

    oam: [u8; 256],
    oam_addr: u8,

    /// Shared first/second-write toggle for $2005 and $2006.
    write_toggle: bool,
    scroll_x: u8,
    scroll_y: u8,
    vram_address: u16,

    fetch: TileFetch,
    /// Tiles fetched since vblank; restarts every frame.
    frame_tiles: u32,
    tile_id: u8,
    tile_attribute: u8,
    pattern_low: u8,

    nmi_request: bool,
    frames: u64,
}

impl Ppu {
    pub fn new() -> Self {
        Self {
            scanline: 0,
            dot: 0,
            ctrl: Controller::default(),
            mask: Mask::default(),
            status: Status::default(),
            oam: [0; 256],
            oam_addr: 0,
            write_toggle: false,
            scroll_x: 0,
            scroll_y: 0,
            vram_address: 0,
            fetch: TileFetch::default(),
            frame_tiles: 0,
            tile_id: 0,
            tile_attribute: 0,
            pattern_low: 0,
            nmi_request: false,
            frames: 0,
        }
    }

    pub fn power_on(&mut self) {
        *self = Self::new();
    }

    pub fn reset(&mut self) {
        self.scanline = 0;
        self.dot = 0;
        self.fetch = TileFetch::default();
        self.write_toggle = false;
    }

    /// The PPU raised NMI since the last poll.
    pub fn take_nmi_request(&mut self) -> bool {
        std::mem::take(&mut self.nmi_request)
    }

    pub fn status_vblank(&self) -> bool {
        self.status.vblank()
    }

    /// Completed frames since power-on.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn oam(&self) -> &[u8; 256] {
        &self.oam
    }

    /// One PPU clock: at most one dot of work, then advance the counters.
    pub fn tick<M: BusMaster, V: PixelSink>(
        &mut self,
        bus: &mut M,
        sink: &mut V,
    ) -> Result<(), BusError> {
        match self.scanline {
            0..=239 => self.visible_dot(bus, sink)?,
            240 => {}
            241 => {
                if self.dot == 1 {
                    self.begin_vblank(sink);
                }
            }
            242..=260 => {}
            _ => {
                // Pre-render line.
                if self.dot == 1 {
                    self.status.set_vblank(false);
                }
            }
        }

        self.dot += 1;
        if self.dot > 340 {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline > 261 {
                self.scanline = 0;
                self.fetch = TileFetch::default();
            }
        }
        Ok(())
    }

    fn begin_vblank<V: PixelSink>(&mut self, sink: &mut V) {
        self.status.set_vblank(true);
        if self.ctrl.nmi_enabled() {
            self.nmi_request = true;
        }
        self.frames += 1;
        debug!(
            "vblank start, frame {} complete ({} tiles fetched)",
            self.frames, self.frame_tiles
        );
        self.frame_tiles = 0;
        self.fetch = TileFetch::default();
        sink.frame_complete();
    }

    fn visible_dot<M: BusMaster, V: PixelSink>(
        &mut self,
        bus: &mut M,
        sink: &mut V,
    ) -> Result<(), BusError> {
        if !(1..=256).contains(&self.dot) {
            return Ok(());
        }

        let tile_x = (self.dot - 1) / 8;
        let tile_y = self.scanline / 8;
        let fine_y = self.scanline % 8;

        self.fetch = match self.fetch {
            TileFetch::IssueNametable => {
                let address = self.ctrl.nametable_base() + tile_y * 32 + tile_x;
                bus.read(address)?;
                TileFetch::ConsumeNametable
            }
            TileFetch::ConsumeNametable => {
                self.tile_id = bus.value();
                TileFetch::IssueAttribute
            }
            TileFetch::IssueAttribute => {
                let address =
                    self.ctrl.nametable_base() + 0x3C0 + (tile_y / 4) * 8 + tile_x / 4;
                bus.read(address)?;
                TileFetch::ConsumeAttribute
            }
            TileFetch::ConsumeAttribute => {
                // 2-bit palette select for this tile's quadrant of the
                // 32x32-pixel attribute cell.
                let shift = ((tile_y & 0x02) << 1) | (tile_x & 0x02);
                self.tile_attribute = (bus.value() >> shift) & 0x03;
                TileFetch::IssuePatternLow
            }
            TileFetch::IssuePatternLow => {
                let address = self.ctrl.background_pattern_base()
                    + u16::from(self.tile_id) * 16
                    + fine_y;
                bus.read(address)?;
                TileFetch::ConsumePatternLow
            }
            TileFetch::ConsumePatternLow => {
                self.pattern_low = bus.value();
                TileFetch::IssuePatternHigh
            }
            TileFetch::IssuePatternHigh => {
                let address = self.ctrl.background_pattern_base()
                    + u16::from(self.tile_id) * 16
                    + fine_y
                    + 8;
                bus.read(address)?;
                TileFetch::ConsumePatternHigh
            }
            TileFetch::ConsumePatternHigh => {
                let pattern_high = bus.value();
                self.emit_tile(bus, sink, pattern_high)?;
                self.frame_tiles += 1;
                TileFetch::IssueNametable
            }
        };
        Ok(())
    }

    /// Combine the two pattern planes with the attribute bits and push 8
    /// pixels. The tile finished on the dot of its last fetch, so the first
    /// pixel sits 8 dots back.
    fn emit_tile<M: BusMaster, V: PixelSink>(
        &mut self,
        bus: &mut M,
        sink: &mut V,
        pattern_high: u8,
    ) -> Result<(), BusError> {
        let x0 = self.dot - 8;
        let y = self.scanline as u8;
        for i in 0..8u16 {
            let bit = 7 - i;
            let low = (self.pattern_low >> bit) & 1;
            let high = (pattern_high >> bit) & 1;
            let index = (high << 1) | low;

            let palette_address =
                0x3F00 + u16::from(self.tile_attribute) * 4 + u16::from(index);
            bus.read(palette_address)?;
            let rgb = NES_PALETTE_RGB[(bus.value() & 0x3F) as usize];
            sink.draw_pixel((x0 + i) as u8, y, rgb);
        }
        Ok(())
    }

    /// CPU-side register read, `offset` = address & 7. Reading $2002 clears
    /// the vblank flag and resets the $2005/$2006 write toggle.
    pub fn read_register<M: BusMaster>(
        &mut self,
        offset: u16,
        bus: &mut M,
    ) -> Result<u8, BusError> {
        match offset & 0x07 {
            0x02 => {
                let bits = self.status.bits();
                self.status.set_vblank(false);
                self.write_toggle = false;
                Ok(bits)
            }
            0x04 => Ok(self.oam[self.oam_addr as usize]),
            0x07 => {
                bus.read(self.vram_address & 0x3FFF)?;
                let value = bus.value();
                self.vram_address = self
                    .vram_address
                    .wrapping_add(self.ctrl.vram_increment());
                Ok(value)
            }
            offset => Err(BusError::ReadUnsupported {
                address: 0x2000 + offset,
            }),
        }
    }

    /// CPU-side register write, `offset` = address & 7.
    pub fn write_register<M: BusMaster>(
        &mut self,
        offset: u16,
        value: u8,
        bus: &mut M,
    ) -> Result<(), BusError> {
        match offset & 0x07 {
            0x00 => self.ctrl = Controller(value),
            0x01 => self.mask = Mask(value),
            0x02 => {
                return Err(BusError::WriteUnsupported { address: 0x2002 });
            }
            0x03 => self.oam_addr = value,
            0x04 => {
                self.oam[self.oam_addr as usize] = value;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            0x05 => {
                if self.write_toggle {
                    self.scroll_y = value;
                } else {
                    self.scroll_x = value;
                }
                self.write_toggle = !self.write_toggle;
            }
            0x06 => {
                // High byte first.
                if self.write_toggle {
                    self.vram_address = (self.vram_address & 0xFF00) | u16::from(value);
                } else {
                    self.vram_address =
                        (u16::from(value) << 8) | (self.vram_address & 0x00FF);
                }
                self.write_toggle = !self.write_toggle;
            }
            _ => {
                bus.set_value(value);
                bus.write(self.vram_address & 0x3FFF)?;
                self.vram_address = self
                    .vram_address
                    .wrapping_add(self.ctrl.vram_increment());
            }
        }
        Ok(())
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Flat 16 KiB PPU address space.
    struct TestVram {
        mem: [u8; 0x4000],
        value: u8,
    }

    impl TestVram {
        fn new() -> Self {
            Self {
                mem: [0; 0x4000],
                value: 0,
            }
        }
    }

    impl BusMaster for TestVram {
        fn acquire(&mut self) {}
        fn try_acquire(&mut self) -> bool {
            true
        }
        fn release(&mut self) {}
        fn value(&self) -> u8 {
            self.value
        }
        fn set_value(&mut self, value: u8) {
            self.value = value;
        }
        fn read(&mut self, address: u16) -> Result<(), BusError> {
            self.value = self.mem[(address & 0x3FFF) as usize];
            Ok(())
        }
        fn write(&mut self, address: u16) -> Result<(), BusError> {
            self.mem[(address & 0x3FFF) as usize] = self.value;
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingSink {
        pixels: usize,
        frames: usize,
        last: Option<(u8, u8, u32)>,
    }

    impl PixelSink for CountingSink {
        fn draw_pixel(&mut self, x: u8, y: u8, rgb: u32) {
            self.pixels += 1;
            self.last = Some((x, y, rgb));
        }
        fn frame_complete(&mut self) {
            self.frames += 1;
        }
    }

    fn run(ppu: &mut Ppu, vram: &mut TestVram, sink: &mut CountingSink, ticks: usize) {
        for _ in 0..ticks {
            ppu.tick(vram, sink).unwrap();
        }
    }

    #[test]
    fn vblank_flag_sets_at_241_1_and_clears_at_261_1() {
        let mut ppu = Ppu::new();
        let mut vram = TestVram::new();
        let mut sink = CountingSink::default();

        // Up to scanline 241, dot 1 inclusive.
        run(&mut ppu, &mut vram, &mut sink, 241 * 341 + 2);
        assert!(ppu.status_vblank());
        assert_eq!(sink.frames, 1);

        // On to scanline 261, dot 1 inclusive.
        run(&mut ppu, &mut vram, &mut sink, 20 * 341);
        assert!(!ppu.status_vblank());
    }

    #[test]
    fn frame_is_262_by_341_ticks() {
        let mut ppu = Ppu::new();
        let mut vram = TestVram::new();
        let mut sink = CountingSink::default();

        run(&mut ppu, &mut vram, &mut sink, 262 * 341);
        assert_eq!((ppu.scanline, ppu.dot), (0, 0));
        assert_eq!(sink.frames, 1);
        // 240 visible lines x 256 pixels.
        assert_eq!(sink.pixels, 240 * 256);
    }

    #[test]
    fn nmi_raised_only_when_enabled() {
        let mut ppu = Ppu::new();
        let mut vram = TestVram::new();
        let mut sink = CountingSink::default();

        run(&mut ppu, &mut vram, &mut sink, 262 * 341);
        assert!(!ppu.take_nmi_request());

        ppu.write_register(0x00, 0x80, &mut vram).unwrap();
        run(&mut ppu, &mut vram, &mut sink, 262 * 341);
        assert!(ppu.take_nmi_request());
        assert!(!ppu.take_nmi_request());
    }

    #[test]
    fn status_read_clears_vblank_and_write_toggle() {
        let mut ppu = Ppu::new();
        let mut vram = TestVram::new();
        let mut sink = CountingSink::default();

        run(&mut ppu, &mut vram, &mut sink, 241 * 341 + 2);
        assert!(ppu.status_vblank());

        // First $2006 write latches the high byte...
        ppu.write_register(0x06, 0x21, &mut vram).unwrap();
        let status = ppu.read_register(0x02, &mut vram).unwrap();
        assert_ne!(status & 0x80, 0);
        assert!(!ppu.status_vblank());

        // ...but the status read reset the toggle, so this is high again.
        ppu.write_register(0x06, 0x3F, &mut vram).unwrap();
        ppu.write_register(0x06, 0x00, &mut vram).unwrap();
        ppu.write_register(0x07, 0x2A, &mut vram).unwrap();
        assert_eq!(vram.mem[0x3F00], 0x2A);
    }

    #[test]
    fn vram_port_increments_by_1_or_32() {
        let mut ppu = Ppu::new();
        let mut vram = TestVram::new();

        ppu.write_register(0x06, 0x20, &mut vram).unwrap();
        ppu.write_register(0x06, 0x00, &mut vram).unwrap();
        ppu.write_register(0x07, 0x11, &mut vram).unwrap();
        ppu.write_register(0x07, 0x22, &mut vram).unwrap();
        assert_eq!(vram.mem[0x2000], 0x11);
        assert_eq!(vram.mem[0x2001], 0x22);

        ppu.write_register(0x00, 0x04, &mut vram).unwrap();
        ppu.write_register(0x06, 0x20, &mut vram).unwrap();
        ppu.write_register(0x06, 0x10, &mut vram).unwrap();
        ppu.write_register(0x07, 0x33, &mut vram).unwrap();
        ppu.write_register(0x07, 0x44, &mut vram).unwrap();
        assert_eq!(vram.mem[0x2010], 0x33);
        assert_eq!(vram.mem[0x2030], 0x44);
    }

    #[test]
    fn oam_data_write_increments_address() {
        let mut ppu = Ppu::new();
        let mut vram = TestVram::new();

        ppu.write_register(0x03, 0xFE, &mut vram).unwrap();
        ppu.write_register(0x04, 0xAA, &mut vram).unwrap();
        ppu.write_register(0x04, 0xBB, &mut vram).unwrap();
        ppu.write_register(0x04, 0xCC, &mut vram).unwrap(); // wraps to 0

        assert_eq!(ppu.oam()[0xFE], 0xAA);
        assert_eq!(ppu.oam()[0xFF], 0xBB);
        assert_eq!(ppu.oam()[0x00], 0xCC);
    }

    #[test]
    fn write_only_registers_fail_reads() {
        let mut ppu = Ppu::new();
        let mut vram = TestVram::new();

        let err = ppu.read_register(0x00, &mut vram).unwrap_err();
        assert_eq!(err, BusError::ReadUnsupported { address: 0x2000 });
        let err = ppu.write_register(0x02, 0, &mut vram).unwrap_err();
        assert_eq!(err, BusError::WriteUnsupported { address: 0x2002 });
    }

    #[test]
    fn background_pixels_come_from_pattern_and_palette() {
        let mut ppu = Ppu::new();
        let mut vram = TestVram::new();
        let mut sink = CountingSink::default();

        // Tile 1 at top-left, solid color index 1 on its first row.
        vram.mem[0x2000] = 0x01;
        vram.mem[0x0010] = 0xFF; // tile 1, low plane, row 0
        vram.mem[0x3F01] = 0x16; // palette 0, entry 1

        // First tile of the frame finishes at dot 8.
        run(&mut ppu, &mut vram, &mut sink, 9);
        assert_eq!(sink.pixels, 8);
        let (x, y, rgb) = sink.last.unwrap();
        assert_eq!((x, y), (7, 0));
        assert_eq!(rgb, NES_PALETTE_RGB[0x16]);
    }
}

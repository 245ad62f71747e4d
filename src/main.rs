//! NES emulator entry point.
//!
//! Loads a cartridge and runs the console with a display window.
//! Usage: vesper <path/to/game.nes>

use std::env;
use std::error::Error;
use std::fs::File;
use std::process;
use std::time::{Duration, Instant};

use ansi_term::Colour::{Green, Red};
use minifb::{Key, Window, WindowOptions};
use vesper::cartridge::Cartridge;
use vesper::ppu::PixelSink;
use vesper::system::NesSystem;

const WIDTH: usize = 256;
const HEIGHT: usize = 240;

/// NES runs at ~60.0988 Hz (NTSC). Target one frame per 16.67 ms.
const FRAME_DURATION: Duration = Duration::from_nanos(16_666_667);

/// Collects the PPU's pixels into a frame buffer for minifb.
struct WindowSink {
    buffer: Vec<u32>,
    frame_ready: bool,
}

impl WindowSink {
    fn new() -> Self {
        Self {
            buffer: vec![0; WIDTH * HEIGHT],
            frame_ready: false,
        }
    }
}

impl PixelSink for WindowSink {
    fn draw_pixel(&mut self, x: u8, y: u8, rgb: u32) {
        self.buffer[y as usize * WIDTH + x as usize] = rgb;
    }

    fn frame_complete(&mut self) {
        self.frame_ready = true;
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let path = env::args()
        .nth(1)
        .ok_or("usage: vesper <path/to/game.nes>")?;

    let mut file = File::open(&path)?;
    let cartridge = Cartridge::from_reader(&mut file)?;
    println!("{} loaded {}", Green.bold().paint("vesper"), path);

    let mut system = NesSystem::new(WindowSink::new())?;
    system.insert_cartridge(cartridge);
    system.power_up()?;

    let mut window = Window::new("Vesper", WIDTH, HEIGHT, WindowOptions {
        resize: true,
        scale: minifb::Scale::FitScreen,
        scale_mode: minifb::ScaleMode::AspectRatioStretch,
        ..WindowOptions::default()
    })?;
    window.set_target_fps(60);

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let frame_start = Instant::now();

        system.step_frame()?;
        if system.sink().frame_ready {
            window.update_with_buffer(&system.sink().buffer, WIDTH, HEIGHT)?;
            system.sink_mut().frame_ready = false;
        }

        // Emulation runs far faster than the real console; pace to ~60 fps.
        let elapsed = frame_start.elapsed();
        if elapsed < FRAME_DURATION {
            std::thread::sleep(FRAME_DURATION - elapsed);
        }
    }
    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {}", Red.bold().paint("error:"), error);
        process::exit(1);
    }
}

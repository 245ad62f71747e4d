//! Master clock: drives every clocked device in a fixed, deterministic order.
//!
//! The NES runs its CPU and PPU off one crystal; the PPU ticks three times
//! per CPU cycle. The [`Clock`] keeps two sink lists (1× and 3×) of opaque
//! sink ids and a [`SinkHost`] routes each id to the device the board owns.
//! One [`Clock::step`] is one master cycle: all 1× sinks once in
//! registration order, then all 3× sinks three times.
//!
//! The clock is unpaced. Real-time pacing belongs to the frontend, which
//! presents frames at ~60 fps; keeping the core free-running makes every
//! test deterministic.

/// A device the board owns, addressed by sink id.
///
/// Implemented by the system board; the clock never touches devices
/// directly.
pub trait SinkHost<S: Copy> {
    /// One clock tick for the device behind `sink`.
    fn tick(&mut self, sink: S);

    /// Power-on hook, fired once before the first tick.
    fn power_on(&mut self, sink: S);

    /// Reset hook (the console's reset button).
    fn reset(&mut self, sink: S);
}

/// The deterministic scheduler for one board.
pub struct Clock<S> {
    sinks: Vec<S>,
    sinks_3x: Vec<S>,
}

impl<S: Copy> Clock<S> {
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            sinks_3x: Vec::new(),
        }
    }

    /// Register a sink in the 1× domain (CPU, RAM, DMA).
    pub fn add_sink(&mut self, sink: S) {
        self.sinks.push(sink);
    }

    /// Register a sink in the 3× domain (PPU).
    pub fn add_3x_sink(&mut self, sink: S) {
        self.sinks_3x.push(sink);
    }

    /// Fire every power-on hook, 1× domain first, in registration order.
    pub fn power_up<H: SinkHost<S>>(&mut self, host: &mut H) {
        for &sink in &self.sinks {
            host.power_on(sink);
        }
        for &sink in &self.sinks_3x {
            host.power_on(sink);
        }
    }

    /// Fire every reset hook in registration order.
    pub fn reset<H: SinkHost<S>>(&mut self, host: &mut H) {
        for &sink in &self.sinks {
            host.reset(sink);
        }
        for &sink in &self.sinks_3x {
            host.reset(sink);
        }
    }

    /// One master cycle: each 1× sink once, then each 3× sink three times.
    pub fn step<H: SinkHost<S>>(&mut self, host: &mut H) {
        for &sink in &self.sinks {
            host.tick(sink);
        }
        for _ in 0..3 {
            for &sink in &self.sinks_3x {
                host.tick(sink);
            }
        }
    }
}

impl<S: Copy> Default for Clock<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Sink {
        Cpu,
        Ppu,
    }

    #[derive(Default)]
    struct Trace {
        events: Vec<(Sink, &'static str)>,
    }

    impl SinkHost<Sink> for Trace {
        fn tick(&mut self, sink: Sink) {
            self.events.push((sink, "tick"));
        }

        fn power_on(&mut self, sink: Sink) {
            self.events.push((sink, "power_on"));
        }

        fn reset(&mut self, sink: Sink) {
            self.events.push((sink, "reset"));
        }
    }

    #[test]
    fn step_runs_one_cpu_tick_then_three_ppu_ticks() {
        let mut clock = Clock::new();
        clock.add_sink(Sink::Cpu);
        clock.add_3x_sink(Sink::Ppu);

        let mut trace = Trace::default();
        clock.step(&mut trace);

        assert_eq!(
            trace.events,
            vec![
                (Sink::Cpu, "tick"),
                (Sink::Ppu, "tick"),
                (Sink::Ppu, "tick"),
                (Sink::Ppu, "tick"),
            ]
        );
    }

    #[test]
    fn power_up_fires_hooks_in_registration_order() {
        let mut clock = Clock::new();
        clock.add_sink(Sink::Cpu);
        clock.add_3x_sink(Sink::Ppu);

        let mut trace = Trace::default();
        clock.power_up(&mut trace);

        assert_eq!(
            trace.events,
            vec![(Sink::Cpu, "power_on"), (Sink::Ppu, "power_on")]
        );
    }

    #[test]
    fn reset_fires_hooks_without_ticking() {
        let mut clock = Clock::new();
        clock.add_sink(Sink::Cpu);

        let mut trace = Trace::default();
        clock.reset(&mut trace);

        assert_eq!(trace.events, vec![(Sink::Cpu, "reset")]);
    }
}

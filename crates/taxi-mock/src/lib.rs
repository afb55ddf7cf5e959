//! Simulated TAXI platform.
//!
//! Every collaborator of the session controller is backed by one shared
//! [`Bench`], so a test can inject faults before an operation and inspect
//! the resulting pin, engine and transport state afterwards.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, HashSet};
use std::convert::Infallible;
use std::rc::Rc;

use embassy_time::{Duration, Instant};
use embedded_hal::digital::{ErrorType, InputPin};
use taxi_capture::board::TAXI_DSTRB_PIN;
use taxi_capture::capture::{CaptureFunction, SgpioPinConfig};
use taxi_capture::hal::{
    BulkTransport, CaptureEngine, Direction, DriverCode, GpioDriver,
    PinRegistry, TimeSource,
};
use taxi_capture::pins::{ClassId, GpioPin, PinMapping, ScuPin};
use taxi_capture::{Platform, SessionController, SyncConfig};

/// Status code the simulated registry returns when releasing a pin the
/// caller does not own.
pub const NOT_OWNER: DriverCode = 1;

/// Observable hardware calls, in the order they were made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Reserve(ScuPin),
    Release(ScuPin),
    Pinmux(GpioPin),
    ResetPinmux(ScuPin),
    SetDirection(GpioPin, Direction),
    SetHigh(GpioPin),
    FastIo { sgpio_pin: u8, function: u8 },
    SetUpFunctions,
    Run,
    Halt,
    StartStreaming,
    StopStreaming,
}

/// Waveform on the DSTRB line, in clock ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strobe {
    Low,
    High,
    /// High for `high` ticks at the start of every `period`, until `until`
    /// (exclusive) if given.
    Pulsing { period: u64, high: u64, until: Option<u64> },
}

impl Strobe {
    pub fn level(&self, tick: u64) -> bool {
        match *self {
            Strobe::Low => false,
            Strobe::High => true,
            Strobe::Pulsing { period, high, until } => {
                if until.is_some_and(|until| tick >= until) {
                    return false;
                }
                tick % period < high
            }
        }
    }
}

/// Shared state of the simulated device.
#[derive(Debug)]
pub struct Bench {
    pub reservations: HashMap<ScuPin, ClassId>,
    pub muxed: HashSet<ScuPin>,
    pub directions: HashMap<GpioPin, Direction>,
    pub driven_high: HashSet<GpioPin>,

    pub fast_io: Option<(u8, u8)>,
    pub functions: Option<&'static [CaptureFunction]>,
    pub running: bool,
    pub streaming: Option<&'static CaptureFunction>,
    /// Write position in the streaming buffer.
    pub cursor: usize,
    /// Bytes shifted in since the bench was created.
    pub captured: usize,

    pub now: u64,
    /// Ticks the clock advances on every read.
    pub tick_step: u64,
    pub strobe: Strobe,

    pub fail_pinmux: Option<(GpioPin, DriverCode)>,
    pub fail_release: Option<(ScuPin, DriverCode)>,
    pub fail_fast_io: Option<DriverCode>,
    pub fail_set_up: Option<DriverCode>,

    pub events: Vec<Event>,
}

impl Default for Bench {
    fn default() -> Self {
        Self {
            reservations: HashMap::new(),
            muxed: HashSet::new(),
            directions: HashMap::new(),
            driven_high: HashSet::new(),
            fast_io: None,
            functions: None,
            running: false,
            streaming: None,
            cursor: 0,
            captured: 0,
            now: 0,
            tick_step: 10,
            strobe: Strobe::Low,
            fail_pinmux: None,
            fail_release: None,
            fail_fast_io: None,
            fail_set_up: None,
            events: Vec::new(),
        }
    }
}

impl Bench {
    /// Number of pins currently held by `owner`.
    pub fn reserved_by(&self, owner: ClassId) -> usize {
        self.reservations.values().filter(|o| **o == owner).count()
    }

    pub fn owner_of(&self, pin: ScuPin) -> Option<ClassId> {
        self.reservations.get(&pin).copied()
    }

    pub fn direction(&self, pin: GpioPin) -> Option<Direction> {
        self.directions.get(&pin).copied()
    }

    fn strobe_level(&self) -> bool {
        self.strobe.level(self.now)
    }
}

/// Handle to a shared [`Bench`]. Clones refer to the same device.
#[derive(Debug, Clone, Default)]
pub struct SimBench(Rc<RefCell<Bench>>);

impl SimBench {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn borrow(&self) -> Ref<'_, Bench> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, Bench> {
        self.0.borrow_mut()
    }

    pub fn registry(&self) -> SimRegistry {
        SimRegistry(self.clone())
    }

    pub fn gpio(&self) -> SimGpio {
        SimGpio(self.clone())
    }

    pub fn engine(&self) -> SimEngine {
        SimEngine(self.clone())
    }

    pub fn transport(&self) -> SimTransport {
        SimTransport(self.clone())
    }

    pub fn clock(&self) -> SimClock {
        SimClock(self.clone())
    }

    /// The DSTRB line as a standalone digital input.
    pub fn strobe(&self) -> SimStrobe {
        SimStrobe(self.clone())
    }

    pub fn controller(&self, config: SyncConfig) -> SessionController<Sim> {
        SessionController::new(
            self.registry(),
            self.gpio(),
            self.engine(),
            self.transport(),
            self.clock(),
            config,
        )
    }

    /// Shift `bytes` samples into the streaming buffer. Nothing is captured
    /// unless the engine runs and the transport drains its buffer.
    pub fn shift_in(&self, bytes: usize) {
        let mut bench = self.borrow_mut();
        let Some(function) = bench.streaming else { return };
        if !bench.running {
            return;
        }
        let len = function.buffer.len();
        bench.cursor = (bench.cursor + bytes) % len;
        bench.captured += bytes;
    }

    pub fn now(&self) -> Instant {
        Instant::from_ticks(self.borrow().now)
    }

    pub fn set_strobe(&self, strobe: Strobe) {
        self.borrow_mut().strobe = strobe;
    }

    pub fn events(&self) -> Vec<Event> {
        self.borrow().events.clone()
    }

    pub fn clear_events(&self) {
        self.borrow_mut().events.clear();
    }
}

/// [`Platform`] whose collaborators all run against a [`SimBench`].
pub struct Sim;

impl Platform for Sim {
    type Registry = SimRegistry;
    type Gpio = SimGpio;
    type Engine = SimEngine;
    type Transport = SimTransport;
    type Clock = SimClock;
}

pub struct SimRegistry(SimBench);

impl PinRegistry for SimRegistry {
    fn ensure_reservation(&mut self, pin: ScuPin, owner: ClassId) -> bool {
        let mut bench = self.0.borrow_mut();
        match bench.reservations.get(&pin) {
            Some(current) if *current != owner => false,
            _ => {
                bench.reservations.insert(pin, owner);
                bench.events.push(Event::Reserve(pin));
                true
            }
        }
    }

    fn release_reservation(
        &mut self,
        pin: ScuPin,
        owner: ClassId,
    ) -> Result<(), DriverCode> {
        let mut bench = self.0.borrow_mut();
        if let Some((failing, code)) = bench.fail_release {
            if failing == pin {
                return Err(code);
            }
        }
        match bench.reservations.get(&pin) {
            Some(current) if *current == owner => {
                bench.reservations.remove(&pin);
                bench.events.push(Event::Release(pin));
                Ok(())
            }
            _ => Err(NOT_OWNER),
        }
    }
}

pub struct SimGpio(SimBench);

impl GpioDriver for SimGpio {
    fn configure_pinmux(
        &mut self,
        pin: GpioPin,
        mapping: PinMapping,
    ) -> Result<(), DriverCode> {
        let mut bench = self.0.borrow_mut();
        if let Some((failing, code)) = bench.fail_pinmux {
            if failing == pin {
                return Err(code);
            }
        }
        bench.muxed.insert(mapping.scu);
        bench.events.push(Event::Pinmux(pin));
        Ok(())
    }

    fn reset_pinmux(&mut self, mapping: PinMapping) {
        let mut bench = self.0.borrow_mut();
        bench.muxed.remove(&mapping.scu);
        bench.events.push(Event::ResetPinmux(mapping.scu));
    }

    fn set_direction(&mut self, pin: GpioPin, direction: Direction) {
        let mut bench = self.0.borrow_mut();
        bench.directions.insert(pin, direction);
        if direction == Direction::Input {
            bench.driven_high.remove(&pin);
        }
        bench.events.push(Event::SetDirection(pin, direction));
    }

    fn set_high(&mut self, pin: GpioPin) {
        let mut bench = self.0.borrow_mut();
        bench.driven_high.insert(pin);
        bench.events.push(Event::SetHigh(pin));
    }
}

pub struct SimEngine(SimBench);

impl CaptureEngine for SimEngine {
    fn configure_fast_io(
        &mut self,
        pin: &SgpioPinConfig,
        function: u8,
    ) -> Result<(), DriverCode> {
        let mut bench = self.0.borrow_mut();
        if let Some(code) = bench.fail_fast_io {
            return Err(code);
        }
        bench.fast_io = Some((pin.sgpio_pin, function));
        bench
            .events
            .push(Event::FastIo { sgpio_pin: pin.sgpio_pin, function });
        Ok(())
    }

    fn set_up_functions(
        &mut self,
        functions: &'static [CaptureFunction],
    ) -> Result<(), DriverCode> {
        let mut bench = self.0.borrow_mut();
        if let Some(code) = bench.fail_set_up {
            return Err(code);
        }
        bench.functions = Some(functions);
        bench.events.push(Event::SetUpFunctions);
        Ok(())
    }

    fn run(&mut self) {
        let mut bench = self.0.borrow_mut();
        bench.running = true;
        bench.events.push(Event::Run);
    }

    fn halt(&mut self) {
        let mut bench = self.0.borrow_mut();
        bench.running = false;
        bench.events.push(Event::Halt);
    }

    fn pin_state(&mut self) -> u16 {
        let bench = self.0.borrow();
        u16::from(bench.strobe_level()) << TAXI_DSTRB_PIN.sgpio_pin
    }
}

pub struct SimTransport(SimBench);

impl BulkTransport for SimTransport {
    fn start_streaming(&mut self, function: &'static CaptureFunction) {
        let mut bench = self.0.borrow_mut();
        bench.streaming = Some(function);
        bench.cursor = 0;
        bench.events.push(Event::StartStreaming);
    }

    fn stop_streaming(&mut self) {
        let mut bench = self.0.borrow_mut();
        bench.streaming = None;
        bench.events.push(Event::StopStreaming);
    }
}

/// Clock that advances by [`Bench::tick_step`] every time it is read.
pub struct SimClock(SimBench);

impl TimeSource for SimClock {
    fn now(&self) -> Instant {
        let mut bench = self.0.borrow_mut();
        let now = bench.now;
        bench.now += bench.tick_step;
        Instant::from_ticks(now)
    }
}

pub struct SimStrobe(SimBench);

impl ErrorType for SimStrobe {
    type Error = Infallible;
}

impl InputPin for SimStrobe {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.0.borrow().strobe_level())
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.0.borrow().strobe_level())
    }
}

/// Synchronizer settings in raw ticks, for tests that reason about exact
/// timing.
pub fn sync_config(window: u64, passes: u8, timeout: Option<u64>) -> SyncConfig {
    SyncConfig {
        window: Duration::from_ticks(window),
        passes,
        timeout: timeout.map(Duration::from_ticks),
    }
}

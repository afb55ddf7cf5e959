use crate::board::{
    CONTROL_PINS, CONTROL_PIN_COUNT, SGPIO_FAST_IO_FUNCTION, TAXI_CLASS,
    TAXI_DSTRB_PIN, TAXI_FUNCTIONS,
};
use crate::capture::PinStateBit;
use crate::error::Error;
use crate::hal::{
    BulkTransport, CaptureEngine, GpioDriver, PinRegistry, TimeSource,
};
use crate::sync::{self, SyncConfig};
use crate::transaction::{self, OwnedPinSet};

/// Bundles the collaborator types a [`SessionController`] drives.
pub trait Platform {
    type Registry: PinRegistry;
    type Gpio: GpioDriver;
    type Engine: CaptureEngine;
    type Transport: BulkTransport;
    type Clock: TimeSource;
}

/// Phase of the capture session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// No session; the control lines are free.
    Idle,
    /// Reserving and configuring the control lines.
    Acquiring,
    /// Binding the capture function to the engine.
    Configuring,
    /// Waiting for a gap in the strobe.
    Synchronizing,
    /// Samples are flowing into the buffer.
    Streaming,
    /// Tearing the session down.
    Halting,
}

/// Operations the command layer can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Operation {
    Start,
    Stop,
}

/// The (state, operation) pairs the controller accepts. Anything else is
/// rejected with [`Error::InvalidState`].
const TRANSITIONS: &[(SessionState, Operation)] = &[
    (SessionState::Idle, Operation::Start),
    (SessionState::Streaming, Operation::Stop),
];

impl SessionState {
    pub fn accepts(self, operation: Operation) -> bool {
        TRANSITIONS.contains(&(self, operation))
    }
}

/// Capture session controller.
///
/// Owns the control lines for the lifetime of a session and sequences the
/// capture engine, the bulk transport and the strobe synchronizer. There is
/// no internal locking: callers must issue one operation at a time.
pub struct SessionController<P: Platform> {
    registry: P::Registry,
    gpio: P::Gpio,
    engine: P::Engine,
    transport: P::Transport,
    clock: P::Clock,
    config: SyncConfig,
    state: SessionState,
    pins: Option<OwnedPinSet<CONTROL_PIN_COUNT>>,
}

impl<P: Platform> SessionController<P> {
    pub fn new(
        registry: P::Registry,
        gpio: P::Gpio,
        engine: P::Engine,
        transport: P::Transport,
        clock: P::Clock,
        config: SyncConfig,
    ) -> Self {
        Self {
            registry,
            gpio,
            engine,
            transport,
            clock,
            config,
            state: SessionState::Idle,
            pins: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> SyncConfig {
        self.config
    }

    /// Replace the synchronizer settings. Only allowed between sessions, and
    /// only with settings that pass [`SyncConfig::validate`].
    pub fn set_config(&mut self, config: SyncConfig) -> Result<(), Error> {
        if self.state != SessionState::Idle {
            return Err(Error::InvalidState);
        }
        config.validate().inspect_err(|_| {
            warn!("taxi: rejected sync config {}", config);
        })?;
        self.config = config;
        Ok(())
    }

    /// Start a capture session: acquire the control lines, bind the capture
    /// function, wait for a gap in the strobe and arm the engine.
    ///
    /// On failure everything acquired so far is released and the controller
    /// is back in [`SessionState::Idle`].
    pub fn start(&mut self) -> Result<(), Error> {
        self.check(Operation::Start)?;

        self.state = SessionState::Acquiring;
        let pins = match transaction::acquire(
            &mut self.registry,
            &mut self.gpio,
            &CONTROL_PINS,
            TAXI_CLASS,
        ) {
            Ok(pins) => pins,
            Err(e) => {
                self.state = SessionState::Idle;
                return Err(e);
            }
        };
        self.pins = Some(pins);
        info!("TAXI initialized.");

        self.state = SessionState::Configuring;
        if let Err(e) = self.configure_engine() {
            self.abort();
            return Err(e);
        }

        self.state = SessionState::Synchronizing;
        self.transport.start_streaming(&TAXI_FUNCTIONS[0]);
        let mut strobe =
            PinStateBit::new(&mut self.engine, TAXI_DSTRB_PIN.sgpio_pin);
        if let Err(e) = sync::settle(&mut strobe, &self.clock, &self.config) {
            self.abort();
            return Err(e);
        }

        self.engine.run();
        self.state = SessionState::Streaming;
        debug!("taxi: streaming");
        Ok(())
    }

    /// Stop the running session and release the control lines.
    ///
    /// Fails with [`Error::InvalidState`] when no session is streaming.
    pub fn stop(&mut self) -> Result<(), Error> {
        self.check(Operation::Stop)?;
        self.halt()
    }

    fn check(&self, operation: Operation) -> Result<(), Error> {
        if self.state.accepts(operation) {
            Ok(())
        } else {
            warn!("taxi: {} rejected while {}", operation, self.state);
            Err(Error::InvalidState)
        }
    }

    fn configure_engine(&mut self) -> Result<(), Error> {
        self.engine
            .configure_fast_io(&TAXI_DSTRB_PIN, SGPIO_FAST_IO_FUNCTION)
            .map_err(Error::DriverConfigFailure)?;
        self.engine
            .set_up_functions(&TAXI_FUNCTIONS)
            .map_err(Error::DriverConfigFailure)
    }

    fn halt(&mut self) -> Result<(), Error> {
        self.state = SessionState::Halting;
        self.transport.stop_streaming();
        self.engine.halt();

        let result = match self.pins.take() {
            Some(pins) => pins.release(&mut self.registry, &mut self.gpio),
            None => Ok(()),
        };
        self.state = SessionState::Idle;
        result
    }

    /// Tear down a half-started session. The error that caused the abort is
    /// what the caller sees, so teardown failures are only logged.
    fn abort(&mut self) {
        if let Err(e) = self.halt() {
            error!("taxi: teardown after failed start: {}", e.code());
        }
    }
}

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use taxi_capture::{Platform, SessionController};
use taxi_icd::{SessionStatus, SyncSettings, TaxiStatus};

use crate::class::{TaxiVerb, TaxiVerbError};

/// Serializes command-class requests onto one [`SessionController`].
///
/// The controller itself has no locking. Every request takes the mutex for
/// the whole operation, so a `stop` arriving while `start_receive` is still
/// synchronizing waits for the start to finish and then sees `Streaming`.
pub struct TaxiService<M: RawMutex, P: Platform> {
    session: Mutex<M, SessionController<P>>,
}

impl<M: RawMutex, P: Platform> TaxiService<M, P> {
    pub const fn new(session: SessionController<P>) -> Self {
        Self { session: Mutex::new(session) }
    }

    pub async fn start_receive(&self) -> TaxiStatus {
        let mut session = self.session.lock().await;
        let status = TaxiStatus::from(session.start());
        if !status.is_ok() {
            warn!("taxi: start_receive failed: {}", status.code());
        }
        status
    }

    pub async fn stop(&self) -> TaxiStatus {
        let mut session = self.session.lock().await;
        let status = TaxiStatus::from(session.stop());
        if !status.is_ok() {
            warn!("taxi: stop failed: {}", status.code());
        }
        status
    }

    pub async fn status(&self) -> SessionStatus {
        self.session.lock().await.state().into()
    }

    pub async fn get_config(&self) -> SyncSettings {
        self.session.lock().await.config().into()
    }

    pub async fn set_config(&self, settings: SyncSettings) -> TaxiStatus {
        let mut session = self.session.lock().await;
        session.set_config(settings.into()).into()
    }

    /// Dispatch a raw verb number from the command pipe.
    pub async fn handle(&self, verb: u8) -> Result<TaxiStatus, TaxiVerbError> {
        let verb = TaxiVerb::try_from(verb).inspect_err(|e| {
            warn!("taxi: unknown verb {}", e);
        })?;
        debug!("taxi: {}", verb.name());
        Ok(match verb {
            TaxiVerb::StartReceive => self.start_receive().await,
            TaxiVerb::Stop => self.stop().await,
        })
    }
}

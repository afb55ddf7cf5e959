use postcard_rpc::{
    header::VarSeqKind,
    host_client::{HostClient, HostErr},
    standard_icd::{WireError, ERROR_PATH},
};
use std::convert::Infallible;
use std::fmt;
use taxi_icd::{
    SessionStatus, SyncSettings, TaxiGetConfigEndpoint, TaxiGetStatusEndpoint,
    TaxiSetConfigEndpoint, TaxiStartReceiveEndpoint, TaxiStatus,
    TaxiStopEndpoint,
};

/// USB product string the TAXI firmware enumerates with.
pub const PRODUCT_STRING: &str = "taxi";

pub struct UsbClient {
    pub client: HostClient<WireError>,
}

#[derive(Debug)]
pub enum UsbError<E> {
    Comms(HostErr<WireError>),
    Endpoint(E),
}

impl<E> From<HostErr<WireError>> for UsbError<E> {
    fn from(value: HostErr<WireError>) -> Self {
        Self::Comms(value)
    }
}

impl<E: fmt::Debug> fmt::Display for UsbError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsbError::Comms(e) => write!(f, "communication error: {:?}", e),
            UsbError::Endpoint(e) => write!(f, "device returned {:?}", e),
        }
    }
}

impl<E: fmt::Debug> std::error::Error for UsbError<E> {}

/// Turn a device status into a result, keeping the status as the error.
fn check(status: TaxiStatus) -> Result<(), UsbError<TaxiStatus>> {
    if status.is_ok() {
        Ok(())
    } else {
        Err(UsbError::Endpoint(status))
    }
}

impl UsbClient {
    pub fn try_new() -> Result<Self, Box<dyn std::error::Error + Send + Sync>>
    {
        let client = HostClient::try_new_raw_nusb(
            |d| d.product_string() == Some(PRODUCT_STRING),
            ERROR_PATH,
            8,
            VarSeqKind::Seq2,
        )?;
        Ok(Self { client })
    }

    /// Start receipt of TAXI data on the primary bulk pipe.
    pub async fn start_receive(&self) -> Result<(), UsbError<TaxiStatus>> {
        let status =
            self.client.send_resp::<TaxiStartReceiveEndpoint>(&()).await?;
        check(status)
    }

    /// Halt TAXI communications.
    pub async fn stop(&self) -> Result<(), UsbError<TaxiStatus>> {
        let status = self.client.send_resp::<TaxiStopEndpoint>(&()).await?;
        check(status)
    }

    pub async fn status(&self) -> Result<SessionStatus, UsbError<Infallible>> {
        let status =
            self.client.send_resp::<TaxiGetStatusEndpoint>(&()).await?;
        Ok(status)
    }

    pub async fn get_config(
        &self,
    ) -> Result<SyncSettings, UsbError<Infallible>> {
        let config =
            self.client.send_resp::<TaxiGetConfigEndpoint>(&()).await?;
        Ok(config)
    }

    pub async fn set_config(
        &self,
        settings: SyncSettings,
    ) -> Result<(), UsbError<TaxiStatus>> {
        let status =
            self.client.send_resp::<TaxiSetConfigEndpoint>(&settings).await?;
        check(status)
    }
}

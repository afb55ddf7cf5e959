use std::io;
use taxi_host::error::keep_first;
use taxi_host::icd::TaxiStatus;
use taxi_host::{Error, UsbError};

fn stop_failed() -> Result<(), UsbError<TaxiStatus>> {
    Err(UsbError::Endpoint(TaxiStatus::InvalidState))
}

#[test]
fn stream_error_survives_a_failed_stop() {
    let result = keep_first(Err(Error::StreamClosed), stop_failed());
    assert!(matches!(result, Err(Error::StreamClosed)));
}

#[test]
fn write_error_survives_a_failed_stop() {
    let write = Err(Error::Io(io::Error::other("disk full")));
    let result = keep_first(write, stop_failed());
    match result {
        Err(Error::Io(e)) => assert_eq!(e.to_string(), "disk full"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn stop_error_reported_after_clean_receive() {
    let result = keep_first(Ok(()), stop_failed());
    assert!(matches!(
        result,
        Err(Error::Command(UsbError::Endpoint(TaxiStatus::InvalidState)))
    ));
}

#[test]
fn clean_receive_and_stop_is_ok() {
    let result = keep_first(Ok(()), Ok::<(), UsbError<TaxiStatus>>(()));
    assert!(result.is_ok());
}

#![cfg_attr(not(feature = "use-std"), no_std)]
//! Wire types and endpoints of the TAXI command class.

use postcard_rpc::{endpoints, topics, TopicDirection};

mod taxi;
pub use taxi::*;

endpoints! {
    list = ENDPOINT_LIST;
    omit_std = true;
    | EndpointTy                | RequestTy         | ResponseTy            | Path                  |
    | ----------                | ---------         | ----------            | ----                  |
    | TaxiStartReceiveEndpoint  | ()                | TaxiStatus            | "taxi/start_receive"  |
    | TaxiStopEndpoint          | ()                | TaxiStatus            | "taxi/stop"           |
    | TaxiGetStatusEndpoint     | ()                | SessionStatus         | "taxi/status"         |
    | TaxiGetConfigEndpoint     | ()                | SyncSettings          | "taxi/get_config"     |
    | TaxiSetConfigEndpoint     | SyncSettings      | TaxiStatus            | "taxi/set_config"     |
}

topics! {
    list = TOPICS_IN_LIST;
    direction = TopicDirection::ToServer;
    | TopicTy                   | MessageTy     | Path              |
    | -------                   | ---------     | ----              |
}

topics! {
    list = TOPICS_OUT_LIST;
    direction = TopicDirection::ToClient;
    | TopicTy                   | MessageTy     | Path              |
    | -------                   | ---------     | ----              |
    | TaxiDataTopic             | CaptureChunk  | "taxi/data"       |
}

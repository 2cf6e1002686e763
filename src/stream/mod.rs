//! Real-time ingestion: upstream transport, frame decoding, and the stream loop
//! that turns chat messages into point awards.

pub mod decoder;
pub mod pipeline;
pub mod runner;
pub mod shutdown;
pub mod supervisor;
pub mod transport;

pub use decoder::{decode, decode_payload, DecodeError};
pub use pipeline::{FrameOutcome, FramePipeline};
pub use runner::{StreamExit, StreamRunner, StreamState, StreamStats};
pub use shutdown::{shutdown_channel, ShutdownSignal, ShutdownTrigger};
pub use supervisor::run_supervised;
pub use transport::{install_crypto_provider, subscribe, Connector, PusherConnection, Transport, TransportError, WsConnector};

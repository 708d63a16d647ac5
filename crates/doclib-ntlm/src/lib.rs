pub mod client;
pub mod handshake;
pub mod remote;

pub use client::{NtlmClient, NtlmClientConfig, TransportError};
pub use handshake::NtlmError;
pub use remote::{LISTING_ACCEPT, NtlmRemote};

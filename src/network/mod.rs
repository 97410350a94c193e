//! Framed-TCP transport for the synchronization service.
//!
//! Frames are a 4-byte big-endian length prefix followed by a bincode
//! payload (see [`crate::proto`] for the message set). The server side runs
//! one task per connection and multiplexes inbound requests with outbound
//! delivery pushes.

mod codec;
mod server;

pub(crate) use codec::*;
pub(crate) use server::*;

#[cfg(test)]
mod codec_test;

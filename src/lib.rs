mod client;
mod config;
mod constants;
mod consumers;
mod core;
mod errors;
mod network;
mod node;
pub mod proto;
mod storage;
pub mod utils;

pub use self::core::*;

pub use client::*;
pub use config::*;
pub use consumers::*;
pub use errors::*;
pub use node::*;
pub use proto::UpdateMetadata;
pub use storage::*;

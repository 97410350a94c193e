// -
// Wire protocol

/// Bytes reserved for the frame length prefix.
pub(crate) const FRAME_LENGTH_FIELD: usize = 4;

/// Default upper bound for a single wire frame. A full-directory snapshot
/// must fit in one frame.
pub(crate) const DEFAULT_MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

// -
// Defaults

/// Default listen / connect address.
pub(crate) const DEFAULT_BIND_ADDR: &str = "127.0.0.1:20020";

/// Default connect timeout for the client session, in milliseconds.
pub(crate) const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3_000;

/// authorized_keys field watched by the reference consumer.
pub(crate) const SSH_KEY_FIELD: &str = "ssh_key";

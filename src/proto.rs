//! Wire protocol for the synchronization service.
//!
//! Messages are bincode-encoded and carried in length-prefixed frames (see
//! [`crate::network`]). The protocol is deliberately small: a client either
//! subscribes and then receives pushed deliveries, or publishes updates.

use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use crate::EntityMap;
use crate::FieldMap;
use crate::ValidationError;

/// Client -> server messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Request {
    /// Register (or replace) this connection's watch set. The server
    /// answers with [`Response::Subscribed`] followed immediately by one
    /// delivery of the current snapshot.
    Subscribe { watch: HashSet<String> },

    /// Apply `updates` to `entity` as one revision. Gated by the shared
    /// publish secret when the server has one configured.
    Publish {
        secret: Option<String>,
        entity: String,
        updates: FieldMap,
    },

    /// Remove an entity from the directory.
    Remove {
        secret: Option<String>,
        entity: String,
    },

    /// Liveness probe.
    Ping,
}

/// Server -> client messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Response {
    Subscribed {
        subscription_id: String,
        revision: u64,
    },

    /// Pushed whenever a revision touches a watched field. Carries the full
    /// current snapshot, not a diff.
    Delivery {
        entities: EntityMap,
        metadata: UpdateMetadata,
    },

    Published {
        revision: u64,
    },

    /// `revision` is `None` when the entity did not exist.
    Removed {
        revision: Option<u64>,
    },

    Pong,

    Error {
        code: ErrorCode,
        message: String,
    },
}

/// Metadata attached to every delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateMetadata {
    /// The revision the delivered snapshot materializes.
    pub revision: u64,

    /// Field names touched since the subscription's previous delivery.
    pub changed_fields: HashSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Publish secret missing or wrong.
    Unauthorized,

    /// Schema violation; detail in the message.
    Validation,

    /// Request not valid in the connection's current state.
    InvalidRequest,

    Internal,
}

impl Response {
    pub fn validation_error(err: &ValidationError) -> Self {
        Response::Error {
            code: ErrorCode::Validation,
            message: err.to_string(),
        }
    }

    pub fn unauthorized() -> Self {
        Response::Error {
            code: ErrorCode::Unauthorized,
            message: "publish secret missing or invalid".to_string(),
        }
    }
}

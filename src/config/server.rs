use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_BIND_ADDR;
use crate::constants::DEFAULT_MAX_FRAME_BYTES;

/// Listener and wire parameters for the synchronization server.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address the daemon listens on (and the default client endpoint).
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Upper bound for a single wire frame. A full-directory snapshot must
    /// fit in one frame.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,

    /// Shared secret required on Publish/Remove requests. `None` leaves
    /// writes open (single-host deployments behind a firewall).
    #[serde(default)]
    pub publish_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_frame_bytes: default_max_frame_bytes(),
            publish_secret: None,
        }
    }
}

impl ServerConfig {
    /// Whether `offered` satisfies the configured publish secret.
    pub fn authorizes(
        &self,
        offered: Option<&str>,
    ) -> bool {
        match &self.publish_secret {
            Some(required) => offered == Some(required.as_str()),
            None => true,
        }
    }
}

fn default_bind_addr() -> String {
    DEFAULT_BIND_ADDR.to_string()
}

fn default_max_frame_bytes() -> usize {
    DEFAULT_MAX_FRAME_BYTES
}

use std::time::Duration;

use stdbus_frame::ReceiveConfig;
use stdbus_transport::LineConfig;

/// Configuration for a [`Link`](crate::Link).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkConfig {
    /// Serial line settings used when the link opens its own port.
    pub line: LineConfig,
    /// Receive state machine settings.
    pub receive: ReceiveConfig,
}

impl LinkConfig {
    /// Default settings at the given line rate and read timeout.
    pub fn new(baud_rate: u32, read_timeout: Duration) -> Self {
        Self {
            line: LineConfig::new(baud_rate, read_timeout),
            receive: ReceiveConfig::default(),
        }
    }

    /// Longest a silent peer can keep an exchange blocked.
    pub fn worst_case_wait(&self) -> Duration {
        self.line.read_timeout * self.receive.empty_read_limit.max(1)
    }
}

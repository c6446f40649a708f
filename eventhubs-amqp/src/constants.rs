//! Constants shared by the connection and session supervisors

use std::time::Duration;

/// Default time a session may stay half-open before its watchdog reports a failure
pub const DEFAULT_SESSION_OPEN_TIMEOUT: Duration = Duration::from_secs(15);

/// Longest accepted session open timeout (one day)
pub const MAX_SESSION_OPEN_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Connection property key carrying the client product name
pub const PRODUCT: &str = "product";

/// Connection property key carrying the client version
pub const VERSION: &str = "version";

/// Connection property key carrying the host platform
pub const PLATFORM: &str = "platform";

/// Connection property key carrying the runtime framework
pub const FRAMEWORK: &str = "framework";

/// Incoming window advertised in a locally sent begin
pub const DEFAULT_INCOMING_WINDOW: u32 = 2048;

/// Outgoing window advertised in a locally sent begin
pub const DEFAULT_OUTGOING_WINDOW: u32 = 2048;

pub(crate) const DEFAULT_CONTROL_CHAN_BUF: usize = 128;
pub(crate) const DEFAULT_OUTPUT_CHAN_BUF: usize = 1024;

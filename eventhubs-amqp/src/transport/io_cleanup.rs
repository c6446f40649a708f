use crate::reactor::{Outbox, Output};

use super::Transport;

/// Releases the OS resources of a transport when a transport-closed event is observed
///
/// The handler holds no per-connection state and is shared by every connection on a
/// reactor. A transport is only unbound while it is still bound and still associated with its
/// connection; a connection that already tore itself down is left alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct IoCleanupHandler;

impl IoCleanupHandler {
    /// Returns `true` if this call released the transport
    pub(crate) fn on_transport_closed(
        &self,
        transport: Option<&mut Transport>,
        outbox: &mut Outbox,
    ) -> bool {
        let transport = match transport {
            Some(transport) => transport,
            None => return false,
        };
        let connection = match transport.connection() {
            Some(connection) => connection,
            None => return false,
        };

        if transport.unbind() {
            #[cfg(feature = "tracing")]
            tracing::debug!(%connection, "transport unbound on close");
            #[cfg(feature = "log")]
            log::debug!("transport of {} unbound on close", connection);

            outbox.push_back((connection, Output::Unbind));
            true
        } else {
            false
        }
    }
}

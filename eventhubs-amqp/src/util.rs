/// Whether the owner of an event loop should keep going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Running {
    Continue,
    Stop,
}

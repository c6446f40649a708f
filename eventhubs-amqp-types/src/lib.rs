#![deny(missing_docs, missing_debug_implementations)]

//! Implements the subset of AMQP1.0 data types needed to drive connection and session
//! lifecycles, as defined in the [specification](http://docs.oasis-open.org/amqp/core/v1.0/os/amqp-core-overview-v1.0-os.html).

pub mod definitions;
pub mod performatives;
pub mod primitives;
pub mod states;

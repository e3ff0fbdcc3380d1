//! Service layer modules
//!
//! Number sequences, the domain-event outbox, and the narrow reads the
//! booking engine makes against externally-owned vendor and event data.

pub mod events;
pub mod numbering;
pub mod outbox;
pub mod vendors;

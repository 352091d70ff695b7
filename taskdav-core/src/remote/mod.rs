//! The remote side: VTODO objects on a CalDAV server.

mod caldav;
pub mod ics;
mod multistatus;
mod task;

pub use caldav::CalDav;
pub use ics::TodoFields;
pub use task::RemoteTask;

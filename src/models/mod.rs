pub mod employee;
pub mod queue_meta;
pub mod ticket;

pub use employee::{Employee, NewEmployee};
pub use queue_meta::{QueueMeta, QueueMetaRow, VersionedMeta};
pub use ticket::{Ticket, TicketRow, TicketStatus};

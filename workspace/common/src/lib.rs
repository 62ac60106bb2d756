//! Common transport-layer types shared between the projector and the
//! HTTP handlers. The projector produces these directly so the backend
//! can serialize aggregation results without an extra mapping step.

mod summary;

pub use summary::{DueStatus, MonthSummary, PaymentState, ScheduledItem};

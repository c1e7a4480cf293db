//! Change notifications for Folio projects.
//!
//! - [`NotificationHub`] fans a "project changed" event out to every viewer
//!   of that project
//! - long-poll viewers hold a [`Subscription`] that resolves once or times out
//! - socket viewers join the project's room as a [`RoomMember`] and also
//!   receive messages relayed by other members
//!
//! Nothing is persisted. A viewer that registers after a publish does not
//! see it.

pub mod config;
pub mod error;
pub mod hub;

pub use config::NotifyConfig;
pub use error::{NotifyError, NotifyResult};
pub use hub::{ConnectionId, Delivery, NotificationHub, RoomEvent, RoomMember, Subscription, Update};

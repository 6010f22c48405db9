//! # Signal Bus
//!
//! A typed publish/subscribe channel that lets page widgets talk to each other
//! without holding references to one another.
//!
//! The navigation controller publishes notifications and location changes; the
//! toast widget and the active-link tracker consume them. Neither side knows the
//! other exists, and a signal with no subscriber is simply dropped.
//!
//! ## Features
//!
//! * **Type-Safe**: Events are identified by their Rust type.
//! * **Inline listeners**: Synchronous callbacks run inside `publish`, in order.
//! * **Async receivers**: `tokio` broadcast receivers for awaiting consumers.
//! * **Cheap to share**: `FxHashMap` + `parking_lot::RwLock` behind an `Arc`.
//!
//! # Example
//!
//! ```rust
//! use ln_event_bus::{EventBus, EventBusError};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Notice(&'static str);
//!
//! fn main() -> Result<(), EventBusError> {
//!     let bus = EventBus::new();
//!     let seen = Arc::new(Mutex::new(Vec::new()));
//!
//!     let sink = seen.clone();
//!     bus.listen::<Notice, _>(move |notice| sink.lock().unwrap().push(notice.0))?;
//!
//!     bus.publish(Notice("saved"))?;
//!     assert_eq!(*seen.lock().unwrap(), vec!["saved"]);
//!     Ok(())
//! }
//! ```

mod bus;
mod error;
mod receiver;

pub use bus::{CHANNEL_CAPACITY, Event, EventBus, ListenerId, Receiver};
pub use error::{EventBusError, EventBusErrorExt};
pub use receiver::EventReceiverExt;

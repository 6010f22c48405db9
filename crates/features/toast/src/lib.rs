//! # Toasts
//!
//! Displays [`NotificationEvent`](ln_domain::notification::NotificationEvent)s published on
//! the signal bus as dismissible toasts. Nothing here knows about the navigation
//! controller; any component may publish a notification.
//!
//! ```html
//! <ul data-ln-toast data-ln-toast-timeout="4000" data-ln-toast-max="3">
//!   <li data-ln-toast-item data-type="success" data-title="Saved">Profile updated.</li>
//! </ul>
//! ```

mod error;
mod stack;
mod toast;

pub use error::{ToastError, ToastErrorExt};
pub use stack::{CLOSE_CLASS, ITEM_CLASS, ToastStack};
pub use toast::Toast;

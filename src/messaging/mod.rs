// Messaging - lock-free queues between threads

pub mod channels;
pub mod notification;

pub use notification::{Notification, NotificationCategory, NotificationLevel};

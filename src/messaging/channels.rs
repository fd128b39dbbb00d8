// Communication channels lock-free

use crate::messaging::notification::Notification;
use crate::synth::voice::Voice;
use ringbuf::{HeapRb, traits::Split};
use std::sync::{Arc, Mutex};

/// Scheduler thread → audio callback
pub type VoiceProducer = ringbuf::HeapProd<Voice>;
pub type VoiceConsumer = ringbuf::HeapCons<Voice>;

pub fn create_voice_channel(capacity: usize) -> (VoiceProducer, VoiceConsumer) {
    let rb = HeapRb::<Voice>::new(capacity);
    rb.split()
}

/// Engine / controller → UI
pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

/// Producer shared by several writers (controller, stream error callback)
pub type SharedNotificationProducer = Arc<Mutex<NotificationProducer>>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    let rb = HeapRb::<Notification>::new(capacity);
    rb.split()
}

/// Non-blocking push; a full queue or a busy lock drops the notification
pub fn try_notify(tx: &SharedNotificationProducer, notification: Notification) -> bool {
    match tx.try_lock() {
        Ok(mut tx) => ringbuf::traits::Producer::try_push(&mut *tx, notification).is_ok(),
        Err(_) => false,
    }
}

/// Drain everything queued so far
pub fn drain_notifications(rx: &mut NotificationConsumer) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Some(notification) = ringbuf::traits::Consumer::try_pop(rx) {
        out.push(notification);
    }
    out
}

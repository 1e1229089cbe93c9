use crate::ports::notification_service::{
    Notification, NotificationService as NotificationServiceTrait, Result,
};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Mock implementation of NotificationService
///
/// Does not send actual notifications.
/// Records every delivered notification so tests can assert on them,
/// and can be switched into a failing mode.
pub struct NotificationService {
    sent: Mutex<Vec<Notification>>,
    failing: AtomicBool,
}

impl NotificationService {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Notifications delivered so far, in delivery order
    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
    }

    /// When set, every `notify` call fails and nothing is recorded
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Default for NotificationService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationServiceTrait for NotificationService {
    async fn notify(&self, notification: Notification) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err("notification sink unavailable".into());
        }
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

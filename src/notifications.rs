use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use crate::models::NotificationSettings;

const ENABLE_LOGS: bool = true;

use crate::log_error;

pub type SettingsCompletion = Box<dyn FnOnce(NotificationSettings) + Send + 'static>;

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Source of the user's notification settings.
///
/// Implementations call `completion` at most once, on any thread they like.
pub trait NotificationCenter: Send + Sync {
    fn get_notification_settings(&self, completion: SettingsCompletion);
}

/// Answers every request with a fixed set of settings, from a worker thread
/// the way the platform service does.
#[derive(Debug, Clone, Default)]
pub struct ConfiguredNotificationCenter {
    settings: NotificationSettings,
}

impl ConfiguredNotificationCenter {
    pub fn new(settings: NotificationSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }
}

impl NotificationCenter for ConfiguredNotificationCenter {
    fn get_notification_settings(&self, completion: SettingsCompletion) {
        let settings = self.settings.clone();
        run_on_worker(Box::new(move || completion(settings)), |task| {
            thread::Builder::new()
                .name("deviceinfo-notifications".into())
                .spawn(task)
                .map(drop)
        });
    }
}

/// Run `task` through `spawn`, or on the calling thread if spawning fails.
fn run_on_worker<S>(task: Task, spawn: S)
where
    S: FnOnce(Task) -> io::Result<()>,
{
    // A failed spawn drops the closure it was given, so the task stays here.
    let slot = Arc::new(Mutex::new(Some(task)));
    let worker_slot = Arc::clone(&slot);

    let spawned = spawn(Box::new(move || {
        if let Some(task) = take_task(&worker_slot) {
            task();
        }
    }));

    if let Err(err) = spawned {
        log_error!("Failed to spawn notification settings thread: {err}; completing inline");
        if let Some(task) = take_task(&slot) {
            task();
        }
    }
}

fn take_task(slot: &Mutex<Option<Task>>) -> Option<Task> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

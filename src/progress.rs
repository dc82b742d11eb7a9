//! Progress notifications during a conversion.
//!
//! A conversion emits zero or more [`ProgressObserver::on_progress`] calls
//! before it returns its single result. Percentages are nominally 0–100 but
//! are neither guaranteed monotonic nor complete; observers must not assume
//! either.
//!
//! Stock observers:
//! - [`LogProgress`]: logs each notification at `info` level
//! - `std::sync::mpsc::Sender<ProgressEvent>`: forwards events to another
//!   thread (the CLI printer uses this)
//! - any `Fn(f32, &str) + Sync` closure

use std::sync::mpsc::Sender;

pub trait ProgressObserver: Sync {
    fn on_progress(&self, percent: f32, message: &str);
}

impl<F> ProgressObserver for F
where
    F: Fn(f32, &str) + Sync,
{
    fn on_progress(&self, percent: f32, message: &str) {
        self(percent, message)
    }
}

/// Owned copy of one notification, for sending across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub percent: f32,
    pub message: String,
}

impl ProgressObserver for Sender<ProgressEvent> {
    fn on_progress(&self, percent: f32, message: &str) {
        // The receiver may be gone if the caller stopped listening.
        let _ = self.send(ProgressEvent {
            percent,
            message: message.to_string(),
        });
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&self, percent: f32, message: &str) {
        tracing::info!("Progress: {percent}%, Message: {message}");
    }
}

/// Report through an optional observer.
pub(crate) fn notify(observer: Option<&dyn ProgressObserver>, percent: f32, message: &str) {
    if let Some(observer) = observer {
        observer.on_progress(percent, message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn closure_observer_receives_calls() {
        let seen = Mutex::new(Vec::new());
        let observer = |percent: f32, message: &str| {
            seen.lock().unwrap().push((percent, message.to_string()));
        };
        notify(Some(&observer), 10.0, "Loading");
        notify(Some(&observer), 5.0, "Going backwards is allowed");
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                (10.0, "Loading".to_string()),
                (5.0, "Going backwards is allowed".to_string())
            ]
        );
    }

    #[test]
    fn sender_observer_forwards_events() {
        let (tx, rx) = std::sync::mpsc::channel();
        tx.on_progress(50.0, "Halfway");
        drop(tx);
        let events: Vec<ProgressEvent> = rx.iter().collect();
        assert_eq!(
            events,
            vec![ProgressEvent {
                percent: 50.0,
                message: "Halfway".to_string()
            }]
        );
    }

    #[test]
    fn sender_observer_ignores_closed_receiver() {
        let (tx, rx) = std::sync::mpsc::channel::<ProgressEvent>();
        drop(rx);
        tx.on_progress(1.0, "nobody listening");
    }

    #[test]
    fn log_progress_accepts_any_percentage() {
        let observer: &dyn ProgressObserver = &LogProgress;
        observer.on_progress(150.0, "Out of range is passed through");
        notify(Some(&LogProgress), -1.0, "So is negative");
    }

    #[test]
    fn notify_without_observer_is_noop() {
        notify(None, 100.0, "Done");
    }
}

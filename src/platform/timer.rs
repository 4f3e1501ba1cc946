use super::TimerService;
use crate::messages::{PlaybackId, PlayerEvent};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One-shot timers as sleeping tokio tasks; invalidating aborts the task
pub struct TokioTimer {
    events: mpsc::UnboundedSender<PlayerEvent>,
    pending: HashMap<PlaybackId, JoinHandle<()>>,
}

impl TokioTimer {
    pub fn new(events: mpsc::UnboundedSender<PlayerEvent>) -> Self {
        Self {
            events,
            pending: HashMap::new(),
        }
    }

    /// Timers that have neither fired nor been invalidated
    #[cfg(test)]
    fn live(&self) -> usize {
        self.pending.values().filter(|task| !task.is_finished()).count()
    }
}

impl TimerService for TokioTimer {
    fn schedule_once(&mut self, after: Duration, id: PlaybackId) {
        self.pending.retain(|_, task| !task.is_finished());

        let events = self.events.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = events.send(PlayerEvent::TimerFired { id });
        });

        if let Some(previous) = self.pending.insert(id, task) {
            previous.abort();
        }
        tracing::debug!("Timer {:?} armed for {:?}", id, after);
    }

    fn invalidate(&mut self, id: PlaybackId) {
        if let Some(task) = self.pending.remove(&id) {
            task.abort();
            tracing::debug!("Timer {:?} invalidated", id);
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for task in self.pending.values() {
            task.abort();
        }
    }
}

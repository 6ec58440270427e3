//! Tokio timers for the deterministic round engine.
//!
//! The engine asks for timers through `SetTimer`/`CancelTimer` actions; each
//! live timer is a tokio task that sleeps and then feeds the matching
//! timeout event back into the coordinator's event channel. Setting a timer
//! with an id that is already armed replaces it.

use quorus_core::{Event, TimerId};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// The event a fired timer injects.
fn timer_event(id: TimerId) -> Event {
    match id {
        TimerId::Phase {
            height,
            round,
            phase,
        } => Event::PhaseTimeout {
            height,
            round,
            phase,
        },
        TimerId::ViewChange { height, round } => Event::ViewChangeTimeout { height, round },
    }
}

pub struct TimerManager {
    timers: HashMap<TimerId, JoinHandle<()>>,
    event_tx: mpsc::Sender<Event>,
}

impl TimerManager {
    pub fn new(event_tx: mpsc::Sender<Event>) -> Self {
        TimerManager {
            timers: HashMap::new(),
            event_tx,
        }
    }

    /// Arm a timer. An already-armed timer with the same id is cancelled
    /// first.
    pub fn set_timer(&mut self, id: TimerId, duration: Duration) {
        self.cancel_timer(id);

        let event_tx = self.event_tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            trace!(?id, "timer fired");
            // A closed channel means the coordinator is gone; nothing to do.
            let _ = event_tx.send(timer_event(id)).await;
        });

        self.timers.insert(id, handle);
        debug!(?id, ?duration, "timer armed");
    }

    /// Disarm a timer. No-op if it never existed or already fired.
    pub fn cancel_timer(&mut self, id: TimerId) {
        if let Some(handle) = self.timers.remove(&id) {
            handle.abort();
            trace!(?id, "timer cancelled");
        }
    }

    pub fn cancel_all(&mut self) {
        for (id, handle) in self.timers.drain() {
            handle.abort();
            trace!(?id, "timer cancelled (shutdown)");
        }
    }

    pub fn active_count(&self) -> usize {
        self.timers.len()
    }
}

impl Drop for TimerManager {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorus_core::Phase;

    fn phase_id(round: u64) -> TimerId {
        TimerId::Phase {
            height: 1,
            round,
            phase: Phase::Propose,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_with_matching_event() {
        let (event_tx, mut event_rx) = mpsc::channel(10);
        let mut manager = TimerManager::new(event_tx);

        manager.set_timer(phase_id(0), Duration::from_millis(20));

        let event = event_rx.recv().await.unwrap();
        assert!(matches!(
            event,
            Event::PhaseTimeout {
                height: 1,
                round: 0,
                phase: Phase::Propose
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let (event_tx, mut event_rx) = mpsc::channel(10);
        let mut manager = TimerManager::new(event_tx);

        manager.set_timer(phase_id(0), Duration::from_millis(20));
        manager.cancel_timer(phase_id(0));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(event_rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn setting_again_replaces_the_deadline() {
        let (event_tx, mut event_rx) = mpsc::channel(10);
        let mut manager = TimerManager::new(event_tx);

        manager.set_timer(phase_id(0), Duration::from_millis(500));
        manager.set_timer(phase_id(0), Duration::from_millis(10));
        assert_eq!(manager.active_count(), 1);

        let start = tokio::time::Instant::now();
        let event = event_rx.recv().await.unwrap();
        assert!(matches!(event, Event::PhaseTimeout { .. }));
        assert!(start.elapsed() < Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn view_change_timer_maps_to_its_event() {
        let (event_tx, mut event_rx) = mpsc::channel(10);
        let mut manager = TimerManager::new(event_tx);

        manager.set_timer(
            TimerId::ViewChange {
                height: 3,
                round: 2,
            },
            Duration::from_millis(5),
        );

        let event = event_rx.recv().await.unwrap();
        assert!(matches!(
            event,
            Event::ViewChangeTimeout {
                height: 3,
                round: 2
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_disarms_everything() {
        let (event_tx, mut event_rx) = mpsc::channel(10);
        {
            let mut manager = TimerManager::new(event_tx);
            manager.set_timer(phase_id(0), Duration::from_millis(10));
            manager.set_timer(phase_id(1), Duration::from_millis(10));
            assert_eq!(manager.active_count(), 2);
        }

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(event_rx.try_recv().is_err());
    }
}

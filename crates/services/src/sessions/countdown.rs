use std::sync::Arc;
use std::time::Duration;

use study_core::model::{ExamSession, Tick};
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Drives an exam's countdown from a background task.
///
/// The task ticks the shared session once per period and ends on its own once
/// the session is submitted, either by timing out or because the host
/// submitted it. Each tick outcome is published on a watch channel.
pub struct ExamCountdown {
    updates: watch::Receiver<Tick>,
    handle: JoinHandle<()>,
}

impl ExamCountdown {
    /// Start ticking once per second.
    pub async fn start(session: Arc<Mutex<ExamSession>>) -> Self {
        Self::with_period(session, Duration::from_secs(1)).await
    }

    pub async fn with_period(session: Arc<Mutex<ExamSession>>, period: Duration) -> Self {
        let initial = {
            let guard = session.lock().await;
            if guard.is_submitted() {
                Tick::Idle
            } else {
                Tick::Counting(guard.remaining_seconds())
            }
        };
        let (tx, updates) = watch::channel(initial);

        let handle = tokio::spawn(async move {
            if initial == Tick::Idle {
                return;
            }
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let tick = session.lock().await.tick();
                debug!(?tick, "exam countdown tick");
                tx.send_replace(tick);
                match tick {
                    Tick::Counting(_) => {}
                    Tick::TimedOut => {
                        info!("exam time is up, answers submitted");
                        break;
                    }
                    Tick::Idle => break,
                }
            }
        });

        Self { updates, handle }
    }

    /// A receiver that sees every published tick outcome.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Tick> {
        self.updates.clone()
    }

    /// Most recent tick outcome.
    #[must_use]
    pub fn latest(&self) -> Tick {
        *self.updates.borrow()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop ticking without touching the session.
    pub fn stop(self) {
        self.handle.abort();
    }

    /// Wait for the countdown to end and return its final outcome.
    pub async fn wait(self) -> Tick {
        if let Err(err) = self.handle.await {
            warn!(error = %err, "exam countdown task ended abnormally");
        }
        *self.updates.borrow()
    }
}

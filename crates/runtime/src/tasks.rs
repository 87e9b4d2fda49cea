//! Periodic background tasks with cooperative shutdown.

use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// Handle to one spawned periodic task.
pub struct TaskHandle {
    /// Task name, for logs
    pub name: &'static str,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    /// Wait for the task to exit after shutdown was signalled.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                tracing::error!(task = self.name, error = %e, "background task panicked");
            }
        }
    }
}

/// Spawn a task that runs `body` every `period` until `shutdown` flips
/// to true.
///
/// Runs never overlap: the next tick is not polled until the current
/// body finishes, and missed ticks are skipped rather than replayed.
/// A shutdown signal also cancels an in-flight run at its next await
/// point, so a long cycle never delays engine stop.
pub fn spawn_periodic<F, Fut>(
    name: &'static str,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut body: F,
) -> TaskHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send,
{
    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick fires immediately; skip it so the task waits a
        // full period before its first run.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    debug!(task = name, "periodic task run");
                    let run = body();
                    tokio::pin!(run);
                    loop {
                        tokio::select! {
                            _ = &mut run => break,
                            result = shutdown.changed() => {
                                if result.is_err() || *shutdown.borrow() {
                                    debug!(task = name, "periodic task cancelled mid-run");
                                    return;
                                }
                            }
                        }
                    }
                }
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        debug!(task = name, "periodic task stopping");
                        break;
                    }
                }
            }
        }
    });

    TaskHandle { name, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn runs_never_overlap_even_when_the_body_is_slow() {
        let (tx, rx) = watch::channel(false);
        let running = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let task = {
            let running = running.clone();
            let max_seen = max_seen.clone();
            spawn_periodic("slow", Duration::from_millis(5), rx, move || {
                let running = running.clone();
                let max_seen = max_seen.clone();
                async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    max_seen.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                }
            })
        };

        tokio::time::sleep(Duration::from_millis(120)).await;
        tx.send(true).ok();
        task.join().await;

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn shutdown_stops_further_runs() {
        let (tx, rx) = watch::channel(false);
        let runs = Arc::new(AtomicUsize::new(0));

        let task = {
            let runs = runs.clone();
            spawn_periodic("counting", Duration::from_millis(5), rx, move || {
                let runs = runs.clone();
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        tx.send(true).ok();
        task.join().await;

        let settled = runs.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(runs.load(Ordering::SeqCst), settled);
        assert!(settled >= 1);
    }

    #[tokio::test]
    async fn shutdown_cancels_an_in_flight_run() {
        let (tx, rx) = watch::channel(false);
        let started = Arc::new(AtomicUsize::new(0));

        let task = {
            let started = started.clone();
            spawn_periodic("stuck", Duration::from_millis(5), rx, move || {
                let started = started.clone();
                async move {
                    started.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                }
            })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(started.load(Ordering::SeqCst) >= 1);

        tx.send(true).ok();
        tokio::time::timeout(Duration::from_secs(1), task.join())
            .await
            .expect("task exits while its body is still sleeping");
    }
}

use std::{future::Future, sync::mpsc::Sender, time::Duration};

use log::{debug, warn};
use tokio::{
    runtime::Handle,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use crate::error::ApiError;

/// Fixed-interval fetch loop feeding snapshots to a controller.
///
/// Every tick issues a fresh request on its own task, so a slow response never
/// delays the next tick. Failures are logged and retried on the following tick,
/// with no backoff. The loop stops when the poller is dropped; requests already
/// in flight finish on their own and their results are discarded once the
/// receiving controller is gone.
pub struct Poller {
    label: &'static str,
    task: JoinHandle<()>,
}

impl Poller {
    pub fn spawn<T, F, Fut>(
        runtime: &Handle,
        label: &'static str,
        period: Duration,
        fetch: F,
        sink: Sender<T>,
    ) -> Self
    where
        T: Send + 'static,
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        debug!("Starting {} poller every {:?}", label, period);
        let task = runtime.spawn(async move {
            let mut ticker = time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let request = fetch();
                let sink = sink.clone();
                tokio::spawn(async move {
                    match request.await {
                        Ok(snapshot) => {
                            // Receiver gone means the view was torn down mid-request.
                            let _ = sink.send(snapshot);
                        }
                        Err(e) => warn!("{} poll failed: {}", label, e),
                    }
                });
            }
        });
        Self { label, task }
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub fn stop(&self) {
        if !self.task.is_finished() {
            debug!("Stopping {} poller", self.label);
        }
        self.task.abort();
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc, Arc,
    };

    use super::*;

    fn counting(
        calls: &Arc<AtomicUsize>,
        fail_every_other: bool,
    ) -> impl Fn() -> std::pin::Pin<Box<dyn Future<Output = Result<usize, ApiError>> + Send>>
           + Send
           + 'static {
        let calls = Arc::clone(calls);
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            Box::pin(async move {
                if fail_every_other && n % 2 == 0 {
                    Err(ApiError::MissingData)
                } else {
                    Ok(n)
                }
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_immediately_then_on_interval() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();
        let _poller = Poller::spawn(
            &Handle::current(),
            "test",
            Duration::from_secs(2),
            counting(&calls, false),
            tx,
        );

        time::sleep(Duration::from_millis(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        time::sleep(Duration::from_secs(4)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_skipped_and_retried() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();
        let _poller = Poller::spawn(
            &Handle::current(),
            "test",
            Duration::from_secs(1),
            counting(&calls, true),
            tx,
        );

        time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_leaves_no_timer_running() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (tx, _rx) = mpsc::channel();
        let poller = Poller::spawn(
            &Handle::current(),
            "test",
            Duration::from_secs(1),
            counting(&calls, false),
            tx,
        );
        drop(poller);

        time::sleep(Duration::from_secs(10)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

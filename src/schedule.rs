//! One-shot scheduling and debouncing on the cooperative task queue. Every
//! delayed action in the engine runs through [`after`]; cancellation is by
//! replacement, never left to race.

use std::cell::RefCell;
use std::rc::Rc;

use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

/// Handle to a scheduled one-shot action. `cancel` stops the action from
/// firing; dropping the handle detaches it and the action still runs, the
/// same as a fired-and-forgotten timeout.
pub struct Delayed {
    cancel_tx: mpsc::UnboundedSender<()>,
}

impl Delayed {
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(());
    }
}

/// Schedules `action` to run once after `delay`. Must be called from within a
/// `LocalSet`; the action runs on the same single-threaded task queue as
/// mutation callbacks, so it never overlaps page work.
pub fn after<F>(delay: Duration, action: F) -> Delayed
where
    F: FnOnce() + 'static,
{
    let (cancel_tx, mut cancel_rx) = mpsc::unbounded_channel();
    tokio::task::spawn_local(async move {
        // Polled in order: a cancel issued in the same scheduling quantum as
        // the deadline must win over the elapsed sleep. A closed channel
        // means the handle was dropped, not cancelled; the `Some` pattern
        // keeps the sleep arm live in that case.
        tokio::select! {
            biased;
            Some(()) = cancel_rx.recv() => {}
            _ = sleep(delay) => action(),
        }
    });
    Delayed { cancel_tx }
}

/// Collapses bursts of triggers into one trailing call: every trigger cancels
/// the pending action and schedules a fresh one, so at most one action is
/// ever in flight.
pub struct Debouncer {
    window: Duration,
    action: Rc<dyn Fn()>,
    pending: Rc<RefCell<Option<Delayed>>>,
}

impl Debouncer {
    pub fn new<F>(window: Duration, action: F) -> Self
    where
        F: Fn() + 'static,
    {
        Self {
            window,
            action: Rc::new(action),
            pending: Rc::new(RefCell::new(None)),
        }
    }

    pub fn trigger(&self) {
        if let Some(previous) = self.pending.borrow_mut().take() {
            previous.cancel();
        }
        let action = Rc::clone(&self.action);
        let pending = Rc::clone(&self.pending);
        let handle = after(self.window, move || {
            pending.borrow_mut().take();
            action();
        });
        *self.pending.borrow_mut() = Some(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::task::LocalSet;

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let fired = Rc::new(Cell::new(false));
                let flag = Rc::clone(&fired);
                let _handle = after(Duration::from_millis(100), move || flag.set(true));
                sleep(Duration::from_millis(50)).await;
                assert!(!fired.get());
                sleep(Duration::from_millis(100)).await;
                assert!(fired.get());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_stops_action() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let fired = Rc::new(Cell::new(false));
                let flag = Rc::clone(&fired);
                let handle = after(Duration::from_millis(100), move || flag.set(true));
                handle.cancel();
                sleep(Duration::from_millis(200)).await;
                assert!(!fired.get());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_at_the_exact_deadline_still_wins() {
        let local = LocalSet::new();
        local
            .run_until(async {
                // The deadline elapses before the cancel is sent, in the same
                // scheduling quantum. Looped because the old arm ordering made
                // the outcome depend on which select branch was polled first.
                for _ in 0..50 {
                    let fired = Rc::new(Cell::new(false));
                    let flag = Rc::clone(&fired);
                    let handle = after(Duration::from_millis(100), move || flag.set(true));
                    sleep(Duration::from_millis(100)).await;
                    handle.cancel();
                    sleep(Duration::from_millis(1)).await;
                    assert!(!fired.get());
                }
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_handle_still_fires() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let fired = Rc::new(Cell::new(false));
                let flag = Rc::clone(&fired);
                drop(after(Duration::from_millis(100), move || flag.set(true)));
                sleep(Duration::from_millis(200)).await;
                assert!(fired.get());
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_collapses_bursts_to_trailing_call() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let count = Rc::new(Cell::new(0u32));
                let counter = Rc::clone(&count);
                let debouncer =
                    Debouncer::new(Duration::from_millis(100), move || {
                        counter.set(counter.get() + 1)
                    });
                for _ in 0..5 {
                    debouncer.trigger();
                    sleep(Duration::from_millis(20)).await;
                }
                assert_eq!(count.get(), 0);
                sleep(Duration::from_millis(150)).await;
                assert_eq!(count.get(), 1);

                debouncer.trigger();
                sleep(Duration::from_millis(150)).await;
                assert_eq!(count.get(), 2);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn retrigger_at_the_window_edge_delivers_one_call() {
        let local = LocalSet::new();
        local
            .run_until(async {
                let count = Rc::new(Cell::new(0u32));
                for _ in 0..50 {
                    count.set(0);
                    let counter = Rc::clone(&count);
                    let debouncer =
                        Debouncer::new(Duration::from_millis(100), move || {
                            counter.set(counter.get() + 1)
                        });
                    debouncer.trigger();
                    // Retrigger exactly as the first window expires; the
                    // superseded action must not also fire.
                    sleep(Duration::from_millis(100)).await;
                    debouncer.trigger();
                    sleep(Duration::from_millis(150)).await;
                    assert_eq!(count.get(), 1);
                }
            })
            .await;
    }
}

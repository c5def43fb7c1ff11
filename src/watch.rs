//! Batched tree-change notification: the subscription interface components
//! run their re-evaluation from. Subscribers see one callback per coalesced
//! batch of child-list changes and inspect the current DOM state themselves;
//! the records are never exposed.

use std::rc::Rc;

use tokio::sync::mpsc;

use crate::page::HostPage;

pub struct MutationFeed {
    rx: mpsc::UnboundedReceiver<()>,
}

impl MutationFeed {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<()>) -> Self {
        Self { rx }
    }

    /// Waits for the next batch, draining every notification already queued
    /// so a burst of mutations delivers a single wakeup. Returns `false`
    /// once the page is gone.
    pub async fn next_batch(&mut self) -> bool {
        if self.rx.recv().await.is_none() {
            return false;
        }
        while self.rx.try_recv().is_ok() {}
        true
    }
}

/// Spawns the standing watch loop for one component. There is no unsubscribe:
/// registrations live for the lifetime of the page, and the loop winds down
/// on its own when the page is dropped.
pub fn watch<F>(page: &Rc<HostPage>, mut callback: F)
where
    F: FnMut() + 'static,
{
    let mut feed = page.subscribe_mutations();
    tokio::task::spawn_local(async move {
        while feed.next_batch().await {
            callback();
        }
    });
}

//! Latest-wins holders for view data.
//!
//! A view calls [`ViewSlot::begin`] before each load and hands the ticket back with the result.
//! Results carrying an older ticket, or arriving after the view was closed, are dropped.

use std::future::Future;
use tokio::sync::watch;

#[derive(Clone, Debug)]
struct SlotState<T> {
    generation: u64,
    closed: bool,
    value: Option<T>,
}

/// Proof that a load was started; only the newest ticket may publish.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

#[derive(Debug)]
pub struct ViewSlot<T> {
    state: watch::Sender<SlotState<T>>,
}

impl<T> Default for ViewSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ViewSlot<T> {
    pub fn new() -> Self {
        let (state, _) = watch::channel(SlotState {
            generation: 0,
            closed: false,
            value: None,
        });
        Self { state }
    }

    /// Start a load. Any ticket handed out before this one becomes stale.
    pub fn begin(&self) -> LoadTicket {
        let mut ticket = LoadTicket(0);
        self.state.send_if_modified(|state| {
            state.generation += 1;
            ticket = LoadTicket(state.generation);
            false
        });
        ticket
    }

    /// Apply `value` if `ticket` is still current and the slot is open.
    pub fn publish(&self, ticket: LoadTicket, value: T) -> bool {
        let mut value = Some(value);
        self.state.send_if_modified(|state| {
            if state.closed || state.generation != ticket.0 {
                return false;
            }
            state.value = value.take();
            true
        })
    }

    /// Tear the view down. Pending loads are discarded when they finish.
    pub fn close(&self) {
        self.state.send_if_modified(|state| {
            let was_open = !state.closed;
            state.closed = true;
            was_open
        });
    }

    pub fn is_closed(&self) -> bool {
        self.state.borrow().closed
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        let state = self.state.borrow();
        !state.closed && state.generation == ticket.0
    }

    /// Watch the values applied to this slot.
    pub fn watch(&self) -> ViewWatcher<T> {
        ViewWatcher {
            rx: self.state.subscribe(),
        }
    }

    /// Run `load` under a fresh ticket and publish its output.
    ///
    /// Returns false when the output was discarded.
    pub async fn load<F>(&self, load: F) -> bool
    where
        F: Future<Output = T>,
    {
        let ticket = self.begin();
        let value = load.await;
        let applied = self.publish(ticket, value);
        if !applied {
            tracing::debug!("discarded stale view load {}", ticket.0);
        }
        applied
    }
}

impl<T: Clone> ViewSlot<T> {
    /// Most recently applied value.
    pub fn current(&self) -> Option<T> {
        self.state.borrow().value.clone()
    }
}

/// Receiving end of [`ViewSlot::watch`].
#[derive(Debug)]
pub struct ViewWatcher<T> {
    rx: watch::Receiver<SlotState<T>>,
}

impl<T: Clone> ViewWatcher<T> {
    /// Wait for the next applied value or close. `None` once the slot is closed or dropped.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        let state = self.rx.borrow_and_update();
        if state.closed {
            return None;
        }
        state.value.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::oneshot;

    #[test]
    fn newest_ticket_wins() {
        let slot = ViewSlot::new();
        let first = slot.begin();
        let second = slot.begin();

        assert!(!slot.is_current(first));
        assert!(!slot.publish(first, "old"));
        assert_eq!(slot.current(), None);

        assert!(slot.publish(second, "new"));
        assert_eq!(slot.current(), Some("new"));
    }

    #[test]
    fn closed_slot_discards_results() {
        let slot = ViewSlot::new();
        let ticket = slot.begin();
        slot.close();
        assert!(slot.is_closed());
        assert!(!slot.publish(ticket, 1));
        assert_eq!(slot.current(), None);
    }

    #[tokio::test]
    async fn slow_load_is_overtaken() {
        let slot = ViewSlot::new();
        let (tx, rx) = oneshot::channel::<u32>();

        let slow = slot.load(async move { rx.await.unwrap_or_default() });
        let slot_ref = &slot;
        let fast = async move {
            tokio::task::yield_now().await;
            let applied = slot_ref.load(async { 2 }).await;
            tx.send(1).unwrap();
            applied
        };
        let (slow_applied, fast_applied) = tokio::join!(slow, fast);

        assert!(fast_applied);
        assert!(!slow_applied);
        assert_eq!(slot.current(), Some(2));
    }

    #[tokio::test]
    async fn watcher_sees_values_then_close() {
        let slot = ViewSlot::new();
        let mut watcher = slot.watch();

        let ticket = slot.begin();
        slot.publish(ticket, 7);
        assert_eq!(watcher.changed().await, Some(7));

        slot.close();
        assert_eq!(watcher.changed().await, None);
    }
}

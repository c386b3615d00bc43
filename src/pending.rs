// ABOUTME: FIFO of waiters awaiting the next frame read off the wire.
// ABOUTME: Cancelled entries stay in place until the head reaches them, so reply slots never shift.

use crate::frame::Frame;
use std::collections::VecDeque;
use tokio::sync::oneshot;

/// Compaction threshold: once the queue's backing storage outgrows this
/// many drained slots, it is shrunk to reclaim memory proportional to
/// live in-flight commands, not lifetime commands.
const COMPACTION_THRESHOLD: usize = 1024;

/// What a waiter resolves to: either the frame the wire actually
/// delivered, or a connection-level failure (teardown, transport error)
/// that was never a real reply frame. Keeping these distinct means a
/// caller can tell a server's `-ERR` apart from the connection going
/// away out from under it.
pub type WaiterOutcome = Result<Frame, String>;

/// One command awaiting its reply. Created by `send`, owned by the
/// connection's pending queue, resolved exactly once: either the head
/// frame is delivered, or the connection tears down and fails it.
///
/// There is deliberately no explicit "cancel" call: a waiter becomes
/// cancelled the moment its caller stops waiting on the matching
/// receiver (for instance because `tokio::time::timeout` elapsed around
/// it), which `oneshot::Sender::is_closed` observes directly. This is
/// the channel-per-waiter pattern from the design notes: the receive
/// loop and the caller's own deadline race on the same channel, and
/// whichever gives up first determines the outcome.
pub struct Waiter {
    reply: oneshot::Sender<WaiterOutcome>,
}

impl Waiter {
    /// Returns the waiter half alongside the receiver the caller awaits.
    pub fn channel() -> (Waiter, oneshot::Receiver<WaiterOutcome>) {
        let (tx, rx) = oneshot::channel();
        (Waiter { reply: tx }, rx)
    }

    /// True once the caller has dropped (or never had) its receiving
    /// half — e.g. its deadline elapsed. The wire slot is still consumed
    /// when the receive loop reaches it; this only suppresses delivery.
    pub fn is_cancelled(&self) -> bool {
        self.reply.is_closed()
    }

    /// Delivers `frame` to the waiting caller as a successful reply. A
    /// closed receiver is not an error here — the slot is still
    /// considered consumed.
    fn deliver(self, frame: Frame) {
        let _ = self.reply.send(Ok(frame));
    }

    /// Fails the waiter with a connection-level error rather than a
    /// reply frame — used when the connection tears down while this
    /// command is still pending.
    fn fail(self, message: String) {
        let _ = self.reply.send(Err(message));
    }
}

/// FIFO of [`Waiter`]s, amortised O(1) enqueue and head-advance. A
/// `VecDeque` is used instead of physically shifting a `Vec` so later
/// waiters' relative order (and thus their match against future replies)
/// never changes as earlier entries are popped.
#[derive(Default)]
pub struct PendingQueue {
    entries: VecDeque<Waiter>,
}

impl PendingQueue {
    pub fn new() -> PendingQueue {
        PendingQueue {
            entries: VecDeque::new(),
        }
    }

    pub fn push(&mut self, waiter: Waiter) {
        self.entries.push_back(waiter);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pops the head waiter and matches it to `frame` — exactly one queue
    /// entry per incoming frame, cancelled or not, so later waiters never
    /// shift out of alignment with their actual replies: the receive loop
    /// still drains one channel per frame. A cancelled
    /// head silently absorbs the frame instead of delivering it. Returns
    /// `None` (frame is unsolicited) only when the queue is empty.
    pub fn deliver_next(&mut self, frame: Frame) -> Option<()> {
        let waiter = self.entries.pop_front()?;
        if !waiter.is_cancelled() {
            waiter.deliver(frame);
        }
        self.maybe_compact();
        Some(())
    }

    /// Fails every pending waiter with the same connection-level error
    /// and empties the queue. Used on teardown / transport failure — this
    /// is not a reply frame, so it can never be mistaken for a genuine
    /// server error.
    pub fn fail_all(&mut self, message: impl Into<String>) {
        let message = message.into();
        while let Some(waiter) = self.entries.pop_front() {
            waiter.fail(message.clone());
        }
    }

    fn maybe_compact(&mut self) {
        if self.entries.capacity() > COMPACTION_THRESHOLD
            && self.entries.len() * 4 < self.entries.capacity()
        {
            self.entries.shrink_to_fit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_in_fifo_order() {
        let mut q = PendingQueue::new();
        let (w1, r1) = Waiter::channel();
        let (w2, r2) = Waiter::channel();
        q.push(w1);
        q.push(w2);

        q.deliver_next(Frame::simple("one"));
        q.deliver_next(Frame::simple("two"));

        assert_eq!(r1.await.unwrap().unwrap(), Frame::simple("one"));
        assert_eq!(r2.await.unwrap().unwrap(), Frame::simple("two"));
    }

    #[tokio::test]
    async fn cancelled_entry_absorbs_its_own_frame_without_shifting_alignment() {
        let mut q = PendingQueue::new();
        let (w1, r1) = Waiter::channel();
        let (w2, r2) = Waiter::channel();
        let (w3, r3) = Waiter::channel();
        q.push(w1);
        q.push(w2);
        q.push(w3);

        // The middle waiter's caller gives up before its reply arrives.
        drop(r2);

        q.deliver_next(Frame::simple("a")); // -> w1
        q.deliver_next(Frame::simple("b")); // -> w2, cancelled, discarded
        q.deliver_next(Frame::simple("c")); // -> w3

        assert_eq!(r1.await.unwrap().unwrap(), Frame::simple("a"));
        assert_eq!(r3.await.unwrap().unwrap(), Frame::simple("c"));
    }

    #[tokio::test]
    async fn fail_all_rejects_every_waiter() {
        let mut q = PendingQueue::new();
        let (w1, r1) = Waiter::channel();
        let (w2, r2) = Waiter::channel();
        q.push(w1);
        q.push(w2);

        q.fail_all("client destroyed");

        assert_eq!(r1.await.unwrap().unwrap_err(), "client destroyed");
        assert_eq!(r2.await.unwrap().unwrap_err(), "client destroyed");
        assert!(q.is_empty());
    }

    #[tokio::test]
    async fn unsolicited_frame_when_queue_empty_reports_none() {
        let mut q = PendingQueue::new();
        assert!(q.deliver_next(Frame::simple("push")).is_none());
    }
}

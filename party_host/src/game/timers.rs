//! Cancellable per-session timers.
//!
//! Each armed timer is a spawned task that sleeps and then posts a
//! [`TimerEvent`] into the hub's timer channel. The event is only honoured if the
//! timer that produced it is still armed with the same epoch, so an event that was
//! already queued when the timer got cancelled is ignored.

use std::collections::HashMap;
use std::time::Duration;

use tokio::{sync::mpsc, task::AbortHandle};

use super::player::PlayerId;

/// Default reconnection grace period (30 seconds).
pub const DEFAULT_RECONNECT_GRACE_PERIOD: Duration = Duration::from_secs(30);

/// Fired timer notifications, delivered to the hub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// A disconnected player did not come back in time
    GraceExpired {
        code: String,
        player_id: PlayerId,
        epoch: u64,
    },
    /// A timed round ran out
    RoundExpired { code: String, round: u32, epoch: u64 },
}

/// Where fired timers are delivered.
pub type TimerSender = mpsc::UnboundedSender<TimerEvent>;

#[derive(Debug)]
struct ArmedTimer {
    epoch: u64,
    handle: AbortHandle,
}

/// Timers owned by one game session.
#[derive(Debug, Default)]
pub struct TimerSet {
    grace: HashMap<PlayerId, ArmedTimer>,
    round: Option<ArmedTimer>,
    next_epoch: u64,
}

impl TimerSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn spawn(&mut self, delay: Duration, sink: &TimerSender, event: TimerEvent) -> ArmedTimer {
        let epoch = match &event {
            TimerEvent::GraceExpired { epoch, .. } | TimerEvent::RoundExpired { epoch, .. } => {
                *epoch
            }
        };
        let sink = sink.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sink.send(event);
        });
        ArmedTimer {
            epoch,
            handle: task.abort_handle(),
        }
    }

    fn bump_epoch(&mut self) -> u64 {
        self.next_epoch += 1;
        self.next_epoch
    }

    /// Arm (or re-arm) the grace timer for `player_id`. Returns its epoch.
    pub fn arm_grace(
        &mut self,
        code: &str,
        player_id: &str,
        delay: Duration,
        sink: &TimerSender,
    ) -> u64 {
        self.cancel_grace(player_id);

        let epoch = self.bump_epoch();
        let event = TimerEvent::GraceExpired {
            code: code.to_string(),
            player_id: player_id.to_string(),
            epoch,
        };
        let armed = self.spawn(delay, sink, event);
        self.grace.insert(player_id.to_string(), armed);
        epoch
    }

    /// Cancel a pending grace timer. Returns whether one was armed.
    pub fn cancel_grace(&mut self, player_id: &str) -> bool {
        match self.grace.remove(player_id) {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Consume a fired grace timer if `epoch` is still the armed one.
    pub fn take_grace(&mut self, player_id: &str, epoch: u64) -> bool {
        match self.grace.get(player_id) {
            Some(timer) if timer.epoch == epoch => {
                self.grace.remove(player_id);
                true
            }
            _ => false,
        }
    }

    pub fn has_grace(&self, player_id: &str) -> bool {
        self.grace.contains_key(player_id)
    }

    pub fn pending_grace_count(&self) -> usize {
        self.grace.len()
    }

    /// Arm the round timer, replacing any previous one.
    pub fn arm_round(
        &mut self,
        code: &str,
        round: u32,
        delay: Duration,
        sink: &TimerSender,
    ) -> u64 {
        self.cancel_round();

        let epoch = self.bump_epoch();
        let event = TimerEvent::RoundExpired {
            code: code.to_string(),
            round,
            epoch,
        };
        self.round = Some(self.spawn(delay, sink, event));
        epoch
    }

    pub fn cancel_round(&mut self) -> bool {
        match self.round.take() {
            Some(timer) => {
                timer.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Consume a fired round timer if `epoch` is still the armed one.
    pub fn take_round(&mut self, epoch: u64) -> bool {
        match &self.round {
            Some(timer) if timer.epoch == epoch => {
                self.round = None;
                true
            }
            _ => false,
        }
    }

    pub fn has_round(&self) -> bool {
        self.round.is_some()
    }

    /// Abort everything.
    pub fn cancel_all(&mut self) {
        for (_, timer) in self.grace.drain() {
            timer.handle.abort();
        }
        self.cancel_round();
    }
}

impl Drop for TimerSet {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> (TimerSender, mpsc::UnboundedReceiver<TimerEvent>) {
        mpsc::unbounded_channel()
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_timer_fires() {
        let (tx, mut rx) = channel();
        let mut timers = TimerSet::new();
        let epoch = timers.arm_grace("ABCD", "p1", Duration::from_secs(30), &tx);

        let event = rx.recv().await.unwrap();
        assert_eq!(
            event,
            TimerEvent::GraceExpired {
                code: "ABCD".to_string(),
                player_id: "p1".to_string(),
                epoch
            }
        );
        assert!(timers.take_grace("p1", epoch));
        assert!(!timers.take_grace("p1", epoch), "fires at most once");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_grace_timer_never_fires() {
        let (tx, mut rx) = channel();
        let mut timers = TimerSet::new();
        timers.arm_grace("ABCD", "p1", Duration::from_secs(30), &tx);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(timers.cancel_grace("p1"));
        assert!(!timers.cancel_grace("p1"), "cancel is idempotent");

        let waited = tokio::time::timeout(Duration::from_secs(60), rx.recv()).await;
        assert!(waited.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_epoch_is_rejected() {
        let (tx, mut rx) = channel();
        let mut timers = TimerSet::new();
        let first = timers.arm_grace("ABCD", "p1", Duration::from_secs(1), &tx);

        // Let the first one fire, then re-arm before the hub processes it.
        let _ = rx.recv().await.unwrap();
        let second = timers.arm_grace("ABCD", "p1", Duration::from_secs(30), &tx);

        assert_ne!(first, second);
        assert!(!timers.take_grace("p1", first));
        assert!(timers.has_grace("p1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_timer_lifecycle() {
        let (tx, mut rx) = channel();
        let mut timers = TimerSet::new();
        let epoch = timers.arm_round("ABCD", 2, Duration::from_secs(30), &tx);
        assert!(timers.has_round());

        match rx.recv().await.unwrap() {
            TimerEvent::RoundExpired { round, epoch: fired, .. } => {
                assert_eq!(round, 2);
                assert_eq!(fired, epoch);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert!(timers.take_round(epoch));
        assert!(!timers.has_round());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let (tx, mut rx) = channel();
        let mut timers = TimerSet::new();
        timers.arm_grace("ABCD", "p1", Duration::from_secs(5), &tx);
        timers.arm_grace("ABCD", "p2", Duration::from_secs(5), &tx);
        timers.arm_round("ABCD", 1, Duration::from_secs(5), &tx);
        assert_eq!(timers.pending_grace_count(), 2);

        timers.cancel_all();
        assert_eq!(timers.pending_grace_count(), 0);
        assert!(!timers.has_round());

        let waited = tokio::time::timeout(Duration::from_secs(60), rx.recv()).await;
        assert!(waited.is_err());
    }
}

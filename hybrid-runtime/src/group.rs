//! A `JoinSet` whose join is bounded by a deadline.
//!
//! Every spawned future owns one slot. [`DeadlineGroup::join_until`] fills
//! each slot exactly once: with the future's value, with `Panicked` if it
//! unwound, or with `TimedOut` if it was still running at the deadline (in
//! which case it is aborted and anything it produces later is discarded).
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum Joined<T> {
    Completed(T),
    TimedOut,
    Panicked(String),
}

/// Final state of one slot.
#[derive(Debug)]
pub struct Settled<K, T> {
    pub key: K,
    pub joined: Joined<T>,
    /// From spawn to completion, or to the deadline for timed-out slots.
    pub elapsed: Duration,
}

pub struct DeadlineGroup<K, T> {
    set: JoinSet<(usize, Result<T, String>)>,
    slots: Vec<(K, Instant)>,
}

impl<K, T> Default for DeadlineGroup<K, T>
where
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, T> DeadlineGroup<K, T>
where
    T: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            set: JoinSet::new(),
            slots: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Start `fut` immediately on the current runtime.
    pub fn spawn<F>(&mut self, key: K, fut: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let slot = self.slots.len();
        self.slots.push((key, Instant::now()));
        self.set.spawn(async move {
            let result = AssertUnwindSafe(fut)
                .catch_unwind()
                .await
                .map_err(panic_message);
            (slot, result)
        });
    }

    /// Wait for every task or the deadline, whichever comes first.
    ///
    /// Results come back in spawn order, independent of completion order.
    ///
    /// ```
    /// use hybrid_runtime::{DeadlineGroup, Joined};
    /// use std::time::Duration;
    /// use tokio::time::Instant;
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let mut group = DeadlineGroup::new();
    /// group.spawn("slow", async {
    ///     tokio::time::sleep(Duration::from_secs(5)).await;
    ///     1
    /// });
    /// group.spawn("fast", async { 2 });
    ///
    /// let settled = group
    ///     .join_until(Instant::now() + Duration::from_millis(50))
    ///     .await;
    /// assert_eq!(settled[0].joined, Joined::TimedOut);
    /// assert_eq!(settled[1].joined, Joined::Completed(2));
    /// # });
    /// ```
    pub async fn join_until(mut self, deadline: Instant) -> Vec<Settled<K, T>> {
        let mut done: Vec<Option<(Joined<T>, Instant)>> =
            self.slots.iter().map(|_| None).collect();
        let mut deadline_hit = false;

        let sleep = tokio::time::sleep_until(deadline);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                biased;
                next = self.set.join_next() => match next {
                    Some(Ok((slot, result))) => {
                        let joined = match result {
                            Ok(value) => Joined::Completed(value),
                            Err(msg) => {
                                tracing::warn!(slot, panic = %msg, "group.task.panicked");
                                Joined::Panicked(msg)
                            }
                        };
                        done[slot] = Some((joined, Instant::now()));
                    }
                    Some(Err(err)) => {
                        // Unwinds are caught inside the task; only cancellation lands here.
                        tracing::warn!(error = %err, "group.task.join_error");
                    }
                    None => break,
                },
                _ = &mut sleep => {
                    deadline_hit = true;
                    let pending = done.iter().filter(|d| d.is_none()).count();
                    tracing::warn!(pending, "group.deadline");
                    self.set.abort_all();
                    break;
                }
            }
        }

        self.slots
            .into_iter()
            .zip(done)
            .map(|((key, spawned), finished)| {
                let (joined, at) = match finished {
                    Some(pair) => pair,
                    None if deadline_hit => (Joined::TimedOut, deadline),
                    None => (
                        Joined::Panicked("task ended without a result".into()),
                        Instant::now(),
                    ),
                };
                Settled {
                    key,
                    joined,
                    elapsed: at.saturating_duration_since(spawned),
                }
            })
            .collect()
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}

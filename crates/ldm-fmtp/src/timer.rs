// SPDX-License-Identifier: BSD-3-Clause

//! Product Timer thread (spec §4.E, §5): a lazy-deletion deadline heap,
//! woken by condvar whenever a new, possibly-earlier deadline is armed.
//! Grounded on the teacher's `WakeNotifier` (`engine/wake.rs`): a
//! `parking_lot::{Mutex, Condvar}` pair rather than a naive sleep-poll loop,
//! adapted here to also carry the heap state the notifier itself didn't need.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use crate::config::LinkSpeed;
use crate::error::{join_worker, FaultLatch};
use crate::product::{DeadlineSink, ProductTracker};

/// How long the timer thread sleeps with nothing armed before re-checking
/// its stop flag.
const IDLE_POLL: Duration = Duration::from_secs(1);

/// Compute the per-product timeout (spec §4.E): `base_timeout` alone when
/// the link speed is unknown (`0`, spec §8 boundary case), otherwise
/// `base_timeout + prodsize*8/link_speed + retx_slack`.
fn compute_deadline_duration(prodsize: u32, link_speed_bps: u64, base_timeout: Duration, retx_slack: Duration) -> Duration {
    if link_speed_bps == 0 {
        return base_timeout;
    }
    let size_term_ns = (u128::from(prodsize) * 8 * 1_000_000_000) / u128::from(link_speed_bps);
    let size_term = Duration::from_nanos(size_term_ns.min(u128::from(u64::MAX)) as u64);
    base_timeout + size_term + retx_slack
}

struct TimerState {
    /// Authoritative deadline per live prodindex; the heap may contain stale
    /// entries for indexes that were re-armed or disarmed since being
    /// pushed.
    deadlines: HashMap<u32, Instant>,
    heap: BinaryHeap<Reverse<(Instant, u32)>>,
}

/// Shared handle the Tracker arms/disarms through, and the timer thread
/// reads from.
struct TimerShared {
    state: Mutex<TimerState>,
    wake: Condvar,
    base_timeout: Duration,
    retx_slack: Duration,
    link_speed: Arc<LinkSpeed>,
}

/// [`DeadlineSink`] implementation backing the Product Timer. Constructible
/// independently of the [`ProductTracker`] it will eventually signal, so the
/// Receiver can wire it into the Tracker before the timer thread itself
/// starts (spec §9 design note: no back-pointer from Timer to Tracker).
pub struct TimerHandle(Arc<TimerShared>);

impl TimerHandle {
    #[must_use]
    pub fn new(link_speed: Arc<LinkSpeed>, base_timeout: Duration, retx_slack: Duration) -> Arc<Self> {
        Arc::new(Self(Arc::new(TimerShared {
            state: Mutex::new(TimerState {
                deadlines: HashMap::new(),
                heap: BinaryHeap::new(),
            }),
            wake: Condvar::new(),
            base_timeout,
            retx_slack,
            link_speed,
        })))
    }
}

impl DeadlineSink for TimerHandle {
    fn arm(&self, prodindex: u32, prodsize: u32) {
        let deadline = Instant::now()
            + compute_deadline_duration(prodsize, self.0.link_speed.get(), self.0.base_timeout, self.0.retx_slack);
        let mut state = self.0.state.lock();
        state.deadlines.insert(prodindex, deadline);
        state.heap.push(Reverse((deadline, prodindex)));
        self.0.wake.notify_one();
    }

    fn disarm(&self, prodindex: u32) {
        self.0.state.lock().deadlines.remove(&prodindex);
    }
}

/// Owns the Product Timer's worker thread.
pub struct ProductTimer {
    shared: Arc<TimerShared>,
    stop_flag: Arc<AtomicBool>,
    fault: Arc<FaultLatch>,
    handle: Option<JoinHandle<()>>,
}

impl ProductTimer {
    /// Spawn the timer thread against an already-constructed [`TimerHandle`]
    /// (the same one passed to [`ProductTracker::new`] as its deadline
    /// sink).
    #[must_use]
    pub fn spawn(timer_handle: &Arc<TimerHandle>, tracker: Arc<ProductTracker>, fault: Arc<FaultLatch>) -> Self {
        let shared = Arc::clone(&timer_handle.0);

        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_flag_worker = Arc::clone(&stop_flag);
        let shared_worker = Arc::clone(&shared);

        let handle = thread::Builder::new()
            .name("fmtp-product-timer".into())
            .spawn(move || run(&shared_worker, &tracker, &stop_flag_worker))
            .expect("failed to spawn fmtp-product-timer thread");

        Self {
            shared,
            stop_flag,
            fault,
            handle: Some(handle),
        }
    }

    pub fn stop(mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        self.shared.wake.notify_all();
        if let Some(handle) = self.handle.take() {
            join_worker(handle, "fmtp-product-timer", &self.fault);
        }
    }
}

impl Drop for ProductTimer {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        self.shared.wake.notify_all();
        if let Some(handle) = self.handle.take() {
            join_worker(handle, "fmtp-product-timer", &self.fault);
        }
    }
}

fn run(shared: &TimerShared, tracker: &ProductTracker, stop_flag: &AtomicBool) {
    loop {
        if stop_flag.load(Ordering::Relaxed) {
            return;
        }
        let expired = {
            let mut state = shared.state.lock();
            loop {
                let Some(&Reverse((deadline, prodindex))) = state.heap.peek() else {
                    shared.wake.wait_for(&mut state, IDLE_POLL);
                    break None;
                };
                let now = Instant::now();
                if deadline > now {
                    let wait = deadline - now;
                    shared.wake.wait_for(&mut state, wait.min(IDLE_POLL));
                    break None;
                }
                state.heap.pop();
                match state.deadlines.get(&prodindex) {
                    Some(&armed) if armed == deadline => {
                        state.deadlines.remove(&prodindex);
                        break Some(prodindex);
                    }
                    _ => continue, // stale heap entry from a disarm/re-arm; keep draining
                }
            }
        };
        if stop_flag.load(Ordering::Relaxed) {
            return;
        }
        if let Some(prodindex) = expired {
            tracker.on_timer_expired(prodindex);
        }
    }
}

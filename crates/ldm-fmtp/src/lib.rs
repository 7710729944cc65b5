// SPDX-License-Identifier: BSD-3-Clause

//! FMTP v3 receiver: concurrent reassembly of multicast product streams with
//! TCP-sidechannel retransmission recovery.
//!
//! An embedding application builds a [`config::ReceiverConfig`], provides a
//! [`notifier::Notifier`] (what to do with each accepted/delivered/missed
//! product) and a [`sink::DeliverySink`] (where completed bytes go), and
//! starts a [`receiver::Receiver`]. From there the four worker threads —
//! Multicast Reader, Retx Sender, Retx Receiver, and Product Timer — run
//! until [`receiver::Receiver::stop`] is called or dropped.

mod config;
mod error;
mod mcast;
mod metrics;
mod notifier;
mod product;
mod receiver;
mod retx;
mod sink;
mod timer;
mod wire;

pub use config::{LinkSpeed, ReceiverConfig, ReceiverConfigBuilder};
pub use error::{Error, FaultLatch, Result};
pub use metrics::{MetricsSnapshot, ReceiverMetrics};
pub use notifier::{BopDecision, ClosureNotifier, Notifier};
pub use receiver::Receiver;
pub use sink::{DeliverySink, NullSink};

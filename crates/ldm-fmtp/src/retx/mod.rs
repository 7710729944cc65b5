// SPDX-License-Identifier: BSD-3-Clause

//! Retransmission sidechannel: the request queue plus the two long-lived
//! threads (spec §4.B, §5) that drive it over a TCP connection to the
//! sender's retransmission port.

mod receiver;
mod request;
mod sender;

pub use receiver::RetxReceiver;
pub use request::{PushOutcome, RetxQueue, RetxRequest};
pub use sender::RetxSender;

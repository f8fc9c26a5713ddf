//! # LogWriter — simple diagnostics printer
//!
//! A minimal observer that prints relay diagnostics to stdout.
//! Use it for test or demo.
//!
//! ## Example output
//! ```text
//! [attached] subscriber=3 endpoint="tcp:127.0.0.1:52114"
//! [subscribed] subscriber=3 channel="topic.1"
//! [forward-failed] subscriber=3 reason="transport_closed"
//! [outbox-overflow] subscriber=3 channel="topic.1"
//! [detached] subscriber=3
//! [shutdown-requested]
//! [drained-within-grace]
//! ```

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::bus::Bus;
use super::event::{RelayEvent, RelayEventKind};

/// Diagnostics printer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Spawns a printer task over the given bus.
    ///
    /// The task exits when the bus is dropped. Lag is reported, not fatal.
    pub fn spawn(bus: &Bus) -> JoinHandle<()> {
        let mut rx = bus.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => Self::write(&ev),
                    Err(RecvError::Lagged(n)) => {
                        println!("[observer-lagged] skipped={n}");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn write(e: &RelayEvent) {
        match e.kind {
            RelayEventKind::SubscriberAttached => {
                println!(
                    "[attached] subscriber={:?} endpoint={:?}",
                    e.subscriber, e.reason
                );
            }
            RelayEventKind::SubscriberDetached => {
                println!("[detached] subscriber={:?}", e.subscriber);
            }
            RelayEventKind::ChannelSubscribed => {
                println!(
                    "[subscribed] subscriber={:?} channel={:?}",
                    e.subscriber, e.channel
                );
            }
            RelayEventKind::ChannelUnsubscribed => {
                println!(
                    "[unsubscribed] subscriber={:?} channel={:?}",
                    e.subscriber, e.channel
                );
            }
            RelayEventKind::ForwardFailed => {
                println!(
                    "[forward-failed] subscriber={:?} reason={:?}",
                    e.subscriber, e.reason
                );
            }
            RelayEventKind::OutboxOverflow => {
                println!(
                    "[outbox-overflow] subscriber={:?} channel={:?}",
                    e.subscriber, e.channel
                );
            }
            RelayEventKind::OutboxPanicked => {
                println!(
                    "[outbox-panicked] subscriber={:?} info={}",
                    e.subscriber,
                    e.reason.as_deref().unwrap_or("unknown"),
                );
            }
            RelayEventKind::FrameIgnored => {
                println!(
                    "[frame-ignored] subscriber={:?} frame={:?}",
                    e.subscriber, e.reason
                );
            }
            RelayEventKind::ShutdownRequested => {
                println!("[shutdown-requested]");
            }
            RelayEventKind::DrainedWithinGrace => {
                println!("[drained-within-grace]");
            }
            RelayEventKind::GraceExceeded => {
                println!("[grace-exceeded] stuck={:?}", e.reason);
            }
        }
    }
}

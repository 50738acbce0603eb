//! Embassy glue: a periodic task body calling [`Node::update`] and a blocking
//! startup delay backed by `embassy_time`.
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{block_for, Duration, Ticker};
use futures_util::{future::select, future::Either, pin_mut};

use crate::protocol::node::Node;
use crate::protocol::transport::traits::link::J1939Link;
use crate::protocol::transport::traits::startup_delay::StartupDelay;

/// Tick `node` every `tick_ms` until `stop` is signaled.
///
/// Frames must reach the link from elsewhere (CAN RX interrupt, channel
/// producer task); this loop only polls them on each tick.
pub async fn drive<L, M>(node: &mut Node<L>, stop: &Signal<M, ()>)
where
    L: J1939Link,
    M: RawMutex,
{
    let mut ticker = Ticker::every(Duration::from_millis(node.config().tick_ms as u64));

    loop {
        let tick = ticker.next();
        let stopped = stop.wait();
        pin_mut!(tick);
        pin_mut!(stopped);

        match select(tick, stopped).await {
            Either::Left(_) => node.update(),
            Either::Right(_) => break,
        }
    }

    #[cfg(feature = "defmt")]
    defmt::info!("[driver] node {} stopped", node.source_address());
}

/// [`StartupDelay`] that busy-waits on the embassy time driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbassyStartupDelay;

impl StartupDelay for EmbassyStartupDelay {
    fn delay_ms(&mut self, millis: u32) {
        block_for(Duration::from_millis(millis as u64));
    }
}

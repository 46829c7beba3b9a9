use std::future::Future;

use futures::{Stream, StreamExt};
use log::{debug, info, trace, warn};
use zbus::{Message, MessageStream};

use mount_monitor_common::MountEvent;

use crate::{handler::EventHandler, proxy::ObjectProxy, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    /// Waiting for the next message
    Idle,
    /// Running handlers for a matched signal
    Dispatching,
}

/// Single task loop, which waits for bus messages and feeds subscribed signals
/// into the handler. Handlers always run to completion before the next message is read
pub struct DispatchLoop<H, S = MessageStream> {
    proxy: ObjectProxy,
    handler: H,
    messages: S,
    state: LoopState,
}

impl<H: EventHandler> DispatchLoop<H> {
    /// Create a loop reading messages from the proxy connection.
    /// Messages received after this call are queued until [Self::run_until] is polled
    pub fn new(proxy: ObjectProxy, handler: H) -> Self {
        let messages = MessageStream::from(proxy.connection().inner());
        Self::with_stream(proxy, handler, messages)
    }
}

impl<H, S> DispatchLoop<H, S>
where
    H: EventHandler,
    S: Stream<Item = zbus::Result<Message>> + Unpin,
{
    /// Create a loop over a custom message stream
    pub fn with_stream(proxy: ObjectProxy, handler: H, messages: S) -> Self {
        Self {
            proxy,
            handler,
            messages,
            state: LoopState::Idle,
        }
    }

    /// Run the loop until `shutdown` resolves. Returns the handler back on a graceful shutdown.
    ///
    /// Fails with [Error::Subscription] if the bus refuses the match rules, with
    /// [Error::ConnectionLost] if the message stream ends or fails, and with
    /// [Error::Decode] if a subscribed signal carries unexpected payload
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<H>
    where
        F: Future<Output = ()>,
    {
        self.proxy.bind().await?;
        info!(
            "Listening for {} signal subscription(s) of {}",
            self.proxy.subscriptions().len(),
            self.proxy.service()
        );

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    debug!("Shutting dispatch loop down");
                    return Ok(self.handler);
                }
                message = self.messages.next() => match message {
                    Some(Ok(message)) => self.dispatch(&message)?,
                    Some(Err(e)) => {
                        warn!("Failed to receive a message: {e}");
                        return Err(Error::ConnectionLost(Some(e)));
                    }
                    None => {
                        warn!("Message stream closed");
                        return Err(Error::ConnectionLost(None));
                    }
                }
            }
        }
    }

    fn dispatch(&mut self, message: &Message) -> Result<()> {
        self.proxy.track_owner(message);

        let kinds = self.proxy.matching_kinds(message);
        if kinds.is_empty() {
            trace!("Skipping unsubscribed message");
            return Ok(());
        }

        // Decode before calling any handler, so that a bad payload never produces partial output
        let payload: (String, String, String, String) =
            message.body().deserialize().map_err(Error::Decode)?;

        self.set_state(LoopState::Dispatching);
        for kind in kinds {
            let event = MountEvent::from_payload(kind, payload.clone());
            debug!("Incoming event: {event:?}");

            self.handler.handle(&event)?;
        }
        self.set_state(LoopState::Idle);

        Ok(())
    }

    fn set_state(&mut self, state: LoopState) {
        trace!("Dispatch loop state: {:?} -> {:?}", self.state, state);
        self.state = state;
    }
}

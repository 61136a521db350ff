//! Sequential event loop around a `Broker`.
//!
//! The broker lives on its own task and applies one command at a time from
//! an unbounded queue. Callers hold a cloneable `BrokerHandle` and get each
//! outcome back over a oneshot channel.

use crate::broker::{Broker, Command, Outcome};
use crate::core::{Error, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

enum BrokerEvent {
    Apply {
        command: Command,
        reply: oneshot::Sender<Result<Outcome>>,
    },
    Shutdown,
}

/// Cloneable handle to a running broker.
#[derive(Clone)]
pub struct BrokerHandle {
    event_tx: mpsc::UnboundedSender<BrokerEvent>,
}

impl BrokerHandle {
    /// Whether the event loop has stopped.
    pub fn is_closed(&self) -> bool {
        self.event_tx.is_closed()
    }

    /// Queue a command and wait for its outcome.
    ///
    /// A multi-candidate raise answers with `Outcome::Resolving` straight
    /// away; the loop keeps serving commands while the resolver is open.
    pub async fn apply(&self, command: Command) -> Result<Outcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.event_tx
            .send(BrokerEvent::Apply {
                command,
                reply: reply_tx,
            })
            .map_err(|_| Error::BrokerStopped)?;
        reply_rx.await.map_err(|_| Error::BrokerStopped)?
    }

    /// Stop the loop after the commands already queued.
    pub fn shutdown(&self) -> Result<()> {
        self.event_tx
            .send(BrokerEvent::Shutdown)
            .map_err(|_| Error::BrokerStopped)
    }
}

/// Owner of a broker running on a tokio task.
pub struct BrokerService {
    broker: Broker,
    event_rx: mpsc::UnboundedReceiver<BrokerEvent>,
}

impl BrokerService {
    /// Spawn the event loop and return its handle.
    pub fn spawn(broker: Broker) -> BrokerHandle {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let service = BrokerService { broker, event_rx };
        tokio::spawn(async move {
            service.run().await;
        });
        BrokerHandle { event_tx }
    }

    async fn run(mut self) {
        info!("broker event loop started");
        while let Some(event) = self.event_rx.recv().await {
            match event {
                BrokerEvent::Apply { command, reply } => {
                    let name = command.name();
                    let result = self.broker.apply(command).await;
                    if reply.send(result).is_err() {
                        debug!(command = name, "caller dropped before the outcome was ready");
                    }
                }
                BrokerEvent::Shutdown => break,
            }
        }
        info!("broker event loop stopped");
    }
}

//! Node event loops.
//!
//! A runtime owns one state machine and its devices. Each step it asks the
//! node what it is blocked on and waits for exactly that. Ticks keep flowing
//! to the node while it waits for a byte or a key, the same way a timer
//! interrupt would. Actions are executed in order before the next wait.
//! Keys pressed while the front node holds or pauses are discarded, never
//! queued for later.
//!
//! No wait has a timeout. A runtime whose peer stops mid-exchange waits for
//! the next byte until the link closes.

use std::{ops::ControlFlow, time::Duration};

use doorlock_core::{
    Awaiting, CredentialStore, CustodyAction, CustodyNode, FrontAction, FrontNode, Key,
};
use tracing::{debug, info};

use crate::{
    driver::{Actuator, Display, Keypad, SerialLink, Ticker},
    error::NodeError,
};

/// Input delivered to a node in one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Tick,
    Byte(u8),
    Key(u8),
}

/// Event loop of the custody node.
pub struct CustodyRuntime<L, A, T, S> {
    node: CustodyNode,
    link: L,
    actuator: A,
    ticker: T,
    store: S,
}

impl<L, A, T, S> CustodyRuntime<L, A, T, S>
where
    L: SerialLink,
    A: Actuator,
    T: Ticker,
    S: CredentialStore + Send,
{
    /// Runtime around a freshly booted node.
    pub fn new(node: CustodyNode, link: L, actuator: A, ticker: T, store: S) -> Self {
        Self { node, link, actuator, ticker, store }
    }

    /// State machine, for inspection.
    pub fn node(&self) -> &CustodyNode {
        &self.node
    }

    /// Credential store, for inspection.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Serve the link until the peer closes it.
    pub async fn run(mut self) -> Result<(), NodeError> {
        info!(state = ?self.node.state(), "custody node running");
        loop {
            match self.step().await {
                Ok(()) => {},
                Err(NodeError::LinkClosed) => {
                    info!("link closed, custody node stopping");
                    return Ok(());
                },
                Err(err) => return Err(err),
            }
        }
    }

    /// Wait for one input and execute the resulting actions.
    pub async fn step(&mut self) -> Result<(), NodeError> {
        let actions = match self.node.awaiting() {
            Awaiting::Byte => {
                tokio::select! {
                    () = self.ticker.tick() => self.node.tick(),
                    byte = self.link.receive() => self.node.handle_byte(byte?, &mut self.store),
                }
            },
            // Custody has no keypad, so it never reports `Awaiting::Key`.
            Awaiting::Hold | Awaiting::Key => {
                self.ticker.tick().await;
                self.node.tick()
            },
        };
        self.execute(actions).await
    }

    async fn execute(&mut self, actions: Vec<CustodyAction>) -> Result<(), NodeError> {
        for action in actions {
            debug!(?action, "custody: execute");
            match action {
                CustodyAction::Transmit(byte) => self.link.send(byte).await?,
                CustodyAction::Motor(command) => self.actuator.motor(command),
                CustodyAction::Alarm(state) => self.actuator.alarm(state),
            }
        }
        Ok(())
    }
}

/// Event loop of the front node.
pub struct FrontRuntime<L, K, D, T> {
    node: FrontNode,
    link: L,
    keypad: K,
    display: D,
    ticker: T,
}

impl<L, K, D, T> FrontRuntime<L, K, D, T>
where
    L: SerialLink,
    K: Keypad,
    D: Display,
    T: Ticker,
{
    /// Runtime around a freshly booted node.
    pub fn new(node: FrontNode, link: L, keypad: K, display: D, ticker: T) -> Self {
        Self { node, link, keypad, display, ticker }
    }

    /// State machine, for inspection.
    pub fn node(&self) -> &FrontNode {
        &self.node
    }

    /// Run the bootstrap setup, then serve the keypad until it runs dry.
    ///
    /// Returns the runtime so callers can inspect the final state.
    pub async fn run(mut self) -> Result<Self, NodeError> {
        info!("front node running");
        let actions = self.node.start();
        self.execute(actions).await?;

        while let ControlFlow::Continue(()) = self.step().await? {}

        info!(state = ?self.node.state(), "keypad exhausted, front node stopping");
        Ok(self)
    }

    /// Wait for one input and execute the resulting actions.
    ///
    /// Breaks once the node wants a key and the keypad has none left.
    pub async fn step(&mut self) -> Result<ControlFlow<()>, NodeError> {
        let event = match self.node.awaiting() {
            Awaiting::Byte => {
                tokio::select! {
                    () = self.ticker.tick() => Event::Tick,
                    byte = self.link.receive() => Event::Byte(byte?),
                }
            },
            Awaiting::Key => {
                tokio::select! {
                    () = self.ticker.tick() => Event::Tick,
                    key = self.keypad.next_key() => match key {
                        Some(code) => Event::Key(code),
                        None => return Ok(ControlFlow::Break(())),
                    },
                }
            },
            // Keys pressed during a hold reach the node, which drops them.
            Awaiting::Hold => {
                tokio::select! {
                    () = self.ticker.tick() => Event::Tick,
                    key = self.keypad.next_key() => match key {
                        Some(code) => Event::Key(code),
                        None => {
                            self.ticker.tick().await;
                            Event::Tick
                        },
                    },
                }
            },
        };

        let actions = match event {
            Event::Tick => self.node.tick(),
            Event::Byte(byte) => self.node.handle_byte(byte),
            Event::Key(code) => self.node.handle_key(Key::from_code(code)),
        };
        self.execute(actions).await?;
        Ok(ControlFlow::Continue(()))
    }

    async fn execute(&mut self, actions: Vec<FrontAction>) -> Result<(), NodeError> {
        for action in actions {
            debug!(?action, "front: execute");
            match action {
                FrontAction::Transmit(byte) => self.link.send(byte).await?,
                FrontAction::Pace => pause(self.node.config().digit_pacing).await,
                FrontAction::Show(screen) => self.display.show(screen),
                FrontAction::MaskDigit => self.display.mask_digit(),
                FrontAction::Pause(duration) => self.pause_discarding_keys(duration).await,
            }
        }
        Ok(())
    }

    /// Sleep for `duration`, dropping every key pressed meanwhile.
    async fn pause_discarding_keys(&mut self, duration: Duration) {
        let deadline = tokio::time::sleep(duration);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                () = &mut deadline => return,
                key = self.keypad.next_key() => match key {
                    Some(code) => debug!(code, "front: key dropped during pause"),
                    None => {
                        deadline.await;
                        return;
                    },
                },
            }
        }
    }
}

async fn pause(duration: Duration) {
    tokio::time::sleep(duration).await;
}

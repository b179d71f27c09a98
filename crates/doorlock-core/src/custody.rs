//! Custody node state machine.
//!
//! Owns the authoritative credential, the door motor and the alarm. Runs the
//! responding side of both exchanges.
//!
//! # State Machine
//!
//! ```text
//!              boot
//!               │
//!               ↓
//!          ┌─────────┐   matched pair   ┌─────────────────┐
//!          │  Setup  │─────────────────>│ AwaitingRequest │<──────────┐
//!          └─────────┘                  └─────────────────┘           │
//!               ↑   CHANGING_PASSWORD     │      │         │          │
//!               └─────────────────────────┘      │         │ 3rd      │
//!                                 UNLOCKING_DOOR │         │ WRONG    │
//!                                                ↓         ↓          │
//!                                         ┌──────────┐ ┌───────────┐  │
//!                                         │   Door   │ │ LockedOut │  │
//!                                         │ 15/3/15  │ │  60 ticks │  │
//!                                         └──────────┘ └───────────┘  │
//!                                                │         │          │
//!                                                └─────────┴──────────┘
//! ```
//!
//! Door and LockedOut are holds: the node reads no bytes until they run out.
//! The stored credential is re-read from the store for every verify request.

use doorlock_proto::{ControlByte, Credential, MatchStatus, Selector};
use tracing::{debug, error, info, warn};

use crate::{
    config::LockConfig,
    exchange::{SetupResponder, SetupStep, VerifyResponder, VerifyStep, compare_setup_pair},
    retry::{RetryCounter, RetryOutcome},
    store::{CredentialStore, load_credential, persist_credential},
    timing::{Awaiting, DoorPhase, DoorSequence, DoorTransition, ElapsedSeconds, Hold},
};

/// Door motor command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorCommand {
    /// Motor off
    Stop,
    /// Unlocking direction
    Clockwise,
    /// Locking direction
    CounterClockwise,
}

/// Alarm output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlarmState {
    /// Sounding
    On,
    /// Silent
    Off,
}

/// Effects requested by the custody node, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustodyAction {
    /// Send one byte to the front node
    Transmit(u8),
    /// Drive the door motor
    Motor(MotorCommand),
    /// Switch the alarm
    Alarm(AlarmState),
}

impl CustodyAction {
    fn reply(byte: ControlByte) -> Self {
        Self::Transmit(byte.to_u8())
    }
}

/// Externally visible custody state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CustodyState {
    /// Responding to a setup exchange
    Setup,
    /// Waiting for a verify request
    AwaitingRequest,
    /// Running the door sequence
    Door(DoorPhase),
    /// Alarm sounding, requests refused
    LockedOut,
}

#[derive(Debug, Clone)]
enum Mode {
    Setup(SetupResponder),
    AwaitingRequest(VerifyResponder),
    Door(DoorSequence),
    LockedOut(Hold),
}

/// Custody node.
#[derive(Debug, Clone)]
pub struct CustodyNode {
    config: LockConfig,
    mode: Mode,
    retries: RetryCounter,
    elapsed: ElapsedSeconds,
}

impl CustodyNode {
    /// Node at boot, ready to serve a setup exchange.
    pub fn new(config: LockConfig) -> Self {
        let retries = RetryCounter::new(config.max_attempts);
        Self {
            config,
            mode: Mode::Setup(SetupResponder::new()),
            retries,
            elapsed: ElapsedSeconds::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> CustodyState {
        match &self.mode {
            Mode::Setup(_) => CustodyState::Setup,
            Mode::AwaitingRequest(_) => CustodyState::AwaitingRequest,
            Mode::Door(sequence) => CustodyState::Door(sequence.phase()),
            Mode::LockedOut(_) => CustodyState::LockedOut,
        }
    }

    /// Input the node is blocked on.
    pub fn awaiting(&self) -> Awaiting {
        match self.mode {
            Mode::Setup(_) | Mode::AwaitingRequest(_) => Awaiting::Byte,
            Mode::Door(_) | Mode::LockedOut(_) => Awaiting::Hold,
        }
    }

    /// Consecutive failed verifications.
    pub fn retry_count(&self) -> u32 {
        self.retries.failures()
    }

    /// Configuration in use.
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Feed one byte from the link.
    ///
    /// Only meaningful while [`Self::awaiting`] is [`Awaiting::Byte`]; a byte
    /// delivered during a hold is dropped.
    pub fn handle_byte<S>(&mut self, byte: u8, store: &mut S) -> Vec<CustodyAction>
    where
        S: CredentialStore + ?Sized,
    {
        match &mut self.mode {
            Mode::Setup(responder) => match responder.on_byte(byte) {
                SetupStep::Ignored | SetupStep::Collecting => Vec::new(),
                SetupStep::Reply(reply) => vec![CustodyAction::reply(reply)],
                SetupStep::Received { candidate, confirmation } => {
                    let matched = compare_setup_pair(candidate, confirmation);
                    self.finish_setup(matched, store)
                },
            },
            Mode::AwaitingRequest(responder) => match responder.on_byte(byte) {
                VerifyStep::Ignored | VerifyStep::Collecting => Vec::new(),
                VerifyStep::Request { candidate, selector } => {
                    self.verify(candidate, selector, store)
                },
                VerifyStep::UnknownSelector(selector) => {
                    warn!(selector, "verify: unknown selector, request dropped");
                    Vec::new()
                },
            },
            Mode::Door(_) | Mode::LockedOut(_) => {
                warn!(byte, "byte delivered during hold, dropped");
                Vec::new()
            },
        }
    }

    /// Advance elapsed time by one tick.
    pub fn tick(&mut self) -> Vec<CustodyAction> {
        self.elapsed.tick();

        match &mut self.mode {
            Mode::Door(sequence) => match sequence.poll(&self.config, &mut self.elapsed) {
                None => Vec::new(),
                Some(DoorTransition::Entered(phase)) => {
                    debug!(?phase, "door phase");
                    let command = match phase {
                        DoorPhase::Unlocking => MotorCommand::Clockwise,
                        DoorPhase::HeldOpen => MotorCommand::Stop,
                        DoorPhase::Locking => MotorCommand::CounterClockwise,
                    };
                    vec![CustodyAction::Motor(command)]
                },
                Some(DoorTransition::Finished) => {
                    info!("door sequence complete");
                    self.await_request();
                    vec![CustodyAction::Motor(MotorCommand::Stop)]
                },
            },
            Mode::LockedOut(hold) if hold.is_complete(self.elapsed) => {
                info!("lockout over");
                self.retries.reset();
                self.await_request();
                vec![CustodyAction::Alarm(AlarmState::Off)]
            },
            Mode::LockedOut(_) | Mode::Setup(_) | Mode::AwaitingRequest(_) => Vec::new(),
        }
    }

    fn await_request(&mut self) {
        self.mode = Mode::AwaitingRequest(VerifyResponder::new());
    }

    fn finish_setup<S>(&mut self, matched: Option<Credential>, store: &mut S) -> Vec<CustodyAction>
    where
        S: CredentialStore + ?Sized,
    {
        let status = match matched {
            Some(credential) => match persist_credential(store, self.config.store_base, &credential) {
                Ok(()) => MatchStatus::Matched,
                Err(err) => {
                    error!(%err, "setup: failed to persist credential");
                    MatchStatus::Unmatched
                },
            },
            None => MatchStatus::Unmatched,
        };

        if status == MatchStatus::Matched {
            info!("setup: credential stored");
            self.await_request();
        } else {
            info!("setup: entries differ, restarting");
            self.mode = Mode::Setup(SetupResponder::new());
        }

        vec![
            CustodyAction::reply(ControlByte::ReadyToSend),
            CustodyAction::Transmit(status.to_u8()),
        ]
    }

    fn verify<S>(
        &mut self,
        candidate: [u8; doorlock_proto::CREDENTIAL_LEN],
        selector: Selector,
        store: &S,
    ) -> Vec<CustodyAction>
    where
        S: CredentialStore + ?Sized,
    {
        let stored = load_credential(store, self.config.store_base).unwrap_or_else(|err| {
            error!(%err, "verify: failed to read stored credential");
            None
        });
        let matched = match (Credential::from_wire(candidate), stored) {
            (Ok(candidate), Some(stored)) => candidate.matches(&stored),
            _ => false,
        };

        if matched {
            info!(?selector, "verify: accepted");
            self.retries.reset();
            let mut actions = vec![CustodyAction::reply(selector.approval().control_byte())];
            match selector {
                Selector::OpenDoor => {
                    self.mode = Mode::Door(DoorSequence::begin(&self.config, &mut self.elapsed));
                    actions.push(CustodyAction::Motor(MotorCommand::Clockwise));
                },
                Selector::ChangePassword => {
                    self.mode = Mode::Setup(SetupResponder::new());
                },
            }
            return actions;
        }

        let mut actions = vec![CustodyAction::reply(ControlByte::WrongPassword)];
        match self.retries.record_failure() {
            RetryOutcome::Counted { failures } => {
                info!(failures, "verify: rejected");
                self.await_request();
            },
            RetryOutcome::LockoutTriggered => {
                warn!(ticks = self.config.lockout_ticks, "verify: rejected, locking out");
                self.mode = Mode::LockedOut(Hold::begin(&mut self.elapsed, self.config.lockout_ticks));
                actions.push(CustodyAction::Alarm(AlarmState::On));
            },
        }
        actions
    }
}

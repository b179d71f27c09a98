//! Front node state machine.
//!
//! Owns the keypad, the display and the user's candidate credential. Runs the
//! initiating side of both exchanges.
//!
//! # State Machine
//!
//! ```text
//!   start ──> CapturingSetup(Candidate) ──> SetupExchange ──> CapturingSetup(Confirmation)
//!                  ↑                                                   │
//!                  │ unmatched                                         ↓
//!                  └──────────────────────────────────────────── SetupExchange
//!                                                                      │ matched
//!                                                                      ↓
//!   ┌─────────────────────────────────────────────────────────────> MenuIdle
//!   │                                                                  │ '+' / '-'
//!   │                                                                  ↓
//!   │                                                         CapturingCredential
//!   │                                                                  │ enter
//!   │                                                                  ↓
//!   │                                                       AwaitingCustodyReply
//!   │                     UNLOCKING_DOOR │   CHANGING_PASSWORD │   WRONG │
//!   │                                    ↓                     ↓         ↓
//!   └──────────────────────────── DoorSequence        CapturingSetup   MenuIdle
//!   └──────────────────────────── LockedOut <─────────── (3rd WRONG)
//! ```
//!
//! The front node keeps its own retry counter and its own clock. Neither is
//! synchronised with the custody node beyond the bytes exchanged.

use std::time::Duration;

use doorlock_proto::{CREDENTIAL_LEN, Credential, CustodyReply, Digit, MatchStatus, Selector};
use tracing::{debug, info, warn};

use crate::{
    config::LockConfig,
    exchange::{LinkAction, SetupInitiator, SetupProgress, SetupRound, encode_verify_request},
    retry::{RetryCounter, RetryOutcome},
    screen::Screen,
    timing::{Awaiting, DoorPhase, DoorSequence, DoorTransition, ElapsedSeconds, Hold},
};

/// Decoded key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Digit key 1..=9
    Digit(Digit),
    /// `+`
    OpenDoor,
    /// `-`
    ChangePassword,
    /// Enter (code 13)
    Enter,
    /// Anything else
    Other(u8),
}

impl Key {
    /// Keypad code of the enter key.
    pub const ENTER_CODE: u8 = 13;

    /// Decode a raw keypad code.
    pub fn from_code(code: u8) -> Self {
        match code {
            b'+' => Self::OpenDoor,
            b'-' => Self::ChangePassword,
            Self::ENTER_CODE => Self::Enter,
            _ => Digit::new(code).map_or(Self::Other(code), Self::Digit),
        }
    }
}

/// Effects requested by the front node, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontAction {
    /// Send one byte to the custody node
    Transmit(u8),
    /// Wait the inter-digit pacing gap
    Pace,
    /// Replace the display contents
    Show(Screen),
    /// Append one masking symbol to the input row
    MaskDigit,
    /// Block for this long, ignoring all input
    Pause(Duration),
}

impl From<LinkAction> for FrontAction {
    fn from(action: LinkAction) -> Self {
        match action {
            LinkAction::Transmit(byte) => Self::Transmit(byte),
            LinkAction::Pace => Self::Pace,
        }
    }
}

/// Externally visible front state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrontState {
    /// Capturing one of the two setup entries
    CapturingSetup(SetupRound),
    /// Setup bytes in flight
    SetupExchange,
    /// Main menu
    MenuIdle,
    /// Capturing a credential for a verify request
    CapturingCredential(Selector),
    /// Verify request sent, waiting for the verdict
    AwaitingCustodyReply(Selector),
    /// Mirroring the door sequence on the display
    DoorSequence(DoorPhase),
    /// Keypad locked
    LockedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureStep {
    Ignored,
    Accepted,
    Complete(Credential),
}

/// Keypad credential entry: exactly five digits, then enter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Capture {
    digits: Vec<Digit>,
}

impl Capture {
    fn push(&mut self, key: Key) -> CaptureStep {
        if self.digits.len() == CREDENTIAL_LEN {
            if key != Key::Enter {
                return CaptureStep::Ignored;
            }
            return match Credential::from_digits(&self.digits) {
                Ok(credential) => CaptureStep::Complete(credential),
                Err(_) => CaptureStep::Ignored,
            };
        }

        match key {
            Key::Digit(digit) => {
                self.digits.push(digit);
                CaptureStep::Accepted
            },
            _ => CaptureStep::Ignored,
        }
    }
}

#[derive(Debug, Clone)]
enum Mode {
    Setup { initiator: SetupInitiator, capture: Option<Capture> },
    Menu,
    Capturing { selector: Selector, capture: Capture },
    AwaitingReply(Selector),
    Door(DoorSequence),
    LockedOut(Hold),
}

impl Mode {
    fn fresh_setup() -> Self {
        Self::Setup { initiator: SetupInitiator::new(), capture: Some(Capture::default()) }
    }
}

/// Front node.
#[derive(Debug, Clone)]
pub struct FrontNode {
    config: LockConfig,
    mode: Mode,
    retries: RetryCounter,
    elapsed: ElapsedSeconds,
}

impl FrontNode {
    /// Node at boot. Call [`Self::start`] before feeding input.
    pub fn new(config: LockConfig) -> Self {
        let retries = RetryCounter::new(config.max_attempts);
        Self { config, mode: Mode::fresh_setup(), retries, elapsed: ElapsedSeconds::new() }
    }

    /// Begin the bootstrap setup exchange.
    pub fn start(&mut self) -> Vec<FrontAction> {
        self.mode = Mode::fresh_setup();
        vec![FrontAction::Show(Screen::CreatePassword)]
    }

    /// Current state.
    pub fn state(&self) -> FrontState {
        match &self.mode {
            Mode::Setup { initiator, capture: Some(_) } => {
                FrontState::CapturingSetup(initiator.round())
            },
            Mode::Setup { capture: None, .. } => FrontState::SetupExchange,
            Mode::Menu => FrontState::MenuIdle,
            Mode::Capturing { selector, .. } => FrontState::CapturingCredential(*selector),
            Mode::AwaitingReply(selector) => FrontState::AwaitingCustodyReply(*selector),
            Mode::Door(sequence) => FrontState::DoorSequence(sequence.phase()),
            Mode::LockedOut(_) => FrontState::LockedOut,
        }
    }

    /// Input the node is blocked on.
    pub fn awaiting(&self) -> Awaiting {
        match &self.mode {
            Mode::Setup { capture: Some(_), .. } | Mode::Menu | Mode::Capturing { .. } => {
                Awaiting::Key
            },
            Mode::Setup { capture: None, .. } | Mode::AwaitingReply(_) => Awaiting::Byte,
            Mode::Door(_) | Mode::LockedOut(_) => Awaiting::Hold,
        }
    }

    /// Consecutive rejected verify requests.
    pub fn retry_count(&self) -> u32 {
        self.retries.failures()
    }

    /// Configuration in use.
    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Feed one key press.
    pub fn handle_key(&mut self, key: Key) -> Vec<FrontAction> {
        match &mut self.mode {
            Mode::Setup { initiator, capture } => {
                let Some(entry) = capture else {
                    debug!(?key, "key during setup exchange ignored");
                    return Vec::new();
                };
                match entry.push(key) {
                    CaptureStep::Ignored => Vec::new(),
                    CaptureStep::Accepted => vec![FrontAction::MaskDigit],
                    CaptureStep::Complete(credential) => {
                        *capture = None;
                        link(initiator.offer(credential))
                    },
                }
            },
            Mode::Menu => {
                let selector = match key {
                    Key::OpenDoor => Selector::OpenDoor,
                    Key::ChangePassword => Selector::ChangePassword,
                    _ => return Vec::new(),
                };
                debug!(?selector, "menu selection");
                self.mode = Mode::Capturing { selector, capture: Capture::default() };
                vec![FrontAction::Show(Screen::EnterPassword)]
            },
            Mode::Capturing { selector, capture } => match capture.push(key) {
                CaptureStep::Ignored => Vec::new(),
                CaptureStep::Accepted => vec![FrontAction::MaskDigit],
                CaptureStep::Complete(credential) => {
                    let selector = *selector;
                    self.mode = Mode::AwaitingReply(selector);
                    link(encode_verify_request(&credential, selector))
                },
            },
            Mode::AwaitingReply(_) | Mode::Door(_) | Mode::LockedOut(_) => {
                debug!(?key, "key while busy ignored");
                Vec::new()
            },
        }
    }

    /// Feed one byte from the link.
    pub fn handle_byte(&mut self, byte: u8) -> Vec<FrontAction> {
        match &mut self.mode {
            Mode::Setup { initiator, capture: capture @ None } => match initiator.on_byte(byte) {
                SetupProgress::Ignored => Vec::new(),
                SetupProgress::Continue(actions) => link(actions),
                SetupProgress::NeedConfirmation(actions) => {
                    *capture = Some(Capture::default());
                    let mut actions = link(actions);
                    actions.push(FrontAction::Show(Screen::ReenterPassword));
                    actions
                },
                SetupProgress::Finished(MatchStatus::Matched) => {
                    info!("setup complete");
                    self.mode = Mode::Menu;
                    vec![FrontAction::Show(Screen::MainMenu)]
                },
                SetupProgress::Finished(MatchStatus::Unmatched) => {
                    info!("setup entries differ, restarting");
                    self.mode = Mode::fresh_setup();
                    vec![
                        FrontAction::Show(Screen::Mismatch),
                        FrontAction::Pause(self.config.message_hold),
                        FrontAction::Show(Screen::CreatePassword),
                    ]
                },
            },
            Mode::AwaitingReply(selector) => {
                let selector = *selector;
                self.on_reply(byte, selector)
            },
            Mode::Setup { .. }
            | Mode::Menu
            | Mode::Capturing { .. }
            | Mode::Door(_)
            | Mode::LockedOut(_) => {
                warn!(byte, "unexpected byte dropped");
                Vec::new()
            },
        }
    }

    /// Advance elapsed time by one tick.
    pub fn tick(&mut self) -> Vec<FrontAction> {
        self.elapsed.tick();

        match &mut self.mode {
            Mode::Door(sequence) => match sequence.poll(&self.config, &mut self.elapsed) {
                None => Vec::new(),
                Some(DoorTransition::Entered(phase)) => vec![FrontAction::Show(phase.into())],
                Some(DoorTransition::Finished) => self.enter_menu(),
            },
            Mode::LockedOut(hold) if hold.is_complete(self.elapsed) => {
                info!("keypad unlocked");
                self.retries.reset();
                self.enter_menu()
            },
            _ => Vec::new(),
        }
    }

    fn enter_menu(&mut self) -> Vec<FrontAction> {
        self.mode = Mode::Menu;
        vec![FrontAction::Show(Screen::MainMenu)]
    }

    fn on_reply(&mut self, byte: u8, selector: Selector) -> Vec<FrontAction> {
        match CustodyReply::from_u8(byte) {
            Some(CustodyReply::WrongPassword) => match self.retries.record_failure() {
                RetryOutcome::Counted { failures } => {
                    info!(failures, "credential rejected");
                    self.mode = Mode::Menu;
                    vec![
                        FrontAction::Show(Screen::WrongPassword),
                        FrontAction::Pause(self.config.message_hold),
                        FrontAction::Show(Screen::MainMenu),
                    ]
                },
                RetryOutcome::LockoutTriggered => {
                    warn!(ticks = self.config.lockout_ticks, "credential rejected, keypad locked");
                    self.mode =
                        Mode::LockedOut(Hold::begin(&mut self.elapsed, self.config.lockout_ticks));
                    vec![FrontAction::Show(Screen::LockedOut)]
                },
            },
            Some(reply) if reply == selector.approval() => {
                info!(?selector, "credential accepted");
                self.retries.reset();
                match selector {
                    Selector::OpenDoor => {
                        self.mode = Mode::Door(DoorSequence::begin(&self.config, &mut self.elapsed));
                        vec![FrontAction::Show(Screen::DoorUnlocking)]
                    },
                    Selector::ChangePassword => {
                        self.mode = Mode::fresh_setup();
                        vec![FrontAction::Show(Screen::CreatePassword)]
                    },
                }
            },
            _ => {
                warn!(byte, ?selector, "unexpected reply, back to menu");
                self.enter_menu()
            },
        }
    }
}

fn link(actions: Vec<LinkAction>) -> Vec<FrontAction> {
    actions.into_iter().map(FrontAction::from).collect()
}

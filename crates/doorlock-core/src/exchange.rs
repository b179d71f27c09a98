//! Setup and verify exchanges.
//!
//! These are the byte-level halves of the two exchanges, with no knowledge of
//! menus, motors or storage. The node state machines embed them and decide
//! what a finished exchange means.
//!
//! ```text
//! Setup (x2: candidate, then confirmation)
//!   front   RTS ──────────────>            custody
//!           <────────────── RTR
//!           d d d d d ────────>
//!   ...second round...
//!           <────────────── RTS
//!           RTR ──────────────>            (ignored by custody)
//!           <──────────── 1 | 0
//!
//! Verify
//!   front   RTS d d d d d SEL ──>          custody
//!           <──── UNLOCKING | CHANGING | WRONG
//! ```
//!
//! Nothing here times out. A peer that stops mid-exchange leaves the other
//! side waiting for its next byte indefinitely.

use doorlock_proto::{CREDENTIAL_LEN, ControlByte, Credential, MatchStatus, Selector};
use tracing::{debug, trace};

/// Link-level effect of an exchange step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    /// Send one byte
    Transmit(u8),
    /// Wait the inter-digit pacing gap before the next send
    Pace,
}

/// Credential digits, each followed by a pacing gap.
pub fn transmit_credential(credential: &Credential) -> Vec<LinkAction> {
    credential
        .to_wire()
        .into_iter()
        .flat_map(|digit| [LinkAction::Transmit(digit), LinkAction::Pace])
        .collect()
}

/// Complete verify request: RTS, paced digits, selector.
pub fn encode_verify_request(credential: &Credential, selector: Selector) -> Vec<LinkAction> {
    let mut actions = Vec::with_capacity(2 + 2 * CREDENTIAL_LEN);
    actions.push(LinkAction::Transmit(ControlByte::ReadyToSend.to_u8()));
    actions.extend(transmit_credential(credential));
    actions.push(LinkAction::Transmit(selector.control_byte().to_u8()));
    actions
}

/// Which of the two setup credentials is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupRound {
    /// First entry
    Candidate,
    /// Repeat entry
    Confirmation,
}

/// Fixed-length collector for raw digit bytes.
///
/// Bytes are kept as received; validation happens when the collected
/// credential is compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DigitBuffer {
    bytes: [u8; CREDENTIAL_LEN],
    len: usize,
}

impl DigitBuffer {
    /// Append; returns the full buffer once the fifth byte arrives.
    fn push(&mut self, byte: u8) -> Option<[u8; CREDENTIAL_LEN]> {
        self.bytes[self.len] = byte;
        self.len += 1;
        if self.len == CREDENTIAL_LEN {
            let full = self.bytes;
            *self = Self::default();
            Some(full)
        } else {
            None
        }
    }
}

/// Progress of the initiating side of a setup exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupProgress {
    /// Byte was not the one being waited for and was discarded
    Ignored,
    /// Send these and keep waiting
    Continue(Vec<LinkAction>),
    /// Candidate sent; capture the confirmation and [`SetupInitiator::offer`] it
    NeedConfirmation(Vec<LinkAction>),
    /// Responder's verdict
    Finished(MatchStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitiatorPhase {
    Idle,
    AwaitingReceiver(Credential),
    AwaitingResultReady,
    AwaitingResult,
}

/// Initiating side of a setup exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupInitiator {
    phase: InitiatorPhase,
    round: SetupRound,
}

impl SetupInitiator {
    /// Fresh exchange, nothing offered yet.
    pub const fn new() -> Self {
        Self { phase: InitiatorPhase::Idle, round: SetupRound::Candidate }
    }

    /// Round the next offered credential belongs to.
    pub const fn round(&self) -> SetupRound {
        self.round
    }

    /// Whether the initiator is waiting on the link.
    pub const fn is_waiting(&self) -> bool {
        !matches!(self.phase, InitiatorPhase::Idle)
    }

    /// Announce a captured credential. It is sent once the responder is
    /// ready.
    pub fn offer(&mut self, credential: Credential) -> Vec<LinkAction> {
        debug!(round = ?self.round, "setup: offering credential");
        self.phase = InitiatorPhase::AwaitingReceiver(credential);
        vec![LinkAction::Transmit(ControlByte::ReadyToSend.to_u8())]
    }

    /// Feed one byte from the responder.
    pub fn on_byte(&mut self, byte: u8) -> SetupProgress {
        let ready_to_receive = byte == ControlByte::ReadyToReceive.to_u8();
        let ready_to_send = byte == ControlByte::ReadyToSend.to_u8();

        let (next, progress) = match (self.phase, self.round) {
            (InitiatorPhase::AwaitingReceiver(credential), SetupRound::Candidate)
                if ready_to_receive =>
            {
                self.round = SetupRound::Confirmation;
                (InitiatorPhase::Idle, SetupProgress::NeedConfirmation(transmit_credential(&credential)))
            },
            (InitiatorPhase::AwaitingReceiver(credential), SetupRound::Confirmation)
                if ready_to_receive =>
            {
                (
                    InitiatorPhase::AwaitingResultReady,
                    SetupProgress::Continue(transmit_credential(&credential)),
                )
            },
            (InitiatorPhase::AwaitingResultReady, _) if ready_to_send => (
                InitiatorPhase::AwaitingResult,
                SetupProgress::Continue(vec![LinkAction::Transmit(
                    ControlByte::ReadyToReceive.to_u8(),
                )]),
            ),
            (InitiatorPhase::AwaitingResult, _) => {
                let status = MatchStatus::from_u8(byte);
                debug!(?status, "setup: responder verdict");
                *self = Self::new();
                return SetupProgress::Finished(status);
            },
            (phase, _) => {
                trace!(byte, ?phase, "setup: discarding byte");
                (phase, SetupProgress::Ignored)
            },
        };

        self.phase = next;
        progress
    }
}

impl Default for SetupInitiator {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of feeding a byte to a [`SetupResponder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupStep {
    /// Waiting for READY_TO_SEND; byte discarded
    Ignored,
    /// Reply with this control byte
    Reply(ControlByte),
    /// Digit stored, more expected
    Collecting,
    /// Both rounds received, as raw bytes
    Received {
        /// First entry
        candidate: [u8; CREDENTIAL_LEN],
        /// Repeat entry
        confirmation: [u8; CREDENTIAL_LEN],
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResponderPhase {
    AwaitingSender,
    Receiving(DigitBuffer),
}

/// Responding side of a setup exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupResponder {
    phase: ResponderPhase,
    candidate: Option<[u8; CREDENTIAL_LEN]>,
}

impl SetupResponder {
    /// Waiting for the first READY_TO_SEND.
    pub const fn new() -> Self {
        Self { phase: ResponderPhase::AwaitingSender, candidate: None }
    }

    /// Round currently expected.
    pub const fn round(&self) -> SetupRound {
        if self.candidate.is_some() { SetupRound::Confirmation } else { SetupRound::Candidate }
    }

    /// Feed one byte from the initiator.
    pub fn on_byte(&mut self, byte: u8) -> SetupStep {
        match &mut self.phase {
            ResponderPhase::AwaitingSender => {
                if byte != ControlByte::ReadyToSend.to_u8() {
                    trace!(byte, "setup: discarding byte while idle");
                    return SetupStep::Ignored;
                }
                self.phase = ResponderPhase::Receiving(DigitBuffer::default());
                SetupStep::Reply(ControlByte::ReadyToReceive)
            },
            ResponderPhase::Receiving(buffer) => {
                let Some(received) = buffer.push(byte) else {
                    return SetupStep::Collecting;
                };
                self.phase = ResponderPhase::AwaitingSender;
                match self.candidate.take() {
                    None => {
                        self.candidate = Some(received);
                        SetupStep::Collecting
                    },
                    Some(candidate) => SetupStep::Received { candidate, confirmation: received },
                }
            },
        }
    }
}

impl Default for SetupResponder {
    fn default() -> Self {
        Self::new()
    }
}

/// Compare the two setup entries. Invalid digits never match.
pub fn compare_setup_pair(
    candidate: [u8; CREDENTIAL_LEN],
    confirmation: [u8; CREDENTIAL_LEN],
) -> Option<Credential> {
    let candidate = Credential::from_wire(candidate).ok()?;
    let confirmation = Credential::from_wire(confirmation).ok()?;
    candidate.matches(&confirmation).then_some(candidate)
}

/// Outcome of feeding a byte to a [`VerifyResponder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyStep {
    /// Waiting for READY_TO_SEND; byte discarded
    Ignored,
    /// Part of the request, more expected
    Collecting,
    /// Complete request
    Request {
        /// Candidate digits as received
        candidate: [u8; CREDENTIAL_LEN],
        /// Requested transaction
        selector: Selector,
    },
    /// Complete request with a selector byte outside the vocabulary
    UnknownSelector(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VerifyPhase {
    AwaitingSender,
    Receiving(DigitBuffer),
    AwaitingSelector([u8; CREDENTIAL_LEN]),
}

/// Responding side of a verify exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResponder {
    phase: VerifyPhase,
}

impl VerifyResponder {
    /// Waiting for READY_TO_SEND.
    pub const fn new() -> Self {
        Self { phase: VerifyPhase::AwaitingSender }
    }

    /// Whether a request is partially received.
    pub const fn in_request(&self) -> bool {
        !matches!(self.phase, VerifyPhase::AwaitingSender)
    }

    /// Feed one byte from the initiator.
    pub fn on_byte(&mut self, byte: u8) -> VerifyStep {
        match &mut self.phase {
            VerifyPhase::AwaitingSender => {
                if byte == ControlByte::ReadyToSend.to_u8() {
                    self.phase = VerifyPhase::Receiving(DigitBuffer::default());
                    VerifyStep::Collecting
                } else {
                    trace!(byte, "verify: discarding byte while idle");
                    VerifyStep::Ignored
                }
            },
            VerifyPhase::Receiving(buffer) => {
                if let Some(candidate) = buffer.push(byte) {
                    self.phase = VerifyPhase::AwaitingSelector(candidate);
                }
                VerifyStep::Collecting
            },
            VerifyPhase::AwaitingSelector(candidate) => {
                let candidate = *candidate;
                self.phase = VerifyPhase::AwaitingSender;
                match Selector::from_u8(byte) {
                    Some(selector) => VerifyStep::Request { candidate, selector },
                    None => VerifyStep::UnknownSelector(byte),
                }
            },
        }
    }
}

impl Default for VerifyResponder {
    fn default() -> Self {
        Self::new()
    }
}

//! Two-node world for scenario execution.
//!
//! The world wires a [`FrontNode`] and a [`CustodyNode`] together through two
//! byte queues and drives them until neither can make progress. Time only
//! moves while one of the nodes is holding; a tick outside a hold only bumps
//! a counter that the next hold resets anyway, so skipping those ticks
//! changes nothing observable.

use std::{collections::VecDeque, time::Duration};

use doorlock_core::{
    AlarmState, Awaiting, CustodyAction, CustodyNode, FrontAction, FrontNode, Key, LockConfig,
    MemoryStore, MotorCommand, Screen,
};
use doorlock_proto::Credential;
use tracing::trace;

/// Something observable that happened in the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorldEvent {
    /// Front node put a byte on the link
    FrontSent(u8),
    /// Custody node put a byte on the link
    CustodySent(u8),
    /// Front display changed
    Screen(Screen),
    /// Front display appended a masking symbol
    Masked,
    /// Front node blocked on a message hold
    Pause(Duration),
    /// Custody node drove the motor
    Motor(MotorCommand),
    /// Custody node switched the alarm
    Alarm(AlarmState),
}

/// Why [`World::run_until_idle`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Front node is waiting for a key and none is queued
    Idle,
    /// Both nodes are waiting for a byte that will never come
    Stalled,
    /// Step budget exhausted
    StepLimit,
}

/// Both nodes, the link between them and the custody store.
#[derive(Debug, Clone)]
pub struct World {
    front: FrontNode,
    custody: CustodyNode,
    store: MemoryStore,
    to_custody: VecDeque<u8>,
    to_front: VecDeque<u8>,
    keys: VecDeque<u8>,
    events: Vec<(u64, WorldEvent)>,
    now: u64,
    max_steps: usize,
}

impl World {
    /// Freshly booted nodes and an erased store.
    pub fn new(config: LockConfig) -> Self {
        Self::with_store(config, MemoryStore::default())
    }

    /// Freshly booted nodes over an existing store.
    pub fn with_store(config: LockConfig, store: MemoryStore) -> Self {
        Self {
            front: FrontNode::new(config.clone()),
            custody: CustodyNode::new(config),
            store,
            to_custody: VecDeque::new(),
            to_front: VecDeque::new(),
            keys: VecDeque::new(),
            events: Vec::new(),
            now: 0,
            max_steps: 100_000,
        }
    }

    /// Boot both nodes and complete the bootstrap setup with `credential`.
    ///
    /// # Panics
    ///
    /// If the setup does not finish at the main menu.
    pub fn provisioned(config: LockConfig, credential: &Credential) -> Self {
        let mut world = Self::new(config);
        world.start();
        world.enter_credential(credential);
        world.enter_credential(credential);
        assert_eq!(world.run_until_idle(), Outcome::Idle, "bootstrap setup did not settle");
        world
    }

    /// Show the front node's first screen.
    pub fn start(&mut self) {
        let actions = self.front.start();
        self.apply_front(actions);
    }

    /// Queue raw key codes.
    pub fn press(&mut self, codes: &[u8]) {
        self.keys.extend(codes);
    }

    /// Queue a credential followed by enter.
    pub fn enter_credential(&mut self, credential: &Credential) {
        self.keys.extend(credential.to_wire());
        self.keys.push_back(Key::ENTER_CODE);
    }

    /// Queue a menu selection, a credential and enter.
    pub fn request(&mut self, menu_key: u8, credential: &Credential) {
        self.keys.push_back(menu_key);
        self.enter_credential(credential);
    }

    /// Put raw bytes on the link towards the custody node.
    pub fn inject_to_custody(&mut self, bytes: &[u8]) {
        self.to_custody.extend(bytes);
    }

    /// Deliver `ticks` ticks to both nodes regardless of what they wait for.
    pub fn advance(&mut self, ticks: u32) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    /// Drive both nodes until nothing more can happen.
    pub fn run_until_idle(&mut self) -> Outcome {
        for _ in 0..self.max_steps {
            if !self.step() {
                return match self.front.awaiting() {
                    Awaiting::Key => Outcome::Idle,
                    Awaiting::Byte | Awaiting::Hold => Outcome::Stalled,
                };
            }
        }
        Outcome::StepLimit
    }

    /// One unit of progress. Returns `false` if none was possible.
    fn step(&mut self) -> bool {
        if self.custody.awaiting() == Awaiting::Byte {
            if let Some(byte) = self.to_custody.pop_front() {
                let actions = self.custody.handle_byte(byte, &mut self.store);
                self.apply_custody(actions);
                return true;
            }
        }

        match self.front.awaiting() {
            Awaiting::Byte => {
                if let Some(byte) = self.to_front.pop_front() {
                    let actions = self.front.handle_byte(byte);
                    self.apply_front(actions);
                    return true;
                }
            },
            Awaiting::Key => {
                if let Some(code) = self.keys.pop_front() {
                    let actions = self.front.handle_key(Key::from_code(code));
                    self.apply_front(actions);
                    return true;
                }
            },
            Awaiting::Hold => {},
        }

        if self.front.awaiting() == Awaiting::Hold || self.custody.awaiting() == Awaiting::Hold {
            self.tick();
            return true;
        }

        false
    }

    fn tick(&mut self) {
        self.now += 1;
        let front = self.front.tick();
        self.apply_front(front);
        let custody = self.custody.tick();
        self.apply_custody(custody);
    }

    fn record(&mut self, event: WorldEvent) {
        trace!(tick = self.now, ?event, "world");
        self.events.push((self.now, event));
    }

    fn apply_front(&mut self, actions: Vec<FrontAction>) {
        for action in actions {
            match action {
                FrontAction::Transmit(byte) => {
                    self.to_custody.push_back(byte);
                    self.record(WorldEvent::FrontSent(byte));
                },
                FrontAction::Pace => {},
                FrontAction::Show(screen) => self.record(WorldEvent::Screen(screen)),
                FrontAction::MaskDigit => self.record(WorldEvent::Masked),
                FrontAction::Pause(duration) => self.record(WorldEvent::Pause(duration)),
            }
        }
    }

    fn apply_custody(&mut self, actions: Vec<CustodyAction>) {
        for action in actions {
            match action {
                CustodyAction::Transmit(byte) => {
                    self.to_front.push_back(byte);
                    self.record(WorldEvent::CustodySent(byte));
                },
                CustodyAction::Motor(command) => self.record(WorldEvent::Motor(command)),
                CustodyAction::Alarm(state) => self.record(WorldEvent::Alarm(state)),
            }
        }
    }

    /// Front state machine.
    pub fn front(&self) -> &FrontNode {
        &self.front
    }

    /// Custody state machine.
    pub fn custody(&self) -> &CustodyNode {
        &self.custody
    }

    /// Custody store.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Ticks elapsed so far.
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Every event with the tick it happened on.
    pub fn events(&self) -> &[(u64, WorldEvent)] {
        &self.events
    }

    /// Drain recorded events.
    pub fn take_events(&mut self) -> Vec<(u64, WorldEvent)> {
        std::mem::take(&mut self.events)
    }

    /// Bytes the custody node sent, in order.
    pub fn custody_sent(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|(_, event)| match event {
                WorldEvent::CustodySent(byte) => Some(*byte),
                _ => None,
            })
            .collect()
    }

    /// Screens shown, in order.
    pub fn screens(&self) -> Vec<Screen> {
        self.events
            .iter()
            .filter_map(|(_, event)| match event {
                WorldEvent::Screen(screen) => Some(*screen),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_stores_credential() {
        let credential: Credential = "13579".parse().unwrap();
        let world = World::provisioned(LockConfig::default(), &credential);

        assert_eq!(&world.store().snapshot()[..5], &[1, 3, 5, 7, 9]);
        assert_eq!(world.screens(), vec![
            Screen::CreatePassword,
            Screen::ReenterPassword,
            Screen::MainMenu
        ]);
    }

    #[test]
    fn misaligned_request_stalls() {
        let credential: Credential = "13579".parse().unwrap();
        let mut world = World::provisioned(LockConfig::default(), &credential);

        // A stray READY_TO_SEND shifts the request by one byte, so custody
        // reads a digit as the selector and never answers.
        world.inject_to_custody(&[0x10]);
        world.request(b'+', &credential);

        assert_eq!(world.run_until_idle(), Outcome::Stalled);
        assert_eq!(world.custody_sent(), vec![0x20, 0x20, 0x10, 1]);
    }
}

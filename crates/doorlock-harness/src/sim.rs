//! Devices and hosts for running both node runtimes inside turmoil.
//!
//! The custody node listens on [`CUSTODY_PORT`] of a host named
//! [`CUSTODY_HOST`]; the front node connects to it. All devices record with
//! `tokio::time::Instant`, so timelines are in simulated time.

use std::{
    collections::VecDeque,
    net::{IpAddr, Ipv4Addr},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use doorlock_core::{
    AlarmState, CredentialStore, CustodyNode, FrontNode, LockConfig, MemoryStore, MotorCommand,
    Screen, StoreError,
};
use doorlock_node::{
    Actuator, ByteLink, CustodyRuntime, Display, FrontRuntime, IntervalTicker, Keypad,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::time::Instant;
use tracing::info;

/// Host name of the custody node.
pub const CUSTODY_HOST: &str = "custody";

/// Port the custody node listens on.
pub const CUSTODY_PORT: u16 = 7070;

/// Key codes that no front state reacts to.
const NOISE_KEYS: [u8; 8] = [0, b'0', b'*', b'A', b'B', b'C', b'D', 0x7F];

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared, timestamped event log.
#[derive(Debug)]
pub struct Recorder<T> {
    start: Instant,
    events: Arc<Mutex<Vec<(Duration, T)>>>,
}

impl<T> Clone for Recorder<T> {
    fn clone(&self) -> Self {
        Self { start: self.start, events: Arc::clone(&self.events) }
    }
}

impl<T: Clone> Recorder<T> {
    /// Empty log; offsets are measured from now.
    pub fn new() -> Self {
        Self { start: Instant::now(), events: Arc::new(Mutex::new(Vec::new())) }
    }

    fn push(&self, event: T) {
        lock(&self.events).push((self.start.elapsed(), event));
    }

    /// Everything recorded so far.
    pub fn events(&self) -> Vec<(Duration, T)> {
        lock(&self.events).clone()
    }

    /// Recorded values without timestamps.
    pub fn values(&self) -> Vec<T> {
        lock(&self.events).iter().map(|(_, value)| value.clone()).collect()
    }
}

impl<T: Clone> Default for Recorder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Custody output as recorded by [`Recorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustodyOutput {
    /// Motor command
    Motor(MotorCommand),
    /// Alarm switch
    Alarm(AlarmState),
}

impl Actuator for Recorder<CustodyOutput> {
    fn motor(&mut self, command: MotorCommand) {
        self.push(CustodyOutput::Motor(command));
    }

    fn alarm(&mut self, state: AlarmState) {
        self.push(CustodyOutput::Alarm(state));
    }
}

impl Display for Recorder<Screen> {
    fn show(&mut self, screen: Screen) {
        self.push(screen);
    }

    fn mask_digit(&mut self) {}
}

/// Credential store that outlives the custody host.
///
/// Turmoil may restart a host; cloning the handle into every incarnation keeps
/// the same bytes, like an EEPROM would.
#[derive(Debug, Clone, Default)]
pub struct SharedStore {
    inner: Arc<Mutex<MemoryStore>>,
}

impl SharedStore {
    /// Share an existing store.
    pub fn new(store: MemoryStore) -> Self {
        Self { inner: Arc::new(Mutex::new(store)) }
    }

    /// Copy of the current contents.
    pub fn snapshot(&self) -> Vec<u8> {
        lock(&self.inner).snapshot().to_vec()
    }

    /// Writes performed so far.
    pub fn write_count(&self) -> usize {
        lock(&self.inner).write_count()
    }
}

impl CredentialStore for SharedStore {
    fn read(&self, addr: u16) -> Result<u8, StoreError> {
        lock(&self.inner).read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) -> Result<(), StoreError> {
        lock(&self.inner).write(addr, value)
    }
}

/// One step of a keypad script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStep {
    /// Deliver this key code
    Press(u8),
    /// Deliver nothing for this long
    Wait(Duration),
}

/// Keypad that replays a script of presses and pauses.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeypad {
    steps: VecDeque<KeyStep>,
    deadline: Option<Instant>,
}

impl ScriptedKeypad {
    /// Keypad replaying `steps` in order.
    pub fn new(steps: impl IntoIterator<Item = KeyStep>) -> Self {
        Self { steps: steps.into_iter().collect(), deadline: None }
    }

    /// Keypad pressing `codes` back to back.
    pub fn presses(codes: impl IntoIterator<Item = u8>) -> Self {
        Self::new(codes.into_iter().map(KeyStep::Press))
    }

    /// Press `codes` with harmless keys mixed in.
    ///
    /// The same seed always yields the same script.
    pub fn noisy(codes: &[u8], seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut steps = Vec::with_capacity(codes.len() * 2);
        for &code in codes {
            if rng.gen_bool(0.3) {
                let noise = NOISE_KEYS[rng.gen_range(0..NOISE_KEYS.len())];
                steps.push(KeyStep::Press(noise));
            }
            steps.push(KeyStep::Press(code));
        }
        Self::new(steps)
    }

    /// Append a pause.
    #[must_use]
    pub fn then_wait(mut self, duration: Duration) -> Self {
        self.steps.push_back(KeyStep::Wait(duration));
        self
    }

    /// Append more presses.
    #[must_use]
    pub fn then_press(mut self, codes: impl IntoIterator<Item = u8>) -> Self {
        self.steps.extend(codes.into_iter().map(KeyStep::Press));
        self
    }
}

#[async_trait]
impl Keypad for ScriptedKeypad {
    async fn next_key(&mut self) -> Option<u8> {
        loop {
            match *self.steps.front()? {
                KeyStep::Press(code) => {
                    self.steps.pop_front();
                    return Some(code);
                },
                KeyStep::Wait(duration) => {
                    // Kept across cancellation so the pause is not restarted.
                    let deadline = *self.deadline.get_or_insert_with(|| Instant::now() + duration);
                    tokio::time::sleep_until(deadline).await;
                    self.deadline = None;
                    self.steps.pop_front();
                },
            }
        }
    }
}

/// Accept one front node and serve it until the link closes.
pub async fn serve_custody(
    config: LockConfig,
    store: SharedStore,
    actuator: Recorder<CustodyOutput>,
) -> turmoil::Result {
    let listener =
        turmoil::net::TcpListener::bind((IpAddr::from(Ipv4Addr::UNSPECIFIED), CUSTODY_PORT))
            .await?;
    let (stream, peer) = listener.accept().await?;
    info!(%peer, "custody: front node connected");

    let ticker = IntervalTicker::new(config.tick_interval);
    CustodyRuntime::new(CustodyNode::new(config), ByteLink::new(stream), actuator, ticker, store)
        .run()
        .await?;
    Ok(())
}

/// Connect to the custody host and run the front node until `keypad` runs dry.
///
/// Returns the front node in its final state.
pub async fn run_front<K: Keypad>(
    config: LockConfig,
    keypad: K,
    display: Recorder<Screen>,
) -> Result<FrontNode, Box<dyn std::error::Error>> {
    let stream = turmoil::net::TcpStream::connect((CUSTODY_HOST, CUSTODY_PORT)).await?;
    let ticker = IntervalTicker::new(config.tick_interval);
    let runtime =
        FrontRuntime::new(FrontNode::new(config), ByteLink::new(stream), keypad, display, ticker)
            .run()
            .await?;
    Ok(runtime.node().clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noisy_script_is_deterministic() {
        let a = ScriptedKeypad::noisy(&[1, 2, 3, 4, 5, 13], 7);
        let b = ScriptedKeypad::noisy(&[1, 2, 3, 4, 5, 13], 7);
        assert_eq!(a.steps, b.steps);

        let pressed: Vec<u8> = a
            .steps
            .iter()
            .filter_map(|step| match step {
                KeyStep::Press(code) if !NOISE_KEYS.contains(code) => Some(*code),
                _ => None,
            })
            .collect();
        assert_eq!(pressed, vec![1, 2, 3, 4, 5, 13]);
    }

    #[test]
    fn shared_store_survives_clone() {
        let mut store = SharedStore::default();
        let view = store.clone();
        store.write(3, 7).unwrap();
        assert_eq!(view.read(3).unwrap(), 7);
        assert_eq!(view.write_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_wait_survives_cancellation() {
        let mut keypad = ScriptedKeypad::presses([1]).then_wait(Duration::from_secs(10)).then_press([2]);
        assert_eq!(keypad.next_key().await, Some(1));

        let start = Instant::now();
        for _ in 0..4 {
            let cancelled =
                tokio::time::timeout(Duration::from_secs(2), keypad.next_key()).await;
            assert!(cancelled.is_err());
        }
        assert_eq!(keypad.next_key().await, Some(2));
        assert_eq!(start.elapsed(), Duration::from_secs(10));
        assert_eq!(keypad.next_key().await, None);
    }
}

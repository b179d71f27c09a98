//! Both node runtimes in a turmoil simulation.
//!
//! The custody runtime serves a simulated TCP link, the front runtime reads a
//! scripted keypad. Tickers, pacing and message holds all run on simulated
//! time, so a full door cycle or lockout completes in milliseconds.

use std::time::Duration;

use doorlock_core::{AlarmState, FrontState, LockConfig, MotorCommand, Screen};
use doorlock_harness::sim::{
    CUSTODY_HOST, CustodyOutput, Recorder, ScriptedKeypad, SharedStore, run_front, serve_custody,
};

/// Simulated time the client keeps running after its keypad is exhausted, so
/// the custody node can finish what it is doing.
const SETTLE: Duration = Duration::from_secs(5);

/// Wait after a rejected attempt; keys typed during the notice are dropped.
const NOTICE: Duration = Duration::from_secs(3);

/// Allowed skew between a recorded gap and its nominal length.
const SLACK: Duration = Duration::from_millis(50);

fn simulation(seed: u64) -> turmoil::Sim<'static> {
    turmoil::Builder::new()
        .simulation_duration(Duration::from_secs(600))
        .tick_duration(Duration::from_millis(10))
        .min_message_latency(Duration::from_millis(1))
        .max_message_latency(Duration::from_millis(20))
        .rng_seed(seed)
        .build()
}

fn typed(credential: &str) -> Vec<u8> {
    let mut keys: Vec<u8> = credential.bytes().map(|c| c - b'0').collect();
    keys.push(13);
    keys
}

fn setup(credential: &str) -> Vec<u8> {
    [typed(credential), typed(credential)].concat()
}

fn request(menu_key: u8, credential: &str) -> Vec<u8> {
    [vec![menu_key], typed(credential)].concat()
}

fn start_custody(sim: &mut turmoil::Sim<'static>) -> (SharedStore, Recorder<CustodyOutput>) {
    let store = SharedStore::default();
    let actuator = Recorder::new();
    let (host_store, host_actuator) = (store.clone(), actuator.clone());
    sim.host(CUSTODY_HOST, move || {
        serve_custody(LockConfig::default(), host_store.clone(), host_actuator.clone())
    });
    (store, actuator)
}

fn start_front(sim: &mut turmoil::Sim<'static>, keypad: ScriptedKeypad) -> Recorder<Screen> {
    let display = Recorder::new();
    let client_display = display.clone();
    sim.client("front", async move {
        let front = run_front(LockConfig::default(), keypad, client_display).await?;
        assert_eq!(front.state(), FrontState::MenuIdle);
        tokio::time::sleep(SETTLE).await;
        Ok(())
    });
    display
}

fn assert_gap(actual: Duration, nominal: Duration) {
    assert!(
        actual.abs_diff(nominal) <= SLACK,
        "gap {actual:?} not within {SLACK:?} of {nominal:?}"
    );
}

#[test]
fn open_door_over_simulated_link() {
    let mut sim = simulation(1);
    let (store, actuator) = start_custody(&mut sim);
    let keys = [setup("24681"), request(b'+', "24681")].concat();
    let display = start_front(&mut sim, ScriptedKeypad::presses(keys));

    sim.run().unwrap();

    assert_eq!(&store.snapshot()[..5], &[2, 4, 6, 8, 1]);
    assert_eq!(store.write_count(), 5);

    let outputs = actuator.events();
    let commands: Vec<CustodyOutput> = outputs.iter().map(|(_, o)| *o).collect();
    assert_eq!(commands, vec![
        CustodyOutput::Motor(MotorCommand::Clockwise),
        CustodyOutput::Motor(MotorCommand::Stop),
        CustodyOutput::Motor(MotorCommand::CounterClockwise),
        CustodyOutput::Motor(MotorCommand::Stop),
    ]);
    // The first phase starts between two ticks, so it can be up to one tick
    // short.
    let gaps: Vec<Duration> = outputs.windows(2).map(|w| w[1].0 - w[0].0).collect();
    assert!(gaps[0] > Duration::from_secs(14) - SLACK);
    assert!(gaps[0] <= Duration::from_secs(15) + SLACK);
    assert_gap(gaps[1], Duration::from_secs(3));
    assert_gap(gaps[2], Duration::from_secs(15));

    assert_eq!(display.values(), vec![
        Screen::CreatePassword,
        Screen::ReenterPassword,
        Screen::MainMenu,
        Screen::EnterPassword,
        Screen::DoorUnlocking,
        Screen::DoorOpen,
        Screen::DoorLocking,
        Screen::MainMenu,
    ]);
}

#[test]
fn lockout_over_simulated_link() {
    let mut sim = simulation(2);
    let (_store, actuator) = start_custody(&mut sim);
    let keypad = ScriptedKeypad::presses(setup("13579"))
        .then_press(request(b'+', "99999"))
        .then_wait(NOTICE)
        .then_press(request(b'+', "99999"))
        .then_wait(NOTICE)
        .then_press(request(b'+', "99999"));
    let display = start_front(&mut sim, keypad);

    sim.run().unwrap();

    let outputs = actuator.events();
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].1, CustodyOutput::Alarm(AlarmState::On));
    assert_eq!(outputs[1].1, CustodyOutput::Alarm(AlarmState::Off));
    let held = outputs[1].0 - outputs[0].0;
    assert!(held > Duration::from_secs(59) - SLACK);
    assert!(held <= Duration::from_secs(60) + SLACK);

    let screens = display.events();
    let locked = screens.iter().find(|(_, s)| *s == Screen::LockedOut).unwrap().0;
    let (unlocked, last) = *screens.last().unwrap();
    assert_eq!(last, Screen::MainMenu);
    assert!(unlocked - locked > Duration::from_secs(59) - SLACK);
}

#[test]
fn change_password_over_simulated_link() {
    let mut sim = simulation(3);
    let (store, actuator) = start_custody(&mut sim);
    let keys = [setup("11111"), request(b'-', "11111"), setup("98765"), request(b'+', "11111")];
    let keypad = ScriptedKeypad::presses(keys.concat())
        .then_wait(NOTICE)
        .then_press(request(b'+', "98765"));
    let display = start_front(&mut sim, keypad);

    sim.run().unwrap();

    assert_eq!(&store.snapshot()[..5], &[9, 8, 7, 6, 5]);
    assert_eq!(store.write_count(), 10);
    assert_eq!(actuator.values().len(), 4);

    let screens = display.values();
    assert!(screens.contains(&Screen::WrongPassword));
    assert_eq!(screens.iter().filter(|s| **s == Screen::CreatePassword).count(), 2);
}

#[test]
fn keys_typed_during_lockout_are_dropped() {
    let mut sim = simulation(5);
    let (store, actuator) = start_custody(&mut sim);
    let keypad = ScriptedKeypad::presses(setup("24681"))
        .then_press(request(b'+', "99999"))
        .then_wait(NOTICE)
        .then_press(request(b'+', "99999"))
        .then_wait(NOTICE)
        .then_press(request(b'+', "99999"))
        .then_wait(Duration::from_secs(10))
        .then_press(request(b'+', "24681"));
    start_front(&mut sim, keypad);

    sim.run().unwrap();

    // Only the alarm fired; the request typed into the lockout never opened
    // the door.
    assert_eq!(actuator.values(), vec![
        CustodyOutput::Alarm(AlarmState::On),
        CustodyOutput::Alarm(AlarmState::Off),
    ]);
    assert_eq!(&store.snapshot()[..5], &[2, 4, 6, 8, 1]);
}

#[test]
fn slow_typist_is_unaffected_by_ticks() {
    let mut sim = simulation(4);
    let (_store, actuator) = start_custody(&mut sim);
    let keypad = ScriptedKeypad::presses(setup("12345"))
        .then_press([b'+', 1, 2])
        .then_wait(Duration::from_secs(30))
        .then_press([3, 4, 5])
        .then_wait(Duration::from_secs(2))
        .then_press([13]);
    start_front(&mut sim, keypad);

    sim.run().unwrap();

    assert_eq!(actuator.values().len(), 4);
}

#[test]
fn noise_keys_do_not_change_outcome() {
    for seed in 0..4 {
        let mut sim = simulation(seed);
        let (store, actuator) = start_custody(&mut sim);
        let keys = [setup("36925"), request(b'+', "36925")].concat();
        start_front(&mut sim, ScriptedKeypad::noisy(&keys, seed));

        sim.run().unwrap();

        assert_eq!(&store.snapshot()[..5], &[3, 6, 9, 2, 5], "seed {seed}");
        assert_eq!(actuator.values().len(), 4, "seed {seed}");
    }
}

//! Model-based property tests.
//!
//! These tests generate random user interactions and verify that the two
//! real state machines, wired back to back, behave exactly like the reference
//! lock model.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: Vec<Operation>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!       LockModel      RealWorld       Compare
//!      (reference)   (FrontNode +     verdicts,
//!                     CustodyNode)    counters, store
//! ```

use arbitrary::{Arbitrary, Unstructured};
use doorlock_core::{AlarmState, CustodyState, FrontState, LockConfig, Screen};
use doorlock_harness::{LockModel, ModelCredential, Operation, Outcome, Verdict, World, WorldEvent};
use doorlock_proto::Credential;
use proptest::prelude::*;

const UNLOCKING: u8 = 0x31;
const CHANGING: u8 = 0x30;
const WRONG: u8 = 0x25;

/// Small credential pool so operations hit the stored credential often.
const POOL: [[u8; 5]; 3] = [[0, 1, 2, 3, 4], [8, 8, 8, 8, 8], [4, 3, 2, 1, 0]];

/// Real system wrapper that mirrors LockModel's interface.
struct RealWorld {
    world: World,
}

impl RealWorld {
    fn new(stored: ModelCredential) -> Self {
        let credential = Credential::from_wire(stored.digits()).unwrap();
        let mut world = World::provisioned(LockConfig::default(), &credential);
        world.take_events();
        Self { world }
    }

    fn apply(&mut self, op: &Operation) -> Result<Verdict, Outcome> {
        self.world.press(&op.key_presses());
        match self.world.run_until_idle() {
            Outcome::Idle => {},
            other => return Err(other),
        }
        self.world.advance(op.idle_ticks());
        Ok(verdict(&self.world.take_events()))
    }

    fn stored(&self) -> [u8; 5] {
        let mut stored = [0; 5];
        stored.copy_from_slice(&self.world.store().snapshot()[..5]);
        stored
    }
}

/// Classify what the custody node said and did during one operation.
fn verdict(events: &[(u64, WorldEvent)]) -> Verdict {
    let replied = |byte| events.iter().any(|(_, e)| *e == WorldEvent::CustodySent(byte));

    if replied(UNLOCKING) {
        return Verdict::Opened;
    }
    if replied(CHANGING) {
        let mismatches =
            events.iter().filter(|(_, e)| *e == WorldEvent::Screen(Screen::Mismatch)).count();
        return Verdict::Changed { mismatches: mismatches as u32 };
    }
    if replied(WRONG) {
        if events.iter().any(|(_, e)| *e == WorldEvent::Alarm(AlarmState::On)) {
            return Verdict::LockedOut;
        }
        return Verdict::Wrong;
    }
    Verdict::NoEffect
}

fn credential_strategy() -> impl Strategy<Value = ModelCredential> {
    (0..POOL.len()).prop_map(|i| ModelCredential(POOL[i]))
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop_oneof![
        // Weight towards interactions that reach the custody node
        5 => credential_strategy().prop_map(|credential| Operation::OpenDoor { credential }),
        3 => (credential_strategy(), credential_strategy(), credential_strategy()).prop_map(
            |(current, new, confirm)| Operation::ChangePassword { current, new, confirm }
        ),
        1 => any::<u8>().prop_map(|code| Operation::Noise { code }),
        1 => any::<u8>().prop_map(|ticks| Operation::Idle { ticks }),
    ]
}

fn check(initial: ModelCredential, ops: &[Operation]) -> Result<(), TestCaseError> {
    let config = LockConfig::default();
    let mut model = LockModel::new(initial.digits(), config.max_attempts);
    let mut real = RealWorld::new(initial);

    for (i, op) in ops.iter().enumerate() {
        let expected = model.apply(op);
        let actual = real.apply(op);

        prop_assert_eq!(
            actual,
            Ok(expected),
            "Divergence at operation {}: {:?}\nModel: {:?}\nReal: {:?}",
            i,
            op,
            expected,
            actual
        );
        prop_assert_eq!(
            real.stored(),
            model.stored(),
            "Stored credential diverged after operation {}: {:?}",
            i,
            op
        );
        prop_assert_eq!(real.world.custody().retry_count(), model.failures());
        prop_assert_eq!(real.world.front().retry_count(), model.failures());
        prop_assert_eq!(real.world.front().state(), FrontState::MenuIdle);
        prop_assert_eq!(real.world.custody().state(), CustodyState::AwaitingRequest);
    }
    Ok(())
}

proptest! {
    /// Verify that every interaction ends the same way in the model and in
    /// the two real nodes.
    #[test]
    fn prop_real_matches_model(
        initial in credential_strategy(),
        ops in prop::collection::vec(operation_strategy(), 1..30),
    ) {
        check(initial, &ops)?;
    }

    /// Same property over operations decoded from raw bytes.
    ///
    /// Raw bytes rarely reproduce the stored credential, so this mostly
    /// exercises the rejection and lockout paths.
    #[test]
    fn prop_arbitrary_operations_match_model(
        initial in credential_strategy(),
        raw in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let mut unstructured = Unstructured::new(&raw);
        let ops: Vec<Operation> = (0..20)
            .map_while(|_| Operation::arbitrary(&mut unstructured).ok())
            .collect();
        check(initial, &ops)?;
    }

    /// A credential opens the door iff it equals the stored one, digit for
    /// digit.
    #[test]
    fn prop_only_exact_credential_opens(
        stored in prop::array::uniform5(0u8..9),
        candidate in prop::array::uniform5(0u8..9),
    ) {
        let stored = ModelCredential(stored);
        let candidate = ModelCredential(candidate);
        let mut real = RealWorld::new(stored);

        let verdict = real.apply(&Operation::OpenDoor { credential: candidate }).unwrap();
        if candidate.digits() == stored.digits() {
            prop_assert_eq!(verdict, Verdict::Opened);
        } else {
            prop_assert_eq!(verdict, Verdict::Wrong);
        }
    }

    /// Mismatched setup pairs never write the store.
    #[test]
    fn prop_mismatched_setup_never_writes(
        first in prop::array::uniform5(0u8..9),
        second in prop::array::uniform5(0u8..9),
        rounds in 1usize..4,
    ) {
        let first = ModelCredential(first).digits();
        let second = ModelCredential(second).digits();
        prop_assume!(first != second);

        let mut world = World::new(LockConfig::default());
        world.start();
        for _ in 0..rounds {
            world.enter_credential(&Credential::from_wire(first).unwrap());
            world.enter_credential(&Credential::from_wire(second).unwrap());
        }

        prop_assert_eq!(world.run_until_idle(), Outcome::Idle);
        prop_assert_eq!(world.store().write_count(), 0);
        prop_assert_eq!(world.custody().state(), CustodyState::Setup);
    }
}

#[test]
fn lockout_then_change_password() {
    let initial = ModelCredential(POOL[0]);
    let wrong = ModelCredential(POOL[1]);
    let ops = [
        Operation::OpenDoor { credential: wrong },
        Operation::OpenDoor { credential: wrong },
        Operation::ChangePassword { current: wrong, new: wrong, confirm: wrong },
        Operation::ChangePassword { current: initial, new: wrong, confirm: initial },
        Operation::OpenDoor { credential: wrong },
    ];

    let mut model = LockModel::new(initial.digits(), 3);
    let mut real = RealWorld::new(initial);
    let verdicts: Vec<Verdict> = ops.iter().map(|op| real.apply(op).unwrap()).collect();
    let expected: Vec<Verdict> = ops.iter().map(|op| model.apply(op)).collect();

    assert_eq!(verdicts, expected);
    assert_eq!(verdicts, vec![
        Verdict::Wrong,
        Verdict::Wrong,
        Verdict::LockedOut,
        Verdict::Changed { mismatches: 1 },
        Verdict::Opened,
    ]);
    assert_eq!(real.stored(), wrong.digits());
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use da_throttle::throttler::strategy::{LinearStrategy, StepStrategy};
use da_throttle::throttler::{Controller, Strategy, StrategyKind, ThrottleConfig, ThrottleParams};

const CONFIG: ThrottleConfig = ThrottleConfig {
    item_size_lower_limit: 5_000,
    item_size_upper_limit: 10_000,
    batch_size_lower_limit: 21_000,
    batch_size_upper_limit: 130_000,
};

const LOWER: u64 = 1_000_000;
const UPPER: u64 = 2_000_000;

const PENDING: [u64; 6] = [0, 1_000_000, 1_250_000, 1_500_000, 1_750_000, 3_000_000];

type Pair = (StrategyKind, ThrottleParams);

fn linear() -> Strategy {
    LinearStrategy::new(LOWER, UPPER).unwrap().into()
}

fn step() -> Strategy {
    StepStrategy::new(LOWER).into()
}

// Every pair a reader is allowed to observe, computed on a private controller
// for each strategy so the shared one never has to be inspected.
fn expected() -> Vec<Pair> {
    let mut pairs = vec![
        (StrategyKind::Linear, CONFIG.inactive_params()),
        (StrategyKind::Step, CONFIG.inactive_params()),
    ];

    for make in [linear as fn() -> Strategy, step] {
        let controller = Controller::new(make(), CONFIG);
        for pending in PENDING {
            controller.update(pending);
            pairs.push(controller.load());
        }
    }

    pairs
}

fn contains(pairs: &[Pair], got: &Pair) -> bool {
    pairs.iter().any(|pair| pair == got)
}

#[test]
fn load_never_observes_torn_snapshot() {
    let expected = expected();
    let controller = Arc::new(Controller::new(linear(), CONFIG));
    let done = AtomicBool::new(false);

    std::thread::scope(|scope| {
        for worker in 0..4 {
            let controller = Arc::clone(&controller);
            scope.spawn(move || {
                for round in 0..2_000 {
                    controller.update(PENDING[(worker + round) % PENDING.len()]);
                }
            });
        }

        let swapper = {
            let controller = Arc::clone(&controller);
            scope.spawn(move || {
                for round in 0..500 {
                    let strategy = if round % 2 == 0 { step() } else { linear() };
                    controller.set_strategy(strategy, CONFIG.inactive_params());

                    if round % 7 == 0 {
                        controller.reset();
                    }
                }
            })
        };

        let readers = (0..4)
            .map(|_| {
                let controller = Arc::clone(&controller);
                let expected = &expected;
                let done = &done;
                scope.spawn(move || {
                    while !done.load(Ordering::Relaxed) {
                        let got = controller.load();
                        assert!(contains(expected, &got), "unexpected snapshot {got:?}");
                    }
                })
            })
            .collect::<Vec<_>>();

        swapper.join().unwrap();
        done.store(true, Ordering::Relaxed);

        for reader in readers {
            reader.join().unwrap();
        }
    });

    // once every writer is done the published snapshot is a legal one too
    assert!(contains(&expected, &controller.load()));
}

#[test]
fn concurrent_updates_publish_a_computed_result() {
    let controller = Arc::new(Controller::new(linear(), CONFIG));

    std::thread::scope(|scope| {
        for pending in PENDING {
            let controller = Arc::clone(&controller);
            scope.spawn(move || {
                for _ in 0..1_000 {
                    controller.update(pending);
                }
            });
        }
    });

    let (kind, params) = controller.load();
    assert_eq!(kind, StrategyKind::Linear);

    let private = Controller::new(linear(), CONFIG);
    let candidates = PENDING
        .iter()
        .map(|pending| private.update(*pending))
        .collect::<Vec<_>>();
    assert!(candidates.contains(&params), "{params:?}");
}

#[test]
fn snapshot_matches_load() {
    let controller = Controller::new(step(), CONFIG);
    controller.update(LOWER + 1);

    let snapshot = controller.snapshot();
    assert_eq!(controller.load(), (snapshot.kind, snapshot.params));
    assert_eq!(
        snapshot.params,
        ThrottleParams {
            max_item_size: 5_000,
            max_batch_size: 21_000,
            intensity: 1.0,
        }
    );
}

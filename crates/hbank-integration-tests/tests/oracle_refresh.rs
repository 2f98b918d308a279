//! Integration test: oracle staleness as seen through the bank.
//!
//! 1. Withdrawals inside the staleness window price at the cached rate and
//!    leave the oracle untouched
//! 2. Withdrawals after the window refresh from the rate source exactly once
//! 3. Owner updates reset the window
//! 4. A configured threshold is honoured

use hbank_integration_tests::Harness;
use hbank_ledger::DeployConfig;
use hbank_oracle::{DEFAULT_RATE, STALENESS_THRESHOLD};
use hbank_types::{EventType, WEI_PER_ETHER};

#[test]
fn fresh_rate_is_not_refreshed() {
    let harness = Harness::standard().expect("deploy");
    let deployer = harness.accounts[0];
    let alice = harness.accounts[1];
    let d = &harness.deployment;

    d.oracle
        .lock()
        .expect("lock")
        .update_rate(&deployer, 40)
        .expect("owner update");
    d.bank.lock().expect("lock").deposit(alice, WEI_PER_ETHER).expect("deposit");
    harness.clock.mine_many(STALENESS_THRESHOLD);

    let receipt = d.bank.lock().expect("lock").withdraw(alice).expect("withdraw");
    assert_eq!(receipt.rate, 40, "Cached rate must be used at the threshold");
    assert!(receipt
        .events
        .iter()
        .all(|e| e.event_type != EventType::RateRefreshed));
    assert_eq!(d.oracle.lock().expect("lock").last_update_tick(), 1);
}

#[test]
fn stale_rate_refreshes_once() {
    let harness = Harness::standard().expect("deploy");
    let (alice, bob) = (harness.accounts[1], harness.accounts[2]);
    let d = &harness.deployment;

    d.bank.lock().expect("lock").deposit(alice, WEI_PER_ETHER).expect("alice");
    d.bank.lock().expect("lock").deposit(bob, WEI_PER_ETHER).expect("bob");
    harness.source.dev_set_rate(7);
    let now = harness.clock.mine_many(STALENESS_THRESHOLD + 1);

    let first = d.bank.lock().expect("lock").withdraw(alice).expect("alice out");
    let refreshes = first
        .events
        .iter()
        .filter(|e| e.event_type == EventType::RateRefreshed)
        .count();
    assert_eq!(refreshes, 1);
    assert_eq!(first.rate, 7);
    assert_eq!(d.oracle.lock().expect("lock").last_update_tick(), now);

    // Same block: the rate is fresh again.
    harness.source.dev_set_rate(DEFAULT_RATE);
    let second = d.bank.lock().expect("lock").withdraw(bob).expect("bob out");
    assert_eq!(second.rate, 7);
    assert_eq!(second.events.len(), 1);
}

#[test]
fn configured_threshold_applies() {
    let config = DeployConfig {
        staleness_threshold: 50,
        ..DeployConfig::default()
    };
    let harness = Harness::new(2, &config).expect("deploy");
    let alice = harness.accounts[1];
    let d = &harness.deployment;

    d.bank.lock().expect("lock").deposit(alice, WEI_PER_ETHER).expect("deposit");
    harness.clock.mine_many(STALENESS_THRESHOLD + 1);

    let receipt = d.bank.lock().expect("lock").withdraw(alice).expect("withdraw");
    assert_eq!(receipt.rate, 0, "Rate is still the fresh initial value");
    assert!(receipt.reward > 0, "An unset rate is priced 1:1");
    assert_eq!(harness.ham_balance(&alice).expect("ham"), receipt.reward);
    assert_eq!(
        harness.native_balance(&alice).expect("native"),
        hbank_integration_tests::STARTING_BALANCE
    );
}

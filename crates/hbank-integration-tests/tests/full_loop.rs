//! Integration test: deposit, accrue, withdraw.
//!
//! Exercises the whole bank lifecycle:
//! 1. Deploy the HAM token, the ETH/HAM oracle and the bank (10% a year)
//! 2. Hand the minter role to the bank
//! 3. Deposit 1 Ether
//! 4. Let the oracle go stale
//! 5. Withdraw and check balances, the cleared position and the refresh event
//!
//! Contracts are wired by hand in the first test and through
//! `Deployment::deploy` in the rest.

use std::sync::Arc;

use hbank_integration_tests::{Harness, STARTING_BALANCE};
use hbank_ledger::{DeployConfig, HBank, Position};
use hbank_oracle::{PriceFeedOracle, StubRateSource, PRICE_FEED, STALENESS_THRESHOLD};
use hbank_token::HamToken;
use hbank_types::{shared, Address, BlockClock, EventType, Host, NativeBalances, WEI_PER_ETHER};

#[test]
fn full_loop_wired_by_hand() {
    // =========================================================
    // Step 1: Deploy
    // =========================================================
    let clock = Arc::new(BlockClock::new(1));
    let native = shared(NativeBalances::new());
    let deployer = Address::from_index(0);
    let alice = Address::from_index(1);
    native
        .lock()
        .expect("lock")
        .credit(alice, 5 * WEI_PER_ETHER)
        .expect("fund alice");

    let token = shared(HamToken::new(Address::contract(&deployer, 0), deployer));
    let oracle = shared(PriceFeedOracle::new(
        Address::contract(&deployer, 1),
        deployer,
        clock.clone(),
        Arc::new(StubRateSource::new()),
    ));
    let mut bank = HBank::new(
        Address::contract(&deployer, 2),
        token.clone(),
        10,
        oracle.clone(),
        Host::new(clock.clone(), native.clone()),
    )
    .expect("bank deploys at 10%");

    // =========================================================
    // Step 2: Minter role to the bank
    // =========================================================
    token
        .lock()
        .expect("lock")
        .pass_minter_role(&deployer, bank.address())
        .expect("deployer is the initial minter");
    assert_eq!(token.lock().expect("lock").minter(), bank.address());

    // =========================================================
    // Step 3: Deposit 1 Ether
    // =========================================================
    bank.deposit(alice, WEI_PER_ETHER).expect("deposit");
    let after_deposit = native.lock().expect("lock").balance_of(&alice);
    assert_eq!(after_deposit, 4 * WEI_PER_ETHER);
    assert_eq!(bank.custody_balance().expect("custody"), WEI_PER_ETHER);

    // =========================================================
    // Step 4: Advance past the staleness threshold
    // =========================================================
    clock.mine_many(STALENESS_THRESHOLD + 1);

    // =========================================================
    // Step 5: Withdraw
    // =========================================================
    let receipt = bank.withdraw(alice).expect("withdraw");

    assert!(
        native.lock().expect("lock").balance_of(&alice) > after_deposit,
        "Native balance must increase on withdrawal"
    );
    let reward = token.lock().expect("lock").balance_of(&alice);
    assert!(reward > 0, "Reward token balance must be positive");
    assert_eq!(reward, receipt.reward);
    assert_eq!(bank.investor(&alice), Position::default());
    assert_eq!(bank.custody_balance().expect("custody"), 0);

    let refresh = receipt
        .events
        .iter()
        .find(|e| e.event_type == EventType::RateRefreshed)
        .expect("The stale rate read must emit a refresh");
    assert_eq!(refresh.field_str("price_feed"), Some(PRICE_FEED));
    assert_eq!(refresh.emitter, oracle.lock().expect("lock").address());
}

#[test]
fn full_loop_through_deployment() {
    let harness = Harness::standard().expect("deploy");
    let alice = harness.accounts[1];
    let bank = &harness.deployment.bank;

    bank.lock()
        .expect("lock")
        .deposit(alice, WEI_PER_ETHER)
        .expect("deposit");
    harness.clock.mine_many(STALENESS_THRESHOLD + 10);

    let receipt = bank.lock().expect("lock").withdraw(alice).expect("withdraw");

    assert_eq!(harness.native_balance(&alice).expect("native"), STARTING_BALANCE);
    assert_eq!(harness.ham_balance(&alice).expect("ham"), receipt.reward);
    assert!(receipt.reward > 0);
    assert_eq!(receipt.elapsed, STALENESS_THRESHOLD + 10);
    assert_eq!(
        receipt.events.last().map(|e| e.event_type),
        Some(EventType::Withdrawn)
    );
}

#[test]
fn withdraw_before_first_refresh_pays_reward() {
    let harness = Harness::standard().expect("deploy");
    let (alice, bob) = (harness.accounts[1], harness.accounts[2]);
    let bank = &harness.deployment.bank;

    bank.lock().expect("lock").deposit(alice, WEI_PER_ETHER).expect("alice");
    harness.clock.mine();
    bank.lock().expect("lock").deposit(bob, WEI_PER_ETHER).expect("bob");
    harness.clock.mine();

    let receipt = bank.lock().expect("lock").withdraw(alice).expect("alice out");
    assert_eq!(receipt.elapsed, 2);
    assert_eq!(receipt.rate, 0, "Oracle is still inside its first window");
    assert!(receipt.reward > 0, "Elapsed time must earn HAM");
    assert_eq!(harness.ham_balance(&alice).expect("ham"), receipt.reward);
    assert_eq!(harness.native_balance(&alice).expect("native"), STARTING_BALANCE);
}

#[test]
fn longer_holds_earn_more() {
    let harness = Harness::new(3, &DeployConfig::default()).expect("deploy");
    let (alice, bob) = (harness.accounts[1], harness.accounts[2]);
    let bank = &harness.deployment.bank;

    bank.lock().expect("lock").deposit(alice, WEI_PER_ETHER).expect("alice");
    bank.lock().expect("lock").deposit(bob, WEI_PER_ETHER).expect("bob");

    harness.clock.mine_many(10);
    let short = bank.lock().expect("lock").withdraw(alice).expect("alice out");
    harness.clock.mine_many(90);
    let long = bank.lock().expect("lock").withdraw(bob).expect("bob out");

    assert!(long.reward > short.reward);
    assert_eq!(harness.ham_balance(&bob).expect("ham"), long.reward);
    let supply = harness.deployment.token.lock().expect("lock").total_supply();
    assert_eq!(supply, short.reward + long.reward);
}

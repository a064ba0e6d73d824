#![allow(dead_code)]

extern crate std;

use crate::types::{ClaimState, GlobalTotals, ParticipantRecord};

/// INV-1: Entitlements never exceed the offering supply.
pub fn assert_offering_within_supply(entitlements: &[i128], offering_amount: i128) {
    let mut sum = 0i128;
    for amount in entitlements {
        assert!(*amount >= 0, "INV-1 violated: negative entitlement {}", amount);
        sum += amount;
    }
    assert!(
        sum <= offering_amount,
        "INV-1 violated: entitlements {} exceed supply {}",
        sum,
        offering_amount
    );
}

/// INV-2: A refund plus the retained stake is exactly the deposit.
pub fn assert_refund_conserves(deposit: i128, refund: i128, retained: i128) {
    assert_eq!(
        refund + retained,
        deposit,
        "INV-2 violated: refund {} + retained {} != deposit {}",
        refund,
        retained,
        deposit
    );
}

/// INV-3: Deposit invariant: after a deposit of `amount`, the total
/// increases by exactly `amount`.
pub fn assert_deposit_invariant(total_before: i128, total_after: i128, amount: i128) {
    assert_eq!(
        total_after,
        total_before + amount,
        "INV-3 violated: deposit invariant broken: {} + {} != {}",
        total_before,
        amount,
        total_after
    );
}

/// INV-4: Claim state only moves forward.
///   Periodic: no claimed bit is ever cleared.
///   Linear:   harvested amount never decreases; the split never changes once made.
pub fn assert_claims_monotonic(before: &ParticipantRecord, after: &ParticipantRecord) {
    assert_eq!(before.deposit, after.deposit, "INV-4 violated: deposit changed");
    assert!(
        !before.refunded || after.refunded,
        "INV-4 violated: refunded flag cleared"
    );
    match (&before.claims, &after.claims) {
        (ClaimState::Periodic(old), ClaimState::Periodic(new)) => {
            assert_eq!(old & new, *old, "INV-4 violated: claimed period cleared");
        }
        (ClaimState::Linear(old), ClaimState::Linear(new)) => {
            assert!(
                new.amount_harvested >= old.amount_harvested,
                "INV-4 violated: harvested {} dropped to {}",
                old.amount_harvested,
                new.amount_harvested
            );
            if old.has_harvested_initial {
                assert_eq!(old.initial_amount, new.initial_amount);
                assert_eq!(old.vested_amount, new.vested_amount);
            }
        }
        _ => panic!("INV-4 violated: claim discipline changed"),
    }
}

/// INV-5: Once every participant has harvested after vesting end, no debt remains.
pub fn assert_reconciled(totals: &GlobalTotals) {
    assert_eq!(
        totals.total_debt, 0,
        "INV-5 violated: {} offering still owed as vesting debt",
        totals.total_debt
    );
}

/// INV-6: Payouts never exceed what entered custody.
pub fn assert_payouts_bounded(totals: &GlobalTotals, offering_amount: i128) {
    assert!(
        totals.offering_harvested <= offering_amount,
        "INV-6 violated: harvested {} > supply {}",
        totals.offering_harvested,
        offering_amount
    );
    assert!(
        totals.stake_refunded <= totals.total_deposited,
        "INV-6 violated: refunded {} > deposited {}",
        totals.stake_refunded,
        totals.total_deposited
    );
}

use offering_sale::allocation::Pool;
use offering_sale::schedule::{entitled_at, harvest_linear, split};
use offering_sale::{ClaimState, Error, LinearVesting, ParticipantRecord, VestingState};
use proptest::collection::vec as pvec;
use proptest::prelude::*;

const END_TIME: u64 = 1_000;

fn pool_of(deposits: &[i128], raising_amount: i128, offering_amount: i128) -> Pool {
    Pool {
        total_deposited: deposits.iter().sum(),
        raising_amount,
        offering_amount,
    }
}

fn linear_record(deposit: i128) -> ParticipantRecord {
    ParticipantRecord {
        deposit,
        refunded: false,
        claims: ClaimState::Linear(VestingState::default()),
    }
}

proptest! {
    #[test]
    fn entitlements_never_exceed_supply(
        deposits in pvec(1i128..=1_000_000_000_000, 1..20),
        raising_amount in 1i128..=10_000_000_000_000,
        offering_amount in 1i128..=1_000_000_000_000_000_000,
    ) {
        let pool = pool_of(&deposits, raising_amount, offering_amount);
        let mut total = 0i128;
        for deposit in &deposits {
            let owed = pool.offering_amount(*deposit).unwrap();
            prop_assert!(owed >= 0);
            total += owed;
        }
        prop_assert!(total <= offering_amount);
    }

    #[test]
    fn refunds_conserve_each_deposit(
        deposits in pvec(1i128..=1_000_000_000_000, 1..20),
        raising_amount in 1i128..=10_000_000_000_000,
    ) {
        let pool = pool_of(&deposits, raising_amount, 1_000);
        let mut retained_sum = 0i128;
        for deposit in &deposits {
            let refund = pool.refunding_amount(*deposit).unwrap();
            let retained = pool.retained_stake(*deposit).unwrap();
            prop_assert!(refund >= 0);
            prop_assert!(retained >= 0);
            prop_assert_eq!(refund + retained, *deposit);
            if !pool.is_oversubscribed() {
                prop_assert_eq!(refund, 0);
            }
            retained_sum += retained;
        }
        prop_assert!(retained_sum <= pool.total_deposited.min(raising_amount));
    }

    #[test]
    fn pooled_bounds_hold_for_any_unsettled_subset(
        deposits in pvec(1i128..=1_000_000_000_000, 1..20),
        settled in pvec(any::<bool>(), 20),
        raising_amount in 1i128..=10_000_000_000_000,
        offering_amount in 1i128..=1_000_000_000_000_000_000,
    ) {
        let pool = pool_of(&deposits, raising_amount, offering_amount);
        let mut unsettled_deposits = 0i128;
        let mut holders = 0u32;
        let mut retained = 0i128;
        let mut owed = 0i128;
        for (deposit, is_settled) in deposits.iter().zip(&settled) {
            if *is_settled {
                continue;
            }
            unsettled_deposits += deposit;
            holders += 1;
            retained += pool.retained_stake(*deposit).unwrap();
            owed += pool.offering_amount(*deposit).unwrap();
        }
        let floor = pool.pooled_retained_stake(unsettled_deposits, holders).unwrap();
        prop_assert!(floor <= retained);
        prop_assert!(floor + i128::from(holders) >= retained);
        prop_assert!(pool.pooled_offering_amount(unsettled_deposits).unwrap() >= owed);
    }

    #[test]
    fn vesting_is_monotonic_and_completes(
        entitlement in 0i128..=1_000_000_000_000_000,
        initial_unlock_bps in 0u32..=10_000,
        duration in 1u64..=1_000_000,
        mut times in pvec(END_TIME..=END_TIME + 2_000_000, 1..12),
    ) {
        let vesting = LinearVesting {
            vesting_end: END_TIME + duration,
            initial_unlock_bps,
        };
        let parts = split(&vesting, entitlement).unwrap();
        prop_assert_eq!(parts.initial + parts.vested, entitlement);
        let state = VestingState {
            has_harvested_initial: true,
            initial_amount: parts.initial,
            vested_amount: parts.vested,
            amount_harvested: 0,
        };

        times.sort_unstable();
        let mut previous = entitled_at(&vesting, END_TIME, &state, END_TIME).unwrap();
        prop_assert_eq!(previous, parts.initial);
        for now in &times {
            let released = entitled_at(&vesting, END_TIME, &state, *now).unwrap();
            prop_assert!(released >= previous);
            prop_assert!(released <= entitlement);
            previous = released;
        }
        let at_end = entitled_at(&vesting, END_TIME, &state, vesting.vesting_end).unwrap();
        prop_assert_eq!(at_end, entitlement);
    }

    #[test]
    fn harvesting_to_the_end_retires_all_debt(
        entitlement in 1i128..=1_000_000_000_000_000,
        initial_unlock_bps in 0u32..=10_000,
        duration in 1u64..=1_000_000,
        mut times in pvec(END_TIME..=END_TIME + 1_000_000, 0..12),
    ) {
        let vesting = LinearVesting {
            vesting_end: END_TIME + duration,
            initial_unlock_bps,
        };
        times.sort_unstable();
        times.push(vesting.vesting_end);

        let mut record = linear_record(1);
        let mut paid = 0i128;
        let mut debt = 0i128;
        for now in &times {
            match harvest_linear(&vesting, END_TIME, &mut record, entitlement, 0, *now) {
                Ok(claim) => {
                    paid += claim.offering;
                    debt += claim.debt_added - claim.debt_released;
                    prop_assert!(debt >= 0);
                }
                Err(Error::NothingToHarvest) => {}
                Err(other) => prop_assert!(false, "unexpected error {:?}", other),
            }
        }
        prop_assert_eq!(paid, entitlement);
        prop_assert_eq!(debt, 0);
    }
}

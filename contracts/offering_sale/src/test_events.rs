extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events, Ledger},
    token, vec, Address, Env, IntoVal, Symbol, TryIntoVal, Val,
};

use crate::events::{Deposited, Finalized, Harvested, Refunded, SaleInitialized, LINEAR_PERIOD};
use crate::schedule::evenly_spaced;
use crate::{HarvestSchedule, LinearVesting, OfferingSale, OfferingSaleClient};

const START: u64 = 1_100;
const END: u64 = 1_200;

fn setup() -> (Env, OfferingSaleClient<'static>) {
    let env = Env::default();
    env.mock_all_auths();
    env.ledger().set_timestamp(1_000);
    let contract_id = env.register(OfferingSale, ());
    let client = OfferingSaleClient::new(&env, &contract_id);
    (env, client)
}

fn create_token<'a>(env: &Env, admin: &Address) -> token::Client<'a> {
    let addr = env.register_stellar_asset_contract_v2(admin.clone());
    token::Client::new(env, &addr.address())
}

/// Start a sale of 1000 offering units for a 100 unit target and fund it.
fn start_sale(
    env: &Env,
    client: &OfferingSaleClient,
    schedule: HarvestSchedule,
) -> (Address, token::Client<'static>, token::Client<'static>) {
    let operator = Address::generate(env);
    let token_admin = Address::generate(env);
    let stake = create_token(env, &token_admin);
    let offering = create_token(env, &token_admin);
    client.initialize(
        &operator,
        &stake.address,
        &offering.address,
        &START,
        &END,
        &1_000,
        &100,
        &schedule,
    );
    token::StellarAssetClient::new(env, &offering.address).mint(&client.address, &1_000);
    (operator, stake, offering)
}

fn funded_participant(env: &Env, stake: &token::Client, amount: i128) -> Address {
    let participant = Address::generate(env);
    token::StellarAssetClient::new(env, &stake.address).mint(&participant, &amount);
    participant
}

/// Events published by the sale contract itself, skipping token transfers.
fn sale_events(env: &Env, client: &OfferingSaleClient) -> std::vec::Vec<(soroban_sdk::Vec<Val>, Val)> {
    env.events()
        .all()
        .iter()
        .filter(|(contract, _, _)| *contract == client.address)
        .map(|(_, topics, data)| (topics, data))
        .collect()
}

#[test]
fn test_sale_initialized_event() {
    let (env, client) = setup();
    let schedule = HarvestSchedule::Periodic(evenly_spaced(&env, END, 100, 2));
    let operator = Address::generate(&env);
    let stake = Address::generate(&env);
    let offering = Address::generate(&env);
    client.initialize(
        &operator, &stake, &offering, &START, &END, &1_000, &100, &schedule,
    );

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("init"),)
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![&env, symbol_short!("init").into_val(&env)];
    assert_eq!(last_event.1, expected_topics);

    let event_data: SaleInitialized = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        SaleInitialized {
            operator,
            stake_asset: stake,
            offering_asset: offering,
            start_time: START,
            end_time: END,
            offering_amount: 1_000,
            raising_amount: 100,
        }
    );
}

#[test]
fn test_deposited_event() {
    let (env, client) = setup();
    let schedule = HarvestSchedule::Periodic(evenly_spaced(&env, END, 100, 2));
    let (_, stake, _) = start_sale(&env, &client, schedule);
    let alice = funded_participant(&env, &stake, 100);
    let bob = funded_participant(&env, &stake, 100);

    env.ledger().set_timestamp(START);
    client.deposit(&alice, &30);
    client.deposit(&bob, &45);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("deposit"), participant)
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![
        &env,
        symbol_short!("deposit").into_val(&env),
        bob.into_val(&env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: Deposited = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        Deposited {
            participant: bob.clone(),
            amount: 45,
            total_deposited: 75,
        }
    );
}

#[test]
fn test_refund_precedes_first_harvest_event() {
    let (env, client) = setup();
    let schedule = HarvestSchedule::Periodic(evenly_spaced(&env, END, 100, 2));
    let (_, stake, _) = start_sale(&env, &client, schedule);
    let alice = funded_participant(&env, &stake, 200);

    env.ledger().set_timestamp(START);
    client.deposit(&alice, &200);
    env.ledger().set_timestamp(END);
    client.harvest_period(&alice, &0);

    let events = sale_events(&env, &client);
    let (refund_topics, refund_data) = &events[events.len() - 2];
    let (harvest_topics, harvest_data) = &events[events.len() - 1];

    assert_eq!(
        *refund_topics,
        vec![
            &env,
            symbol_short!("refund").into_val(&env),
            alice.into_val(&env),
        ]
    );
    let refund: Refunded = refund_data.try_into_val(&env).unwrap();
    assert_eq!(
        refund,
        Refunded {
            participant: alice.clone(),
            amount: 100,
        }
    );

    let topic: Symbol = harvest_topics.get(0).unwrap().try_into_val(&env).unwrap();
    assert_eq!(topic, symbol_short!("harvest"));
    let harvest: Harvested = harvest_data.try_into_val(&env).unwrap();
    assert_eq!(
        harvest,
        Harvested {
            participant: alice.clone(),
            period: 0,
            amount: 500,
        }
    );

    // Second checkpoint: no refund left to pay.
    env.ledger().set_timestamp(END + 100);
    client.harvest_period(&alice, &1);
    let events = sale_events(&env, &client);
    let topic_of = |index: usize| -> Symbol {
        events[index].0.get(0).unwrap().try_into_val(&env).unwrap()
    };
    let last = events.len() - 1;
    assert_eq!(topic_of(last), symbol_short!("harvest"));
    assert!(last == 0 || topic_of(last - 1) != symbol_short!("refund"));
}

#[test]
fn test_linear_harvest_event_carries_sentinel_period() {
    let (env, client) = setup();
    let schedule = HarvestSchedule::Linear(LinearVesting {
        vesting_end: END + 1_000,
        initial_unlock_bps: 2_500,
    });
    let (_, stake, _) = start_sale(&env, &client, schedule);
    let alice = funded_participant(&env, &stake, 100);

    env.ledger().set_timestamp(START);
    client.deposit(&alice, &100);
    env.ledger().set_timestamp(END);
    client.harvest(&alice);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");
    let event_data: Harvested = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        Harvested {
            participant: alice,
            period: LINEAR_PERIOD,
            amount: 250,
        }
    );
}

#[test]
fn test_finalized_event() {
    let (env, client) = setup();
    let schedule = HarvestSchedule::Periodic(evenly_spaced(&env, END, 100, 2));
    let (operator, stake, _) = start_sale(&env, &client, schedule);
    let alice = funded_participant(&env, &stake, 40);

    env.ledger().set_timestamp(START);
    client.deposit(&alice, &40);
    env.ledger().set_timestamp(END + 100);
    client.finalize(&operator, &None, &None);

    let all_events = env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("final"),)
    assert_eq!(last_event.0, client.address);
    let expected_topics = vec![&env, symbol_short!("final").into_val(&env)];
    assert_eq!(last_event.1, expected_topics);

    let event_data: Finalized = last_event.2.try_into_val(&env).unwrap();
    assert_eq!(
        event_data,
        Finalized {
            operator,
            stake_amount: 40,
            offering_amount: 600,
        }
    );
}

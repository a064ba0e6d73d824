//! # Custody
//!
//! The only place assets move. Balances live in the stake and offering token
//! contracts; the sale keeps accounting numbers and asks the token contracts
//! to move funds in or out of its own address. A failed transfer traps the
//! invocation, which reverts every storage write made before it.

use soroban_sdk::{token, Address, Env};

/// Pull `amount` of `asset` from `from` into the sale.
pub fn collect(env: &Env, asset: &Address, from: &Address, amount: i128) {
    if amount <= 0 {
        return;
    }
    token::Client::new(env, asset).transfer(from, &env.current_contract_address(), &amount);
}

/// Send `amount` of `asset` from the sale to `to`.
pub fn pay(env: &Env, asset: &Address, to: &Address, amount: i128) {
    if amount <= 0 {
        return;
    }
    token::Client::new(env, asset).transfer(&env.current_contract_address(), to, &amount);
}

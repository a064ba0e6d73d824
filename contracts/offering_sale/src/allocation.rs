//! # Allocation
//!
//! Pure pro-rata arithmetic. Nothing here touches storage or the clock, so
//! every function is safe to call in any phase and returns zero when nothing
//! has been deposited yet.
//!
//! All division truncates. The dust this leaves behind is bounded by one unit
//! of [`ALLOCATION_SCALE`] per participant and is recovered by the final sweep.
//! Changing the rounding direction changes who absorbs the dust.

use crate::Error;

/// Fixed-point scale for allocation shares. A share of `ALLOCATION_SCALE`
/// means the whole pool; a participant holding one millionth of the pool
/// still gets a share of `1_000_000`.
pub const ALLOCATION_SCALE: i128 = 1_000_000_000_000;

/// The global quantities every allocation depends on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Pool {
    pub total_deposited: i128,
    pub raising_amount: i128,
    pub offering_amount: i128,
}

impl Pool {
    /// `true` when deposits exceed the fundraising target.
    pub fn is_oversubscribed(&self) -> bool {
        self.total_deposited > self.raising_amount
    }

    /// Share of the pool held by `deposit`, scaled by [`ALLOCATION_SCALE`].
    pub fn user_allocation(&self, deposit: i128) -> Result<i128, Error> {
        if self.total_deposited <= 0 {
            return Ok(0);
        }
        mul_div(deposit, ALLOCATION_SCALE, self.total_deposited)
    }

    /// Offering units owed to a participant who deposited `deposit`.
    ///
    /// Under-subscribed sales fill at the fixed rate
    /// `offering_amount / raising_amount`. Over-subscribed sales split the
    /// whole offering by allocation share.
    pub fn offering_amount(&self, deposit: i128) -> Result<i128, Error> {
        if self.total_deposited <= 0 || deposit <= 0 {
            return Ok(0);
        }
        if self.is_oversubscribed() {
            let allocation = self.user_allocation(deposit)?;
            mul_div(allocation, self.offering_amount, ALLOCATION_SCALE)
        } else {
            mul_div(deposit, self.offering_amount, self.raising_amount)
        }
    }

    /// Stake returned to a participant who deposited `deposit`: the part of
    /// the deposit above its pro-rata claim on the fundraising target.
    pub fn refunding_amount(&self, deposit: i128) -> Result<i128, Error> {
        if !self.is_oversubscribed() || deposit <= 0 {
            return Ok(0);
        }
        let retained = mul_div(deposit, self.raising_amount, self.total_deposited)?;
        deposit
            .checked_sub(retained)
            .ok_or(Error::ArithmeticOverflow)
    }

    /// Stake kept by the sale from a participant who deposited `deposit`.
    pub fn retained_stake(&self, deposit: i128) -> Result<i128, Error> {
        deposit
            .checked_sub(self.refunding_amount(deposit)?)
            .ok_or(Error::ArithmeticOverflow)
    }

    /// Lower bound on the stake retained from `holders` participants whose
    /// deposits sum to `deposits`. Each retained share truncates by less than
    /// one unit, so the sum of shares trails the pooled share by at most
    /// `holders - 1`.
    pub fn pooled_retained_stake(&self, deposits: i128, holders: u32) -> Result<i128, Error> {
        if holders == 0 || deposits <= 0 {
            return Ok(0);
        }
        let pooled = self.retained_stake(deposits)?;
        if !self.is_oversubscribed() {
            return Ok(pooled);
        }
        Ok((pooled - i128::from(holders - 1)).max(0))
    }

    /// Upper bound on the offering owed to participants whose deposits sum
    /// to `deposits`. Truncation only ever rounds individual shares down.
    pub fn pooled_offering_amount(&self, deposits: i128) -> Result<i128, Error> {
        self.offering_amount(deposits)
    }
}

/// `a * b / c`, truncating, with overflow reported instead of wrapping.
pub fn mul_div(a: i128, b: i128, c: i128) -> Result<i128, Error> {
    if c == 0 {
        return Err(Error::InvariantViolation);
    }
    a.checked_mul(b)
        .map(|product| product / c)
        .ok_or(Error::ArithmeticOverflow)
}

//! `CashManager`: Decimal cash balance with reservations and audit log.
//!
//! Near-1:1 grounded in `original_source/itrader/portfolio_handler/cash_manager.py`:
//! the `RLock`-guarded balance/reserved pair, the `CashOperation` audit
//! record shape, the `min_balance`/`max_balance`/`precision` constants, and
//! `validate_balance_consistency` as a non-raising self-check that logs
//! rather than panics.

use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::ReentrantMutex;
use rust_decimal::{Decimal, RoundingStrategy};
use std::cell::RefCell;
use tracing::{error, info};

use crate::core::errors::CashError;

const MIN_BALANCE: Decimal = Decimal::ZERO;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashOperationType {
    Deposit,
    Withdrawal,
    TransactionDebit,
    TransactionCredit,
    Reservation,
    ReleaseReservation,
}

#[derive(Debug, Clone)]
pub struct CashOperation {
    pub operation_id: String,
    pub operation_type: CashOperationType,
    pub amount: Decimal,
    pub timestamp: i64,
    pub description: String,
    pub reference_id: Option<String>,
    pub balance_before: Decimal,
    pub balance_after: Decimal,
}

struct State {
    balance: Decimal,
    reserved: Decimal,
    operations: Vec<CashOperation>,
    operation_counter: u64,
    max_balance: Decimal,
}

/// Thread-safe cash ledger; all mutators acquire the same re-entrant lock,
/// append an audit record, and enforce `balance >= 0 ∧ reserved >= 0 ∧
/// reserved <= balance` before returning.
pub struct CashManager {
    state: ReentrantMutex<RefCell<State>>,
    portfolio_id: u64,
}

impl CashManager {
    pub fn new(portfolio_id: u64, initial_cash: Decimal, max_balance: Decimal) -> Self {
        let balance = quantize(initial_cash);
        Self {
            state: ReentrantMutex::new(RefCell::new(State {
                balance,
                reserved: Decimal::ZERO,
                operations: Vec::new(),
                operation_counter: 0,
                max_balance,
            })),
            portfolio_id,
        }
    }

    pub fn balance(&self) -> Decimal {
        self.state.lock().borrow().balance
    }

    pub fn reserved_balance(&self) -> Decimal {
        self.state.lock().borrow().reserved
    }

    pub fn available_balance(&self) -> Decimal {
        let s = self.state.lock();
        let s = s.borrow();
        s.balance - s.reserved
    }

    pub fn deposit(
        &self,
        amount: Decimal,
        description: &str,
        reference_id: Option<String>,
    ) -> Result<(), CashError> {
        let amount = self.validate_and_convert_amount(amount)?;
        let guard = self.state.lock();
        let mut s = guard.borrow_mut();
        let before = s.balance;
        let after = before + amount;
        if after > s.max_balance {
            return Err(CashError::InvalidTransaction {
                reason: format!("deposit would exceed max balance {}", s.max_balance),
            });
        }
        s.balance = after;
        self.record(&mut s, CashOperationType::Deposit, amount, description, reference_id, before, after);
        info!(portfolio_id = self.portfolio_id, %amount, "cash deposited");
        Ok(())
    }

    pub fn withdraw(
        &self,
        amount: Decimal,
        description: &str,
        reference_id: Option<String>,
    ) -> Result<(), CashError> {
        let amount = self.validate_and_convert_amount(amount)?;
        let guard = self.state.lock();
        let mut s = guard.borrow_mut();
        let available = s.balance - s.reserved;
        if available < amount {
            return Err(CashError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        let before = s.balance;
        let after = before - amount;
        if after < MIN_BALANCE {
            return Err(CashError::InvalidTransaction {
                reason: "withdrawal would breach minimum balance".to_string(),
            });
        }
        s.balance = after;
        self.record(&mut s, CashOperationType::Withdrawal, amount, description, reference_id, before, after);
        info!(portfolio_id = self.portfolio_id, %amount, "cash withdrawn");
        Ok(())
    }

    /// `processTransactionCashFlow(amount, isDebit, desc, txnId)`.
    pub fn process_transaction_cash_flow(
        &self,
        amount: Decimal,
        is_debit: bool,
        description: &str,
        transaction_id: impl Into<String>,
    ) -> Result<(), CashError> {
        let amount = self.validate_and_convert_amount(amount)?;
        let guard = self.state.lock();
        let mut s = guard.borrow_mut();
        let before = s.balance;
        let after = if is_debit {
            let available = s.balance - s.reserved;
            if available < amount {
                return Err(CashError::InsufficientFunds {
                    required: amount,
                    available,
                });
            }
            before - amount
        } else {
            before + amount
        };
        s.balance = after;
        let op_type = if is_debit {
            CashOperationType::TransactionDebit
        } else {
            CashOperationType::TransactionCredit
        };
        self.record(&mut s, op_type, amount, description, Some(transaction_id.into()), before, after);
        Ok(())
    }

    /// Reservations only move `reserved`, never `balance`.
    pub fn reserve_cash(
        &self,
        amount: Decimal,
        description: &str,
        reference_id: Option<String>,
    ) -> Result<(), CashError> {
        let amount = self.validate_and_convert_amount(amount)?;
        let guard = self.state.lock();
        let mut s = guard.borrow_mut();
        let available = s.balance - s.reserved;
        if available < amount {
            return Err(CashError::InsufficientFunds {
                required: amount,
                available,
            });
        }
        let before = s.balance;
        s.reserved += amount;
        self.record(&mut s, CashOperationType::Reservation, amount, description, reference_id, before, before);
        Ok(())
    }

    pub fn release_cash_reservation(
        &self,
        amount: Decimal,
        description: &str,
        reference_id: Option<String>,
    ) -> Result<(), CashError> {
        let amount = self.validate_and_convert_amount(amount)?;
        let guard = self.state.lock();
        let mut s = guard.borrow_mut();
        if amount > s.reserved {
            return Err(CashError::InvalidTransaction {
                reason: "release exceeds reserved amount".to_string(),
            });
        }
        let before = s.balance;
        s.reserved -= amount;
        self.record(
            &mut s,
            CashOperationType::ReleaseReservation,
            amount,
            description,
            reference_id,
            before,
            before,
        );
        Ok(())
    }

    /// Read-side audit accessor, supplemented from the original's
    /// `get_cash_operations(limit, operation_type)`.
    pub fn cash_operations(
        &self,
        limit: Option<usize>,
        operation_type: Option<CashOperationType>,
    ) -> Vec<CashOperation> {
        let s = self.state.lock();
        let s = s.borrow();
        let mut ops: Vec<CashOperation> = s
            .operations
            .iter()
            .filter(|op| operation_type.is_none_or(|t| op.operation_type == t))
            .cloned()
            .collect();
        if let Some(limit) = limit {
            ops.truncate(limit);
        }
        ops
    }

    /// Non-raising invariant check; logs at `error` on violation rather than
    /// panicking, matching the original's `validate_balance_consistency`.
    pub fn validate_balance_consistency(&self) -> bool {
        let s = self.state.lock();
        let s = s.borrow();
        let ok = s.balance >= Decimal::ZERO && s.reserved >= Decimal::ZERO && s.reserved <= s.balance;
        if !ok {
            error!(
                portfolio_id = self.portfolio_id,
                balance = %s.balance,
                reserved = %s.reserved,
                "cash manager invariant violated"
            );
        }
        ok
    }

    fn validate_and_convert_amount(&self, amount: Decimal) -> Result<Decimal, CashError> {
        let quantized = quantize(amount);
        if quantized <= Decimal::ZERO {
            return Err(CashError::InvalidTransaction {
                reason: "amount must be positive".to_string(),
            });
        }
        Ok(quantized)
    }

    fn record(
        &self,
        s: &mut State,
        operation_type: CashOperationType,
        amount: Decimal,
        description: &str,
        reference_id: Option<String>,
        balance_before: Decimal,
        balance_after: Decimal,
    ) {
        s.operation_counter += 1;
        let operation_id = format!("cash_op_{}_{}", s.operation_counter, now_millis());
        s.operations.push(CashOperation {
            operation_id,
            operation_type,
            amount,
            timestamp: now_millis(),
            description: description.to_string(),
            reference_id,
            balance_before,
            balance_after,
        });
    }
}

fn quantize(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn manager() -> CashManager {
        CashManager::new(1, dec!(10_000), dec!(10_000_000))
    }

    #[test]
    fn deposit_then_withdraw_round_trips_balance() {
        let cm = manager();
        cm.deposit(dec!(500), "test", None).unwrap();
        cm.withdraw(dec!(500), "test", None).unwrap();
        assert_eq!(cm.balance(), dec!(10_000));
    }

    #[test]
    fn withdraw_more_than_available_fails() {
        let cm = manager();
        let err = cm.withdraw(dec!(10_001), "test", None).unwrap_err();
        assert!(matches!(err, CashError::InsufficientFunds { .. }));
    }

    #[test]
    fn reserve_then_release_restores_available_balance() {
        let cm = manager();
        let available_before = cm.available_balance();
        cm.reserve_cash(dec!(1_000), "hold", None).unwrap();
        assert_eq!(cm.reserved_balance(), dec!(1_000));
        assert_eq!(cm.available_balance(), available_before - dec!(1_000));
        cm.release_cash_reservation(dec!(1_000), "release", None).unwrap();
        assert_eq!(cm.reserved_balance(), Decimal::ZERO);
        assert_eq!(cm.available_balance(), available_before);
    }

    #[test]
    fn release_more_than_reserved_fails() {
        let cm = manager();
        cm.reserve_cash(dec!(100), "hold", None).unwrap();
        let err = cm.release_cash_reservation(dec!(200), "x", None).unwrap_err();
        assert!(matches!(err, CashError::InvalidTransaction { .. }));
    }

    #[test]
    fn buying_exactly_available_cash_succeeds_one_cent_more_fails() {
        let cm = CashManager::new(1, dec!(100.00), dec!(10_000_000));
        cm.process_transaction_cash_flow(dec!(100.00), true, "buy", "t1")
            .unwrap();
        assert_eq!(cm.balance(), Decimal::ZERO);

        let cm2 = CashManager::new(1, dec!(100.00), dec!(10_000_000));
        let err = cm2
            .process_transaction_cash_flow(dec!(100.01), true, "buy", "t2")
            .unwrap_err();
        assert!(matches!(err, CashError::InsufficientFunds { .. }));
    }

    #[test]
    fn deposit_over_max_balance_rejected() {
        let cm = CashManager::new(1, dec!(0), dec!(100));
        let err = cm.deposit(dec!(200), "too much", None).unwrap_err();
        assert!(matches!(err, CashError::InvalidTransaction { .. }));
    }

    #[test]
    fn consistency_check_passes_for_well_formed_state() {
        let cm = manager();
        cm.reserve_cash(dec!(500), "hold", None).unwrap();
        assert!(cm.validate_balance_consistency());
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let cm = manager();
        assert!(cm.deposit(dec!(0), "x", None).is_err());
        assert!(cm.deposit(dec!(-10), "x", None).is_err());
    }

    #[test]
    fn cash_operations_filter_by_type() {
        let cm = manager();
        cm.deposit(dec!(10), "a", None).unwrap();
        cm.withdraw(dec!(5), "b", None).unwrap();
        let deposits = cm.cash_operations(None, Some(CashOperationType::Deposit));
        assert_eq!(deposits.len(), 1);
    }
}

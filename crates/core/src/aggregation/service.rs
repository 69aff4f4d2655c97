//! Aggregation service.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use cofre_shared::types::{Money, MoneyError, UserId};
use rust_decimal::prelude::*;

use super::types::{CashFlowPoint, CategoryTotal, EndingAccount, MonthlySummary};
use crate::calendar::MonthPeriod;
use crate::ledger::{Transaction, Wallet};
use crate::obligation::{Flow, ParentRef};

/// Stateless read-side computations over wallets and transactions.
///
/// Nothing here mutates or caches: every figure is recomputed from the
/// transaction set it is given.
pub struct AggregationService;

impl AggregationService {
    /// `initial_balance + received income - paid expenses` routed to `wallet`.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` if the balance does not fit in cents.
    pub fn wallet_balance(
        wallet: &Wallet,
        transactions: &[Transaction],
    ) -> Result<Money, MoneyError> {
        let net = Money::checked_sum(
            transactions
                .iter()
                .filter(|tx| tx.wallet_id == wallet.id)
                .map(Transaction::balance_effect),
        )?;
        wallet.initial_balance.checked_add(net)
    }

    /// `sum(initial balances) + all received income - all paid expenses` of a user.
    ///
    /// Agrees with summing [`wallet_balance`](Self::wallet_balance) over the
    /// user's wallets as long as the user's transactions settle against the
    /// user's wallets.
    ///
    /// # Errors
    ///
    /// Returns `Overflow` if the balance does not fit in cents.
    pub fn total_balance(
        owner: UserId,
        wallets: &[Wallet],
        transactions: &[Transaction],
    ) -> Result<Money, MoneyError> {
        let initial = Money::checked_sum(
            wallets
                .iter()
                .filter(|w| w.owner_id == owner)
                .map(|w| w.initial_balance),
        )?;
        let received = Money::checked_sum(
            Self::settled_in(owner, transactions, Flow::Income, None).map(|tx| tx.amount),
        )?;
        let paid = Money::checked_sum(
            Self::settled_in(owner, transactions, Flow::Expense, None).map(|tx| tx.amount),
        )?;
        initial.checked_add(received)?.checked_sub(paid)
    }

    /// Paid expenses with `paid_at` in `period`.
    #[must_use]
    pub fn monthly_expenses(
        owner: UserId,
        transactions: &[Transaction],
        period: MonthPeriod,
    ) -> Money {
        Self::settled_total(owner, transactions, Flow::Expense, Some(period))
    }

    /// Received income with `received_at` in `period`.
    #[must_use]
    pub fn monthly_income(
        owner: UserId,
        transactions: &[Transaction],
        period: MonthPeriod,
    ) -> Money {
        Self::settled_total(owner, transactions, Flow::Income, Some(period))
    }

    /// Percentage change from `previous` to `current`, one decimal place.
    ///
    /// A zero `previous` yields 0, never an error or infinity.
    #[must_use]
    pub fn percentage_change(current: Money, previous: Money) -> Decimal {
        if previous.is_zero() {
            return Decimal::ZERO;
        }

        let delta = Decimal::from(current.cents()) - Decimal::from(previous.cents());
        let base = Decimal::from(previous.cents()).abs();
        (delta * Decimal::ONE_HUNDRED / base)
            .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
    }

    /// `months` trailing monthly totals ending at the month of `today`, oldest first.
    #[must_use]
    pub fn cashflow_series(
        owner: UserId,
        transactions: &[Transaction],
        today: NaiveDate,
        months: u32,
    ) -> Vec<CashFlowPoint> {
        MonthPeriod::of(today)
            .trailing(months)
            .into_iter()
            .map(|period| {
                let expenses = Self::monthly_expenses(owner, transactions, period);
                let income = Self::monthly_income(owner, transactions, period);
                CashFlowPoint {
                    period,
                    expenses,
                    income,
                    net: income - expenses,
                }
            })
            .collect()
    }

    /// Accounts whose final installment falls due this month and is still
    /// pending or was paid this month.
    #[must_use]
    pub fn accounts_ending_this_month(
        owner: UserId,
        transactions: &[Transaction],
        today: NaiveDate,
    ) -> Vec<EndingAccount> {
        let month = MonthPeriod::of(today);
        let mut ending: Vec<EndingAccount> = transactions
            .iter()
            .filter(|tx| tx.owner_id == owner && tx.is_final_installment())
            .filter(|tx| month.contains(tx.due_date))
            .filter(|tx| {
                tx.is_pending()
                    || (tx.is_settled() && tx.settled_at.is_some_and(|d| month.contains(d)))
            })
            .filter_map(|tx| match tx.parent {
                ParentRef::Account(account_id) => Some(EndingAccount {
                    account_id,
                    transaction_id: tx.id,
                    due_date: tx.due_date,
                    amount: tx.amount,
                    status: tx.effective_status(today),
                }),
                ParentRef::Income(_) => None,
            })
            .collect();
        ending.sort_by_key(|e| e.due_date);
        ending
    }

    /// Pending transactions due within `[today, today + days]`, soonest first.
    #[must_use]
    pub fn upcoming_due(
        transactions: &[Transaction],
        today: NaiveDate,
        days: u32,
    ) -> Vec<&Transaction> {
        let until = today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX);
        let mut due: Vec<&Transaction> = transactions
            .iter()
            .filter(|tx| tx.is_pending() && tx.due_date >= today && tx.due_date <= until)
            .collect();
        due.sort_by_key(|tx| tx.due_date);
        due
    }

    /// Pending transactions due before `today`, oldest first.
    #[must_use]
    pub fn overdue(transactions: &[Transaction], today: NaiveDate) -> Vec<&Transaction> {
        let mut late: Vec<&Transaction> = transactions
            .iter()
            .filter(|tx| tx.is_overdue(today))
            .collect();
        late.sort_by_key(|tx| tx.due_date);
        late
    }

    /// Paid expenses in `period` grouped by category, largest first.
    #[must_use]
    pub fn expenses_by_category(
        owner: UserId,
        transactions: &[Transaction],
        period: MonthPeriod,
    ) -> Vec<CategoryTotal> {
        let mut totals: BTreeMap<_, Money> = BTreeMap::new();
        for tx in Self::settled_in(owner, transactions, Flow::Expense, Some(period)) {
            *totals.entry(tx.category_id).or_default() += tx.amount;
        }

        let mut rows: Vec<CategoryTotal> = totals
            .into_iter()
            .map(|(category_id, total)| CategoryTotal { category_id, total })
            .collect();
        rows.sort_by(|a, b| b.total.cmp(&a.total).then(a.category_id.cmp(&b.category_id)));
        rows
    }

    /// Income, expenses and their change vs the previous month.
    #[must_use]
    pub fn monthly_summary(
        owner: UserId,
        transactions: &[Transaction],
        period: MonthPeriod,
    ) -> MonthlySummary {
        let previous = period.previous();
        let income = Self::monthly_income(owner, transactions, period);
        let expenses = Self::monthly_expenses(owner, transactions, period);

        MonthlySummary {
            period,
            income,
            expenses,
            net: income - expenses,
            income_change: Self::percentage_change(
                income,
                Self::monthly_income(owner, transactions, previous),
            ),
            expenses_change: Self::percentage_change(
                expenses,
                Self::monthly_expenses(owner, transactions, previous),
            ),
        }
    }

    /// What `card_limit_used` should be: the draws of currently paid
    /// transactions on `wallet`. Zero for non-card wallets.
    #[must_use]
    pub fn recompute_limit_used(wallet: &Wallet, transactions: &[Transaction]) -> Money {
        if !wallet.is_credit_card() {
            return Money::ZERO;
        }
        transactions
            .iter()
            .filter(|tx| tx.wallet_id == wallet.id && tx.is_settled())
            .filter_map(|tx| tx.limit_drawn)
            .sum()
    }

    fn settled_in(
        owner: UserId,
        transactions: &[Transaction],
        flow: Flow,
        period: Option<MonthPeriod>,
    ) -> impl Iterator<Item = &Transaction> {
        transactions.iter().filter(move |tx| {
            tx.owner_id == owner
                && tx.flow() == flow
                && tx.is_settled()
                && period.is_none_or(|p| tx.settled_at.is_some_and(|d| p.contains(d)))
        })
    }

    fn settled_total(
        owner: UserId,
        transactions: &[Transaction],
        flow: Flow,
        period: Option<MonthPeriod>,
    ) -> Money {
        Self::settled_in(owner, transactions, flow, period)
            .map(|tx| tx.amount)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::TransactionStatus;
    use cofre_shared::types::{AccountId, CategoryId, IncomeId, TransactionId};
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(y: i32, m: u32) -> MonthPeriod {
        MonthPeriod::new(y, m).unwrap()
    }

    fn tx(wallet: &Wallet, parent: ParentRef, cents: i64, due: NaiveDate) -> Transaction {
        Transaction {
            id: TransactionId::new(),
            parent,
            owner_id: wallet.owner_id,
            wallet_id: wallet.id,
            category_id: None,
            amount: Money::from_cents(cents),
            due_date: due,
            settled_at: None,
            installment_number: 1,
            total_installments: None,
            status: TransactionStatus::Pending,
            limit_drawn: None,
            version: 0,
        }
    }

    fn settled(mut t: Transaction, on: NaiveDate) -> Transaction {
        t.status = TransactionStatus::Settled;
        t.settled_at = Some(on);
        t
    }

    fn bill() -> ParentRef {
        ParentRef::Account(AccountId::new())
    }

    fn salary() -> ParentRef {
        ParentRef::Income(IncomeId::new())
    }

    #[test]
    fn test_wallet_balance_scenario() {
        let wallet = Wallet::checking(UserId::new(), "Conta", Money::from_cents(50_000));
        let rows = vec![
            settled(tx(&wallet, bill(), 12_000, date(2024, 3, 5)), date(2024, 3, 5)),
            settled(tx(&wallet, salary(), 5_000, date(2024, 3, 6)), date(2024, 3, 6)),
            tx(&wallet, bill(), 99_999, date(2024, 3, 9)),
        ];

        let balance = AggregationService::wallet_balance(&wallet, &rows).unwrap();
        assert_eq!(balance, Money::from_cents(43_000));
        assert_eq!(balance.to_display(), dec!(430.00));
    }

    #[test]
    fn test_balances_report_overflow() {
        let owner = UserId::new();
        let wallet = Wallet::checking(owner, "Conta", Money::from_cents(i64::MAX - 1_000));
        let rows = vec![
            settled(tx(&wallet, salary(), 600, date(2024, 3, 6)), date(2024, 3, 6)),
            settled(tx(&wallet, salary(), 600, date(2024, 3, 7)), date(2024, 3, 7)),
        ];

        assert_eq!(
            AggregationService::wallet_balance(&wallet, &rows),
            Err(MoneyError::Overflow)
        );
        assert_eq!(
            AggregationService::total_balance(owner, &[wallet], &rows),
            Err(MoneyError::Overflow)
        );
    }

    #[test]
    fn test_percentage_change_rules() {
        let m = Money::from_cents;
        assert_eq!(AggregationService::percentage_change(m(12_345), Money::ZERO), dec!(0));
        assert_eq!(AggregationService::percentage_change(Money::ZERO, Money::ZERO), dec!(0));
        assert_eq!(AggregationService::percentage_change(m(150), m(100)), dec!(50.0));
        assert_eq!(AggregationService::percentage_change(m(50), m(100)), dec!(-50.0));
        assert_eq!(AggregationService::percentage_change(m(100), m(300)), dec!(-66.7));
        assert_eq!(AggregationService::percentage_change(m(50), m(-100)), dec!(150.0));
        assert_eq!(AggregationService::percentage_change(m(10_005), m(10_000)), dec!(0.1));
    }

    #[test]
    fn test_monthly_totals_use_settled_date() {
        let wallet = Wallet::checking(UserId::new(), "Conta", Money::ZERO);
        let rows = vec![
            settled(tx(&wallet, bill(), 1_000, date(2024, 2, 28)), date(2024, 3, 1)),
            settled(tx(&wallet, bill(), 2_000, date(2024, 3, 10)), date(2024, 3, 10)),
            settled(tx(&wallet, salary(), 7_000, date(2024, 3, 5)), date(2024, 3, 5)),
            tx(&wallet, bill(), 4_000, date(2024, 3, 20)),
        ];

        let owner = wallet.owner_id;
        assert_eq!(
            AggregationService::monthly_expenses(owner, &rows, month(2024, 3)),
            Money::from_cents(3_000)
        );
        assert_eq!(
            AggregationService::monthly_expenses(owner, &rows, month(2024, 2)),
            Money::ZERO
        );
        assert_eq!(
            AggregationService::monthly_income(owner, &rows, month(2024, 3)),
            Money::from_cents(7_000)
        );
    }

    #[test]
    fn test_cashflow_series_oldest_first() {
        let wallet = Wallet::checking(UserId::new(), "Conta", Money::ZERO);
        let rows = vec![
            settled(tx(&wallet, bill(), 1_000, date(2024, 1, 10)), date(2024, 1, 10)),
            settled(tx(&wallet, salary(), 5_000, date(2024, 3, 1)), date(2024, 3, 1)),
        ];

        let series =
            AggregationService::cashflow_series(wallet.owner_id, &rows, date(2024, 3, 15), 3);

        let periods: Vec<String> = series.iter().map(|p| p.period.to_string()).collect();
        assert_eq!(periods, vec!["2024-01", "2024-02", "2024-03"]);
        assert_eq!(series[0].expenses, Money::from_cents(1_000));
        assert_eq!(series[0].net, Money::from_cents(-1_000));
        assert_eq!(series[1].net, Money::ZERO);
        assert_eq!(series[2].income, Money::from_cents(5_000));
    }

    #[test]
    fn test_accounts_ending_this_month() {
        let wallet = Wallet::checking(UserId::new(), "Conta", Money::ZERO);
        let today = date(2024, 6, 12);

        let mut pending_final = tx(&wallet, bill(), 1_000, date(2024, 6, 20));
        pending_final.installment_number = 10;
        pending_final.total_installments = Some(10);

        let mut paid_final = tx(&wallet, bill(), 2_000, date(2024, 6, 5));
        paid_final.installment_number = 3;
        paid_final.total_installments = Some(3);
        let paid_final = settled(paid_final, date(2024, 6, 5));

        let mut paid_early = tx(&wallet, bill(), 3_000, date(2024, 6, 25));
        paid_early.installment_number = 2;
        paid_early.total_installments = Some(2);
        let paid_early = settled(paid_early, date(2024, 5, 30));

        let mut not_final = tx(&wallet, bill(), 4_000, date(2024, 6, 1));
        not_final.installment_number = 2;
        not_final.total_installments = Some(5);

        let mut income_final = tx(&wallet, salary(), 5_000, date(2024, 6, 1));
        income_final.installment_number = 2;
        income_final.total_installments = Some(2);

        let rows = vec![pending_final, paid_final, paid_early, not_final, income_final];
        let ending = AggregationService::accounts_ending_this_month(wallet.owner_id, &rows, today);

        assert_eq!(ending.len(), 2);
        assert_eq!(ending[0].amount, Money::from_cents(2_000));
        assert_eq!(ending[1].amount, Money::from_cents(1_000));
    }

    #[test]
    fn test_upcoming_and_overdue() {
        let wallet = Wallet::checking(UserId::new(), "Conta", Money::ZERO);
        let today = date(2024, 6, 12);
        let rows = vec![
            tx(&wallet, bill(), 1, date(2024, 6, 19)),
            tx(&wallet, bill(), 2, date(2024, 6, 20)),
            tx(&wallet, bill(), 3, date(2024, 6, 12)),
            tx(&wallet, bill(), 4, date(2024, 6, 11)),
            settled(tx(&wallet, bill(), 5, date(2024, 6, 13)), today),
        ];

        let upcoming: Vec<i64> = AggregationService::upcoming_due(&rows, today, 7)
            .iter()
            .map(|tx| tx.amount.cents())
            .collect();
        assert_eq!(upcoming, vec![3, 1]);

        let late: Vec<i64> = AggregationService::overdue(&rows, today)
            .iter()
            .map(|tx| tx.amount.cents())
            .collect();
        assert_eq!(late, vec![4]);
    }

    #[test]
    fn test_expenses_by_category_sorted() {
        let wallet = Wallet::checking(UserId::new(), "Conta", Money::ZERO);
        let food = Some(CategoryId::new());
        let fun = Some(CategoryId::new());
        let mut rows = Vec::new();
        for (category, cents) in [(food, 3_000), (fun, 1_000), (food, 500), (None, 2_000)] {
            let mut t = settled(tx(&wallet, bill(), cents, date(2024, 6, 3)), date(2024, 6, 3));
            t.category_id = category;
            rows.push(t);
        }

        let totals =
            AggregationService::expenses_by_category(wallet.owner_id, &rows, month(2024, 6));

        assert_eq!(totals.len(), 3);
        assert_eq!(totals[0], CategoryTotal { category_id: food, total: Money::from_cents(3_500) });
        assert_eq!(totals[1].category_id, None);
        assert_eq!(totals[2].category_id, fun);
    }

    #[test]
    fn test_monthly_summary() {
        let wallet = Wallet::checking(UserId::new(), "Conta", Money::ZERO);
        let rows = vec![
            settled(tx(&wallet, bill(), 10_000, date(2024, 5, 3)), date(2024, 5, 3)),
            settled(tx(&wallet, bill(), 15_000, date(2024, 6, 3)), date(2024, 6, 3)),
            settled(tx(&wallet, salary(), 40_000, date(2024, 6, 5)), date(2024, 6, 5)),
        ];

        let summary = AggregationService::monthly_summary(wallet.owner_id, &rows, month(2024, 6));

        assert_eq!(summary.net, Money::from_cents(25_000));
        assert_eq!(summary.expenses_change, dec!(50.0));
        assert_eq!(summary.income_change, dec!(0));
    }

    #[test]
    fn test_recompute_limit_used() {
        let card = Wallet::credit_card(UserId::new(), "Visa", Money::from_cents(100_000));
        let mut paid = settled(tx(&card, bill(), 30_000, date(2024, 6, 3)), date(2024, 6, 3));
        paid.limit_drawn = Some(Money::from_cents(30_000));
        let pending = tx(&card, bill(), 20_000, date(2024, 6, 10));

        assert_eq!(
            AggregationService::recompute_limit_used(&card, &[paid, pending]),
            Money::from_cents(30_000)
        );
    }
}

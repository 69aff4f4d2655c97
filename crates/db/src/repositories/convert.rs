//! Row <-> domain conversions.
//!
//! Amounts are stored as BIGINT cents and map 1:1 onto [`Money`]. Counters
//! are INTEGER columns; a value that does not fit is reported as a corrupt
//! row rather than truncated.

use chrono::Utc;
use cofre_core::budget::Budget;
use cofre_core::calendar::MonthPeriod;
use cofre_core::ledger::{CreditLine, Transaction, Wallet, WalletKind};
use cofre_core::obligation::{Account, Income, ParentRef};
use cofre_core::recurrence::RecurrencePolicy;
use cofre_shared::types::{AccountId, BudgetId, IncomeId, Money};
use sea_orm::Set;
use uuid::Uuid;

use super::error::RepositoryError;
use crate::entities::sea_orm_active_enums::{TransactionStatus, WalletType};
use crate::entities::{accounts, budgets, incomes, transactions, wallets};

fn to_i32(entity: &str, id: Uuid, value: u32) -> Result<i32, RepositoryError> {
    i32::try_from(value).map_err(|e| RepositoryError::corrupt(entity, id, e))
}

fn to_u32(entity: &str, id: Uuid, value: i32) -> Result<u32, RepositoryError> {
    u32::try_from(value).map_err(|e| RepositoryError::corrupt(entity, id, e))
}

// ============================================================================
// Wallets
// ============================================================================

pub(crate) fn wallet_from_model(model: wallets::Model) -> Result<Wallet, RepositoryError> {
    let credit_line = match (WalletKind::from(model.wallet_type), model.card_limit) {
        (WalletKind::Checking, _) => None,
        (WalletKind::CreditCard, Some(limit)) => Some(CreditLine {
            limit: Money::from_cents(limit),
            used: Money::from_cents(model.card_limit_used),
        }),
        (WalletKind::CreditCard, None) => {
            return Err(RepositoryError::corrupt("wallet", model.id, "credit card without limit"));
        }
    };

    Ok(Wallet {
        id: model.id.into(),
        owner_id: model.owner_id.into(),
        name: model.name,
        initial_balance: Money::from_cents(model.initial_balance),
        credit_line,
    })
}

pub(crate) fn wallet_active_model(wallet: &Wallet) -> wallets::ActiveModel {
    let now = Utc::now().into();
    wallets::ActiveModel {
        id: Set(wallet.id.into_inner()),
        owner_id: Set(wallet.owner_id.into_inner()),
        name: Set(wallet.name.clone()),
        wallet_type: Set(WalletType::from(wallet.kind())),
        initial_balance: Set(wallet.initial_balance.cents()),
        card_limit: Set(wallet.credit_line.map(|line| line.limit.cents())),
        card_limit_used: Set(wallet.credit_line.map_or(0, |line| line.used.cents())),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

// ============================================================================
// Transactions
// ============================================================================

pub(crate) fn transaction_from_model(
    model: transactions::Model,
) -> Result<Transaction, RepositoryError> {
    let parent = match (model.account_id, model.income_id) {
        (Some(id), None) => ParentRef::Account(AccountId::from(id)),
        (None, Some(id)) => ParentRef::Income(IncomeId::from(id)),
        _ => return Err(RepositoryError::corrupt("transaction", model.id, "ambiguous parent")),
    };

    Ok(Transaction {
        id: model.id.into(),
        parent,
        owner_id: model.owner_id.into(),
        wallet_id: model.wallet_id.into(),
        category_id: model.category_id.map(Into::into),
        amount: Money::from_cents(model.amount),
        due_date: model.due_date,
        settled_at: model.settled_at,
        installment_number: to_u32("transaction", model.id, model.installment_number)?,
        total_installments: model
            .total_installments
            .map(|n| to_u32("transaction", model.id, n))
            .transpose()?,
        status: model.status.into(),
        limit_drawn: model.limit_drawn.map(Money::from_cents),
        version: model.version,
    })
}

/// Full row for insert or a version-checked overwrite.
pub(crate) fn transaction_active_model(
    transaction: &Transaction,
) -> Result<transactions::ActiveModel, RepositoryError> {
    let id = transaction.id.into_inner();
    let (account_id, income_id) = match transaction.parent {
        ParentRef::Account(account) => (Some(account.into_inner()), None),
        ParentRef::Income(income) => (None, Some(income.into_inner())),
    };
    let now = Utc::now().into();

    Ok(transactions::ActiveModel {
        id: Set(id),
        account_id: Set(account_id),
        income_id: Set(income_id),
        owner_id: Set(transaction.owner_id.into_inner()),
        wallet_id: Set(transaction.wallet_id.into_inner()),
        category_id: Set(transaction.category_id.map(|c| c.into_inner())),
        amount: Set(transaction.amount.cents()),
        due_date: Set(transaction.due_date),
        settled_at: Set(transaction.settled_at),
        installment_number: Set(to_i32("transaction", id, transaction.installment_number)?),
        total_installments: Set(transaction
            .total_installments
            .map(|n| to_i32("transaction", id, n))
            .transpose()?),
        status: Set(TransactionStatus::from(transaction.status)),
        limit_drawn: Set(transaction.limit_drawn.map(Money::cents)),
        version: Set(transaction.version),
        created_at: Set(now),
        updated_at: Set(now),
    })
}

// ============================================================================
// Parents
// ============================================================================

fn policy_to_json(
    id: Uuid,
    policy: &RecurrencePolicy,
) -> Result<serde_json::Value, RepositoryError> {
    serde_json::to_value(policy).map_err(|e| RepositoryError::corrupt("policy", id, e))
}

macro_rules! parent_conversions {
    ($module:ident, $domain:ident, $from_model:ident, $to_active:ident, $entity:literal) => {
        pub(crate) fn $from_model(model: $module::Model) -> Result<$domain, RepositoryError> {
            let policy: RecurrencePolicy = serde_json::from_value(model.policy)
                .map_err(|e| RepositoryError::corrupt($entity, model.id, e))?;

            Ok($domain {
                id: model.id.into(),
                owner_id: model.owner_id.into(),
                wallet_id: model.wallet_id.into(),
                category_id: model.category_id.map(Into::into),
                name: model.name,
                note: model.note,
                policy,
                status: model.status.into(),
                created_at: model.created_at.with_timezone(&Utc),
            })
        }

        pub(crate) fn $to_active(
            parent: &$domain,
        ) -> Result<$module::ActiveModel, RepositoryError> {
            let id = parent.id.into_inner();
            Ok($module::ActiveModel {
                id: Set(id),
                owner_id: Set(parent.owner_id.into_inner()),
                wallet_id: Set(parent.wallet_id.into_inner()),
                category_id: Set(parent.category_id.map(|c| c.into_inner())),
                name: Set(parent.name.clone()),
                note: Set(parent.note.clone()),
                policy: Set(policy_to_json(id, &parent.policy)?),
                status: Set(parent.status.into()),
                created_at: Set(parent.created_at.into()),
                updated_at: Set(Utc::now().into()),
            })
        }
    };
}

parent_conversions!(accounts, Account, account_from_model, account_active_model, "account");
parent_conversions!(incomes, Income, income_from_model, income_active_model, "income");

// ============================================================================
// Budgets
// ============================================================================

pub(crate) fn budget_from_model(model: budgets::Model) -> Budget {
    Budget {
        id: BudgetId::from(model.id),
        owner_id: model.owner_id.into(),
        category_id: model.category_id.into(),
        period: MonthPeriod::of(model.period),
        amount: Money::from_cents(model.amount),
        recurrence: model.recurrence.into(),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub(crate) fn budget_active_model(budget: &Budget) -> budgets::ActiveModel {
    budgets::ActiveModel {
        id: Set(budget.id.into_inner()),
        owner_id: Set(budget.owner_id.into_inner()),
        category_id: Set(budget.category_id.into_inner()),
        period: Set(budget.period.first_day()),
        amount: Set(budget.amount.cents()),
        recurrence: Set(budget.recurrence.into()),
        created_at: Set(budget.created_at.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cofre_core::ledger::TransactionStatus as CoreStatus;
    use cofre_core::obligation::ObligationStatus;
    use cofre_shared::types::{UserId, WalletId};
    use sea_orm::ActiveValue;

    fn row(account_id: Option<Uuid>, income_id: Option<Uuid>) -> transactions::Model {
        let now = Utc::now().into();
        transactions::Model {
            id: Uuid::now_v7(),
            account_id,
            income_id,
            owner_id: Uuid::now_v7(),
            wallet_id: Uuid::now_v7(),
            category_id: None,
            amount: 15_000,
            due_date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            settled_at: None,
            installment_number: 2,
            total_installments: Some(3),
            status: TransactionStatus::Pending,
            limit_drawn: None,
            version: 4,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_transaction_row_round_trip() {
        let account = Uuid::now_v7();
        let tx = transaction_from_model(row(Some(account), None)).unwrap();

        assert_eq!(tx.parent, ParentRef::Account(AccountId::from(account)));
        assert_eq!(tx.amount, Money::from_cents(15_000));
        assert_eq!(tx.installment_number, 2);
        assert_eq!(tx.status, CoreStatus::Pending);

        let active = transaction_active_model(&tx).unwrap();
        assert_eq!(active.account_id, ActiveValue::Set(Some(account)));
        assert_eq!(active.income_id, ActiveValue::Set(None));
        assert_eq!(active.version, ActiveValue::Set(4));
    }

    #[test]
    fn test_transaction_needs_exactly_one_parent() {
        let err = transaction_from_model(row(None, None)).unwrap_err();
        assert_eq!(err.error_code(), "STORAGE_ERROR");

        let both = row(Some(Uuid::now_v7()), Some(Uuid::now_v7()));
        assert!(transaction_from_model(both).is_err());
    }

    #[test]
    fn test_negative_installment_is_corrupt() {
        let mut model = row(None, Some(Uuid::now_v7()));
        model.installment_number = -1;
        assert!(transaction_from_model(model).is_err());
    }

    #[test]
    fn test_credit_card_wallet() {
        let wallet = Wallet::credit_card(UserId::new(), "Nubank", Money::from_cents(500_000));
        let active = wallet_active_model(&wallet);
        assert_eq!(active.wallet_type, ActiveValue::Set(WalletType::CreditCard));
        assert_eq!(active.card_limit, ActiveValue::Set(Some(500_000)));

        let now = Utc::now().into();
        let model = wallets::Model {
            id: wallet.id.into_inner(),
            owner_id: wallet.owner_id.into_inner(),
            name: wallet.name.clone(),
            wallet_type: WalletType::CreditCard,
            initial_balance: 0,
            card_limit: None,
            card_limit_used: 0,
            created_at: now,
            updated_at: now,
        };
        assert!(wallet_from_model(model).is_err());
    }

    #[test]
    fn test_account_policy_json() {
        let account = Account::create(
            cofre_core::obligation::ObligationInput {
                owner_id: UserId::new(),
                wallet_id: WalletId::new(),
                category_id: None,
                name: "Internet".to_string(),
                note: None,
                policy: RecurrencePolicy::Recurring {
                    amount_per_period: Money::from_cents(9_990),
                    start_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
                    horizon_months: 12,
                },
            },
            Utc::now(),
        )
        .unwrap();

        let active = account_active_model(&account).unwrap();
        let ActiveValue::Set(policy) = active.policy else {
            panic!("policy not set");
        };
        assert_eq!(policy["type"], "recurring");

        let now = Utc::now().into();
        let model = accounts::Model {
            id: account.id.into_inner(),
            owner_id: account.owner_id.into_inner(),
            wallet_id: account.wallet_id.into_inner(),
            category_id: None,
            name: account.name.clone(),
            note: None,
            policy,
            status: ObligationStatus::Active.into(),
            created_at: now,
            updated_at: now,
        };
        let back = account_from_model(model).unwrap();
        assert_eq!(back.policy, account.policy);
    }
}

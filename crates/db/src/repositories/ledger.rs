//! Ledger repository: wallets, transactions and settlements in PostgreSQL.
//!
//! Settlements follow the same protocol as the in-memory store: the
//! transaction row is written only if its `version` still matches, and the
//! card limit moves by an in-SQL increment in the same database transaction.
//! The transaction row is always touched before the wallet row.

use chrono::NaiveDate;
use cofre_core::aggregation::AggregationService;
use cofre_core::generator::TransactionDraft;
use cofre_core::ledger::{LedgerService, Settlement, StoreError, Transaction, Wallet};
use cofre_core::obligation::ParentRef;
use cofre_shared::types::{Money, TransactionId, UserId, WalletId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tracing::{info, warn};

use super::convert::{
    transaction_active_model, transaction_from_model, wallet_active_model, wallet_from_model,
};
use super::error::RepositoryError;
use crate::entities::sea_orm_active_enums::TransactionStatus as DbTransactionStatus;
use crate::entities::{accounts, incomes, transactions, wallets};

/// Ledger repository for wallet and transaction operations.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Wallets
    // ========================================================================

    /// Inserts a wallet.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create_wallet(&self, wallet: &Wallet) -> Result<Wallet, RepositoryError> {
        let model = wallet_active_model(wallet).insert(&self.db).await?;
        wallet_from_model(model)
    }

    /// Loads one wallet.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the wallet does not exist.
    pub async fn find_wallet(&self, id: WalletId) -> Result<Wallet, RepositoryError> {
        let model = wallets::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(StoreError::wallet_not_found(id))?;
        wallet_from_model(model)
    }

    /// Wallets owned by a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_wallets(&self, owner: UserId) -> Result<Vec<Wallet>, RepositoryError> {
        wallets::Entity::find()
            .filter(wallets::Column::OwnerId.eq(owner.into_inner()))
            .order_by_asc(wallets::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(wallet_from_model)
            .collect()
    }

    /// Sets `card_limit_used` outright.
    ///
    /// # Errors
    ///
    /// Returns `NotCreditCard` for a wallet without a limit, `NotFound` if missing.
    pub async fn set_wallet_limit(&self, id: WalletId, used: Money) -> Result<(), RepositoryError> {
        let result = wallets::Entity::update_many()
            .col_expr(wallets::Column::CardLimitUsed, Expr::value(used.cents()))
            .filter(wallets::Column::Id.eq(id.into_inner()))
            .filter(wallets::Column::CardLimit.is_not_null())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            self.find_wallet(id).await?;
            return Err(StoreError::NotCreditCard(id).into());
        }
        Ok(())
    }

    /// Recomputes a card's `card_limit_used` from its paid transactions and
    /// writes it back if it drifted. Returns the audited value.
    ///
    /// # Errors
    ///
    /// Returns an error if the wallet is missing or the database fails.
    pub async fn repair_limit_used(&self, id: WalletId) -> Result<Money, RepositoryError> {
        let wallet = self.find_wallet(id).await?;
        let Some(recorded) = wallet.limit_used() else {
            return Ok(Money::ZERO);
        };

        let transactions = transactions::Entity::find()
            .filter(transactions::Column::WalletId.eq(id.into_inner()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(transaction_from_model)
            .collect::<Result<Vec<_>, _>>()?;

        let expected = AggregationService::recompute_limit_used(&wallet, &transactions);
        if expected != recorded {
            warn!(
                wallet_id = %id,
                recorded = recorded.cents(),
                expected = expected.cents(),
                "card limit drift repaired"
            );
            self.set_wallet_limit(id, expected).await?;
        }
        Ok(expected)
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Loads one transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the transaction does not exist.
    pub async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Transaction, RepositoryError> {
        find_transaction(&self.db, id).await
    }

    /// Transactions owned by a user, by due date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_transactions(
        &self,
        owner: UserId,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        transactions::Entity::find()
            .filter(transactions::Column::OwnerId.eq(owner.into_inner()))
            .order_by_asc(transactions::Column::DueDate)
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(transaction_from_model)
            .collect()
    }

    /// Pending transactions of every owner due on or before `until`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn pending_due_by(
        &self,
        until: NaiveDate,
    ) -> Result<Vec<Transaction>, RepositoryError> {
        transactions::Entity::find()
            .filter(transactions::Column::Status.eq(DbTransactionStatus::Pending))
            .filter(transactions::Column::DueDate.lte(until))
            .order_by_asc(transactions::Column::DueDate)
            .all(&self.db)
            .await?
            .into_iter()
            .map(transaction_from_model)
            .collect()
    }

    /// Children of a parent, by due date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn children(&self, parent: ParentRef) -> Result<Vec<Transaction>, RepositoryError> {
        children(&self.db, parent).await
    }

    /// Persists drafts as pending transactions in one database transaction.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateDueDate` if a draft repeats a materialized due date;
    /// nothing is written in that case.
    pub async fn save_drafts(
        &self,
        drafts: &[TransactionDraft],
    ) -> Result<Vec<Transaction>, RepositoryError> {
        let txn = self.db.begin().await?;
        let saved = insert_drafts(&txn, drafts).await?;
        txn.commit().await?;
        Ok(saved)
    }

    // ========================================================================
    // Settlements
    // ========================================================================

    /// Applies a settlement atomically.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentModification` if the row's version moved on,
    /// `NotFound` for a missing transaction or wallet.
    pub async fn commit_settlement(&self, settlement: &Settlement) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;
        apply_settlement(&txn, settlement).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Marks an expense transaction paid, on `paid_at` or `today`.
    ///
    /// # Errors
    ///
    /// Any `LedgerService::mark_paid` error, or a storage error.
    pub async fn pay(
        &self,
        id: TransactionId,
        paid_at: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Transaction, RepositoryError> {
        let transaction = self.find_transaction(id).await?;
        let wallet = self.find_wallet(transaction.wallet_id).await?;
        let settlement = LedgerService::mark_paid(&transaction, &wallet, paid_at, today)?;
        self.settle(settlement, "paid").await
    }

    /// Reverts a paid expense transaction.
    ///
    /// # Errors
    ///
    /// Any `LedgerService::mark_unpaid` error, or a storage error.
    pub async fn unpay(&self, id: TransactionId) -> Result<Transaction, RepositoryError> {
        let transaction = self.find_transaction(id).await?;
        let settlement = LedgerService::mark_unpaid(&transaction)?;
        self.settle(settlement, "unpaid").await
    }

    /// Marks an income transaction received, on `received_at` or `today`.
    ///
    /// # Errors
    ///
    /// Any `LedgerService::mark_received` error, or a storage error.
    pub async fn receive(
        &self,
        id: TransactionId,
        received_at: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Transaction, RepositoryError> {
        let transaction = self.find_transaction(id).await?;
        let settlement = LedgerService::mark_received(&transaction, received_at, today)?;
        self.settle(settlement, "received").await
    }

    /// Reverts a received income transaction.
    ///
    /// # Errors
    ///
    /// Any `LedgerService::mark_not_received` error, or a storage error.
    pub async fn unreceive(&self, id: TransactionId) -> Result<Transaction, RepositoryError> {
        let transaction = self.find_transaction(id).await?;
        let settlement = LedgerService::mark_not_received(&transaction)?;
        self.settle(settlement, "not_received").await
    }

    async fn settle(
        &self,
        settlement: Settlement,
        action: &'static str,
    ) -> Result<Transaction, RepositoryError> {
        let transaction_id = settlement.transaction.id;
        if let Err(err) = self.commit_settlement(&settlement).await {
            if err.is_retryable() {
                warn!(%transaction_id, action, "settlement lost a concurrent update");
            }
            return Err(err);
        }

        info!(
            %transaction_id,
            wallet_id = %settlement.transaction.wallet_id,
            action,
            limit_delta = settlement.limit_delta.map(|d| d.amount.cents()),
            "transaction settled"
        );
        Ok(settlement.transaction)
    }
}

// ============================================================================
// Connection-generic helpers shared with the obligation repository
// ============================================================================

pub(crate) async fn find_transaction<C: ConnectionTrait>(
    conn: &C,
    id: TransactionId,
) -> Result<Transaction, RepositoryError> {
    let model = transactions::Entity::find_by_id(id.into_inner())
        .one(conn)
        .await?
        .ok_or(StoreError::transaction_not_found(id))?;
    transaction_from_model(model)
}

fn parent_column(parent: ParentRef) -> transactions::Column {
    match parent {
        ParentRef::Account(_) => transactions::Column::AccountId,
        ParentRef::Income(_) => transactions::Column::IncomeId,
    }
}

pub(crate) async fn children<C: ConnectionTrait>(
    conn: &C,
    parent: ParentRef,
) -> Result<Vec<Transaction>, RepositoryError> {
    transactions::Entity::find()
        .filter(parent_column(parent).eq(parent.id()))
        .order_by_asc(transactions::Column::DueDate)
        .all(conn)
        .await?
        .into_iter()
        .map(transaction_from_model)
        .collect()
}

/// Latest materialized due date of a parent.
pub(crate) async fn max_due_date<C: ConnectionTrait>(
    conn: &C,
    parent: ParentRef,
) -> Result<Option<NaiveDate>, RepositoryError> {
    let max: Option<Option<NaiveDate>> = transactions::Entity::find()
        .filter(parent_column(parent).eq(parent.id()))
        .select_only()
        .column_as(transactions::Column::DueDate.max(), "max_due_date")
        .into_tuple()
        .one(conn)
        .await?;
    Ok(max.flatten())
}

/// Takes the parent's row lock so concurrent inserts for it serialize.
pub(crate) async fn lock_parent<C: ConnectionTrait>(
    conn: &C,
    parent: ParentRef,
) -> Result<(), RepositoryError> {
    let found = match parent {
        ParentRef::Account(id) => accounts::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(conn)
            .await?
            .is_some(),
        ParentRef::Income(id) => incomes::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(conn)
            .await?
            .is_some(),
    };

    if found {
        Ok(())
    } else {
        let entity = match parent {
            ParentRef::Account(_) => "account",
            ParentRef::Income(_) => "income",
        };
        Err(StoreError::NotFound {
            entity,
            id: parent.id(),
        }
        .into())
    }
}

/// Inserts drafts after checking their due dates under the parent locks.
/// Must run inside a database transaction.
pub(crate) async fn insert_drafts<C: ConnectionTrait>(
    conn: &C,
    drafts: &[TransactionDraft],
) -> Result<Vec<Transaction>, RepositoryError> {
    if drafts.is_empty() {
        return Ok(Vec::new());
    }

    let mut parents: Vec<ParentRef> = drafts.iter().map(|d| d.parent).collect();
    parents.sort_unstable();
    parents.dedup();

    let mut taken = std::collections::BTreeSet::new();
    for parent in &parents {
        lock_parent(conn, *parent).await?;
        let dates: Vec<NaiveDate> = transactions::Entity::find()
            .filter(parent_column(*parent).eq(parent.id()))
            .select_only()
            .column(transactions::Column::DueDate)
            .into_tuple()
            .all(conn)
            .await?;
        taken.extend(dates.into_iter().map(|date| (*parent, date)));
    }

    for draft in drafts {
        if !taken.insert((draft.parent, draft.due_date)) {
            return Err(StoreError::DuplicateDueDate {
                parent: draft.parent,
                due_date: draft.due_date,
            }
            .into());
        }
    }

    let saved: Vec<Transaction> = drafts.iter().map(Transaction::from_draft).collect();
    let rows = saved
        .iter()
        .map(transaction_active_model)
        .collect::<Result<Vec<_>, _>>()?;
    transactions::Entity::insert_many(rows).exec(conn).await?;
    Ok(saved)
}

/// Version-checked write of the transaction row, then the limit increment.
/// Must run inside a database transaction.
pub(crate) async fn apply_settlement<C: ConnectionTrait>(
    conn: &C,
    settlement: &Settlement,
) -> Result<(), RepositoryError> {
    let id = settlement.transaction.id;
    let mut row = transaction_active_model(&settlement.transaction)?;
    row.created_at = NotSet;
    row.updated_at = NotSet;

    let updated = transactions::Entity::update(row)
        .filter(transactions::Column::Version.eq(settlement.expected_version))
        .exec(conn)
        .await;

    match updated {
        Ok(_) => {}
        Err(DbErr::RecordNotUpdated) => {
            // Missing row or a stale version.
            find_transaction(conn, id).await?;
            return Err(StoreError::ConcurrentModification {
                entity: "transaction",
                id: id.into_inner(),
            }
            .into());
        }
        Err(err) => return Err(err.into()),
    }

    if let Some(delta) = settlement.limit_delta {
        let result = wallets::Entity::update_many()
            .col_expr(
                wallets::Column::CardLimitUsed,
                Expr::col(wallets::Column::CardLimitUsed).add(delta.amount.cents()),
            )
            .filter(wallets::Column::Id.eq(delta.wallet_id.into_inner()))
            .filter(wallets::Column::CardLimit.is_not_null())
            .exec(conn)
            .await?;

        // A wallet that stopped being a card has no counter left to release.
        if result.rows_affected == 0 {
            wallets::Entity::find_by_id(delta.wallet_id.into_inner())
                .one(conn)
                .await?
                .ok_or(StoreError::wallet_not_found(delta.wallet_id))?;
        }
    }

    Ok(())
}

//! Obligation repository: accounts and incomes with their materialized
//! transactions.

use chrono::NaiveDate;
use cofre_core::Clock;
use cofre_core::generator::{HorizonFailure, HorizonReport, TransactionGenerator};
use cofre_core::ledger::{LedgerService, StoreError, Transaction};
use cofre_core::obligation::{
    Account, Income, ObligationInput, ObligationService, ObligationStatus, ParentRef,
    RecurringObligation,
};
use cofre_shared::types::{AccountId, IncomeId, UserId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::{debug, info, warn};

use super::convert::{
    account_active_model, account_from_model, income_active_model, income_from_model,
};
use super::error::RepositoryError;
use super::ledger::{apply_settlement, children, insert_drafts, lock_parent, max_due_date};
use crate::entities::sea_orm_active_enums::ObligationStatus as DbObligationStatus;
use crate::entities::{accounts, incomes};

/// A loaded parent of either flavour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Obligation {
    /// Expense parent.
    Account(Account),
    /// Income parent.
    Income(Income),
}

impl Obligation {
    /// The parent behind the shared trait.
    #[must_use]
    pub fn as_recurring(&self) -> &dyn RecurringObligation {
        match self {
            Self::Account(account) => account,
            Self::Income(income) => income,
        }
    }
}

/// Outcome of a lifecycle change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// The new status.
    pub status: ObligationStatus,
    /// Pending children voided by a cancellation.
    pub cancelled_children: usize,
}

/// Obligation repository for account and income operations.
#[derive(Debug, Clone)]
pub struct ObligationRepository {
    db: DatabaseConnection,
}

impl ObligationRepository {
    /// Creates a new obligation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account and materializes its first transactions.
    ///
    /// # Errors
    ///
    /// Returns the policy validation error, or a storage error. Nothing is
    /// written on failure.
    pub async fn create_account(
        &self,
        input: ObligationInput,
        clock: &dyn Clock,
    ) -> Result<(Account, Vec<Transaction>), RepositoryError> {
        let account = Account::create(input, clock.now())?;
        let drafts = TransactionGenerator::generate(&account, clock.today())?;

        let txn = self.db.begin().await?;
        account_active_model(&account)?.insert(&txn).await?;
        let saved = insert_drafts(&txn, &drafts).await?;
        txn.commit().await?;

        debug!(account_id = %account.id, created = saved.len(), "account created");
        Ok((account, saved))
    }

    /// Creates an income and materializes its first transactions.
    ///
    /// # Errors
    ///
    /// Returns the policy validation error, or a storage error. Nothing is
    /// written on failure.
    pub async fn create_income(
        &self,
        input: ObligationInput,
        clock: &dyn Clock,
    ) -> Result<(Income, Vec<Transaction>), RepositoryError> {
        let income = Income::create(input, clock.now())?;
        let drafts = TransactionGenerator::generate(&income, clock.today())?;

        let txn = self.db.begin().await?;
        income_active_model(&income)?.insert(&txn).await?;
        let saved = insert_drafts(&txn, &drafts).await?;
        txn.commit().await?;

        debug!(income_id = %income.id, created = saved.len(), "income created");
        Ok((income, saved))
    }

    /// Loads an account or an income.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the parent does not exist.
    pub async fn find(&self, parent: ParentRef) -> Result<Obligation, RepositoryError> {
        find_obligation(&self.db, parent).await
    }

    /// Accounts owned by a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_accounts(&self, owner: UserId) -> Result<Vec<Account>, RepositoryError> {
        accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(owner.into_inner()))
            .order_by_asc(accounts::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(account_from_model)
            .collect()
    }

    /// Incomes owned by a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_incomes(&self, owner: UserId) -> Result<Vec<Income>, RepositoryError> {
        incomes::Entity::find()
            .filter(incomes::Column::OwnerId.eq(owner.into_inner()))
            .order_by_asc(incomes::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(income_from_model)
            .collect()
    }

    /// Moves a parent to a new lifecycle status.
    ///
    /// Cancelling voids every still-pending child in the same database
    /// transaction; settled children are kept as history.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` for a disallowed change, `NotFound` for a
    /// missing parent, `ConcurrentModification` if a child moved meanwhile.
    pub async fn change_status(
        &self,
        parent: ParentRef,
        to: ObligationStatus,
    ) -> Result<StatusChange, RepositoryError> {
        let txn = self.db.begin().await?;
        let status = match parent {
            ParentRef::Account(id) => {
                let model = accounts::Entity::find_by_id(id.into_inner())
                    .lock_exclusive()
                    .one(&txn)
                    .await?
                    .ok_or(StoreError::NotFound {
                        entity: "account",
                        id: id.into_inner(),
                    })?;
                let status = ObligationService::transition(model.status.into(), to)?;
                let mut active: accounts::ActiveModel = model.into();
                active.status = Set(status.into());
                active.update(&txn).await?;
                status
            }
            ParentRef::Income(id) => {
                let model = incomes::Entity::find_by_id(id.into_inner())
                    .lock_exclusive()
                    .one(&txn)
                    .await?
                    .ok_or(StoreError::NotFound {
                        entity: "income",
                        id: id.into_inner(),
                    })?;
                let status = ObligationService::transition(model.status.into(), to)?;
                let mut active: incomes::ActiveModel = model.into();
                active.status = Set(status.into());
                active.update(&txn).await?;
                status
            }
        };

        let mut cancelled_children = 0;
        if status == ObligationStatus::Cancelled {
            let rows = children(&txn, parent).await?;
            for transaction in ObligationService::pending_to_cancel(&rows) {
                let settlement = LedgerService::cancel(transaction)?;
                apply_settlement(&txn, &settlement).await?;
                cancelled_children += 1;
            }
        }

        txn.commit().await?;
        info!(%parent, %status, cancelled_children, "obligation status changed");
        Ok(StatusChange {
            status,
            cancelled_children,
        })
    }

    /// Tops up every active recurring parent up to its horizon as of `today`.
    ///
    /// Each parent runs in its own database transaction under its row lock,
    /// so a failure is recorded in the report and the batch continues.
    /// Running it twice on the same day creates nothing the second time.
    ///
    /// # Errors
    ///
    /// Returns an error only if the parents cannot be listed.
    pub async fn top_up_horizons(
        &self,
        today: NaiveDate,
    ) -> Result<HorizonReport, RepositoryError> {
        let mut parents: Vec<ParentRef> = accounts::Entity::find()
            .filter(accounts::Column::Status.eq(DbObligationStatus::Active))
            .filter(Expr::cust("policy->>'type' = 'recurring'"))
            .select_only()
            .column(accounts::Column::Id)
            .into_tuple::<uuid::Uuid>()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|id| ParentRef::Account(AccountId::from(id)))
            .collect();
        parents.extend(
            incomes::Entity::find()
                .filter(incomes::Column::Status.eq(DbObligationStatus::Active))
                .filter(Expr::cust("policy->>'type' = 'recurring'"))
                .select_only()
                .column(incomes::Column::Id)
                .into_tuple::<uuid::Uuid>()
                .all(&self.db)
                .await?
                .into_iter()
                .map(|id| ParentRef::Income(IncomeId::from(id))),
        );

        let mut report = HorizonReport::default();
        for parent in parents {
            match self.top_up_one(parent, today).await {
                Ok(None) => report.parents_skipped += 1,
                Ok(Some(0)) => {}
                Ok(Some(created)) => {
                    report.parents_extended += 1;
                    report.drafts_created += created;
                }
                Err(err) => {
                    warn!(%parent, error_code = err.error_code(), %err, "horizon top-up failed");
                    report.failures.push(HorizonFailure {
                        parent,
                        error_code: err.error_code(),
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            extended = report.parents_extended,
            skipped = report.parents_skipped,
            created = report.drafts_created,
            failed = report.failures.len(),
            "horizon top-up finished"
        );
        Ok(report)
    }

    /// `None` when the parent stopped qualifying since it was listed.
    async fn top_up_one(
        &self,
        parent: ParentRef,
        today: NaiveDate,
    ) -> Result<Option<usize>, RepositoryError> {
        let txn = self.db.begin().await?;
        lock_parent(&txn, parent).await?;
        let loaded = find_obligation(&txn, parent).await?;
        let obligation = loaded.as_recurring();

        let Some(horizon) = obligation
            .is_active()
            .then(|| obligation.policy().horizon_for(today))
            .flatten()
        else {
            return Ok(None);
        };

        let existing = max_due_date(&txn, parent).await?;
        let drafts = TransactionGenerator::top_up(obligation, existing, horizon)?;
        let saved = insert_drafts(&txn, &drafts).await?;
        txn.commit().await?;
        Ok(Some(saved.len()))
    }
}

async fn find_obligation<C: ConnectionTrait>(
    conn: &C,
    parent: ParentRef,
) -> Result<Obligation, RepositoryError> {
    match parent {
        ParentRef::Account(id) => {
            let model = accounts::Entity::find_by_id(id.into_inner())
                .one(conn)
                .await?
                .ok_or(StoreError::NotFound {
                    entity: "account",
                    id: id.into_inner(),
                })?;
            Ok(Obligation::Account(account_from_model(model)?))
        }
        ParentRef::Income(id) => {
            let model = incomes::Entity::find_by_id(id.into_inner())
                .one(conn)
                .await?
                .ok_or(StoreError::NotFound {
                    entity: "income",
                    id: id.into_inner(),
                })?;
            Ok(Obligation::Income(income_from_model(model)?))
        }
    }
}

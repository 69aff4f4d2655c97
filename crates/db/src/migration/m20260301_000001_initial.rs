//! Initial database migration.
//!
//! Creates the enums, wallets, parents (accounts and incomes), their
//! materialized transactions and budgets.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: WALLETS
        // ============================================================
        db.execute_unprepared(WALLETS_SQL).await?;

        // ============================================================
        // PART 3: PARENTS
        // ============================================================
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(INCOMES_SQL).await?;

        // ============================================================
        // PART 4: TRANSACTIONS
        // ============================================================
        db.execute_unprepared(TRANSACTIONS_SQL).await?;

        // ============================================================
        // PART 5: BUDGETS
        // ============================================================
        db.execute_unprepared(BUDGETS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE wallet_type AS ENUM ('checking', 'credit_card');

CREATE TYPE obligation_status AS ENUM ('active', 'completed', 'cancelled');

-- 'overdue' is derived at read time and never stored
CREATE TYPE transaction_status AS ENUM ('pending', 'settled', 'cancelled');

CREATE TYPE budget_recurrence AS ENUM ('monthly', 'once');
";

const WALLETS_SQL: &str = r"
CREATE TABLE wallets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_id UUID NOT NULL,
    name VARCHAR(255) NOT NULL,
    wallet_type wallet_type NOT NULL DEFAULT 'checking',
    initial_balance BIGINT NOT NULL DEFAULT 0,
    card_limit BIGINT,
    card_limit_used BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_card_limit CHECK (
        (wallet_type = 'credit_card' AND card_limit IS NOT NULL AND card_limit >= 0)
        OR (wallet_type = 'checking' AND card_limit IS NULL)
    )
);

CREATE INDEX idx_wallets_owner ON wallets(owner_id);
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_id UUID NOT NULL,
    wallet_id UUID NOT NULL REFERENCES wallets(id),
    category_id UUID,
    name VARCHAR(255) NOT NULL,
    note TEXT,
    policy JSONB NOT NULL,
    status obligation_status NOT NULL DEFAULT 'active',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_accounts_owner ON accounts(owner_id);
CREATE INDEX idx_accounts_recurring ON accounts(status) WHERE policy->>'type' = 'recurring';
";

const INCOMES_SQL: &str = r"
CREATE TABLE incomes (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_id UUID NOT NULL,
    wallet_id UUID NOT NULL REFERENCES wallets(id),
    category_id UUID,
    name VARCHAR(255) NOT NULL,
    note TEXT,
    policy JSONB NOT NULL,
    status obligation_status NOT NULL DEFAULT 'active',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_incomes_owner ON incomes(owner_id);
CREATE INDEX idx_incomes_recurring ON incomes(status) WHERE policy->>'type' = 'recurring';
";

const TRANSACTIONS_SQL: &str = r"
CREATE TABLE transactions (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    account_id UUID REFERENCES accounts(id) ON DELETE CASCADE,
    income_id UUID REFERENCES incomes(id) ON DELETE CASCADE,
    owner_id UUID NOT NULL,
    wallet_id UUID NOT NULL REFERENCES wallets(id),
    category_id UUID,
    amount BIGINT NOT NULL CHECK (amount >= 0),
    due_date DATE NOT NULL,
    settled_at DATE,
    installment_number INTEGER NOT NULL CHECK (installment_number >= 1),
    total_installments INTEGER CHECK (total_installments >= 1),
    status transaction_status NOT NULL DEFAULT 'pending',
    limit_drawn BIGINT,
    version BIGINT NOT NULL DEFAULT 0,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT chk_single_parent CHECK (num_nonnulls(account_id, income_id) = 1),
    CONSTRAINT chk_settled_at CHECK ((status = 'settled') = (settled_at IS NOT NULL)),
    CONSTRAINT uq_account_due_date UNIQUE (account_id, due_date),
    CONSTRAINT uq_income_due_date UNIQUE (income_id, due_date)
);

CREATE INDEX idx_txn_owner_due ON transactions(owner_id, due_date);
CREATE INDEX idx_txn_wallet ON transactions(wallet_id);
CREATE INDEX idx_txn_pending ON transactions(owner_id, due_date) WHERE status = 'pending';
";

const BUDGETS_SQL: &str = r"
CREATE TABLE budgets (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    owner_id UUID NOT NULL,
    category_id UUID NOT NULL,
    period DATE NOT NULL CHECK (EXTRACT(DAY FROM period) = 1),
    amount BIGINT NOT NULL CHECK (amount >= 0),
    recurrence budget_recurrence NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    UNIQUE (owner_id, category_id, period, recurrence)
);

CREATE INDEX idx_budgets_owner ON budgets(owner_id);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_wallets_updated_at BEFORE UPDATE ON wallets
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_accounts_updated_at BEFORE UPDATE ON accounts
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_incomes_updated_at BEFORE UPDATE ON incomes
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
CREATE TRIGGER trg_transactions_updated_at BEFORE UPDATE ON transactions
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS budgets CASCADE;
DROP TABLE IF EXISTS transactions CASCADE;
DROP TABLE IF EXISTS incomes CASCADE;
DROP TABLE IF EXISTS accounts CASCADE;
DROP TABLE IF EXISTS wallets CASCADE;
DROP FUNCTION IF EXISTS set_updated_at() CASCADE;
DROP TYPE IF EXISTS budget_recurrence;
DROP TYPE IF EXISTS transaction_status;
DROP TYPE IF EXISTS obligation_status;
DROP TYPE IF EXISTS wallet_type;
";

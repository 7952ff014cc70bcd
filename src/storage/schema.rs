//! Table definitions for the proposal store.
//!
//! Column names follow the upstream proposal database. Note the orders table
//! keys by `enriched_proposals_id` (plural) while the constraints table uses
//! `enriched_proposal_id`.

/// Constraint-evaluation table name.
pub const CONSTRAINTS_TABLE: &str = "enriched_proposal_evaluated_constraints";

/// Orders table name.
pub const ORDERS_TABLE: &str = "enriched_proposals_orders";

/// Creates both tables and their lookup indexes.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE IF NOT EXISTS enriched_proposal_evaluated_constraints (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    enriched_proposal_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    violated INTEGER NOT NULL DEFAULT 0,
    rule_scope TEXT,
    validation_mode TEXT,
    rule_group_type TEXT,
    evaluated_at DATETIME DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_epec_proposal
    ON enriched_proposal_evaluated_constraints (enriched_proposal_id, violated);

CREATE TABLE IF NOT EXISTS enriched_proposals_orders (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    enriched_proposals_id INTEGER NOT NULL,
    transaction_type TEXT NOT NULL,
    isin TEXT,
    quantity INTEGER NOT NULL,
    price_value DECIMAL(18, 4),
    cash_currency_used TEXT,
    adjusted_quantity DECIMAL(18, 4),
    target_quantity DECIMAL(18, 4)
);

CREATE INDEX IF NOT EXISTS idx_epo_proposal
    ON enriched_proposals_orders (enriched_proposals_id);
";

/// Counts how many of the two tables exist.
pub const COUNT_TABLES_SQL: &str = "SELECT COUNT(*) FROM sqlite_master \
     WHERE type = 'table' \
     AND name IN ('enriched_proposal_evaluated_constraints', 'enriched_proposals_orders')";

/// Violated constraints for one proposal.
pub const VIOLATED_CONSTRAINTS_SQL: &str = "SELECT enriched_proposal_id, name, violated, \
     rule_scope, validation_mode, rule_group_type \
     FROM enriched_proposal_evaluated_constraints \
     WHERE enriched_proposal_id = ?1 AND violated = 1 \
     ORDER BY id";

/// All orders for one proposal.
pub const ORDERS_SQL: &str = "SELECT id, transaction_type, isin, quantity, \
     cash_currency_used, adjusted_quantity, target_quantity \
     FROM enriched_proposals_orders \
     WHERE enriched_proposals_id = ?1 \
     ORDER BY id";

/// Every proposal with at least one evaluated constraint.
pub const PROPOSAL_IDS_SQL: &str = "SELECT DISTINCT enriched_proposal_id \
     FROM enriched_proposal_evaluated_constraints \
     ORDER BY enriched_proposal_id";

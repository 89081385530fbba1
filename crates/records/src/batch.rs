//! Batch assembly: routes decoded documents into typed collections, then
//! deduplicates and orders them.
//!
//! ```text
//!             ┌────────────┐   ingest    ┌──────────────────────────┐
//!  Document ─▶│ leaf match │────────────▶│ Dataset (11 collections) │
//!             └────────────┘             └────────────┬─────────────┘
//!                                                     │ finish
//!                                                     ▼
//!                                         dedup + deterministic sort
//! ```
//!
//! Duplicates exist because the cache holds multiple log files with
//! overlapping snapshots of the same documents. Identity is semantic, not
//! key-based: two files can store the same transaction under different
//! document ids.

use firestore::Document;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::account::Account;
use crate::budget::Budget;
use crate::category::Category;
use crate::customization::UserAccountCustomization;
use crate::goal::{Goal, GoalHistory};
use crate::investment::{InvestmentPrice, InvestmentSplit};
use crate::item::Item;
use crate::money::cents;
use crate::recurring::Recurring;
use crate::transaction::Transaction;

pub const TRANSACTIONS: &str = "transactions";
pub const ACCOUNTS: &str = "accounts";
pub const RECURRINGS: &str = "recurrings";
pub const BUDGETS: &str = "budgets";
pub const FINANCIAL_GOALS: &str = "financial_goals";
pub const FINANCIAL_GOAL_HISTORY: &str = "financial_goal_history";
pub const INVESTMENT_PRICES: &str = "investment_prices";
pub const INVESTMENT_SPLITS: &str = "investment_splits";
pub const ITEMS: &str = "items";
pub const CATEGORIES: &str = "categories";
pub const USER_ACCOUNT_CUSTOMIZATIONS: &str = "user_account_customizations";

/// Every collection the decoder recognizes, in routing order.
pub const KNOWN_COLLECTIONS: &[&str] = &[
    TRANSACTIONS,
    ACCOUNTS,
    RECURRINGS,
    BUDGETS,
    FINANCIAL_GOALS,
    FINANCIAL_GOAL_HISTORY,
    INVESTMENT_PRICES,
    INVESTMENT_SPLITS,
    ITEMS,
    CATEGORIES,
    USER_ACCOUNT_CUSTOMIZATIONS,
];

/// All typed records decoded from one pass over the cache.
#[derive(Debug, Default, Clone, Serialize)]
pub struct Dataset {
    pub transactions: Vec<Transaction>,
    pub accounts: Vec<Account>,
    pub recurrings: Vec<Recurring>,
    pub budgets: Vec<Budget>,
    pub goals: Vec<Goal>,
    pub goal_history: Vec<GoalHistory>,
    pub investment_prices: Vec<InvestmentPrice>,
    pub investment_splits: Vec<InvestmentSplit>,
    pub items: Vec<Item>,
    pub categories: Vec<Category>,
    pub account_customizations: Vec<UserAccountCustomization>,
}

impl Dataset {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes one document by its leaf collection. Documents from unknown
    /// collections and documents that fail a builder's field gate are
    /// silently skipped.
    pub fn ingest(&mut self, doc: &Document) {
        match doc.leaf_collection() {
            TRANSACTIONS => {
                if let Some(r) = Transaction::from_document(doc) {
                    self.transactions.push(r);
                }
            }
            ACCOUNTS => {
                if let Some(r) = Account::from_document(doc) {
                    self.accounts.push(r);
                }
            }
            RECURRINGS => {
                if let Some(r) = Recurring::from_document(doc) {
                    self.recurrings.push(r);
                }
            }
            BUDGETS => {
                if let Some(r) = Budget::from_document(doc) {
                    self.budgets.push(r);
                }
            }
            FINANCIAL_GOALS => {
                if let Some(r) = Goal::from_document(doc) {
                    self.goals.push(r);
                }
            }
            FINANCIAL_GOAL_HISTORY => {
                if let Some(r) = GoalHistory::from_document(doc) {
                    self.goal_history.push(r);
                }
            }
            INVESTMENT_PRICES => {
                if let Some(r) = InvestmentPrice::from_document(doc) {
                    self.investment_prices.push(r);
                }
            }
            INVESTMENT_SPLITS => {
                if let Some(r) = InvestmentSplit::from_document(doc) {
                    self.investment_splits.push(r);
                }
            }
            ITEMS => {
                if let Some(r) = Item::from_document(doc) {
                    self.items.push(r);
                }
            }
            CATEGORIES => {
                if let Some(r) = Category::from_document(doc) {
                    self.categories.push(r);
                }
            }
            USER_ACCOUNT_CUSTOMIZATIONS => {
                if let Some(r) = UserAccountCustomization::from_document(doc) {
                    self.account_customizations.push(r);
                }
            }
            other => debug!(collection = other, "skipping unrecognized collection"),
        }
    }

    /// Deduplicates and sorts every collection. Call once after the last
    /// `ingest`; the result is deterministic regardless of input order
    /// within a duplicate group's first occurrence.
    pub fn finish(&mut self) {
        // First occurrence wins within each identity group.
        dedup_first_wins(&mut self.transactions, |t| {
            (t.display_name().to_string(), cents(t.amount), t.date.clone())
        });
        dedup_first_wins(&mut self.accounts, |a| {
            (a.display_name().to_string(), a.mask.clone())
        });
        dedup_first_wins(&mut self.recurrings, |r| r.recurring_id.clone());
        dedup_first_wins(&mut self.budgets, |b| b.budget_id.clone());
        dedup_first_wins(&mut self.goals, |g| g.goal_id.clone());
        dedup_first_wins(&mut self.goal_history, |h| {
            (h.goal_id.clone(), h.month.clone())
        });
        dedup_first_wins(&mut self.investment_prices, |p| p.price_id.clone());
        dedup_first_wins(&mut self.investment_splits, |s| s.split_id.clone());
        dedup_first_wins(&mut self.items, |i| i.item_id.clone());
        dedup_first_wins(&mut self.categories, |c| c.category_id.clone());
        dedup_first_wins(&mut self.account_customizations, |c| c.account_id.clone());

        self.transactions
            .sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.transaction_id.cmp(&b.transaction_id)));
        self.accounts
            .sort_by(|a, b| a.display_name().cmp(b.display_name()));
        self.recurrings.sort_by(|a, b| a.name.cmp(&b.name));
        self.budgets
            .sort_by(|a, b| b.month.cmp(&a.month).then_with(|| a.category_id.cmp(&b.category_id)));
        self.goals.sort_by(|a, b| a.name.cmp(&b.name));
        self.goal_history
            .sort_by(|a, b| a.goal_id.cmp(&b.goal_id).then_with(|| b.month.cmp(&a.month)));
        self.investment_prices
            .sort_by(|a, b| a.symbol.cmp(&b.symbol).then_with(|| b.date.cmp(&a.date)));
        self.investment_splits
            .sort_by(|a, b| a.symbol.cmp(&b.symbol).then_with(|| b.date.cmp(&a.date)));
        self.items.sort_by(|a, b| a.institution_name.cmp(&b.institution_name));
        self.categories.sort_by(|a, b| a.name.cmp(&b.name));
        self.account_customizations
            .sort_by(|a, b| a.account_id.cmp(&b.account_id));
    }

    /// Total records across all collections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.transactions.len()
            + self.accounts.len()
            + self.recurrings.len()
            + self.budgets.len()
            + self.goals.len()
            + self.goal_history.len()
            + self.investment_prices.len()
            + self.investment_splits.len()
            + self.items.len()
            + self.categories.len()
            + self.account_customizations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn dedup_first_wins<T, K, F>(records: &mut Vec<T>, mut key: F)
where
    K: std::hash::Hash + Eq,
    F: FnMut(&T) -> K,
{
    let mut seen = HashSet::new();
    records.retain(|r| seen.insert(key(r)));
}

//! Typed record models over decoded cache documents.
//!
//! Each collection the finance app stores gets a builder that lifts a
//! generic [`firestore::Document`] into a typed record, gating on the
//! fields that make the record meaningful:
//!
//! | collection                     | record                        |
//! |--------------------------------|-------------------------------|
//! | `transactions`                 | [`Transaction`]               |
//! | `accounts`                     | [`Account`]                   |
//! | `recurrings`                   | [`Recurring`]                 |
//! | `budgets`                      | [`Budget`]                    |
//! | `financial_goals`              | [`Goal`]                      |
//! | `financial_goal_history`       | [`GoalHistory`]               |
//! | `investment_prices`            | [`InvestmentPrice`]           |
//! | `investment_splits`            | [`InvestmentSplit`]           |
//! | `items`                        | [`Item`]                      |
//! | `categories`                   | [`Category`]                  |
//! | `user_account_customizations`  | [`UserAccountCustomization`]  |
//!
//! A builder returning `None` means the document lacked the required
//! fields; the batch moves on. [`Dataset`] collects all eleven collections
//! in one pass and applies deduplication and deterministic ordering.

pub mod account;
pub mod batch;
pub mod budget;
pub mod category;
pub mod customization;
mod fields;
pub mod goal;
pub mod investment;
pub mod item;
pub mod money;
pub mod recurring;
pub mod transaction;

pub use account::Account;
pub use batch::{Dataset, KNOWN_COLLECTIONS};
pub use budget::Budget;
pub use category::Category;
pub use customization::UserAccountCustomization;
pub use goal::{Goal, GoalHistory};
pub use investment::{InvestmentPrice, InvestmentSplit};
pub use item::Item;
pub use recurring::Recurring;
pub use transaction::Transaction;

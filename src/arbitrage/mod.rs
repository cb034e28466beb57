//! Carry Opportunity Detection Module
//! Mission: Identify and rank borrow-then-stake spreads within and across exchanges
//! Philosophy: Profit is in the spread between what you pay and what you earn

pub mod engine;
pub mod labels;

pub use engine::{
    best_staking_across_exchanges, find_cross_opportunities, find_intra_opportunities,
    hot_loans, merge_summary, OpportunityEngine,
};
pub use labels::{profitability_label, LoanReason, ProfitTier};

//! Opportunity Matching Engine
//! Mission: Turn per-exchange loan and staking tables into ranked carry opportunities
//! Philosophy: Borrow where it is cheapest, stake where it pays the most

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

use tracing::{debug, info};

use crate::arbitrage::labels::{profitability_label, LoanReason};
use crate::models::{
    AnalysisReport, Coin, ExchangeSnapshot, Opportunity, OpportunityKind, RankedLoan,
    RankedStaking,
};

/// Minimum net spread (percentage points) worth reporting
pub const DEFAULT_MIN_PROFIT_THRESHOLD: f64 = 0.1;

/// Staking products must pay strictly more than this to be "best staking"
pub const DEFAULT_STAKING_APY_FLOOR: f64 = 5.0;

/// Loans must cost strictly more than this to be "hot"
pub const DEFAULT_HOT_LOAN_RATE_FLOOR: f64 = 15.0;

/// Stateless engine carrying the thresholds for one analysis configuration
#[derive(Debug, Clone, Copy)]
pub struct OpportunityEngine {
    pub min_profit_threshold: f64,
    pub staking_apy_floor: f64,
    pub hot_loan_rate_floor: f64,
}

impl Default for OpportunityEngine {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_PROFIT_THRESHOLD)
    }
}

impl OpportunityEngine {
    pub fn new(min_profit_threshold: f64) -> Self {
        Self {
            min_profit_threshold,
            staking_apy_floor: DEFAULT_STAKING_APY_FLOOR,
            hot_loan_rate_floor: DEFAULT_HOT_LOAN_RATE_FLOOR,
        }
    }

    pub fn with_floors(mut self, staking_apy_floor: f64, hot_loan_rate_floor: f64) -> Self {
        self.staking_apy_floor = staking_apy_floor;
        self.hot_loan_rate_floor = hot_loan_rate_floor;
        self
    }

    /// Run every pass over fully materialized snapshots.
    pub fn analyze(&self, snapshots: &[ExchangeSnapshot]) -> AnalysisReport {
        let intra = find_intra_opportunities(snapshots, self.min_profit_threshold);
        let cross = find_cross_opportunities(snapshots, self.min_profit_threshold);
        let summary = merge_summary(&intra, &cross);
        let best_staking = best_staking_across_exchanges(snapshots, self.staking_apy_floor);
        let hot = hot_loans(snapshots, self.hot_loan_rate_floor);

        info!(
            exchanges = snapshots.len(),
            intra = intra.len(),
            cross = cross.len(),
            summary = summary.len(),
            "🎯 Analysis complete"
        );

        AnalysisReport {
            intra,
            cross,
            summary,
            best_staking,
            hot_loans: hot,
        }
    }
}

/// Borrow and stake the same coin on the same exchange.
pub fn find_intra_opportunities(
    snapshots: &[ExchangeSnapshot],
    min_profit_threshold: f64,
) -> Vec<Opportunity> {
    let mut opportunities = Vec::new();

    for snapshot in snapshots {
        let mut common = 0usize;
        for coin in snapshot.common_coins() {
            common += 1;
            let loan = &snapshot.loan_rates[coin];
            let staking = &snapshot.staking_rates[coin];
            debug_assert!(loan.rate.is_finite() && staking.apy.is_finite());

            let net_profit = staking.apy - loan.rate;
            if net_profit >= min_profit_threshold {
                opportunities.push(Opportunity {
                    coin: coin.clone(),
                    borrow_exchange: snapshot.exchange_name.clone(),
                    borrow_rate: loan.rate,
                    staking_exchange: snapshot.exchange_name.clone(),
                    staking_apy: staking.apy,
                    net_profit,
                    profitability_label: profitability_label(net_profit).to_string(),
                    kind: OpportunityKind::IntraExchange,
                });
            }
        }
        debug!(
            exchange = %snapshot.exchange_name,
            common_coins = common,
            "Intra pass"
        );
    }

    rank_by_net_profit(&mut opportunities);
    opportunities
}

/// Borrow on the cheapest venue and stake on the best-paying one, when they differ.
pub fn find_cross_opportunities(
    snapshots: &[ExchangeSnapshot],
    min_profit_threshold: f64,
) -> Vec<Opportunity> {
    let mut opportunities = Vec::new();

    for coin in coin_universe(snapshots) {
        let Some((staking_exchange, staking_apy)) = best_staking_venue(coin, snapshots) else {
            continue;
        };
        let Some((borrow_exchange, borrow_rate)) = best_loan_venue(coin, snapshots) else {
            continue;
        };

        // Same venue is the intra pass's business
        if staking_exchange == borrow_exchange {
            continue;
        }

        let net_profit = staking_apy - borrow_rate;
        if net_profit >= min_profit_threshold {
            opportunities.push(Opportunity {
                coin: coin.clone(),
                borrow_exchange: borrow_exchange.to_string(),
                borrow_rate,
                staking_exchange: staking_exchange.to_string(),
                staking_apy,
                net_profit,
                profitability_label: profitability_label(net_profit).to_string(),
                kind: OpportunityKind::CrossExchange,
            });
        }
    }

    rank_by_net_profit(&mut opportunities);
    opportunities
}

/// Union of intra and cross without duplicates; intra entries shadow cross ones.
pub fn merge_summary(intra: &[Opportunity], cross: &[Opportunity]) -> Vec<Opportunity> {
    let mut seen: HashSet<(&Coin, &str, &str)> = HashSet::new();
    let mut merged = Vec::with_capacity(intra.len() + cross.len());

    for opp in intra.iter().chain(cross.iter()) {
        if seen.insert(opp.key()) {
            merged.push(opp.clone());
        }
    }

    rank_by_net_profit(&mut merged);
    merged
}

/// Every staking quote above the floor, highest APY first.
pub fn best_staking_across_exchanges(
    snapshots: &[ExchangeSnapshot],
    apy_floor: f64,
) -> Vec<RankedStaking> {
    let mut ranked: Vec<RankedStaking> = snapshots
        .iter()
        .flat_map(|snapshot| {
            snapshot
                .staking_rates
                .iter()
                .filter(move |(_, quote)| quote.apy > apy_floor)
                .map(move |(coin, quote)| RankedStaking {
                    coin: coin.clone(),
                    exchange: snapshot.exchange_name.clone(),
                    apy: quote.apy,
                    min_amount: quote.min_amount,
                    max_amount: quote.max_amount,
                })
        })
        .collect();

    ranked.sort_by(|a, b| descending(a.apy, b.apy));
    ranked
}

/// Every loan quote above the floor, most expensive first, with a demand reason.
pub fn hot_loans(snapshots: &[ExchangeSnapshot], rate_floor: f64) -> Vec<RankedLoan> {
    let mut ranked: Vec<RankedLoan> = snapshots
        .iter()
        .flat_map(|snapshot| {
            snapshot
                .loan_rates
                .iter()
                .filter(move |(_, quote)| quote.rate > rate_floor)
                .map(move |(coin, quote)| RankedLoan {
                    coin: coin.clone(),
                    exchange: snapshot.exchange_name.clone(),
                    rate: quote.rate,
                    min_amount: quote.min_amount,
                    max_amount: quote.max_amount,
                    reason: LoanReason::from_rate(quote.rate).label().to_string(),
                })
        })
        .collect();

    ranked.sort_by(|a, b| descending(a.rate, b.rate));
    ranked
}

fn coin_universe(snapshots: &[ExchangeSnapshot]) -> BTreeSet<&Coin> {
    snapshots
        .iter()
        .flat_map(|s| s.loan_rates.keys().chain(s.staking_rates.keys()))
        .collect()
}

/// Highest APY for `coin`; equal APYs resolve to the alphabetically first exchange.
fn best_staking_venue<'a>(coin: &Coin, snapshots: &'a [ExchangeSnapshot]) -> Option<(&'a str, f64)> {
    snapshots
        .iter()
        .filter_map(|s| {
            s.staking_rates
                .get(coin)
                .map(|q| (s.exchange_name.as_str(), q.apy))
        })
        .fold(None, |best, candidate| match best {
            Some(current) if !beats(candidate, current, Ordering::Greater) => Some(current),
            _ => Some(candidate),
        })
}

/// Lowest loan rate for `coin`; equal rates resolve to the alphabetically first exchange.
fn best_loan_venue<'a>(coin: &Coin, snapshots: &'a [ExchangeSnapshot]) -> Option<(&'a str, f64)> {
    snapshots
        .iter()
        .filter_map(|s| {
            s.loan_rates
                .get(coin)
                .map(|q| (s.exchange_name.as_str(), q.rate))
        })
        .fold(None, |best, candidate| match best {
            Some(current) if !beats(candidate, current, Ordering::Less) => Some(current),
            _ => Some(candidate),
        })
}

/// `candidate` replaces `current` when its value compares as `wanted`,
/// or on an exact tie when its exchange name sorts first.
fn beats(candidate: (&str, f64), current: (&str, f64), wanted: Ordering) -> bool {
    match candidate.1.partial_cmp(&current.1) {
        Some(ord) if ord == wanted => true,
        Some(Ordering::Equal) => candidate.0 < current.0,
        _ => false,
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    b.partial_cmp(&a).unwrap_or(Ordering::Equal)
}

/// Stable sort, highest net profit first
fn rank_by_net_profit(opportunities: &mut [Opportunity]) {
    opportunities.sort_by(|a, b| descending(a.net_profit, b.net_profit));
}

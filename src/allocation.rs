//! Daily buy-plan computation.
//!
//! Pure over the loaded basket settings and the quotes fetched this run:
//! no I/O, no clock, no mutation of the config.

use std::collections::{BTreeMap, HashMap};

use crate::config::TickerSettings;
use crate::quotes::Quote;

/// Fixed "meaningful dip" cutoff that gates the pool pass. Deliberately
/// independent of the configurable `threshold` that gates the allocation
/// pass; the two may disagree about a ticker.
pub const DIP_POOL_CUTOFF: f64 = -0.1;

#[derive(Debug, Default, PartialEq)]
pub struct BuyPlan {
    /// Symbol -> whole shares to buy. Zero-share entries are never kept.
    pub orders: BTreeMap<String, u32>,
    pub total_expenditure: f64,
}

/// Split today's budget across the tickers that dipped, proportional to
/// weight * rebalance_factor * |pct_change|.
///
/// The budget released for dip-buying is funded only by tickers past the
/// hard [`DIP_POOL_CUTOFF`]; the looser `threshold` decides who may draw
/// from it. Tickers with no quote this run are skipped in both passes.
pub fn compute_buys(
    daily_limit: f64,
    threshold: f64,
    tickers: &BTreeMap<String, TickerSettings>,
    quotes: &HashMap<String, Quote>,
) -> BuyPlan {
    let mut plan = BuyPlan::default();
    if tickers.is_empty() {
        return plan;
    }

    let per_ticker = daily_limit / tickers.len() as f64;

    let mut total_dip = 0.0;
    let mut pool = 0.0;
    for (symbol, settings) in tickers {
        if let Some(quote) = quotes.get(symbol) {
            if quote.pct_change < DIP_POOL_CUTOFF {
                total_dip += dip_severity(settings, quote);
                pool += settings.weight * per_ticker;
            }
        }
    }

    // Nothing dipped far enough today; never divide by the empty pool.
    if total_dip == 0.0 {
        return plan;
    }

    for (symbol, settings) in tickers {
        let Some(quote) = quotes.get(symbol) else {
            continue;
        };
        if quote.pct_change >= threshold || quote.last_price <= 0.0 {
            continue;
        }

        let dip = dip_severity(settings, quote);
        let alloted = pool * dip / total_dip;
        let shares = nearest_whole_shares(alloted, quote.last_price);
        if shares > 0 {
            plan.total_expenditure += shares as f64 * quote.last_price;
            plan.orders.insert(symbol.clone(), shares);
        }
    }

    plan
}

fn dip_severity(settings: &TickerSettings, quote: &Quote) -> f64 {
    (settings.weight * settings.rebalance_factor * quote.pct_change).abs()
}

/// Round the fractional share count to whichever integer lands closer to the
/// alloted amount in currency terms (absolute deviation, not relative).
fn nearest_whole_shares(alloted: f64, price: f64) -> u32 {
    let ideal = alloted / price;
    let lo = ideal.floor();
    let hi = ideal.ceil();
    let chosen = if alloted - lo * price < hi * price - alloted {
        lo
    } else {
        hi
    };
    chosen as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(weight: f64, rebalance_factor: f64) -> TickerSettings {
        TickerSettings {
            weight,
            rebalance_factor,
        }
    }

    fn quote(last_price: f64, pct_change: f64) -> Quote {
        Quote {
            last_price,
            pct_change,
        }
    }

    #[test]
    fn two_ticker_proportional_split() {
        let tickers = BTreeMap::from([
            ("A".to_string(), settings(2.0, 1.0)),
            ("B".to_string(), settings(1.0, 2.0)),
        ]);
        let quotes = HashMap::from([
            ("A".to_string(), quote(100.0, -1.0)),
            ("B".to_string(), quote(50.0, -0.5)),
        ]);

        // per_ticker = 500, total_dip = 2 + 1 = 3, pool = 1500.
        // A draws 1000 -> 10 shares, B draws 500 -> 10 shares.
        let plan = compute_buys(1000.0, 0.0, &tickers, &quotes);
        assert_eq!(plan.orders["A"], 10);
        assert_eq!(plan.orders["B"], 10);
        assert_eq!(plan.total_expenditure, 1500.0);
    }

    #[test]
    fn no_quotes_means_empty_plan() {
        let tickers = BTreeMap::from([("A".to_string(), settings(2.0, 1.0))]);
        let plan = compute_buys(1000.0, 0.0, &tickers, &HashMap::new());
        assert!(plan.orders.is_empty());
        assert_eq!(plan.total_expenditure, 0.0);
    }

    #[test]
    fn empty_ticker_set_means_empty_plan() {
        let plan = compute_buys(1000.0, 0.0, &BTreeMap::new(), &HashMap::new());
        assert!(plan.orders.is_empty());
    }

    #[test]
    fn shallow_dips_leave_the_pool_empty() {
        // -0.05 never passes the -0.1 pool cutoff, so total_dip stays 0 and
        // the run short-circuits even though the threshold gate would admit it.
        let tickers = BTreeMap::from([("A".to_string(), settings(3.0, 1.0))]);
        let quotes = HashMap::from([("A".to_string(), quote(10.0, -0.05))]);
        let plan = compute_buys(1000.0, 0.0, &tickers, &quotes);
        assert!(plan.orders.is_empty());
        assert_eq!(plan.total_expenditure, 0.0);
    }

    #[test]
    fn missing_quote_excludes_only_that_ticker() {
        let tickers = BTreeMap::from([
            ("A".to_string(), settings(1.0, 1.0)),
            ("B".to_string(), settings(1.0, 1.0)),
        ]);
        let quotes = HashMap::from([("A".to_string(), quote(10.0, -1.0))]);

        // per_ticker still divides by both tickers: pool = 1 * 150 = 150.
        let plan = compute_buys(300.0, 0.0, &tickers, &quotes);
        assert_eq!(plan.orders.len(), 1);
        assert_eq!(plan.orders["A"], 15);
        assert_eq!(plan.total_expenditure, 150.0);
    }

    #[test]
    fn threshold_gate_blocks_allocation() {
        // Deep enough for the pool (-1.0 < -0.1) but not for a threshold of
        // -2.0, so the pool fills and nobody may draw from it.
        let tickers = BTreeMap::from([("A".to_string(), settings(1.0, 1.0))]);
        let quotes = HashMap::from([("A".to_string(), quote(10.0, -1.0))]);
        let plan = compute_buys(300.0, -2.0, &tickers, &quotes);
        assert!(plan.orders.is_empty());
    }

    #[test]
    fn threshold_admits_tickers_outside_the_pool() {
        // B's -0.05 fails the pool cutoff yet passes threshold 0, so it draws
        // from a pool funded entirely by A. The combined spend may exceed the
        // pool itself; the daily limit is a soft bound.
        let tickers = BTreeMap::from([
            ("A".to_string(), settings(1.0, 1.0)),
            ("B".to_string(), settings(1.0, 1.0)),
        ]);
        let quotes = HashMap::from([
            ("A".to_string(), quote(10.0, -1.0)),
            ("B".to_string(), quote(5.0, -0.05)),
        ]);

        let plan = compute_buys(300.0, 0.0, &tickers, &quotes);
        assert_eq!(plan.orders["A"], 15);
        assert_eq!(plan.orders["B"], 2);
        assert_eq!(plan.total_expenditure, 160.0);
    }

    #[test]
    fn zero_share_allocations_are_dropped() {
        // B's allotment is far below one share of its expensive stock.
        let tickers = BTreeMap::from([
            ("A".to_string(), settings(10.0, 1.0)),
            ("B".to_string(), settings(1.0, 0.01)),
        ]);
        let quotes = HashMap::from([
            ("A".to_string(), quote(10.0, -5.0)),
            ("B".to_string(), quote(100000.0, -5.0)),
        ]);

        let plan = compute_buys(100.0, 0.0, &tickers, &quotes);
        assert!(plan.orders.contains_key("A"));
        assert!(!plan.orders.contains_key("B"));
    }

    #[test]
    fn all_orders_are_positive_and_below_threshold() {
        let tickers = BTreeMap::from([
            ("A".to_string(), settings(2.0, 1.5)),
            ("B".to_string(), settings(1.0, 1.0)),
            ("C".to_string(), settings(4.0, 0.5)),
        ]);
        let quotes = HashMap::from([
            ("A".to_string(), quote(312.4, -1.7)),
            ("B".to_string(), quote(48.6, 0.3)),
            ("C".to_string(), quote(1021.0, -0.4)),
        ]);

        let threshold = 0.0;
        let plan = compute_buys(5000.0, threshold, &tickers, &quotes);
        assert!(!plan.orders.is_empty());
        for (symbol, shares) in &plan.orders {
            assert!(*shares > 0);
            assert!(quotes[symbol].pct_change < threshold);
        }
    }

    #[test]
    fn rounding_picks_the_currency_closer_integer() {
        for (alloted, price) in [
            (1000.0, 100.0),
            (149.9, 50.0),
            (150.1, 50.0),
            (7.5, 5.0),
            (3.2, 10.0),
            (99.99, 33.3),
        ] {
            let shares = nearest_whole_shares(alloted, price) as f64;
            let ideal = alloted / price;
            let other = if shares == ideal.floor() {
                ideal.ceil()
            } else {
                ideal.floor()
            };
            let chosen_err = (alloted - shares * price).abs();
            let other_err = (alloted - other * price).abs();
            assert!(
                chosen_err <= other_err,
                "alloted={alloted} price={price}: {shares} shares err {chosen_err} > {other_err}"
            );
        }
    }

    #[test]
    fn exact_midpoint_rounds_up() {
        // 7.5 against price 5 sits exactly between 1 and 2 shares; the
        // strict-less comparison sends ties to ceil.
        assert_eq!(nearest_whole_shares(7.5, 5.0), 2);
    }

    #[test]
    fn non_positive_price_is_skipped() {
        let tickers = BTreeMap::from([
            ("A".to_string(), settings(1.0, 1.0)),
            ("B".to_string(), settings(1.0, 1.0)),
        ]);
        let quotes = HashMap::from([
            ("A".to_string(), quote(10.0, -1.0)),
            ("B".to_string(), quote(0.0, -1.0)),
        ]);

        let plan = compute_buys(300.0, 0.0, &tickers, &quotes);
        assert!(!plan.orders.contains_key("B"));
    }
}

//! Weight evolution between cycles.

use chrono::Local;

use crate::allocation::BuyPlan;
use crate::config::Config;

/// Tickers that bought today spent their priority and drop back to weight 1;
/// everyone else gains a point so a ticker that never dips enough still
/// accumulates claim on the budget over time.
///
/// Mutates the in-memory config only; the caller decides whether to persist.
pub fn apply_rebalance(config: &mut Config, plan: &BuyPlan) {
    for (symbol, settings) in config.tickers.iter_mut() {
        if plan.orders.contains_key(symbol) {
            settings.weight = 1.0;
        } else {
            settings.weight += 1.0;
        }
    }
    config.last_updated = Some(Local::now().date_naive());
}

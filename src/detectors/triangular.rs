//! Single-venue triangular arbitrage detection.

use std::collections::HashMap;

use serde::Deserialize;

use crate::domain::{ArbitrageSignalBuilder, ArbitrageStrategy, ArbitrageSignal, OrderBook};

const PREFERRED_START_ASSETS: [&str; 5] = ["USDT", "USDC", "BUSD", "USD", "DAI"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TriangularDetectorConfig {
    pub enabled: bool,
    pub min_profit_pct: f64,
    pub quantity_usd: f64,
    pub fee_pct: f64,
}

impl Default for TriangularDetectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_profit_pct: 0.15,
            quantity_usd: 1_000.0,
            fee_pct: 0.04,
        }
    }
}

struct Leg<'a> {
    symbol: &'a str,
    direction: Direction,
}

struct CycleResult {
    net_pct: f64,
    final_amount: f64,
    min_depth_usd: f64,
    path: Vec<String>,
    directions: Vec<&'static str>,
}

pub struct TriangularDetector {
    config: TriangularDetectorConfig,
}

impl TriangularDetector {
    #[must_use]
    pub fn new(config: TriangularDetectorConfig) -> Self {
        Self { config }
    }

    pub fn detect(&self, venue: &str, books_by_symbol: &HashMap<String, OrderBook>) -> Vec<ArbitrageSignal> {
        if !self.config.enabled {
            return Vec::new();
        }

        let symbols: Vec<&String> = books_by_symbol.keys().collect();
        let mut signals = Vec::new();

        for i in 0..symbols.len() {
            for j in (i + 1)..symbols.len() {
                for k in (j + 1)..symbols.len() {
                    let combo = [symbols[i].as_str(), symbols[j].as_str(), symbols[k].as_str()];
                    let Some(assets) = distinct_triangle_assets(&combo) else { continue };
                    let Some(signal) = self.evaluate_triangle(venue, &combo, assets, books_by_symbol) else {
                        continue;
                    };
                    signals.push(signal);
                }
            }
        }

        signals
    }

    fn evaluate_triangle(
        &self,
        venue: &str,
        combo: &[&str; 3],
        assets: [String; 3],
        books_by_symbol: &HashMap<String, OrderBook>,
    ) -> Option<ArbitrageSignal> {
        let adjacency = build_adjacency(combo);
        let start = preferred_start(&assets);
        let others: Vec<&String> = assets.iter().filter(|a| **a != start).collect();
        if others.len() != 2 {
            return None;
        }

        let orderings = [
            [start.clone(), others[0].clone(), others[1].clone()],
            [start.clone(), others[1].clone(), others[0].clone()],
        ];

        let mut best: Option<CycleResult> = None;
        for ordering in &orderings {
            if let Some(result) = self.walk_cycle(ordering, &adjacency, books_by_symbol) {
                let better = match &best {
                    Some(b) => result.net_pct > b.net_pct,
                    None => true,
                };
                if better {
                    best = Some(result);
                }
            }
        }

        let best = best?;
        if best.net_pct < self.config.min_profit_pct || best.final_amount <= self.config.quantity_usd {
            return None;
        }

        let gross_pct = best.net_pct + self.config.fee_pct * 3.0;
        let confidence = (best.net_pct / self.config.min_profit_pct).min(3.0) / 3.0;

        let signal = ArbitrageSignalBuilder::new(
            ArbitrageStrategy::Triangular,
            venue.to_string(),
            venue.to_string(),
            combo[0].to_string(),
            self.config.quantity_usd,
            best.final_amount,
            self.config.quantity_usd,
        )
        .gross_spread_pct(gross_pct)
        .net_spread_pct(best.net_pct)
        .estimated_profit_usd(best.final_amount - self.config.quantity_usd)
        .confidence(confidence)
        .orderbook_depth_usd(best.min_depth_usd)
        .metadata("path", best.path)
        .metadata("directions", best.directions)
        .build();
        Some(signal)
    }

    fn walk_cycle(
        &self,
        ordering: &[String; 3],
        adjacency: &HashMap<(String, String), Leg<'_>>,
        books_by_symbol: &HashMap<String, OrderBook>,
    ) -> Option<CycleResult> {
        let hops = [
            (&ordering[0], &ordering[1]),
            (&ordering[1], &ordering[2]),
            (&ordering[2], &ordering[0]),
        ];

        let mut amount = self.config.quantity_usd;
        let mut min_depth_usd = f64::INFINITY;
        let mut path = Vec::with_capacity(3);
        let mut directions = Vec::with_capacity(3);

        for (from, to) in hops {
            let leg = adjacency.get(&(from.clone(), to.clone()))?;
            let book = books_by_symbol.get(leg.symbol)?;

            let (price, depth, direction_label) = match leg.direction {
                Direction::Buy => {
                    let ask = book.best_ask()?;
                    if ask.price <= 0.0 {
                        return None;
                    }
                    (ask.price, book.side_depth_usd(crate::domain::BookSide::Asks), "BUY")
                }
                Direction::Sell => {
                    let bid = book.best_bid()?;
                    if bid.price <= 0.0 {
                        return None;
                    }
                    (bid.price, book.side_depth_usd(crate::domain::BookSide::Bids), "SELL")
                }
            };

            amount = match leg.direction {
                Direction::Buy => (amount / price) * (1.0 - self.config.fee_pct / 100.0),
                Direction::Sell => (amount * price) * (1.0 - self.config.fee_pct / 100.0),
            };
            min_depth_usd = min_depth_usd.min(depth);
            path.push(leg.symbol.to_string());
            directions.push(direction_label);
        }

        let net_pct = (amount / self.config.quantity_usd - 1.0) * 100.0;
        Some(CycleResult {
            net_pct,
            final_amount: amount,
            min_depth_usd,
            path,
            directions,
        })
    }
}

fn distinct_triangle_assets(combo: &[&str; 3]) -> Option<[String; 3]> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for symbol in combo {
        let (base, quote) = split_symbol(symbol)?;
        *counts.entry(base).or_insert(0) += 1;
        *counts.entry(quote).or_insert(0) += 1;
    }
    if counts.len() != 3 || counts.values().any(|&c| c != 2) {
        return None;
    }
    let mut assets: Vec<String> = counts.into_keys().collect();
    assets.sort();
    Some([assets[0].clone(), assets[1].clone(), assets[2].clone()])
}

fn split_symbol(symbol: &str) -> Option<(String, String)> {
    let mut parts = symbol.split('/');
    let base = parts.next()?.to_string();
    let quote = parts.next()?.to_string();
    if parts.next().is_some() {
        return None;
    }
    Some((base, quote))
}

fn build_adjacency<'a>(combo: &[&'a str; 3]) -> HashMap<(String, String), Leg<'a>> {
    let mut adjacency = HashMap::new();
    for &symbol in combo {
        if let Some((base, quote)) = split_symbol(symbol) {
            adjacency.insert((quote.clone(), base.clone()), Leg { symbol, direction: Direction::Buy });
            adjacency.insert((base, quote), Leg { symbol, direction: Direction::Sell });
        }
    }
    adjacency
}

fn preferred_start(assets: &[String; 3]) -> String {
    for candidate in PREFERRED_START_ASSETS {
        if let Some(found) = assets.iter().find(|a| a.as_str() == candidate) {
            return found.clone();
        }
    }
    assets.iter().min().cloned().unwrap_or_default()
}

//! Order book snapshot with VWAP depth consumption.

/// A single resting price level. Immutable after construction.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrderBookEntry {
    pub price: f64,
    pub quantity: f64,
}

impl OrderBookEntry {
    #[must_use]
    pub const fn new(price: f64, quantity: f64) -> Self {
        Self { price, quantity }
    }

    #[must_use]
    pub fn notional(&self) -> f64 {
        self.price * self.quantity
    }
}

/// Which side of the book to walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSide {
    Bids,
    Asks,
}

/// A normalized order book snapshot for one `(exchange, symbol)` pair.
///
/// Invariants, enforced by the constructor: entries with `quantity <= 0`
/// are dropped, bids are sorted strictly descending by price, asks are
/// sorted strictly ascending by price.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OrderBook {
    pub exchange: String,
    pub symbol: String,
    pub timestamp: f64,
    bids: Vec<OrderBookEntry>,
    asks: Vec<OrderBookEntry>,
}

impl OrderBook {
    /// Build a normalized book. Drops non-positive-quantity entries and
    /// sorts each side into the required order, collapsing duplicate
    /// price levels by summing their quantity (defensive against feeds
    /// that emit the same level twice in one update).
    #[must_use]
    pub fn new(
        exchange: impl Into<String>,
        symbol: impl Into<String>,
        timestamp: f64,
        bids: Vec<OrderBookEntry>,
        asks: Vec<OrderBookEntry>,
    ) -> Self {
        Self {
            exchange: exchange.into(),
            symbol: symbol.into(),
            timestamp,
            bids: Self::normalize_side(bids, BookSide::Bids),
            asks: Self::normalize_side(asks, BookSide::Asks),
        }
    }

    fn normalize_side(entries: Vec<OrderBookEntry>, side: BookSide) -> Vec<OrderBookEntry> {
        let mut by_price: Vec<OrderBookEntry> = Vec::with_capacity(entries.len());
        for entry in entries.into_iter().filter(|e| e.quantity > 0.0) {
            if let Some(existing) = by_price.iter_mut().find(|e| e.price == entry.price) {
                existing.quantity += entry.quantity;
            } else {
                by_price.push(entry);
            }
        }
        match side {
            BookSide::Bids => {
                by_price.sort_by(|a, b| b.price.partial_cmp(&a.price).unwrap_or(std::cmp::Ordering::Equal));
            }
            BookSide::Asks => {
                by_price.sort_by(|a, b| a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal));
            }
        }
        by_price
    }

    #[must_use]
    pub fn bids(&self) -> &[OrderBookEntry] {
        &self.bids
    }

    #[must_use]
    pub fn asks(&self) -> &[OrderBookEntry] {
        &self.asks
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<OrderBookEntry> {
        self.bids.first().copied()
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<OrderBookEntry> {
        self.asks.first().copied()
    }

    /// Midpoint of best bid and best ask, or 0 if either side is empty.
    #[must_use]
    pub fn mid_price(&self) -> f64 {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => (bid.price + ask.price) / 2.0,
            _ => 0.0,
        }
    }

    /// Spread as a percentage of mid price, or 0 if mid price is 0.
    #[must_use]
    pub fn spread_pct(&self) -> f64 {
        let mid = self.mid_price();
        if mid <= 0.0 {
            return 0.0;
        }
        let (Some(bid), Some(ask)) = (self.best_bid(), self.best_ask()) else {
            return 0.0;
        };
        (ask.price - bid.price) / mid * 100.0
    }

    /// Total notional resting on one side of the book.
    #[must_use]
    pub fn side_depth_usd(&self, side: BookSide) -> f64 {
        self.side(side).iter().map(OrderBookEntry::notional).sum()
    }

    fn side(&self, side: BookSide) -> &[OrderBookEntry] {
        match side {
            BookSide::Bids => &self.bids,
            BookSide::Asks => &self.asks,
        }
    }

    /// Walk `side` accumulating quantity until the requested notional is
    /// satisfied, returning the volume-weighted average price of what was
    /// consumed. Returns 0 if the book side is empty or `notional <= 0`.
    /// If the side is exhausted before the request is satisfied, returns
    /// the VWAP of everything that was available.
    #[must_use]
    pub fn vwap_cost(&self, side: BookSide, notional_in_quote: f64) -> f64 {
        if notional_in_quote <= 0.0 {
            return 0.0;
        }
        let levels = self.side(side);
        if levels.is_empty() {
            return 0.0;
        }

        let mut remaining_notional = notional_in_quote;
        let mut filled_quantity = 0.0;
        let mut cost = 0.0;

        for level in levels {
            if remaining_notional <= 0.0 {
                break;
            }
            let level_notional = level.notional();
            if level_notional <= remaining_notional {
                filled_quantity += level.quantity;
                cost += level_notional;
                remaining_notional -= level_notional;
            } else {
                let quantity = remaining_notional / level.price;
                filled_quantity += quantity;
                cost += quantity * level.price;
                remaining_notional = 0.0;
            }
        }

        if filled_quantity <= 0.0 {
            0.0
        } else {
            cost / filled_quantity
        }
    }

    /// Walk `side` consuming up to `requested_qty` units, returning the
    /// quantity actually filled and the volume-weighted average price of
    /// that fill. Returns `(0.0, 0.0)` if the side is empty or
    /// `requested_qty <= 0`.
    #[must_use]
    pub fn consume_quantity(&self, side: BookSide, requested_qty: f64) -> (f64, f64) {
        if requested_qty <= 0.0 {
            return (0.0, 0.0);
        }
        let mut remaining = requested_qty;
        let mut filled_quantity = 0.0;
        let mut cost = 0.0;
        for level in self.side(side) {
            if remaining <= 0.0 {
                break;
            }
            let consumed = remaining.min(level.quantity);
            filled_quantity += consumed;
            cost += consumed * level.price;
            remaining -= consumed;
        }
        if filled_quantity <= 0.0 {
            (0.0, 0.0)
        } else {
            (filled_quantity, cost / filled_quantity)
        }
    }
}

//! Stateless spread and profit math shared by the spatial and triangular
//! detectors.

use crate::domain::{BookSide, OrderBook, TradingFee};

/// Result of walking both legs of a candidate arbitrage at a given
/// notional size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArbitrageProfit {
    pub buy_price: f64,
    pub sell_price: f64,
    pub gross_pct: f64,
    pub net_pct: f64,
    pub estimated_profit_usd: f64,
    pub available_depth_usd: f64,
    pub is_profitable: bool,
}

/// `(sell - buy) / buy * 100`, or 0 when `buy <= 0` so callers never
/// divide by zero.
#[must_use]
pub fn gross_spread_pct(buy: f64, sell: f64) -> f64 {
    if buy <= 0.0 {
        return 0.0;
    }
    (sell - buy) / buy * 100.0
}

#[must_use]
pub fn net_spread_pct(gross_pct: f64, buy_fee_pct: f64, sell_fee_pct: f64) -> f64 {
    gross_pct - buy_fee_pct - sell_fee_pct
}

/// VWAP cost of filling `notional_usd` on the given side of `book`.
#[must_use]
pub fn effective_price(book: &OrderBook, side: BookSide, notional_usd: f64) -> f64 {
    book.vwap_cost(side, notional_usd)
}

/// Full buy/sell VWAP walk and profitability check for a candidate pair.
/// Buy leg uses `buy_fee.maker_pct` when `buy_maker`, else `taker_pct`;
/// sell leg always uses `taker_pct`.
#[must_use]
pub fn arbitrage_profit(
    buy_book: &OrderBook,
    sell_book: &OrderBook,
    buy_fee: TradingFee,
    sell_fee: TradingFee,
    notional_usd: f64,
    buy_maker: bool,
) -> ArbitrageProfit {
    let buy_price = effective_price(buy_book, BookSide::Asks, notional_usd);
    let sell_price = effective_price(sell_book, BookSide::Bids, notional_usd);

    let gross_pct = gross_spread_pct(buy_price, sell_price);
    let buy_fee_pct = if buy_maker { buy_fee.maker_pct } else { buy_fee.taker_pct };
    let net_pct = net_spread_pct(gross_pct, buy_fee_pct, sell_fee.taker_pct);
    let estimated_profit_usd = net_pct / 100.0 * notional_usd;

    let available_depth_usd = buy_book
        .side_depth_usd(BookSide::Asks)
        .min(sell_book.side_depth_usd(BookSide::Bids));

    ArbitrageProfit {
        buy_price,
        sell_price,
        gross_pct,
        net_pct,
        estimated_profit_usd,
        available_depth_usd,
        is_profitable: net_pct > 0.0 && estimated_profit_usd > 0.0,
    }
}

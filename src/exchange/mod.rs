//! Venue connectivity: the abstract connector contract, a reconnecting
//! supervisor built around it, and per-venue symbol/message
//! normalization. Real per-venue REST/WebSocket dialects are out of
//! scope (spec Non-goals); a scripted [`FixtureConnector`] stands in for
//! wiring the rest of the system and for tests.

mod connector;
mod fixture;
mod normalize;
mod supervisor;

pub use connector::{ConnectionState, OrderBookCallback, OrderRequest, TradeCallback, VenueConnector};
pub use fixture::FixtureConnector;
pub use normalize::{normalize_orderbook, normalize_symbol, normalize_trade};
pub use supervisor::{ReconnectConfig, WebSocketSupervisor};

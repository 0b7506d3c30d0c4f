use thiserror::Error;

/// Failures the trading layer reports to its caller.
///
/// Everything here is either a user-input problem (surfaced inline and
/// blocking submission) or a configuration mismatch between the pool data
/// and the currency registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TradeError {
    #[error("Failed to find currency {0}")]
    UnknownCurrency(String),

    #[error("Invalid amount: {0:?}")]
    InvalidAmount(String),

    #[error("Invalid price: {0:?}")]
    InvalidPrice(String),

    #[error("Invalid slippage: {0:?}")]
    InvalidSlippage(String),

    #[error("Slippage can not be negative")]
    NegativeSlippage,

    #[error("No route found from {from} to {to}")]
    NoRoute { from: String, to: String },

    #[error("Limit price is below market value")]
    PriceBelowMarket,

    #[error("Pool {pool_id} has no asset {denom}")]
    AssetNotInPool { pool_id: String, denom: String },

    #[error("Invalid pool {pool_id}: {reason}")]
    InvalidPool { pool_id: String, reason: String },

    #[error("Spot price can't be decreased after swap")]
    SpotPriceDecreased,

    #[error("Network {0} is not configured")]
    UnknownNetwork(String),

    #[error("Wallet is not connected")]
    WalletNotConnected,
}

use std::time::Duration;

// Fixed-point scale used by every intermediate pool calculation
pub const DEC_PRECISION: i64 = 18;

// Percent-style display values are scaled up by 10^5 and shown with a
// precision of 3, which nets a multiplication by 100
pub const DISPLAY_SCALE_EXPONENT: u32 = 5;
pub const DISPLAY_PRECISION: u32 = 3;
pub const DISPLAY_MAX_DECIMALS: u32 = 4;

// Accuracy of the binomial series used for fractional weight ratios
pub const POW_APPROX_PRECISION: &str = "0.00000001";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(4);

pub const DEFAULT_FEE_DENOM: &str = "uosmo";
pub const DEFAULT_FEE_AMOUNT: u64 = 1000;
pub const DEFAULT_GAS_LIMIT: u64 = 350_000;

// max_output of a limit order, i.e. "no upper bound"
pub const UNBOUNDED_MAX_OUTPUT: &str = "18446744073709551615";

// Stop-loss orders accept down to 80% of the quoted output
pub const STOP_LOSS_NUMERATOR: u32 = 4;
pub const STOP_LOSS_DENOMINATOR: u32 = 5;

// Estimated slippage above 10% always triggers a warning
pub const SLIPPAGE_WARNING_THRESHOLD: &str = "0.1";

pub const SELECTABLE_SLIPPAGES: [&str; 3] = ["1", "3", "5"];

pub const MSG_SWAP_EXACT_AMOUNT_IN: &str = "osmosis/gamm/swap-exact-amount-in";

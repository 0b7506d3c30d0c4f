use super::dec::{
    dec_from_biguint, format_dec, from_base_units, parse_dec, percent_pretty, shift_decimal,
    to_base_units, truncate_to_biguint, PrettyCoin, PrettyDec,
};
use super::pool::SwapFormula;
use super::request::{build_order_plan, OrderPlan, ResolvedHop, ResolvedRoute};
use super::types::{Coin, Currency, CurrencyRegistry, RoutePath};
use super::Result;
use crate::config::NetworkConfig;
use crate::error::TradeError;
use crate::types::OrderType;
use bigdecimal::BigDecimal;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use std::collections::HashMap;
use tracing::debug;

/// Balance shortcut: the amount follows the wallet balance instead of
/// what was typed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AmountFraction {
    Half,
    Max,
}

impl AmountFraction {
    pub fn apply(&self, balance: &BigUint) -> BigUint {
        match self {
            AmountFraction::Half => balance / 2u32,
            AmountFraction::Max => balance.clone(),
        }
    }
}

/// Quote for the amount in the session, walked over every hop of the best
/// route.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpectedSwapResult {
    pub amount: PrettyCoin,
    // Market price before the swap with no fee applied, in display units
    pub before_spot_price_without_swap_fee_out_over_in: PrettyDec,
    pub before_spot_price_without_swap_fee_in_over_out: PrettyDec,
    // Percent views
    pub slippage: PrettyDec,
    pub swap_fee: PrettyDec,
    pub token_in_fee_amount: PrettyCoin,
}

impl ExpectedSwapResult {
    // 0.01 for 1%
    pub fn slippage_ratio(&self) -> BigDecimal {
        shift_decimal(&self.slippage.to_dec(), -2)
    }
}

/// Everything a form renders, derived from the session in one pass.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderView {
    pub send_currency: Currency,
    pub out_currency: Currency,
    pub amount: String,
    pub price: String,
    pub fraction: Option<AmountFraction>,
    pub balance: PrettyCoin,
    pub expected: Option<ExpectedSwapResult>,
    pub real_output_amount: Option<PrettyCoin>,
    pub price_change_percentage: Option<BigDecimal>,
    pub error: Option<String>,
}

fn view_field<T>(result: Result<T>, error: &mut Option<String>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(err) => {
            error.get_or_insert_with(|| err.to_string());
            None
        }
    }
}

// Spot prices of a route in base units, `denom_in` paid per `denom_out`
struct RouteSpotPrice {
    with_fee: BigDecimal,
    without_fee: BigDecimal,
    // 1 - prod(1 - fee_i)
    swap_fee: BigDecimal,
}

/// Session state of the limit / stop-loss order form.
///
/// All mutations go through the setters; every successful one clears the
/// error message left behind by a failed [`OrderTokenInConfig::prepare_order`].
#[derive(Clone, Debug)]
pub struct OrderTokenInConfig {
    registry: CurrencyRegistry,
    send_currency: Currency,
    out_currency: Currency,
    amount: String,
    price: String,
    fraction: Option<AmountFraction>,
    balances: HashMap<String, BigUint>,
    optimized_route_paths: Vec<RoutePath>,
    error: Option<String>,
}

impl OrderTokenInConfig {
    pub fn new(registry: CurrencyRegistry, send_currency: Currency, out_currency: Currency) -> Self {
        Self {
            registry,
            send_currency,
            out_currency,
            amount: String::new(),
            price: String::new(),
            fraction: None,
            balances: HashMap::new(),
            optimized_route_paths: vec![],
            error: None,
        }
    }

    pub fn send_currency(&self) -> &Currency {
        &self.send_currency
    }

    pub fn out_currency(&self) -> &Currency {
        &self.out_currency
    }

    pub fn registry(&self) -> &CurrencyRegistry {
        &self.registry
    }

    pub fn fraction(&self) -> Option<AmountFraction> {
        self.fraction
    }

    pub fn price(&self) -> &str {
        &self.price
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn balance(&self, denom: &str) -> BigUint {
        self.balances.get(denom).cloned().unwrap_or_default()
    }

    /// The amount to send. With a fraction active this is the fraction of
    /// the send balance, otherwise the typed string.
    pub fn amount(&self) -> String {
        match self.fraction {
            Some(fraction) => {
                let base = fraction.apply(&self.balance(&self.send_currency.coin_minimal_denom));
                let decimals = self.send_currency.coin_decimals;
                format_dec(&from_base_units(&base, decimals), decimals, true)
            }
            None => self.amount.clone(),
        }
    }

    pub fn set_amount(&mut self, amount: &str) {
        let amount = amount.trim();
        self.amount = if amount.starts_with('.') {
            format!("0{}", amount)
        } else {
            amount.to_string()
        };
        self.fraction = None;
        self.error = None;
    }

    pub fn set_price(&mut self, price: &str) {
        let price = price.trim();
        self.price = if price.starts_with('.') {
            format!("0{}", price)
        } else {
            price.to_string()
        };
        self.error = None;
    }

    // Picking the active fraction again turns it off
    pub fn set_fraction(&mut self, fraction: Option<AmountFraction>) {
        self.fraction = if fraction == self.fraction { None } else { fraction };
        self.error = None;
    }

    // Also drops the routes ranked for the previous pair
    pub fn switch_in_and_out(&mut self) {
        std::mem::swap(&mut self.send_currency, &mut self.out_currency);
        self.optimized_route_paths.clear();
        self.error = None;
    }

    pub fn set_send_currency(&mut self, currency: Currency) {
        if currency == self.out_currency {
            self.switch_in_and_out();
            return;
        }
        if currency != self.send_currency {
            self.send_currency = currency;
            self.optimized_route_paths.clear();
        }
        self.error = None;
    }

    pub fn set_out_currency(&mut self, currency: Currency) {
        if currency == self.send_currency {
            self.switch_in_and_out();
            return;
        }
        if currency != self.out_currency {
            self.out_currency = currency;
            self.optimized_route_paths.clear();
        }
        self.error = None;
    }

    pub fn set_balance(&mut self, denom: &str, amount: BigUint) {
        self.balances.insert(denom.to_string(), amount);
    }

    // Ranked by the router, best first
    pub fn set_optimized_route_paths(&mut self, paths: Vec<RoutePath>) {
        self.optimized_route_paths = paths;
        self.error = None;
    }

    pub fn set_error(&mut self, error: Option<String>) {
        self.error = error;
    }

    pub fn optimized_route_paths(&self) -> &[RoutePath] {
        &self.optimized_route_paths
    }

    pub fn best_route(&self) -> Option<&RoutePath> {
        self.optimized_route_paths.first()
    }

    // Registry currencies the wallet holds something of
    pub fn sendable_currencies(&self) -> Vec<&Currency> {
        self.registry
            .currencies
            .iter()
            .filter(|currency| !self.balance(&currency.coin_minimal_denom).is_zero())
            .collect()
    }

    fn no_route(&self) -> TradeError {
        TradeError::NoRoute {
            from: self.send_currency.coin_minimal_denom.clone(),
            to: self.out_currency.coin_minimal_denom.clone(),
        }
    }

    /// The best route, provided it leads from the send currency to the out
    /// currency. A route ranked for another pair is never used.
    fn matching_route(&self) -> std::result::Result<&RoutePath, TradeError> {
        let route = self.best_route().ok_or_else(|| self.no_route())?;
        if route.pools.is_empty() || route.pools.len() != route.token_out_denoms.len() {
            return Err(self.no_route());
        }
        if route.token_in_denom != self.send_currency.coin_minimal_denom
            || route.token_out_denoms.last() != Some(&self.out_currency.coin_minimal_denom)
        {
            return Err(self.no_route());
        }
        Ok(route)
    }

    fn route(&self) -> Result<&RoutePath> {
        Ok(self.matching_route()?)
    }

    fn amount_in_base_units(&self) -> Result<BigUint> {
        let amount = self.amount();
        if amount.is_empty() {
            return Ok(BigUint::zero());
        }
        to_base_units(&amount, self.send_currency.coin_decimals)
    }

    fn route_spot_price(&self, route: &RoutePath) -> Result<RouteSpotPrice> {
        let mut with_fee = BigDecimal::one();
        let mut without_fee = BigDecimal::one();
        let mut fee_kept = BigDecimal::one();

        let mut denom_in = route.token_in_denom.as_str();
        for (pool, denom_out) in route.pools.iter().zip(&route.token_out_denoms) {
            let spot = pool.spot_price(denom_in, denom_out)?;
            let keep = BigDecimal::one() - pool.swap_fee();
            without_fee = without_fee * (&spot * &keep);
            with_fee = with_fee * spot;
            fee_kept = fee_kept * keep;
            denom_in = denom_out;
        }

        Ok(RouteSpotPrice {
            with_fee,
            without_fee,
            swap_fee: BigDecimal::one() - fee_kept,
        })
    }

    // In-over-out ratio of base units expressed in display units
    fn display_price(&self, in_over_out: &BigDecimal) -> BigDecimal {
        let places =
            self.out_currency.coin_decimals as i64 - self.send_currency.coin_decimals as i64;
        shift_decimal(in_over_out, places)
    }

    pub fn expected_swap_result(&self) -> Result<ExpectedSwapResult> {
        let route = self.route()?;
        let spot = self.route_spot_price(route)?;
        let amount_in = self.amount_in_base_units()?;

        let mut amount_out = amount_in.clone();
        if !amount_in.is_zero() {
            let mut denom_in = route.token_in_denom.clone();
            for (pool, denom_out) in route.pools.iter().zip(&route.token_out_denoms) {
                let estimated =
                    pool.estimate_swap_exact_amount_in(&Coin::new(&denom_in, amount_out), denom_out)?;
                amount_out = estimated.token_out_amount;
                denom_in = denom_out.clone();
            }
        }

        let slippage = if amount_in.is_zero() {
            BigDecimal::zero()
        } else {
            let effective_price = dec_from_biguint(&amount_in) / dec_from_biguint(&amount_out);
            effective_price / &spot.with_fee - BigDecimal::one()
        };

        let in_over_out = self.display_price(&spot.without_fee);
        let out_over_in = if in_over_out.is_zero() {
            BigDecimal::zero()
        } else {
            BigDecimal::one() / &in_over_out
        };

        let fee_amount = truncate_to_biguint(&(dec_from_biguint(&amount_in) * &spot.swap_fee));

        Ok(ExpectedSwapResult {
            amount: PrettyCoin::new(self.out_currency.clone(), amount_out),
            before_spot_price_without_swap_fee_out_over_in: PrettyDec::new(out_over_in)
                .max_decimals(self.out_currency.coin_decimals)
                .trim(true),
            before_spot_price_without_swap_fee_in_over_out: PrettyDec::new(in_over_out)
                .max_decimals(self.send_currency.coin_decimals)
                .trim(true),
            slippage: percent_pretty(&slippage),
            swap_fee: percent_pretty(&spot.swap_fee),
            token_in_fee_amount: PrettyCoin::new(self.send_currency.clone(), fee_amount),
        })
    }

    /// How many out tokens one send token buys right now, fee excluded.
    pub fn market_price(&self) -> Result<BigDecimal> {
        let route = self.route()?;
        let spot = self.route_spot_price(route)?;
        let in_over_out = self.display_price(&spot.without_fee);
        if in_over_out.is_zero() {
            return Err(self.no_route().into());
        }
        Ok(BigDecimal::one() / in_over_out)
    }

    pub fn set_current_price(&mut self) -> Result<()> {
        let market = self.market_price()?;
        let price = format_dec(&market, self.out_currency.coin_decimals, true);
        self.set_price(&price);
        Ok(())
    }

    fn parsed_price(&self) -> Result<BigDecimal> {
        match parse_dec(&self.price) {
            Some(price) if price > BigDecimal::zero() => Ok(price),
            _ => Err(TradeError::InvalidPrice(self.price.clone()).into()),
        }
    }

    /// `amount * price` in out-currency base units, the output the order
    /// asks for.
    pub fn real_output_amount(&self) -> Result<PrettyCoin> {
        let price = self.parsed_price()?;
        let amount_in = self.amount_in_base_units()?;
        let amount = from_base_units(&amount_in, self.send_currency.coin_decimals) * price;
        let base = truncate_to_biguint(&shift_decimal(
            &amount,
            self.out_currency.coin_decimals as i64,
        ));
        Ok(PrettyCoin::new(self.out_currency.clone(), base))
    }

    // (price / market - 1) * 100; negative when the limit is under market
    pub fn price_change_percentage(&self) -> Result<BigDecimal> {
        let price = self.parsed_price()?;
        let market = self.market_price()?;
        Ok((price / market - BigDecimal::one()) * BigDecimal::from(100u32))
    }

    /// Renders the form. A field that can't be derived from the current
    /// input is left empty and the first such failure lands in `error`,
    /// unless the session already holds one.
    pub fn view(&self) -> OrderView {
        let mut error = self.error.clone();
        let routed = self.best_route().is_some();
        let priced = !self.price.is_empty();

        let expected = if routed {
            view_field(self.expected_swap_result(), &mut error)
        } else {
            None
        };
        let real_output_amount = if priced {
            view_field(self.real_output_amount(), &mut error)
        } else {
            None
        };
        let price_change_percentage = if priced && routed {
            view_field(self.price_change_percentage(), &mut error)
        } else {
            None
        };

        OrderView {
            send_currency: self.send_currency.clone(),
            out_currency: self.out_currency.clone(),
            amount: self.amount(),
            price: self.price.clone(),
            fraction: self.fraction,
            balance: PrettyCoin::new(
                self.send_currency.clone(),
                self.balance(&self.send_currency.coin_minimal_denom),
            ),
            expected,
            real_output_amount,
            price_change_percentage,
            error,
        }
    }

    fn fail(&mut self, err: TradeError) -> anyhow::Error {
        self.error = Some(err.to_string());
        err.into()
    }

    fn resolve(&self, denom: &str) -> std::result::Result<Currency, TradeError> {
        self.registry
            .find(denom)
            .cloned()
            .ok_or_else(|| TradeError::UnknownCurrency(denom.to_string()))
    }

    fn resolve_route(&self) -> std::result::Result<ResolvedRoute, TradeError> {
        let route = self.matching_route()?;
        let token_in = self.resolve(&route.token_in_denom)?;
        let hops = route
            .pools
            .iter()
            .zip(&route.token_out_denoms)
            .map(|(pool, denom_out)| -> std::result::Result<ResolvedHop, TradeError> {
                Ok(ResolvedHop {
                    pool_id: pool.id.clone(),
                    token_out: self.resolve(denom_out)?,
                })
            })
            .collect::<std::result::Result<Vec<_>, TradeError>>()?;

        Ok(ResolvedRoute { token_in, hops })
    }

    /// Validates the session and builds the transactions of a new order.
    ///
    /// A failed currency or route lookup is also left in [`Self::error`].
    pub fn prepare_order(
        &mut self,
        network: &NetworkConfig,
        user: &str,
        order_type: OrderType,
    ) -> Result<OrderPlan> {
        let route = match self.resolve_route() {
            Ok(route) => route,
            Err(err) => return Err(self.fail(err)),
        };

        let amount_in = self.amount_in_base_units()?;
        if amount_in.is_zero() {
            return Err(TradeError::InvalidAmount(self.amount()).into());
        }
        let price = self.parsed_price()?;

        if order_type == OrderType::Limit && price < self.market_price()? {
            return Err(self.fail(TradeError::PriceBelowMarket));
        }

        let token_out = self.real_output_amount()?;
        if token_out.amount.is_zero() {
            return Err(TradeError::InvalidAmount(self.amount()).into());
        }

        debug!(
            %order_type,
            amount_in = %amount_in,
            amount_out = %token_out.amount,
            hops = route.hops.len(),
            "prepared order"
        );
        self.error = None;
        build_order_plan(network, user, order_type, &route, amount_in, token_out.amount)
    }
}

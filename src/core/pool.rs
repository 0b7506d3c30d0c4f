use super::dec::{
    dec_from_biguint, percent_pretty, to_base_units, truncate_to_biguint, PrettyCoin,
    PrettyDec,
};
use super::math::{calc_out_given_in, calc_spot_price};
use super::slippage::parse_slippage_percent;
use super::types::{Coin, Currency, CurrencyRegistry, Pool, PoolAsset};
use super::Result;
use crate::error::TradeError;
use anyhow::anyhow;
use bigdecimal::BigDecimal;
use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Pool formula output in raw units: integer base-unit amounts and
/// unscaled fixed-point ratios.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSwapEstimate {
    pub token_out_amount: BigUint,
    pub spot_price_before: BigDecimal,
    pub spot_price_after: BigDecimal,
    pub effective_price: BigDecimal,
    pub slippage: BigDecimal,
}

/// The pricing formula of a pool. Quotes and route estimates only go
/// through this trait, so other pool kinds can plug in.
pub trait SwapFormula {
    fn swap_fee(&self) -> &BigDecimal;

    // Units of `denom_in` paid per unit of `denom_out`, fee included
    fn spot_price(&self, denom_in: &str, denom_out: &str) -> Result<BigDecimal>;

    fn estimate_swap_exact_amount_in(
        &self,
        token_in: &Coin,
        token_out_denom: &str,
    ) -> Result<RawSwapEstimate>;
}

impl Pool {
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| TradeError::InvalidPool {
            pool_id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.pool_assets.len() < 2 {
            return Err(invalid("a pool needs at least two assets").into());
        }

        let weight_sum: BigUint = self.pool_assets.iter().map(|asset| &asset.weight).sum();
        if weight_sum != self.total_weight {
            return Err(invalid("asset weights do not add up to the total weight").into());
        }

        let fee = &self.pool_params.swap_fee;
        if *fee < BigDecimal::zero() || *fee >= BigDecimal::one() {
            return Err(invalid("swap fee must be in range [0, 1)").into());
        }
        Ok(())
    }

    pub fn asset(&self, denom: &str) -> Result<&PoolAsset> {
        self.pool_assets
            .iter()
            .find(|asset| asset.token.denom == denom)
            .ok_or_else(|| {
                TradeError::AssetNotInPool {
                    pool_id: self.id.clone(),
                    denom: denom.to_string(),
                }
                .into()
            })
    }
}

impl SwapFormula for Pool {
    fn swap_fee(&self) -> &BigDecimal {
        &self.pool_params.swap_fee
    }

    fn spot_price(&self, denom_in: &str, denom_out: &str) -> Result<BigDecimal> {
        let asset_in = self.asset(denom_in)?;
        let asset_out = self.asset(denom_out)?;

        calc_spot_price(
            &dec_from_biguint(&asset_in.token.amount),
            &dec_from_biguint(&asset_in.weight),
            &dec_from_biguint(&asset_out.token.amount),
            &dec_from_biguint(&asset_out.weight),
            self.swap_fee(),
        )
    }

    fn estimate_swap_exact_amount_in(
        &self,
        token_in: &Coin,
        token_out_denom: &str,
    ) -> Result<RawSwapEstimate> {
        let asset_in = self.asset(&token_in.denom)?;
        let asset_out = self.asset(token_out_denom)?;

        let balance_in = dec_from_biguint(&asset_in.token.amount);
        let weight_in = dec_from_biguint(&asset_in.weight);
        let balance_out = dec_from_biguint(&asset_out.token.amount);
        let weight_out = dec_from_biguint(&asset_out.weight);
        let amount_in = dec_from_biguint(&token_in.amount);

        let spot_price_before = calc_spot_price(
            &balance_in,
            &weight_in,
            &balance_out,
            &weight_out,
            self.swap_fee(),
        )?;
        if spot_price_before.is_zero() {
            return Err(anyhow!("Pool {} has no liquidity for {}", self.id, token_in.denom));
        }

        if token_in.amount.is_zero() {
            return Ok(RawSwapEstimate {
                token_out_amount: BigUint::zero(),
                spot_price_after: spot_price_before.clone(),
                spot_price_before,
                effective_price: BigDecimal::zero(),
                slippage: BigDecimal::zero(),
            });
        }

        let token_out_amount = truncate_to_biguint(&calc_out_given_in(
            &balance_in,
            &weight_in,
            &balance_out,
            &weight_out,
            &amount_in,
            self.swap_fee(),
        )?);
        if token_out_amount.is_zero() {
            return Err(anyhow!(
                "Swap of {}{} in pool {} yields no output",
                token_in.amount,
                token_in.denom,
                self.id
            ));
        }

        let spot_price_after = calc_spot_price(
            &(&balance_in + &amount_in),
            &weight_in,
            &(&balance_out - dec_from_biguint(&token_out_amount)),
            &weight_out,
            self.swap_fee(),
        )?;
        if spot_price_after < spot_price_before {
            return Err(TradeError::SpotPriceDecreased.into());
        }

        let effective_price = &amount_in / dec_from_biguint(&token_out_amount);
        let slippage = &effective_price / &spot_price_before - BigDecimal::one();

        Ok(RawSwapEstimate {
            token_out_amount,
            spot_price_before,
            spot_price_after,
            effective_price,
            slippage,
        })
    }
}

/// A token amount as typed by the user.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenInput {
    pub currency: Currency,
    pub amount: String,
}

impl TokenInput {
    pub fn new(currency: Currency, amount: &str) -> Self {
        Self {
            currency,
            amount: amount.to_string(),
        }
    }

    pub fn to_coin(&self) -> Result<Coin> {
        let amount = to_base_units(&self.amount, self.currency.coin_decimals)?;
        Ok(Coin::new(&self.currency.coin_minimal_denom, amount))
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SwapEstimate {
    pub token_out: PrettyCoin,
    pub spot_price_after: PrettyDec,
    pub slippage: PrettyDec,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PoolAssetView {
    pub weight: BigUint,
    pub amount: PrettyCoin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapAmountInRoute {
    pub pool_id: String,
    pub token_out_denom: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapExactAmountInValue {
    pub sender: String,
    pub routes: Vec<SwapAmountInRoute>,
    pub token_in: Coin,
    pub token_out_min_amount: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapExactAmountInMsg {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub value: SwapExactAmountInValue,
}

/// Swap quoting and message building for a single pool.
///
/// Display views are recomputed from the current pool on every call, so
/// swapping the pool through [`PoolQuoter::set_pool`] is all it takes to
/// refresh them.
#[derive(Clone, Debug)]
pub struct PoolQuoter {
    pool: Pool,
    registry: CurrencyRegistry,
}

impl PoolQuoter {
    pub fn new(pool: Pool, registry: CurrencyRegistry) -> Result<Self> {
        pool.validate()?;
        Ok(Self { pool, registry })
    }

    pub fn id(&self) -> &str {
        &self.pool.id
    }

    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    pub fn set_pool(&mut self, pool: Pool) -> Result<()> {
        pool.validate()?;
        self.pool = pool;
        Ok(())
    }

    pub fn estimate_swap_exact_amount_in(
        &self,
        token_in: &TokenInput,
        token_out_currency: &Currency,
    ) -> Result<SwapEstimate> {
        let coin = token_in.to_coin()?;
        let estimated = self
            .pool
            .estimate_swap_exact_amount_in(&coin, &token_out_currency.coin_minimal_denom)?;
        debug!(
            pool_id = %self.pool.id,
            amount_in = %coin.amount,
            amount_out = %estimated.token_out_amount,
            "estimated swap"
        );

        Ok(SwapEstimate {
            token_out: PrettyCoin::new(token_out_currency.clone(), estimated.token_out_amount),
            spot_price_after: percent_pretty(&estimated.spot_price_after),
            slippage: percent_pretty(&estimated.slippage),
        })
    }

    /// Builds a single-pool swap message.
    ///
    /// `max_slippage` is a percentage. Zero means "accept any output", which
    /// is expressed as a minimum of one base unit rather than zero.
    pub fn make_swap_exact_amount_in_msg(
        &self,
        msg_type: &str,
        sender: &str,
        token_in: &TokenInput,
        token_out_currency: &Currency,
        max_slippage: &str,
    ) -> Result<SwapExactAmountInMsg> {
        let estimated = self.estimate_swap_exact_amount_in(token_in, token_out_currency)?;
        let max_slippage = parse_slippage_percent(max_slippage)?;
        let coin = token_in.to_coin()?;

        let token_out_min_amount = if max_slippage.is_zero() {
            "1".to_string()
        } else {
            let floor = dec_from_biguint(&estimated.token_out.amount) * (BigDecimal::one() - max_slippage);
            truncate_to_biguint(&floor).to_string()
        };

        Ok(SwapExactAmountInMsg {
            msg_type: msg_type.to_string(),
            value: SwapExactAmountInValue {
                sender: sender.to_string(),
                routes: vec![SwapAmountInRoute {
                    pool_id: self.pool.id.clone(),
                    token_out_denom: token_out_currency.coin_minimal_denom.clone(),
                }],
                token_in: coin,
                token_out_min_amount,
            },
        })
    }

    pub fn swap_fee(&self) -> PrettyDec {
        percent_pretty(&self.pool.pool_params.swap_fee)
    }

    /// Pool assets with their registry currencies. An asset the registry
    /// does not know can't be displayed or traded, so it fails the call.
    pub fn pool_assets(&self) -> Result<Vec<PoolAssetView>> {
        self.pool
            .pool_assets
            .iter()
            .map(|asset| -> Result<PoolAssetView> {
                let currency = self
                    .registry
                    .find(&asset.token.denom)
                    .ok_or_else(|| TradeError::UnknownCurrency(asset.token.denom.clone()))?;
                Ok(PoolAssetView {
                    weight: asset.weight.clone(),
                    amount: PrettyCoin::new(currency.clone(), asset.token.amount.clone()),
                })
            })
            .collect()
    }
}

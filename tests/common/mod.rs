#![allow(dead_code)]

use autonomy_trade::config::NetworkConfig;
use autonomy_trade::core::types::{
    Coin, Currency, CurrencyRegistry, Pool, PoolAsset, PoolParams, RoutePath,
};
use bigdecimal::BigDecimal;
use num_bigint::BigUint;
use std::str::FromStr;

pub const CW20_DENOM: &str = "osmo1cw20tokencontract";
pub const REGISTRY: &str = "osmo1registry";
pub const WRAPPER: &str = "osmo1wrapper";
pub const USER: &str = "osmo1user";

pub fn osmo() -> Currency {
    Currency::new("OSMO", "uosmo", 6)
}

pub fn atom() -> Currency {
    Currency::new("ATOM", "uatom", 6)
}

pub fn cw20() -> Currency {
    Currency::new("TKN", CW20_DENOM, 6)
}

pub fn registry() -> CurrencyRegistry {
    CurrencyRegistry::new("osmo-test-4", vec![osmo(), atom(), cw20()])
}

pub fn network() -> NetworkConfig {
    NetworkConfig::new(REGISTRY, WRAPPER)
}

pub fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

pub fn pool(id: &str, assets: &[(&str, u64, u64)], swap_fee: &str) -> Pool {
    let pool_assets: Vec<PoolAsset> = assets
        .iter()
        .map(|(denom, amount, weight)| PoolAsset {
            token: Coin::new(denom, BigUint::from(*amount)),
            weight: BigUint::from(*weight),
        })
        .collect();
    let total_weight = pool_assets.iter().map(|asset| &asset.weight).sum();

    Pool {
        id: id.to_string(),
        pool_params: PoolParams {
            swap_fee: dec(swap_fee),
        },
        pool_assets,
        total_weight,
    }
}

// 1M OSMO against 100k ATOM, equal weights: 1 OSMO buys 0.1 ATOM
pub fn osmo_atom_pool(swap_fee: &str) -> Pool {
    pool(
        "1",
        &[("uosmo", 1_000_000_000_000, 1), ("uatom", 100_000_000_000, 1)],
        swap_fee,
    )
}

// 1 TKN buys 2 OSMO
pub fn cw20_osmo_pool(swap_fee: &str) -> Pool {
    pool(
        "7",
        &[(CW20_DENOM, 500_000_000_000, 1), ("uosmo", 1_000_000_000_000, 1)],
        swap_fee,
    )
}

pub fn route(token_in: &str, hops: &[(Pool, &str)]) -> RoutePath {
    RoutePath {
        pools: hops.iter().map(|(pool, _)| pool.clone()).collect(),
        token_in_denom: token_in.to_string(),
        token_out_denoms: hops.iter().map(|(_, denom)| denom.to_string()).collect(),
    }
}

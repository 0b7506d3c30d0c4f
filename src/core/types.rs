use bigdecimal::BigDecimal;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

// Base-unit amounts travel as decimal strings on the wire
pub mod biguint_string {
    use num_bigint::BigUint;
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let raw = String::deserialize(deserializer)?;
        BigUint::from_str(raw.trim()).map_err(de::Error::custom)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Currency {
    pub coin_denom: String,
    pub coin_minimal_denom: String,
    pub coin_decimals: u32,
}

impl Currency {
    pub fn new(coin_denom: &str, coin_minimal_denom: &str, coin_decimals: u32) -> Self {
        Self {
            coin_denom: coin_denom.to_string(),
            coin_minimal_denom: coin_minimal_denom.to_string(),
            coin_decimals,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "biguint_string")]
    pub amount: BigUint,
}

impl Coin {
    pub fn new(denom: &str, amount: BigUint) -> Self {
        Self {
            denom: denom.to_string(),
            amount,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolAsset {
    pub token: Coin,
    #[serde(with = "biguint_string")]
    pub weight: BigUint,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolParams {
    // Fraction of the input kept by the pool, e.g. 0.003
    pub swap_fee: BigDecimal,
}

/// Raw state of a weighted AMM pool as the chain reports it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: String,
    pub pool_params: PoolParams,
    pub pool_assets: Vec<PoolAsset>,
    #[serde(with = "biguint_string")]
    pub total_weight: BigUint,
}

/// One candidate path produced by the route finder: `pools[i]` turns the
/// previous denom into `token_out_denoms[i]`.
#[derive(Clone, Debug, PartialEq)]
pub struct RoutePath {
    pub pools: Vec<Pool>,
    pub token_in_denom: String,
    pub token_out_denoms: Vec<String>,
}

/// Currencies known to the chain the user trades on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CurrencyRegistry {
    pub chain_id: String,
    pub currencies: Vec<Currency>,
}

impl CurrencyRegistry {
    pub fn new(chain_id: &str, currencies: Vec<Currency>) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            currencies,
        }
    }

    pub fn find(&self, coin_minimal_denom: &str) -> Option<&Currency> {
        self.currencies
            .iter()
            .find(|currency| currency.coin_minimal_denom == coin_minimal_denom)
    }
}

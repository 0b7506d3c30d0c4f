use super::constants::{STOP_LOSS_DENOMINATOR, STOP_LOSS_NUMERATOR, UNBOUNDED_MAX_OUTPUT};
use super::types::{biguint_string, Coin, Currency};
use super::{Context, Result};
use crate::config::NetworkConfig;
use crate::error::TradeError;
use crate::types::OrderType;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteHop {
    pub pool_id: String,
    #[serde(alias = "denom_out")]
    pub token_out_denom: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirstHop {
    pub pool_id: String,
    pub denom_in: String,
    pub denom_out: String,
}

/// The swap the wrapper contract performs once a request triggers.
///
/// Two layouts exist on chain: the current one (`amount_in`, `denom_in`,
/// every hop in `route`) and an older one (`amount`, a separate `first`
/// hop, remaining hops in `route`). Both decode into this type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapInstruction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, alias = "amount", skip_serializing_if = "Option::is_none")]
    pub amount_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denom_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denom_out: Option<String>,
    pub min_output: String,
    pub max_output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first: Option<FirstHop>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<Vec<RouteHop>>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum WrapperMsg<T> {
    Swap(T),
}

impl SwapInstruction {
    // base64(json({"swap": ...})), the `msg` of a create_request
    pub fn encode(&self) -> Result<String> {
        let json = serde_json::to_vec(&WrapperMsg::Swap(self))?;
        Ok(STANDARD.encode(json))
    }

    pub fn decode(msg: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(msg.trim())
            .context("request msg is not valid base64")?;
        let WrapperMsg::Swap(swap) =
            serde_json::from_slice(&bytes).context("request msg is not a swap instruction")?;
        Ok(swap)
    }

    pub fn input_denom(&self) -> Option<&str> {
        self.denom_in
            .as_deref()
            .or_else(|| self.first.as_ref().map(|first| first.denom_in.as_str()))
    }

    pub fn output_denom(&self) -> Option<&str> {
        self.route
            .as_ref()
            .and_then(|route| route.last())
            .map(|hop| hop.token_out_denom.as_str())
            .or(self.denom_out.as_deref())
            .or_else(|| self.first.as_ref().map(|first| first.denom_out.as_str()))
    }

    pub fn order_type(&self) -> OrderType {
        if is_stop_loss(&self.min_output, &self.max_output) {
            OrderType::StopLoss
        } else {
            OrderType::Limit
        }
    }

    // The amount the user is quoted: max_output for stop-loss, min_output otherwise
    pub fn quoted_output(&self) -> &str {
        match self.order_type() {
            OrderType::StopLoss => &self.max_output,
            OrderType::Limit => &self.min_output,
        }
    }
}

pub fn stop_loss_floor(max_output: &BigUint) -> BigUint {
    max_output * STOP_LOSS_NUMERATOR / STOP_LOSS_DENOMINATOR
}

/// Requests carry no explicit order type. A stop-loss is recognised by its
/// `min_output` being exactly `floor(max_output * 0.8)`; everything else is
/// read as a limit order.
pub fn is_stop_loss(min_output: &str, max_output: &str) -> bool {
    match BigUint::from_str(max_output.trim()) {
        Ok(max_output) => stop_loss_floor(&max_output).to_string() == min_output.trim(),
        Err(_) => false,
    }
}

// Bank denoms ("uosmo", "ibc/...") are sent as funds; anything else is a cw20 contract
pub fn is_native_denom(denom: &str) -> bool {
    denom.starts_with('u') || denom.starts_with("ibc/")
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetInfo {
    NativeToken { denom: String },
    Token { contract_addr: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub info: AssetInfo,
    #[serde(with = "biguint_string")]
    pub amount: BigUint,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestInfo {
    pub target: String,
    pub msg: String,
    pub input_asset: Asset,
    pub is_recurring: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryExecuteMsg {
    CreateRequest { request_info: RequestInfo },
    CancelRequest { id: u64 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cw20ExecuteMsg {
    IncreaseAllowance {
        spender: String,
        #[serde(with = "biguint_string")]
        amount: BigUint,
    },
}

/// A contract execution handed to the wallet for signing.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContractCall {
    pub contract: String,
    pub msg: serde_json::Value,
    pub funds: Vec<Coin>,
    pub gas_limit: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedHop {
    pub pool_id: String,
    pub token_out: Currency,
}

/// The best route with every denom resolved against the currency registry.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedRoute {
    pub token_in: Currency,
    pub hops: Vec<ResolvedHop>,
}

/// Everything needed to register one order: an optional cw20 allowance
/// followed by the `create_request` call.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderPlan {
    pub swap: SwapInstruction,
    pub allowance: Option<ContractCall>,
    pub create_request: ContractCall,
}

// Input coin plus the protocol fee, merged when both use the fee denom
pub fn order_funds(denom_in: &str, amount_in: &BigUint, network: &NetworkConfig) -> Vec<Coin> {
    let fee = BigUint::from(network.fee_amount);
    if denom_in == network.fee_denom {
        return vec![Coin::new(&network.fee_denom, amount_in + fee)];
    }
    if is_native_denom(denom_in) {
        vec![
            Coin::new(denom_in, amount_in.clone()),
            Coin::new(&network.fee_denom, fee),
        ]
    } else {
        vec![Coin::new(&network.fee_denom, fee)]
    }
}

pub fn build_order_plan(
    network: &NetworkConfig,
    user: &str,
    order_type: OrderType,
    route: &ResolvedRoute,
    amount_in: BigUint,
    token_out_amount: BigUint,
) -> Result<OrderPlan> {
    let first = route.hops.first().ok_or_else(|| TradeError::NoRoute {
        from: route.token_in.coin_minimal_denom.clone(),
        to: String::new(),
    })?;
    let denom_in = route.token_in.coin_minimal_denom.as_str();

    let (min_output, max_output) = match order_type {
        OrderType::Limit => (token_out_amount.to_string(), UNBOUNDED_MAX_OUTPUT.to_string()),
        OrderType::StopLoss => (
            stop_loss_floor(&token_out_amount).to_string(),
            token_out_amount.to_string(),
        ),
    };

    let swap = SwapInstruction {
        user: Some(user.to_string()),
        amount_in: Some(amount_in.to_string()),
        denom_in: Some(denom_in.to_string()),
        denom_out: Some(first.token_out.coin_minimal_denom.clone()),
        min_output,
        max_output,
        first: None,
        route: Some(
            route
                .hops
                .iter()
                .map(|hop| RouteHop {
                    pool_id: hop.pool_id.clone(),
                    token_out_denom: hop.token_out.coin_minimal_denom.clone(),
                })
                .collect(),
        ),
    };

    let native = is_native_denom(denom_in);
    let input_asset = Asset {
        info: if native {
            AssetInfo::NativeToken {
                denom: denom_in.to_string(),
            }
        } else {
            AssetInfo::Token {
                contract_addr: denom_in.to_string(),
            }
        },
        amount: amount_in.clone(),
    };

    let allowance = if native {
        None
    } else {
        Some(ContractCall {
            contract: denom_in.to_string(),
            msg: serde_json::to_value(Cw20ExecuteMsg::IncreaseAllowance {
                spender: network.registry_address.clone(),
                amount: amount_in.clone(),
            })?,
            funds: vec![],
            gas_limit: network.gas_limit,
        })
    };

    let create_request = ContractCall {
        contract: network.registry_address.clone(),
        msg: serde_json::to_value(RegistryExecuteMsg::CreateRequest {
            request_info: RequestInfo {
                target: network.wrapper_address.clone(),
                msg: swap.encode()?,
                input_asset,
                is_recurring: false,
            },
        })?,
        funds: order_funds(denom_in, &amount_in, network),
        gas_limit: network.gas_limit,
    };

    Ok(OrderPlan {
        swap,
        allowance,
        create_request,
    })
}

pub fn build_cancel_call(network: &NetworkConfig, id: u64) -> Result<ContractCall> {
    Ok(ContractCall {
        contract: network.registry_address.clone(),
        msg: serde_json::to_value(RegistryExecuteMsg::CancelRequest { id })?,
        funds: vec![],
        gas_limit: network.gas_limit,
    })
}

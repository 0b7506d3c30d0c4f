use super::client::RawRequest;
use super::Result;
use crate::core::request::SwapInstruction;
use crate::core::types::Coin;
use crate::types::{Order, OrderStatus};
use anyhow::{anyhow, Context};
use chrono::{DateTime, NaiveDateTime};
use num_bigint::BigUint;
use std::str::FromStr;
use tracing::debug;

// Indexer timestamps come either as RFC 3339 or as naive UTC
pub fn parse_created_at(value: &str) -> Option<i64> {
    if let Ok(time) = DateTime::parse_from_rfc3339(value) {
        return Some(time.timestamp());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|time| time.and_utc().timestamp())
}

fn parse_amount(value: &str) -> Result<BigUint> {
    BigUint::from_str(value.trim()).with_context(|| format!("invalid amount {:?}", value))
}

/// Turns one indexer record into an order. Anything that is not a swap with
/// a route, or has unreadable fields, is an error.
pub fn decode_request(request: &RawRequest) -> Result<Order> {
    let swap = SwapInstruction::decode(&request.msg)?;
    if swap.route.is_none() {
        return Err(anyhow!("swap instruction has no route"));
    }

    let id = request
        .id
        .parse::<u64>()
        .with_context(|| format!("invalid request id {:?}", request.id))?;
    let status = OrderStatus::from_str(&request.status).map_err(|e| anyhow!(e))?;
    let created_at = parse_created_at(&request.created_at)
        .ok_or_else(|| anyhow!("invalid createdAt {:?}", request.created_at))?;

    let denom_in = swap
        .input_denom()
        .ok_or_else(|| anyhow!("swap instruction has no input denom"))?;
    let amount_in = swap
        .amount_in
        .as_deref()
        .ok_or_else(|| anyhow!("swap instruction has no input amount"))?;
    let denom_out = swap
        .output_denom()
        .ok_or_else(|| anyhow!("swap instruction has no output denom"))?;

    Ok(Order {
        id,
        order_type: swap.order_type(),
        status,
        created_at,
        input_token: Coin::new(denom_in, parse_amount(amount_in)?),
        output_token: Coin::new(denom_out, parse_amount(swap.quoted_output())?),
    })
}

/// Decodes a poll result, newest (highest id) first. Records that fail to
/// decode are left out.
pub fn decode_requests(requests: &[RawRequest]) -> Vec<Order> {
    let mut orders: Vec<Order> = requests
        .iter()
        .filter_map(|request| match decode_request(request) {
            Ok(order) => Some(order),
            Err(err) => {
                debug!(id = %request.id, error = %err, "skipping request");
                None
            }
        })
        .collect();

    orders.sort_by(|a, b| b.id.cmp(&a.id));
    orders
}

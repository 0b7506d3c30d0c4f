use crate::core::types::Coin;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Limit,
    StopLoss,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderType::Limit => write!(f, "Limit"),
            OrderType::StopLoss => write!(f, "StopLoss"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Created,
    Executed,
    Cancelled,
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(OrderStatus::Created),
            "executed" => Ok(OrderStatus::Executed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status {}", other)),
        }
    }
}

/// An order placed through the registry, as shown in the order history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: u64,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub status: OrderStatus,
    // Unix seconds
    pub created_at: i64,
    pub input_token: Coin,
    pub output_token: Coin,
}

/// Latest order list published by the history poller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderHistory {
    pub orders: Vec<Order>,
    // Set when the last refresh failed on both endpoints and `orders` is
    // carried over from an earlier tick
    pub stale: bool,
}

impl OrderHistory {
    pub fn by_status(&self, order_type: OrderType, status: OrderStatus) -> Vec<&Order> {
        orders_by_status(&self.orders, order_type, status)
    }
}

// Backs the Open / Executed / Cancelled tabs
pub fn orders_by_status(orders: &[Order], order_type: OrderType, status: OrderStatus) -> Vec<&Order> {
    orders
        .iter()
        .filter(|order| order.order_type == order_type && order.status == status)
        .collect()
}

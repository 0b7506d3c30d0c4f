use super::config::NetworkConfig;
use super::core::indexer::poller::{OrderHistoryPoller, PollerHandle};
use super::core::order_config::OrderTokenInConfig;
use super::core::request::{build_cancel_call, ContractCall};
use super::error::TradeError;
use super::types::OrderType;
use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{error, info};

/// The connected account. Signing and broadcasting happen behind this trait.
#[async_trait]
pub trait Wallet: Send + Sync {
    // None until the user connects
    fn address(&self) -> Option<String>;

    // Signs and broadcasts one contract execution, returning the tx hash
    async fn execute_contract(&self, call: &ContractCall) -> Result<String>;
}

/// Registers a limit or stop-loss order for the session's amount.
///
/// A cw20 input first raises the registry's allowance. If any transaction
/// fails the session is left as it was; on success the amount is cleared.
pub async fn place_order<W: Wallet>(
    wallet: &W,
    session: &mut OrderTokenInConfig,
    network: &NetworkConfig,
    order_type: OrderType,
) -> Result<String> {
    let user = wallet.address().ok_or(TradeError::WalletNotConnected)?;
    let plan = session.prepare_order(network, &user, order_type)?;

    if let Some(allowance) = &plan.allowance {
        let tx_hash = wallet
            .execute_contract(allowance)
            .await
            .inspect_err(|err| error!(%user, error = %err, "increase_allowance failed"))
            .context("Error increasing allowance")?;
        info!(%user, %tx_hash, token = %allowance.contract, "allowance increased");
    }

    let tx_hash = wallet
        .execute_contract(&plan.create_request)
        .await
        .inspect_err(|err| error!(%user, %order_type, error = %err, "create_request failed"))
        .context("Error creating order request")?;

    info!(%user, %order_type, %tx_hash, "order placed");
    session.set_fraction(None);
    session.set_amount("");
    Ok(tx_hash)
}

pub async fn cancel_order<W: Wallet>(wallet: &W, network: &NetworkConfig, id: u64) -> Result<String> {
    let user = wallet.address().ok_or(TradeError::WalletNotConnected)?;
    let call = build_cancel_call(network, id)?;

    let tx_hash = wallet
        .execute_contract(&call)
        .await
        .inspect_err(|err| error!(%user, id, error = %err, "cancel_request failed"))
        .with_context(|| format!("Error cancelling order {}", id))?;

    info!(%user, id, %tx_hash, "order cancelled");
    Ok(tx_hash)
}

// Polls the network's indexers for `account` until the handle is dropped
pub fn start_order_history(network: &NetworkConfig, account: Option<String>) -> Result<PollerHandle> {
    let mut poller = OrderHistoryPoller::new(network.indexer_client()?);
    poller.set_account(account);
    Ok(poller.spawn(network.poll_interval()))
}

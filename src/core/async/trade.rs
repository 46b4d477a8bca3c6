//! Buyer side of a two-party exchange
//!
//! The seller opens a session and sends an [`Amount`]. The buyer accepts any
//! offer unconditionally and hands it to a [`TradeProtocol`], which carries
//! out the actual exchange. Negotiation and the protocol itself live outside
//! this crate.
//!
//! ```text
//! AwaitingOffer ──offer──> Trading(amount) ──protocol.buy──> Done
//! ```

use crate::core::traits::IdentityService;
use crate::types::{FinalizedTransaction, LedgerError, PartyRef};
use futures::future::BoxFuture;
use rust_decimal::Decimal;
use std::fmt;
use tokio::sync::mpsc;
use tracing::info;

/// A quantity of some currency offered in a trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Amount {
    pub quantity: Decimal,
    pub currency: String,
}

impl Amount {
    pub fn new(quantity: Decimal, currency: impl Into<String>) -> Self {
        Self {
            quantity,
            currency: currency.into(),
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.quantity, self.currency)
    }
}

/// The external trade sub-protocol the buyer delegates to
pub trait TradeProtocol {
    /// Buy from the seller at `amount`, finalized by `notary`
    fn buy(
        &self,
        notary: PartyRef,
        amount: Amount,
    ) -> BoxFuture<'_, Result<FinalizedTransaction, LedgerError>>;
}

/// Where a [`BuyerFlow`] is in the exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuyerState {
    AwaitingOffer,
    Trading(Amount),
    Done,
}

/// Buyer end of a seller-initiated session
#[derive(Debug)]
pub struct BuyerFlow {
    session: mpsc::Receiver<Amount>,
    state: BuyerState,
}

impl BuyerFlow {
    /// Create a buyer listening on `session`
    pub fn new(session: mpsc::Receiver<Amount>) -> Self {
        Self {
            session,
            state: BuyerState::AwaitingOffer,
        }
    }

    pub fn state(&self) -> &BuyerState {
        &self.state
    }

    /// Receive one offer, accept it and run the trade protocol
    ///
    /// # Errors
    ///
    /// - `SessionClosed` if the seller hangs up before sending an offer
    /// - `NoNotary` if no notary is registered
    /// - Whatever the trade protocol fails with
    pub async fn run<S, P>(
        &mut self,
        identity: &S,
        protocol: &P,
    ) -> Result<FinalizedTransaction, LedgerError>
    where
        S: IdentityService,
        P: TradeProtocol,
    {
        let amount = self
            .session
            .recv()
            .await
            .ok_or_else(|| LedgerError::session_closed("awaiting offer"))?;
        info!(step = "Buying", offer = %amount, "Seller connected, accepting offer");

        let notary = identity.current_notary().ok_or(LedgerError::NoNotary)?;
        self.state = BuyerState::Trading(amount.clone());

        let trade = protocol.buy(notary, amount).await?;
        self.state = BuyerState::Done;

        info!(tx = %trade.id(), "Trade completed");
        Ok(trade)
    }
}

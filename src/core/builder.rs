//! Transaction builder
//!
//! Accumulates inputs, outputs, commands and a time window, then freezes
//! them into a [`WireTransaction`]. Builders are single-use scratchpads: flows
//! create one per transaction and hand it to contract helpers such as
//! `generate_move` to fill in.

use crate::types::{
    Command, CommandWithSigners, ContractId, LedgerTransaction, PartyRef, PublicKey,
    StateAndRef, StateData, TimeWindow, TransactionState, WireTransaction,
};
use std::time::{Duration, SystemTime};

/// Mutable transaction under construction
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    notary: PartyRef,
    inputs: Vec<StateAndRef>,
    outputs: Vec<TransactionState>,
    commands: Vec<CommandWithSigners>,
    time_window: Option<TimeWindow>,
    privacy_salt: [u8; 32],
}

impl TransactionBuilder {
    /// Start an empty transaction to be notarised by `notary`
    ///
    /// A fresh random privacy salt is drawn so two builders with identical
    /// content still produce distinct transaction ids.
    pub fn new(notary: PartyRef) -> Self {
        TransactionBuilder {
            notary,
            inputs: Vec::new(),
            outputs: Vec::new(),
            commands: Vec::new(),
            time_window: None,
            privacy_salt: rand::random(),
        }
    }

    pub fn notary(&self) -> &PartyRef {
        &self.notary
    }

    pub fn add_input_state(&mut self, state: StateAndRef) -> &mut Self {
        self.inputs.push(state);
        self
    }

    pub fn add_output_state(&mut self, data: StateData, contract: ContractId) -> &mut Self {
        self.outputs.push(TransactionState::new(data, contract));
        self
    }

    pub fn add_command(
        &mut self,
        command: Command,
        signers: impl IntoIterator<Item = PublicKey>,
    ) -> &mut Self {
        self.commands.push(CommandWithSigners::new(command, signers));
        self
    }

    /// Set a window starting at `from` and lasting `duration`
    pub fn set_time_window(&mut self, from: SystemTime, duration: Duration) -> &mut Self {
        self.time_window = Some(TimeWindow::from_start_and_duration(from, duration));
        self
    }

    pub fn input_states(&self) -> &[StateAndRef] {
        &self.inputs
    }

    pub fn output_states(&self) -> &[TransactionState] {
        &self.outputs
    }

    pub fn commands(&self) -> &[CommandWithSigners] {
        &self.commands
    }

    /// Freeze the builder into an unsigned transaction
    pub fn to_wire_transaction(&self) -> WireTransaction {
        WireTransaction::new(
            self.inputs.iter().map(|input| input.state_ref).collect(),
            self.outputs.clone(),
            self.commands.clone(),
            self.time_window,
            self.notary.clone(),
            self.privacy_salt,
        )
    }

    /// Ledger view of the builder, for verifying before signing
    ///
    /// The builder already holds resolved inputs, so no lookup is needed.
    pub fn to_ledger_transaction(&self) -> LedgerTransaction {
        let wire = self.to_wire_transaction();
        LedgerTransaction {
            id: wire.id(),
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            commands: self.commands.clone(),
            time_window: self.time_window,
            notary: self.notary.clone(),
        }
    }
}

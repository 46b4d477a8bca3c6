//! Land title contract
//!
//! This module provides the verification rules for title transactions and the
//! move generator that assembles a transfer.
//!
//! The contract enforces:
//! - Exactly one command per transaction
//! - Issuances: one title output, a time window, no inputs
//! - Moves: one output, signed per the configured authorization rule, and
//!   consuming exactly one title with the same id
//!
//! Verification is a pure function over a [`LedgerTransaction`]. It holds no
//! state and can be called from any thread.

use crate::core::builder::TransactionBuilder;
use crate::types::{
    AssetState, Command, ContractId, LedgerTransaction, PartyRef, PublicKey, StateAndRef,
    StateData, VerificationError,
};
use clap::ValueEnum;
use std::collections::BTreeSet;

/// Contract id used when none is configured
pub const DEFAULT_CONTRACT_ID: &str = "land_title_ledger.AssetContract";

/// Whose signature authorizes a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum MoveAuthorization {
    /// The owner of the consumed title must sign (the holder gives it away)
    #[default]
    CurrentOwner,

    /// The owner of the produced title must sign (the recipient accepts it)
    NewOwner,
}

impl MoveAuthorization {
    /// Keys the move generator must request for a transfer from `current` to `new_owner`
    ///
    /// Under `NewOwner` the current owner still signs so the holder always
    /// takes part in giving the title away.
    fn required_signers(&self, current: &PartyRef, new_owner: &PartyRef) -> Vec<PublicKey> {
        match self {
            MoveAuthorization::CurrentOwner => vec![current.owning_key],
            MoveAuthorization::NewOwner => vec![current.owning_key, new_owner.owning_key],
        }
    }
}

/// Verification rules and transaction helpers for land titles
#[derive(Debug, Clone)]
pub struct AssetContract {
    id: ContractId,
    move_authorization: MoveAuthorization,
    require_issuer_signature: bool,
}

impl AssetContract {
    /// Create a contract with the given id and rules
    ///
    /// # Arguments
    ///
    /// * `id` - Identifier tagged onto every title output
    /// * `move_authorization` - Whose signature a move requires
    /// * `require_issuer_signature` - Whether an issuance must be signed by the title's issuer
    pub fn new(
        id: ContractId,
        move_authorization: MoveAuthorization,
        require_issuer_signature: bool,
    ) -> Self {
        AssetContract {
            id,
            move_authorization,
            require_issuer_signature,
        }
    }

    pub fn id(&self) -> &ContractId {
        &self.id
    }

    pub fn move_authorization(&self) -> MoveAuthorization {
        self.move_authorization
    }

    pub fn requires_issuer_signature(&self) -> bool {
        self.require_issuer_signature
    }

    /// Verify a transaction against the title rules
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the transaction is acceptable
    /// * `Err(VerificationError)` naming the first broken rule
    ///
    /// # Errors
    ///
    /// - `MalformedTransaction` if there is not exactly one command
    /// - `UnrecognizedCommand` if that command is not Issue or Move
    /// - Any error from the Issue or Move rules
    pub fn verify(&self, tx: &LedgerTransaction) -> Result<(), VerificationError> {
        let command = match tx.commands.as_slice() {
            [single] => single,
            commands => return Err(VerificationError::malformed_transaction(commands.len())),
        };

        match &command.value {
            Command::Issue => self.verify_issue(tx, &command.signers),
            Command::Move => self.verify_move(tx, &command.signers),
            Command::External(name) => Err(VerificationError::unrecognized_command(name)),
        }
    }

    fn verify_issue(
        &self,
        tx: &LedgerTransaction,
        signers: &BTreeSet<PublicKey>,
    ) -> Result<(), VerificationError> {
        let output = single_asset_output(tx)?;

        if tx.time_window.is_none() {
            return Err(VerificationError::MissingTimeWindow);
        }

        if !tx.inputs.is_empty() {
            return Err(VerificationError::unexpected_input(tx.inputs.len()));
        }

        // Stops parties issuing titles under someone else's identity
        if self.require_issuer_signature && !signers.contains(&output.issuer.owning_key) {
            return Err(VerificationError::unauthorized_signer(
                "issuer",
                output.issuer.owning_key,
            ));
        }

        Ok(())
    }

    fn verify_move(
        &self,
        tx: &LedgerTransaction,
        signers: &BTreeSet<PublicKey>,
    ) -> Result<(), VerificationError> {
        if tx.outputs.len() != 1 {
            return Err(VerificationError::state_propagation(format!(
                "a move must produce exactly one output, found {}",
                tx.outputs.len()
            )));
        }

        let output = single_asset_output(tx)?;

        let mut inputs = tx.inputs.iter().filter_map(StateAndRef::asset);
        let input = match (inputs.next(), inputs.next()) {
            (Some(input), None) => Some(input),
            _ => None,
        };

        match self.move_authorization {
            MoveAuthorization::NewOwner => {
                if !signers.contains(&output.owner.owning_key) {
                    return Err(VerificationError::unauthorized_signer(
                        "new owner",
                        output.owner.owning_key,
                    ));
                }
            }
            MoveAuthorization::CurrentOwner => {
                // A missing input is reported as a propagation problem below
                if let Some(input) = input {
                    if !signers.contains(&input.owner.owning_key) {
                        return Err(VerificationError::unauthorized_signer(
                            "current owner",
                            input.owner.owning_key,
                        ));
                    }
                }
            }
        }

        let input = input.ok_or_else(|| {
            VerificationError::state_propagation(format!(
                "a move must consume exactly one title, found {}",
                tx.inputs.iter().filter_map(StateAndRef::asset).count()
            ))
        })?;

        if input.asset_id != output.asset_id {
            return Err(VerificationError::state_propagation(format!(
                "title '{}' cannot become '{}'",
                input.asset_id, output.asset_id
            )));
        }

        Ok(())
    }

    /// Add a transfer of `title` to `new_owner` to the builder
    ///
    /// Adds the title as an input, a copy held by `new_owner` as the only new
    /// output, and a Move command signed per the authorization rule.
    ///
    /// # Errors
    ///
    /// Returns `AmbiguousOutput` if `title` does not carry a land title. The
    /// builder is left untouched in that case.
    pub fn generate_move(
        &self,
        builder: &mut TransactionBuilder,
        title: &StateAndRef,
        new_owner: PartyRef,
    ) -> Result<(), VerificationError> {
        let current = title
            .asset()
            .ok_or_else(|| VerificationError::ambiguous_output(0))?;
        let signers = self
            .move_authorization
            .required_signers(&current.owner, &new_owner);
        let moved = current.with_owner(new_owner);

        builder
            .add_input_state(title.clone())
            .add_output_state(StateData::Asset(moved), self.id.clone())
            .add_command(Command::Move, signers);

        Ok(())
    }
}

fn single_asset_output(tx: &LedgerTransaction) -> Result<&AssetState, VerificationError> {
    let mut outputs = tx.outputs.iter().filter_map(|output| output.data.as_asset());
    match (outputs.next(), outputs.next()) {
        (Some(output), None) => Ok(output),
        _ => Err(VerificationError::ambiguous_output(
            tx.outputs
                .iter()
                .filter(|output| output.data.as_asset().is_some())
                .count(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        CommandWithSigners, StateRef, TimeWindow, TransactionId, TransactionState,
    };
    use rstest::rstest;
    use std::time::{Duration, SystemTime};

    fn party(name: &str, byte: u8) -> PartyRef {
        PartyRef::new(name, PublicKey::from_bytes([byte; 32]))
    }

    fn p1() -> PartyRef {
        party("P1", 1)
    }

    fn p2() -> PartyRef {
        party("P2", 2)
    }

    fn p3() -> PartyRef {
        party("P3", 3)
    }

    fn notary() -> PartyRef {
        party("Notary", 9)
    }

    fn contract(auth: MoveAuthorization) -> AssetContract {
        AssetContract::new(ContractId::new(DEFAULT_CONTRACT_ID), auth, false)
    }

    fn title_state(owner: PartyRef) -> TransactionState {
        TransactionState::new(
            StateData::Asset(AssetState::new("TITLE-001", p1(), owner)),
            ContractId::new(DEFAULT_CONTRACT_ID),
        )
    }

    fn external_state() -> TransactionState {
        TransactionState::new(
            StateData::External {
                kind: "Cash".to_string(),
            },
            ContractId::new("cash"),
        )
    }

    fn title_input(owner: PartyRef) -> StateAndRef {
        StateAndRef::new(
            title_state(owner),
            StateRef::new(TransactionId::from_bytes([1u8; 32]), 0),
        )
    }

    fn window() -> Option<TimeWindow> {
        Some(TimeWindow::from_start_and_duration(
            SystemTime::now(),
            Duration::from_secs(30),
        ))
    }

    fn ltx(
        inputs: Vec<StateAndRef>,
        outputs: Vec<TransactionState>,
        commands: Vec<CommandWithSigners>,
        time_window: Option<TimeWindow>,
    ) -> LedgerTransaction {
        LedgerTransaction {
            id: TransactionId::from_bytes([0u8; 32]),
            inputs,
            outputs,
            commands,
            time_window,
            notary: notary(),
        }
    }

    fn issue(signers: &[PartyRef]) -> CommandWithSigners {
        CommandWithSigners::new(Command::Issue, signers.iter().map(|p| p.owning_key))
    }

    fn mv(signers: &[PartyRef]) -> CommandWithSigners {
        CommandWithSigners::new(Command::Move, signers.iter().map(|p| p.owning_key))
    }

    // Issue rules

    #[test]
    fn test_valid_issue_is_accepted() {
        let tx = ltx(vec![], vec![title_state(p2())], vec![issue(&[p1()])], window());

        assert!(contract(MoveAuthorization::CurrentOwner).verify(&tx).is_ok());
    }

    #[test]
    fn test_issue_with_input_is_rejected() {
        let tx = ltx(
            vec![title_input(p2())],
            vec![title_state(p2())],
            vec![issue(&[p1()])],
            window(),
        );

        let result = contract(MoveAuthorization::CurrentOwner).verify(&tx);
        assert_eq!(result, Err(VerificationError::UnexpectedInput { count: 1 }));
    }

    #[test]
    fn test_issue_without_time_window_is_rejected() {
        let tx = ltx(vec![], vec![title_state(p2())], vec![issue(&[p1()])], None);

        let result = contract(MoveAuthorization::CurrentOwner).verify(&tx);
        assert_eq!(result, Err(VerificationError::MissingTimeWindow));
    }

    #[rstest]
    #[case::no_outputs(vec![], 0)]
    #[case::only_external(vec![external_state()], 0)]
    #[case::two_titles(vec![title_state(p2()), title_state(p3())], 2)]
    fn test_issue_requires_single_title_output(
        #[case] outputs: Vec<TransactionState>,
        #[case] found: usize,
    ) {
        let tx = ltx(vec![], outputs, vec![issue(&[p1()])], window());

        let result = contract(MoveAuthorization::CurrentOwner).verify(&tx);
        assert_eq!(result, Err(VerificationError::AmbiguousOutput { count: found }));
    }

    #[test]
    fn test_issuer_signature_only_checked_when_required() {
        // Signed by the owner, not the issuer
        let tx = ltx(vec![], vec![title_state(p2())], vec![issue(&[p2()])], window());

        let lenient = contract(MoveAuthorization::CurrentOwner);
        assert!(lenient.verify(&tx).is_ok());

        let strict = AssetContract::new(
            ContractId::new(DEFAULT_CONTRACT_ID),
            MoveAuthorization::CurrentOwner,
            true,
        );
        assert!(matches!(
            strict.verify(&tx),
            Err(VerificationError::UnauthorizedSigner { key, .. }) if key == p1().owning_key
        ));
    }

    // Command extraction

    #[rstest]
    #[case::no_commands(vec![], 0)]
    #[case::two_commands(vec![issue(&[p1()]), mv(&[p2()])], 2)]
    fn test_requires_single_command(
        #[case] commands: Vec<CommandWithSigners>,
        #[case] count: usize,
    ) {
        let tx = ltx(vec![], vec![title_state(p2())], commands, window());

        let result = contract(MoveAuthorization::CurrentOwner).verify(&tx);
        assert_eq!(result, Err(VerificationError::MalformedTransaction { count }));
    }

    #[test]
    fn test_external_command_is_unrecognized() {
        let command = CommandWithSigners::new(Command::External("Redeem".to_string()), []);
        let tx = ltx(vec![], vec![title_state(p2())], vec![command], window());

        let result = contract(MoveAuthorization::CurrentOwner).verify(&tx);
        assert_eq!(
            result,
            Err(VerificationError::UnrecognizedCommand {
                command: "Redeem".to_string()
            })
        );
    }

    // Move rules

    #[test]
    fn test_move_signed_by_current_owner_is_accepted() {
        let tx = ltx(
            vec![title_input(p2())],
            vec![title_state(p3())],
            vec![mv(&[p2()])],
            None,
        );

        assert!(contract(MoveAuthorization::CurrentOwner).verify(&tx).is_ok());
    }

    #[test]
    fn test_move_signed_only_by_issuer_is_rejected() {
        let tx = ltx(
            vec![title_input(p2())],
            vec![title_state(p3())],
            vec![mv(&[p1()])],
            None,
        );

        for auth in [MoveAuthorization::CurrentOwner, MoveAuthorization::NewOwner] {
            assert!(matches!(
                contract(auth).verify(&tx),
                Err(VerificationError::UnauthorizedSigner { .. })
            ));
        }
    }

    #[rstest]
    #[case::zero_outputs(vec![])]
    #[case::two_titles(vec![title_state(p3()), title_state(p3())])]
    #[case::title_and_external(vec![title_state(p3()), external_state()])]
    fn test_move_output_count_must_be_one(
        #[case] outputs: Vec<TransactionState>,
        #[values(MoveAuthorization::CurrentOwner, MoveAuthorization::NewOwner)]
        auth: MoveAuthorization,
    ) {
        let tx = ltx(vec![title_input(p2())], outputs, vec![mv(&[p2(), p3()])], None);

        assert!(matches!(
            contract(auth).verify(&tx),
            Err(VerificationError::StatePropagationViolation { .. })
        ));
    }

    #[test]
    fn test_new_owner_rule_requires_output_owner_signature() {
        let policy = contract(MoveAuthorization::NewOwner);

        let signed_by_holder = ltx(
            vec![title_input(p2())],
            vec![title_state(p3())],
            vec![mv(&[p2()])],
            None,
        );
        assert!(matches!(
            policy.verify(&signed_by_holder),
            Err(VerificationError::UnauthorizedSigner { key, .. }) if key == p3().owning_key
        ));

        let signed_by_recipient = ltx(
            vec![title_input(p2())],
            vec![title_state(p3())],
            vec![mv(&[p3()])],
            None,
        );
        assert!(policy.verify(&signed_by_recipient).is_ok());
    }

    #[test]
    fn test_move_with_external_output_is_ambiguous() {
        let tx = ltx(
            vec![title_input(p2())],
            vec![external_state()],
            vec![mv(&[p2()])],
            None,
        );

        let result = contract(MoveAuthorization::CurrentOwner).verify(&tx);
        assert_eq!(result, Err(VerificationError::AmbiguousOutput { count: 0 }));
    }

    #[test]
    fn test_move_without_title_input_is_rejected() {
        let tx = ltx(vec![], vec![title_state(p3())], vec![mv(&[p2(), p3()])], None);

        for auth in [MoveAuthorization::CurrentOwner, MoveAuthorization::NewOwner] {
            assert!(matches!(
                contract(auth).verify(&tx),
                Err(VerificationError::StatePropagationViolation { .. })
            ));
        }
    }

    #[test]
    fn test_move_cannot_change_title_id() {
        let renamed = TransactionState::new(
            StateData::Asset(AssetState::new("TITLE-999", p1(), p3())),
            ContractId::new(DEFAULT_CONTRACT_ID),
        );
        let tx = ltx(vec![title_input(p2())], vec![renamed], vec![mv(&[p2()])], None);

        assert!(matches!(
            contract(MoveAuthorization::CurrentOwner).verify(&tx),
            Err(VerificationError::StatePropagationViolation { .. })
        ));
    }

    // Move generator

    #[rstest]
    #[case::current_owner(MoveAuthorization::CurrentOwner, vec![p2()])]
    #[case::new_owner(MoveAuthorization::NewOwner, vec![p2(), p3()])]
    fn test_generate_move_builds_transfer(
        #[case] auth: MoveAuthorization,
        #[case] expected_signers: Vec<PartyRef>,
    ) {
        let contract = contract(auth);
        let title = title_input(p2());
        let mut builder = TransactionBuilder::new(notary());

        contract.generate_move(&mut builder, &title, p3()).unwrap();

        assert_eq!(builder.input_states(), &[title.clone()]);
        assert_eq!(builder.output_states().len(), 1);
        let output = builder.output_states()[0].data.as_asset().unwrap();
        assert_eq!(output.owner, p3());
        assert_eq!(output.asset_id, "TITLE-001");
        assert_eq!(builder.output_states()[0].contract, *contract.id());

        assert_eq!(builder.commands().len(), 1);
        assert_eq!(builder.commands()[0].value, Command::Move);
        let expected: BTreeSet<PublicKey> = expected_signers.iter().map(|p| p.owning_key).collect();
        assert_eq!(builder.commands()[0].signers, expected);

        // Whatever the rule, the generated transfer verifies under it
        assert!(contract.verify(&builder.to_ledger_transaction()).is_ok());
    }

    #[test]
    fn test_generate_move_rejects_non_title() {
        let contract = contract(MoveAuthorization::CurrentOwner);
        let not_a_title = StateAndRef::new(
            external_state(),
            StateRef::new(TransactionId::from_bytes([1u8; 32]), 0),
        );
        let mut builder = TransactionBuilder::new(notary());

        let result = contract.generate_move(&mut builder, &not_a_title, p3());

        assert!(matches!(result, Err(VerificationError::AmbiguousOutput { .. })));
        assert!(builder.input_states().is_empty());
        assert!(builder.commands().is_empty());
    }
}

//! CSV format handling for ledger operations and title holdings
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to domain operations
//! - Holdings output serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{Operation, OperationType, StateAndRef};
use serde::Deserialize;
use std::io::Write;

/// CSV record structure for deserialization
///
/// Matches the input CSV format with columns: op, title, issuer, owner,
/// recipient. Which of the party columns are required depends on `op`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub op: String,
    pub title: String,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
}

/// A present, non-blank field
fn field(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Convert a CsvRecord to an Operation
///
/// - `issue` needs title, issuer and owner; recipient defaults to the owner
/// - `transfer` needs title and owner, the party the title moves to
///
/// # Arguments
///
/// * `csv_record` - The deserialized CSV record
///
/// # Returns
///
/// Result containing either:
/// - Ok(Operation) - Successfully converted record
/// - Err(String) - Error message describing the conversion failure
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<Operation, String> {
    let op_type = match csv_record.op.to_lowercase().as_str() {
        "issue" => OperationType::Issue,
        "transfer" => OperationType::Transfer,
        _ => {
            return Err(format!(
                "Invalid operation: '{}' for title {}",
                csv_record.op, csv_record.title
            ))
        }
    };

    if csv_record.title.trim().is_empty() {
        return Err(format!("{} operation requires a title", op_type));
    }

    let missing = |column: &str| {
        format!(
            "{} operation for title {} requires {}",
            op_type, csv_record.title, column
        )
    };

    match op_type {
        OperationType::Issue => {
            let issuer = field(csv_record.issuer).ok_or_else(|| missing("an issuer"))?;
            let owner = field(csv_record.owner).ok_or_else(|| missing("an owner"))?;
            let recipient = field(csv_record.recipient).unwrap_or_else(|| owner.clone());
            Ok(Operation::Issue {
                title: csv_record.title,
                issuer,
                owner,
                recipient,
            })
        }
        OperationType::Transfer => {
            let new_owner = field(csv_record.owner).ok_or_else(|| missing("an owner"))?;
            Ok(Operation::Transfer {
                title: csv_record.title,
                new_owner,
            })
        }
    }
}

/// Write title holdings to CSV format
///
/// Writes unconsumed titles with columns: title, issuer, owner, tx.
/// Rows are sorted by title, then by transaction id, for deterministic output.
/// States that are not titles are skipped.
///
/// # Arguments
///
/// * `holdings` - Unconsumed states to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(String)` if a write error occurred
pub fn write_holdings_csv(holdings: &[StateAndRef], output: &mut dyn Write) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["title", "issuer", "owner", "tx"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut rows: Vec<[String; 4]> = holdings
        .iter()
        .filter_map(|held| {
            held.asset().map(|asset| {
                [
                    asset.asset_id.clone(),
                    asset.issuer.name.clone(),
                    asset.owner.name.clone(),
                    held.state_ref.to_string(),
                ]
            })
        })
        .collect();
    rows.sort_by(|a, b| (&a[0], &a[3]).cmp(&(&b[0], &b[3])));

    for row in rows {
        writer
            .write_record(&row)
            .map_err(|e| format!("Failed to write holding record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AssetState, ContractId, PartyRef, PublicKey, StateData, StateRef, TransactionId,
        TransactionState,
    };
    use rstest::rstest;

    fn record(op: &str, title: &str, issuer: &str, owner: &str, recipient: &str) -> CsvRecord {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        CsvRecord {
            op: op.to_string(),
            title: title.to_string(),
            issuer: opt(issuer),
            owner: opt(owner),
            recipient: opt(recipient),
        }
    }

    #[rstest]
    #[case::explicit_recipient("issue", "P3", "P3")]
    #[case::recipient_defaults_to_owner("issue", "", "P2")]
    #[case::case_insensitive("ISSUE", "", "P2")]
    fn test_convert_issue(#[case] op: &str, #[case] recipient: &str, #[case] expected: &str) {
        let result = convert_csv_record(record(op, "TITLE-001", "P1", "P2", recipient));

        assert_eq!(
            result,
            Ok(Operation::Issue {
                title: "TITLE-001".to_string(),
                issuer: "P1".to_string(),
                owner: "P2".to_string(),
                recipient: expected.to_string(),
            })
        );
    }

    #[test]
    fn test_convert_transfer() {
        let result = convert_csv_record(record("transfer", "TITLE-001", "", "P3", ""));

        assert_eq!(
            result,
            Ok(Operation::Transfer {
                title: "TITLE-001".to_string(),
                new_owner: "P3".to_string(),
            })
        );
    }

    #[rstest]
    #[case::unknown_op(record("burn", "TITLE-001", "P1", "P2", ""), "Invalid operation")]
    #[case::missing_title(record("issue", " ", "P1", "P2", ""), "requires a title")]
    #[case::issue_without_issuer(record("issue", "TITLE-001", "", "P2", ""), "requires an issuer")]
    #[case::issue_without_owner(record("issue", "TITLE-001", "P1", "", "P3"), "requires an owner")]
    #[case::transfer_without_owner(record("transfer", "TITLE-001", "P1", "", "P3"), "requires an owner")]
    fn test_convert_invalid(#[case] csv_record: CsvRecord, #[case] expected: &str) {
        let error = convert_csv_record(csv_record).unwrap_err();
        assert!(error.contains(expected), "unexpected error: {}", error);
    }

    fn held(asset_id: &str, owner: &str, tx_byte: u8) -> StateAndRef {
        let issuer = PartyRef::new("P1", PublicKey::from_bytes([1u8; 32]));
        let owner = PartyRef::new(owner, PublicKey::from_bytes([tx_byte; 32]));
        StateAndRef::new(
            TransactionState::new(
                StateData::Asset(AssetState::new(asset_id, issuer, owner)),
                ContractId::new("test"),
            ),
            StateRef::new(TransactionId::from_bytes([tx_byte; 32]), 0),
        )
    }

    #[test]
    fn test_write_holdings_sorted() {
        let holdings = vec![
            held("TITLE-002", "P3", 0xbb),
            held("TITLE-001", "P2", 0xcc),
            held("TITLE-001", "P3", 0xaa),
        ];
        let mut output = Vec::new();

        write_holdings_csv(&holdings, &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "title,issuer,owner,tx");
        assert_eq!(lines.len(), 4);
        assert!(lines[1].starts_with("TITLE-001,P1,P3,AAAA"));
        assert!(lines[2].starts_with("TITLE-001,P1,P2,CCCC"));
        assert!(lines[3].starts_with("TITLE-002,P1,P3,BBBB"));
    }

    #[test]
    fn test_write_holdings_skips_other_states() {
        let other = StateAndRef::new(
            TransactionState::new(
                StateData::External {
                    kind: "cash".to_string(),
                },
                ContractId::new("cash"),
            ),
            StateRef::new(TransactionId::from_bytes([7u8; 32]), 0),
        );
        let mut output = Vec::new();

        write_holdings_csv(&[other], &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "title,issuer,owner,tx\n");
    }
}

//! Programmable Transaction Request
//!
//! The JSON structure handed to the wallet for signing: an ordered list of
//! inputs and commands. Object inputs are unresolved (ID only); the wallet
//! fills in versions, ownership and gas before signing.

use serde::{Deserialize, Serialize};

use depeg_core::TxError;

use crate::coin_select::SelectedCoins;

/// Reference to an input or to the result of an earlier command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Argument {
    GasCoin,
    Input(u16),
    Result(u16),
    NestedResult(u16, u16),
}

impl Argument {
    /// The `index`-th value returned by a command with several results.
    pub fn nested(self, index: u16) -> Option<Argument> {
        match self {
            Argument::Result(cmd) => Some(Argument::NestedResult(cmd, index)),
            _ => None,
        }
    }
}

/// Pure (BCS scalar) input value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PureArg {
    /// Decimal string, so JSON consumers never round it
    U64(String),
    Address(String),
}

/// Transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallArg {
    #[serde(rename_all = "camelCase")]
    Object { object_id: String },
    Pure(PureArg),
}

/// One step of the programmable transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    SplitCoins {
        coin: Argument,
        amounts: Vec<Argument>,
    },
    MergeCoins {
        destination: Argument,
        sources: Vec<Argument>,
    },
    #[serde(rename_all = "camelCase")]
    MoveCall {
        package: String,
        module: String,
        function: String,
        type_arguments: Vec<String>,
        arguments: Vec<Argument>,
    },
    TransferObjects {
        objects: Vec<Argument>,
        address: Argument,
    },
}

/// Complete unsigned transaction request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub sender: String,
    pub inputs: Vec<CallArg>,
    pub commands: Vec<Command>,
}

impl TransactionRequest {
    pub fn to_json(&self) -> Result<serde_json::Value, TxError> {
        serde_json::to_value(self).map_err(|e| TxError::SerializationFailed {
            message: e.to_string(),
        })
    }

    /// Fully-qualified targets of every move call, in order
    pub fn move_call_targets(&self) -> Vec<String> {
        self.commands
            .iter()
            .filter_map(|cmd| match cmd {
                Command::MoveCall {
                    package,
                    module,
                    function,
                    ..
                } => Some(format!("{}::{}::{}", package, module, function)),
                _ => None,
            })
            .collect()
    }
}

/// Incremental builder for [`TransactionRequest`]
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    sender: String,
    inputs: Vec<CallArg>,
    commands: Vec<Command>,
}

impl TransactionBuilder {
    pub fn new(sender: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            inputs: Vec::new(),
            commands: Vec::new(),
        }
    }

    fn push_input(&mut self, arg: CallArg) -> Argument {
        self.inputs.push(arg);
        Argument::Input((self.inputs.len() - 1) as u16)
    }

    fn push_command(&mut self, cmd: Command) -> Argument {
        self.commands.push(cmd);
        Argument::Result((self.commands.len() - 1) as u16)
    }

    /// Object input. The same object ID always maps to the same input.
    pub fn object(&mut self, object_id: &str) -> Argument {
        let existing = self.inputs.iter().position(|input| {
            matches!(input, CallArg::Object { object_id: id } if id == object_id)
        });
        match existing {
            Some(idx) => Argument::Input(idx as u16),
            None => self.push_input(CallArg::Object {
                object_id: object_id.to_string(),
            }),
        }
    }

    pub fn pure_u64(&mut self, value: u64) -> Argument {
        self.push_input(CallArg::Pure(PureArg::U64(value.to_string())))
    }

    pub fn pure_address(&mut self, address: &str) -> Argument {
        self.push_input(CallArg::Pure(PureArg::Address(address.to_string())))
    }

    /// Split `amounts` off `coin`; one new coin per amount.
    pub fn split_coins(&mut self, coin: Argument, amounts: &[u64]) -> Vec<Argument> {
        let amount_args: Vec<Argument> = amounts.iter().map(|&a| self.pure_u64(a)).collect();
        let count = amount_args.len() as u16;
        let result = self.push_command(Command::SplitCoins {
            coin,
            amounts: amount_args,
        });
        (0..count).filter_map(|i| result.nested(i)).collect()
    }

    /// Split a single coin of exactly `amount` off `coin`.
    pub fn split_coin(&mut self, coin: Argument, amount: u64) -> Argument {
        let amount_arg = self.pure_u64(amount);
        let result = self.push_command(Command::SplitCoins {
            coin,
            amounts: vec![amount_arg],
        });
        Argument::NestedResult(
            match result {
                Argument::Result(idx) => idx,
                _ => 0,
            },
            0,
        )
    }

    pub fn merge_coins(&mut self, destination: Argument, sources: Vec<Argument>) {
        if sources.is_empty() {
            return;
        }
        self.push_command(Command::MergeCoins {
            destination,
            sources,
        });
    }

    /// Merge the selected coin objects and split off exactly `amount`.
    pub fn coin_with_amount(&mut self, selection: &SelectedCoins, amount: u64) -> Argument {
        let primary = self.object(&selection.primary);
        let sources: Vec<Argument> = selection.merge.iter().map(|id| self.object(id)).collect();
        self.merge_coins(primary, sources);
        self.split_coin(primary, amount)
    }

    /// Call `package::module::function`. Use [`Argument::nested`] on the
    /// result to reach individual return values.
    pub fn move_call(
        &mut self,
        target: &str,
        type_arguments: Vec<String>,
        arguments: Vec<Argument>,
    ) -> Result<Argument, TxError> {
        let mut parts = target.split("::");
        let (package, module, function) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(m), Some(f), None) if !p.is_empty() && !m.is_empty() && !f.is_empty() => {
                (p, m, f)
            }
            _ => {
                return Err(TxError::BuildFailed {
                    message: format!("invalid move call target '{}'", target),
                })
            }
        };

        Ok(self.push_command(Command::MoveCall {
            package: package.to_string(),
            module: module.to_string(),
            function: function.to_string(),
            type_arguments,
            arguments,
        }))
    }

    pub fn transfer_objects(&mut self, objects: Vec<Argument>, recipient: &str) {
        let address = self.pure_address(recipient);
        self.push_command(Command::TransferObjects { objects, address });
    }

    pub fn build(self) -> Result<TransactionRequest, TxError> {
        if self.commands.is_empty() {
            return Err(TxError::BuildFailed {
                message: "transaction has no commands".to_string(),
            });
        }
        Ok(TransactionRequest {
            sender: self.sender,
            inputs: self.inputs,
            commands: self.commands,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENDER: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

    #[test]
    fn test_object_inputs_are_deduplicated() {
        let mut tx = TransactionBuilder::new(SENDER);
        let a = tx.object("0xaa");
        let b = tx.object("0xbb");
        let a_again = tx.object("0xaa");
        assert_eq!(a, Argument::Input(0));
        assert_eq!(b, Argument::Input(1));
        assert_eq!(a_again, a);
    }

    #[test]
    fn test_split_and_transfer() {
        let mut tx = TransactionBuilder::new(SENDER);
        let coin = tx.object("0xc0");
        let split = tx.split_coin(coin, 500);
        assert_eq!(split, Argument::NestedResult(0, 0));
        tx.transfer_objects(vec![split], SENDER);

        let request = tx.build().unwrap();
        assert_eq!(request.inputs.len(), 3);
        assert_eq!(
            request.inputs[1],
            CallArg::Pure(PureArg::U64("500".to_string()))
        );
        assert_eq!(request.commands.len(), 2);
    }

    #[test]
    fn test_split_many() {
        let mut tx = TransactionBuilder::new(SENDER);
        let coin = tx.object("0xc0");
        let parts = tx.split_coins(coin, &[1, 2, 3]);
        assert_eq!(
            parts,
            vec![
                Argument::NestedResult(0, 0),
                Argument::NestedResult(0, 1),
                Argument::NestedResult(0, 2)
            ]
        );
    }

    #[test]
    fn test_move_call_target_parsing() {
        let mut tx = TransactionBuilder::new(SENDER);
        let result = tx
            .move_call("0xpkg::vault::redeem_underlying", vec!["0x2::sui::SUI".into()], vec![])
            .unwrap();
        assert_eq!(result, Argument::Result(0));
        assert_eq!(result.nested(1), Some(Argument::NestedResult(0, 1)));

        assert!(tx.move_call("0xpkg::vault", vec![], vec![]).is_err());
        assert!(tx.move_call("0xpkg::vault::f::g", vec![], vec![]).is_err());

        let request = tx.build().unwrap();
        assert_eq!(
            request.move_call_targets(),
            vec!["0xpkg::vault::redeem_underlying".to_string()]
        );
    }

    #[test]
    fn test_coin_with_amount_merges_first() {
        let selection = SelectedCoins {
            primary: "0xbig".into(),
            merge: vec!["0xsmall".into()],
            total: 150,
        };
        let mut tx = TransactionBuilder::new(SENDER);
        let coin = tx.coin_with_amount(&selection, 120);
        assert_eq!(coin, Argument::NestedResult(1, 0));

        let request = tx.build().unwrap();
        assert!(matches!(
            request.commands[0],
            Command::MergeCoins { destination: Argument::Input(0), .. }
        ));
        assert!(matches!(request.commands[1], Command::SplitCoins { .. }));
    }

    #[test]
    fn test_empty_build_fails() {
        assert!(TransactionBuilder::new(SENDER).build().is_err());
    }

    #[test]
    fn test_json_shape() {
        let mut tx = TransactionBuilder::new(SENDER);
        let coin = tx.object("0xc0");
        tx.split_coin(coin, 7);
        let json = tx.build().unwrap().to_json().unwrap();
        assert_eq!(json["sender"], SENDER);
        assert_eq!(json["inputs"][0]["Object"]["objectId"], "0xc0");
        assert_eq!(json["inputs"][1]["Pure"]["U64"], "7");
        assert_eq!(json["commands"][0]["SplitCoins"]["coin"]["Input"], 0);
    }
}

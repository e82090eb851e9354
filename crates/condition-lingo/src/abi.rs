//! Minimal ABI support: just enough to encode calls and decode returns for
//! the closed set of standard contract types plus arbitrary explicit ABIs
//! restricted to the scalar/sequence types `ConditionValue` can represent.

use crate::value::ConditionValue;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use threshold_errors::{NodeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StandardContractType {
    #[serde(rename = "ERC20")]
    Erc20,
    #[serde(rename = "ERC721")]
    Erc721,
}

/// One entry of a minimal function ABI: enough to build a selector and know
/// how many 32-byte words to decode out of a return value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionAbi {
    pub name: String,
    pub inputs: Vec<AbiType>,
    pub outputs: Vec<AbiType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbiType {
    Bool,
    Uint256,
    Address,
    Bytes32,
}

impl AbiType {
    fn solidity_name(self) -> &'static str {
        match self {
            AbiType::Bool => "bool",
            AbiType::Uint256 => "uint256",
            AbiType::Address => "address",
            AbiType::Bytes32 => "bytes32",
        }
    }
}

impl FunctionAbi {
    pub fn standard(kind: StandardContractType, method: &str) -> Option<Self> {
        match (kind, method) {
            (StandardContractType::Erc20, "balanceOf") => Some(FunctionAbi {
                name: "balanceOf".into(),
                inputs: vec![AbiType::Address],
                outputs: vec![AbiType::Uint256],
            }),
            (StandardContractType::Erc20, "totalSupply") => Some(FunctionAbi {
                name: "totalSupply".into(),
                inputs: vec![],
                outputs: vec![AbiType::Uint256],
            }),
            (StandardContractType::Erc721, "ownerOf") => Some(FunctionAbi {
                name: "ownerOf".into(),
                inputs: vec![AbiType::Uint256],
                outputs: vec![AbiType::Address],
            }),
            (StandardContractType::Erc721, "balanceOf") => Some(FunctionAbi {
                name: "balanceOf".into(),
                inputs: vec![AbiType::Address],
                outputs: vec![AbiType::Uint256],
            }),
            _ => None,
        }
    }

    fn signature(&self) -> String {
        let types: Vec<&str> = self.inputs.iter().map(|t| t.solidity_name()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    fn selector(&self) -> [u8; 4] {
        let mut hasher = Keccak256::new();
        hasher.update(self.signature().as_bytes());
        let digest = hasher.finalize();
        [digest[0], digest[1], digest[2], digest[3]]
    }

    /// Encode a call: 4-byte selector followed by 32-byte-word-encoded args.
    pub fn encode_call(&self, args: &[ConditionValue]) -> Result<Vec<u8>> {
        if args.len() != self.inputs.len() {
            return Err(NodeError::InvalidCondition(format!(
                "{} expects {} args, got {}",
                self.name,
                self.inputs.len(),
                args.len()
            )));
        }
        let mut encoded = self.selector().to_vec();
        for (ty, arg) in self.inputs.iter().zip(args) {
            encoded.extend(encode_word(*ty, arg)?);
        }
        Ok(encoded)
    }

    /// Decode a return value into one value per output word, projected
    /// through `index` if the outputs form a tuple and an index is set.
    pub fn decode_outputs(&self, data: &[u8], index: Option<usize>) -> Result<ConditionValue> {
        let mut values = Vec::with_capacity(self.outputs.len());
        for (i, ty) in self.outputs.iter().enumerate() {
            let word = data
                .get(i * 32..(i + 1) * 32)
                .ok_or_else(|| NodeError::RpcError("return data too short".into()))?;
            values.push(decode_word(*ty, word));
        }
        match index {
            Some(idx) => values
                .get(idx)
                .cloned()
                .ok_or_else(|| NodeError::InvalidCondition(format!("output index {idx} out of bounds"))),
            None if values.len() == 1 => Ok(values.into_iter().next().expect("len checked")),
            None => Ok(ConditionValue::Sequence(values)),
        }
    }

    pub fn output_len(&self) -> usize {
        self.outputs.len()
    }
}

fn encode_word(ty: AbiType, value: &ConditionValue) -> Result<[u8; 32]> {
    let mut word = [0u8; 32];
    match (ty, value) {
        (AbiType::Bool, ConditionValue::Bool(b)) => {
            word[31] = *b as u8;
        }
        (AbiType::Uint256, ConditionValue::Int(n)) => {
            word[16..32].copy_from_slice(&(*n as i128 as u128).to_be_bytes());
        }
        (AbiType::Address, ConditionValue::HexString(addr)) => {
            let bytes = hex::decode(addr.trim_start_matches("0x"))
                .map_err(|e| NodeError::InvalidCondition(format!("bad address: {e}")))?;
            if bytes.len() != 20 {
                return Err(NodeError::InvalidCondition("address must be 20 bytes".into()));
            }
            word[12..32].copy_from_slice(&bytes);
        }
        (AbiType::Bytes32, ConditionValue::HexString(b)) => {
            let bytes = hex::decode(b.trim_start_matches("0x"))
                .map_err(|e| NodeError::InvalidCondition(format!("bad bytes32: {e}")))?;
            let len = bytes.len().min(32);
            word[..len].copy_from_slice(&bytes[..len]);
        }
        _ => return Err(NodeError::InvalidCondition("argument type mismatch".into())),
    }
    Ok(word)
}

fn decode_word(ty: AbiType, word: &[u8]) -> ConditionValue {
    match ty {
        AbiType::Bool => ConditionValue::Bool(word.last().copied().unwrap_or(0) != 0),
        AbiType::Uint256 => {
            let mut buf = [0u8; 16];
            buf.copy_from_slice(&word[16..32]);
            ConditionValue::Int(u128::from_be_bytes(buf) as i128)
        }
        AbiType::Address => ConditionValue::HexString(format!("0x{}", hex::encode(&word[12..32]))),
        AbiType::Bytes32 => ConditionValue::HexString(format!("0x{}", hex::encode(word))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erc20_balance_of_roundtrip() {
        let abi = FunctionAbi::standard(StandardContractType::Erc20, "balanceOf").unwrap();
        let addr = ConditionValue::HexString("0x0000000000000000000000000000000000000001".into());
        let call = abi.encode_call(&[addr]).unwrap();
        assert_eq!(&call[0..4], &abi.selector());

        let mut ret = vec![0u8; 32];
        ret[31] = 7;
        let decoded = abi.decode_outputs(&ret, None).unwrap();
        assert_eq!(decoded, ConditionValue::Int(7));
    }

    #[test]
    fn rejects_wrong_arg_count() {
        let abi = FunctionAbi::standard(StandardContractType::Erc20, "totalSupply").unwrap();
        let err = abi.encode_call(&[ConditionValue::Int(1)]).unwrap_err();
        assert!(matches!(err, NodeError::InvalidCondition(_)));
    }
}

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, FormatError};

/// 1 BTC あたりの satoshi 数
pub const SATS_PER_BTC: u64 = 100_000_000;

/// satoshi を `N.NNNNNNNN` 形式の BTC 表記にする (浮動小数点は使わない)
pub fn format_btc(sats: u64) -> String {
    format!("{}.{:08}", sats / SATS_PER_BTC, sats % SATS_PER_BTC)
}

/// デコード済みトランザクション
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    /// sha256d(raw) を表示順 (ビッグエンディアン) にしたもの
    pub txid: String,
    pub version: u32,
    pub input_count: u64,
    pub inputs: Vec<TxInput>,
    pub output_count: u64,
    pub outputs: Vec<TxOutput>,
    pub locktime: u32,
    /// バイト数 (16進文字列長の半分)
    pub size: usize,
    pub raw_hex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxInput {
    /// 参照先トランザクションID (表示順)
    pub txid: String,
    pub vout: u32,
    #[serde(with = "hex::serde")]
    pub script_sig: Vec<u8>,
    /// ワイヤー上の順序のまま保持する
    pub sequence: String,
}

impl TxInput {
    /// sequence をリトルエンディアンの数値として解釈する
    pub fn sequence_value(&self) -> Result<u32, FormatError> {
        let bytes = crate::primitives::decode_hex(&self.sequence)?;
        let raw: [u8; 4] = bytes.as_slice().try_into().map_err(|_| FormatError::Truncated {
            offset: 0,
            needed: 4,
            available: bytes.len(),
        })?;
        Ok(u32::from_le_bytes(raw))
    }

    pub fn is_unsigned(&self) -> bool {
        self.script_sig.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxOutput {
    pub value: u64,
    #[serde(rename = "scriptPubKey", with = "hex::serde")]
    pub script_pubkey: Vec<u8>,
    /// 標準スクリプトの場合のみ導出されるアドレス
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl TxOutput {
    pub fn value_btc(&self) -> String {
        format_btc(self.value)
    }
}

impl RawTransaction {
    pub fn total_output_value(&self) -> u64 {
        self.outputs
            .iter()
            .fold(0u64, |acc, o| acc.saturating_add(o.value))
    }

    pub fn is_unsigned(&self) -> bool {
        self.inputs.iter().all(TxInput::is_unsigned)
    }

    /// 入力を再エンコード用の `UnspentOutput` に変換する。
    /// 金額はワイヤー上に存在しないため 0 になる。
    pub fn to_unspent_outputs(&self) -> Vec<UnspentOutput> {
        self.inputs
            .iter()
            .map(|input| UnspentOutput {
                txid: input.txid.clone(),
                vout: input.vout,
                value: 0,
                address: None,
                script_pubkey: None,
            })
            .collect()
    }

    /// 出力を再エンコード用の `RequestedOutput` に変換する。
    /// アドレスを持たない (非標準スクリプトの) 出力があれば失敗する。
    pub fn to_requested_outputs(&self) -> Result<Vec<RequestedOutput>, CodecError> {
        self.outputs
            .iter()
            .map(|output| match &output.address {
                Some(address) => Ok(RequestedOutput {
                    address: address.clone(),
                    value: output.value,
                    is_change: false,
                }),
                None => Err(CodecError::UnsupportedScript {
                    script_hex: hex::encode(&output.script_pubkey),
                }),
            })
            .collect()
    }
}

/// エンコーダへの入力 (使用するUTXO)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnspentOutput {
    /// 64桁の16進数 (表示順)
    pub txid: String,
    pub vout: u32,
    #[serde(rename = "valueSats")]
    pub value: u64,
    /// 表示用のみ。エンコードされない
    #[serde(default)]
    pub address: Option<String>,
    /// 表示用のみ。エンコードされない
    #[serde(default, rename = "scriptPubKeyHex")]
    pub script_pubkey: Option<String>,
}

/// エンコーダへの入力 (送金先)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedOutput {
    pub address: String,
    #[serde(rename = "valueSats")]
    pub value: u64,
    /// 表示用のみ。エンコード結果は変わらない
    #[serde(default)]
    pub is_change: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_btc_is_exact() {
        assert_eq!(format_btc(0), "0.00000000");
        assert_eq!(format_btc(1), "0.00000001");
        assert_eq!(format_btc(1_000_000_000), "10.00000000");
        assert_eq!(format_btc(4_000_000_000), "40.00000000");
        assert_eq!(format_btc(u64::MAX), "184467440737.09551615");
    }

    #[test]
    fn sequence_value_reads_little_endian() {
        let input = TxInput {
            txid: "00".repeat(32),
            vout: 0,
            script_sig: Vec::new(),
            sequence: "feffffff".to_string(),
        };
        assert_eq!(input.sequence_value().unwrap(), 0xffff_fffe);
        assert!(input.is_unsigned());
    }

    #[test]
    fn requested_outputs_need_addresses() {
        let tx = RawTransaction {
            txid: String::new(),
            version: 1,
            input_count: 0,
            inputs: Vec::new(),
            output_count: 1,
            outputs: vec![TxOutput {
                value: 5,
                script_pubkey: vec![0x51],
                address: None,
            }],
            locktime: 0,
            size: 0,
            raw_hex: String::new(),
        };
        assert_eq!(
            tx.to_requested_outputs(),
            Err(CodecError::UnsupportedScript {
                script_hex: "51".to_string()
            })
        );
        assert_eq!(tx.total_output_value(), 5);
    }

    #[test]
    fn unspent_output_json_uses_camel_case() {
        let json = r#"{"txid":"ab","vout":3,"valueSats":1000}"#;
        let utxo: UnspentOutput = serde_json::from_str(json).unwrap();
        assert_eq!(utxo.vout, 3);
        assert_eq!(utxo.value, 1000);
        assert!(utxo.address.is_none());
    }
}

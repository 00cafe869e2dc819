use serde::Serialize;

use crate::address::AddressKind;
use crate::config::BuildConfig;
use crate::decoder::compute_txid;
use crate::encoder::encode_to_bytes;
use crate::error::AppError;
use crate::types::{RequestedOutput, UnspentOutput, format_btc};

// Bitcoin Coreのデフォルトダスト閾値 (P2PKH出力に対して)
pub const DUST_THRESHOLD_SATS: u64 = 546;

/// 組み立て結果と金額の内訳
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltTransaction {
    pub raw_hex: String,
    /// 署名前のTXID。署名後は変わる
    pub unsigned_txid: String,
    pub inputs: Vec<UnspentOutput>,
    pub outputs: Vec<RequestedOutput>,
    pub total_input_sats: u64,
    pub total_output_sats: u64,
    /// 実際に支払われる手数料 (ダストとして吸収したおつりを含む)
    pub fee_sats: u64,
    pub change_sats: u64,
}

impl BuiltTransaction {
    pub fn change_output(&self) -> Option<&RequestedOutput> {
        self.outputs.iter().find(|o| o.is_change)
    }

    pub fn summary(&self) -> String {
        format!(
            "入力 {} BTC -> 出力 {} BTC, 手数料 {} BTC, おつり {} BTC",
            format_btc(self.total_input_sats),
            format_btc(self.total_output_sats),
            format_btc(self.fee_sats),
            format_btc(self.change_sats)
        )
    }
}

/// 選択されたUTXOと送金先から未署名トランザクションを組み立てる。
///
/// 残高と手数料を検証し、おつりアドレスがあればおつり出力を末尾に追加する。
pub fn build_unsigned_transaction(config: &BuildConfig) -> Result<BuiltTransaction, AppError> {
    log::info!("トランザクション構築処理を開始します。");

    if config.utxos.is_empty() {
        return Err(AppError::InputValidation(
            "少なくとも1つのUTXOを指定してください".to_string(),
        ));
    }
    if config.outputs.is_empty() {
        return Err(AppError::InputValidation(
            "少なくとも1つの出力を指定してください".to_string(),
        ));
    }

    let mut total_input_sats: u64 = 0;
    for utxo in &config.utxos {
        total_input_sats = total_input_sats.checked_add(utxo.value).ok_or_else(|| {
            AppError::InputValidation("入力金額の合計がオーバーフローしました".to_string())
        })?;
        log::debug!("UTXO追加: txid={}, vout={}, value={}", utxo.txid, utxo.vout, utxo.value);
    }

    let mut outputs: Vec<RequestedOutput> = Vec::with_capacity(config.outputs.len() + 1);
    let mut total_recipient_sats: u64 = 0;
    for output_def in &config.outputs {
        if output_def.value_sats == 0 {
            return Err(AppError::InputValidation(format!(
                "出力金額が0です: {}",
                output_def.address
            )));
        }
        // 金額計算の前にアドレスを検証しておく
        AddressKind::parse(&output_def.address)?;
        total_recipient_sats = total_recipient_sats
            .checked_add(output_def.value_sats)
            .ok_or_else(|| {
                AppError::InputValidation("出力金額の合計がオーバーフローしました".to_string())
            })?;
        outputs.push(RequestedOutput {
            address: output_def.address.clone(),
            value: output_def.value_sats,
            is_change: false,
        });
        log::debug!("受信者出力追加: address={}, value={}", output_def.address, output_def.value_sats);
    }

    let required = total_recipient_sats
        .checked_add(config.fee_sats)
        .ok_or_else(|| {
            AppError::InputValidation("出力金額と手数料の合計がオーバーフローしました".to_string())
        })?;
    if total_input_sats < required {
        return Err(AppError::InsufficientFunds {
            available: total_input_sats,
            required,
            fee: config.fee_sats,
        });
    }

    let change_sats = total_input_sats - required;
    let mut added_change = 0;
    match &config.change_address {
        Some(change_address) if change_sats >= DUST_THRESHOLD_SATS => {
            AddressKind::parse(change_address)?;
            log::debug!("おつり発生: {} sats, おつりアドレス: {}", change_sats, change_address);
            outputs.push(RequestedOutput {
                address: change_address.clone(),
                value: change_sats,
                is_change: true,
            });
            added_change = change_sats;
        }
        Some(_) if change_sats > 0 => {
            log::warn!(
                "おつり {} sats はダスト閾値 {} sats 未満のため手数料に含めます。",
                change_sats,
                DUST_THRESHOLD_SATS
            );
        }
        None if change_sats > 0 => {
            log::warn!(
                "おつりアドレスが指定されていないため、{} sats は手数料になります。",
                change_sats
            );
        }
        _ => {}
    }

    let raw = encode_to_bytes(&config.utxos, &outputs, config.locktime)?;
    let total_output_sats = total_recipient_sats + added_change;

    let built = BuiltTransaction {
        raw_hex: hex::encode(&raw),
        unsigned_txid: compute_txid(&raw),
        inputs: config.utxos.clone(),
        outputs,
        total_input_sats,
        total_output_sats,
        fee_sats: total_input_sats - total_output_sats,
        change_sats: added_change,
    };
    log::info!("{}", built.summary());
    Ok(built)
}

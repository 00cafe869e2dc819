use crate::address::AddressKind;
use crate::error::{CodecError, EncodingError};
use crate::primitives::Writer;
use crate::types::{RequestedOutput, UnspentOutput};

/// 生成するトランザクションのバージョン
pub const TX_VERSION: u32 = 1;
/// 相対ロックタイムもRBFも使わない
pub const FINAL_SEQUENCE: u32 = 0xffff_ffff;

/// 未署名のレガシートランザクションを組み立てて16進文字列で返す。
///
/// 入力・出力は渡された順にエンコードされ、scriptSig は常に空になる。
/// 残高のチェックは行わない (呼び出し側の責任)。
pub fn encode(
    inputs: &[UnspentOutput],
    outputs: &[RequestedOutput],
    locktime: u32,
) -> Result<String, CodecError> {
    Ok(hex::encode(encode_to_bytes(inputs, outputs, locktime)?))
}

pub fn encode_to_bytes(
    inputs: &[UnspentOutput],
    outputs: &[RequestedOutput],
    locktime: u32,
) -> Result<Vec<u8>, CodecError> {
    let mut writer = Writer::new();
    writer.write_u32_le(TX_VERSION);

    writer.write_varint(inputs.len() as u64);
    for input in inputs {
        let prev_txid = txid_to_wire(&input.txid)?;
        writer.write_bytes(&prev_txid);
        writer.write_u32_le(input.vout);
        // 未署名: 空の scriptSig
        writer.write_var_bytes(&[]);
        writer.write_u32_le(FINAL_SEQUENCE);
        log::debug!("入力をエンコード: {}:{}", input.txid, input.vout);
    }

    writer.write_varint(outputs.len() as u64);
    for output in outputs {
        let script = AddressKind::parse(&output.address)?.script_pubkey();
        writer.write_u64_le(output.value);
        writer.write_var_bytes(&script);
        log::debug!(
            "出力をエンコード: {} -> {} sats{}",
            output.address,
            output.value,
            if output.is_change { " (おつり)" } else { "" }
        );
    }

    writer.write_u32_le(locktime);
    log::info!(
        "未署名トランザクションを生成しました: 入力 {} 件, 出力 {} 件, {} バイト",
        inputs.len(),
        outputs.len(),
        writer.len()
    );
    Ok(writer.into_bytes())
}

/// 表示順の64桁TXIDをワイヤー上の順序 (リトルエンディアン) に変換する
fn txid_to_wire(txid: &str) -> Result<[u8; 32], EncodingError> {
    let invalid = || EncodingError::InvalidTxid {
        txid: txid.to_string(),
    };
    if txid.len() != 64 {
        return Err(invalid());
    }
    let mut bytes: [u8; 32] = hex::decode(txid)
        .map_err(|_| invalid())?
        .try_into()
        .map_err(|_| invalid())?;
    bytes.reverse();
    Ok(bytes)
}

use bitcoin::hashes::{Hash, sha256d};

use crate::address::script_to_address;
use crate::error::FormatError;
use crate::primitives::{Reader, decode_hex};
use crate::types::{RawTransaction, TxInput, TxOutput};

/// レガシー (非segwit) トランザクションの16進文字列をデコードする。
///
/// 途中で入力が尽きた場合は `Truncated`、locktimeの後にバイトが残る場合は
/// `TrailingBytes` を返し、部分的な結果は返さない。
pub fn decode(hex_str: &str) -> Result<RawTransaction, FormatError> {
    let bytes = decode_hex(hex_str)?;
    let mut reader = Reader::new(&bytes);
    log::debug!("トランザクションのデコードを開始します: {} バイト", bytes.len());

    let version = reader.read_u32_le()?;

    let input_count = reader.read_varint()?;
    let mut inputs = Vec::new();
    for index in 0..input_count {
        let input = read_input(&mut reader)?;
        log::debug!("入力 {}: {}:{}", index, input.txid, input.vout);
        inputs.push(input);
    }

    let output_count = reader.read_varint()?;
    let mut outputs = Vec::new();
    for index in 0..output_count {
        let output = read_output(&mut reader)?;
        log::debug!("出力 {}: {} sats", index, output.value);
        outputs.push(output);
    }

    let locktime = reader.read_u32_le()?;

    if !reader.is_exhausted() {
        return Err(FormatError::TrailingBytes {
            count: reader.remaining(),
        });
    }

    let txid = compute_txid(&bytes);
    log::info!(
        "デコード完了: txid={}, 入力 {} 件, 出力 {} 件",
        txid,
        input_count,
        output_count
    );

    Ok(RawTransaction {
        txid,
        version,
        input_count,
        inputs,
        output_count,
        outputs,
        locktime,
        size: reader.offset(),
        raw_hex: hex_str.to_string(),
    })
}

/// sha256d(raw) をバイト反転した表示用TXID
pub fn compute_txid(raw: &[u8]) -> String {
    let mut digest = sha256d::Hash::hash(raw).to_byte_array();
    digest.reverse();
    hex::encode(digest)
}

fn read_input(reader: &mut Reader<'_>) -> Result<TxInput, FormatError> {
    let mut prev_txid = reader.read_array::<32>()?;
    prev_txid.reverse();
    let vout = reader.read_u32_le()?;
    let script_sig = reader.read_var_bytes()?.to_vec();
    // sequence はワイヤー上の順序のまま
    let sequence = hex::encode(reader.read_bytes(4)?);

    Ok(TxInput {
        txid: hex::encode(prev_txid),
        vout,
        script_sig,
        sequence,
    })
}

fn read_output(reader: &mut Reader<'_>) -> Result<TxOutput, FormatError> {
    let value = reader.read_u64_le()?;
    let script_pubkey = reader.read_var_bytes()?.to_vec();
    let address = script_to_address(&script_pubkey).ok();

    Ok(TxOutput {
        value,
        script_pubkey,
        address,
    })
}

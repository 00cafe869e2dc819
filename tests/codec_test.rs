//! `bitcoin` クレートのコンセンサスエンコーディングとの突き合わせ

use std::str::FromStr;

use bitcoin::consensus::encode::deserialize;
use bitcoin::{Address, Transaction};
use btc_rawtx_codec::{
    CodecError, FormatError, RequestedOutput, UnspentOutput, address_to_script, decode, encode,
};

const EXAMPLE_TX: &str = "0100000001c997a5e56e104102fa209c6a852dd90660a20b2d9c352423edce25857fcd3704000000004847304402204e45e16932b8af514961a1d3a1a25fdf3f4f7732e9d624c6c61548ab5fb8cd410220181522ec8eca07de4860a4acdd12909d831cc56cbbac4622082221a8768d1d0901ffffffff0200ca9a3b00000000434104ae1a62fe09c5f51b13905f07f06b99a2f7159b2225f374cd378d71302fa28414e7aab37397f554a7df5f142c21c1b7303b8a0626f1baded5c72a704f7e6cd84cac00286bee0000000043410411db93e1dcdb8a016b49840f8c53bc1eb68a382e97b1482ecad7b148a6909a5cb2e0eaddfb84ccf9744464f82e160bfa9b8b64f9d4c03f999b8643f656b412a3ac00000000";

const ADDRESSES: [&str; 4] = [
    "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa",
    "3QwLETfQquYZP4FH5fHbwTPPLjfdHP2TCV",
    "bc1qar0srrr7xfkvy5l643lydnw9re59gtzzwf5mdq",
    "bc1p0xlxvlhemja6c4dqv22uapctqupfhlxm9h8z3k2e72q4k9hcz7vqzk5jj0",
];

fn sample_inputs() -> Vec<UnspentOutput> {
    vec![
        UnspentOutput {
            txid: "0437cd7f8525ceed2324359c2d0ba26006d92d856a9c20fa0241106ee5a597c9".to_string(),
            vout: 4,
            value: 70_000,
            address: Some(ADDRESSES[0].to_string()),
            script_pubkey: None,
        },
        UnspentOutput {
            txid: "f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16".to_string(),
            vout: 1,
            value: 30_000,
            address: None,
            script_pubkey: None,
        },
    ]
}

fn sample_outputs() -> Vec<RequestedOutput> {
    ADDRESSES
        .iter()
        .enumerate()
        .map(|(i, address)| RequestedOutput {
            address: address.to_string(),
            value: 10_000 * (i as u64 + 1),
            is_change: i == ADDRESSES.len() - 1,
        })
        .collect()
}

#[test]
fn address_scripts_match_bitcoin_crate() {
    for address in ADDRESSES {
        let expected = Address::from_str(address)
            .unwrap()
            .assume_checked()
            .script_pubkey()
            .to_hex_string();
        assert_eq!(address_to_script(address).unwrap(), expected, "{}", address);
    }
}

#[test]
fn example_transaction_matches_bitcoin_crate() {
    let ours = decode(EXAMPLE_TX).unwrap();
    let theirs: Transaction = deserialize(&hex::decode(EXAMPLE_TX).unwrap()).unwrap();

    assert_eq!(ours.txid, theirs.compute_txid().to_string());
    assert_eq!(ours.inputs.len(), theirs.input.len());
    assert_eq!(
        ours.inputs[0].txid,
        theirs.input[0].previous_output.txid.to_string()
    );
    for (o, t) in ours.outputs.iter().zip(&theirs.output) {
        assert_eq!(o.value, t.value.to_sat());
        assert_eq!(o.script_pubkey, t.script_pubkey.as_bytes());
    }
}

#[test]
fn encoded_transaction_is_valid_consensus_encoding() {
    let inputs = sample_inputs();
    let outputs = sample_outputs();
    let raw = hex::decode(encode(&inputs, &outputs, 840_000).unwrap()).unwrap();
    let tx: Transaction = deserialize(&raw).unwrap();

    assert_eq!(tx.version.0, 1);
    assert_eq!(tx.lock_time.to_consensus_u32(), 840_000);
    assert_eq!(tx.input.len(), 2);
    for (ours, theirs) in inputs.iter().zip(&tx.input) {
        assert_eq!(ours.txid, theirs.previous_output.txid.to_string());
        assert_eq!(ours.vout, theirs.previous_output.vout);
        assert!(theirs.script_sig.is_empty());
        assert_eq!(theirs.sequence.0, 0xffff_ffff);
    }
    for (ours, theirs) in outputs.iter().zip(&tx.output) {
        assert_eq!(ours.value, theirs.value.to_sat());
        assert_eq!(
            address_to_script(&ours.address).unwrap(),
            theirs.script_pubkey.to_hex_string()
        );
    }

    let decoded = decode(&hex::encode(&raw)).unwrap();
    assert_eq!(decoded.txid, tx.compute_txid().to_string());
}

#[test]
fn unsigned_transaction_round_trips() {
    let hex_str = encode(&sample_inputs(), &sample_outputs(), 0).unwrap();
    let decoded = decode(&hex_str).unwrap();
    assert!(decoded.is_unsigned());

    let reencoded = encode(
        &decoded.to_unspent_outputs(),
        &decoded.to_requested_outputs().unwrap(),
        decoded.locktime,
    )
    .unwrap();
    assert_eq!(reencoded, hex_str);
}

#[test]
fn signed_transaction_reencodes_with_empty_script_sig() {
    let unsigned = encode(&sample_inputs()[..1], &sample_outputs()[..1], 0).unwrap();
    // version(4) + 入力数(1) + txid(32) + vout(4) の直後が scriptSig 長
    let script_offset = (4 + 1 + 32 + 4) * 2;
    assert_eq!(&unsigned[script_offset..script_offset + 2], "00");
    let signed = format!(
        "{}03aabbcc{}",
        &unsigned[..script_offset],
        &unsigned[script_offset + 2..]
    );

    let decoded = decode(&signed).unwrap();
    assert_eq!(decoded.inputs[0].script_sig, vec![0xaa, 0xbb, 0xcc]);
    assert!(!decoded.is_unsigned());

    let reencoded = encode(
        &decoded.to_unspent_outputs(),
        &decoded.to_requested_outputs().unwrap(),
        decoded.locktime,
    )
    .unwrap();
    assert_eq!(reencoded, unsigned);
}

#[test]
fn pay_to_pubkey_outputs_cannot_be_requested() {
    let decoded = decode(EXAMPLE_TX).unwrap();
    assert!(matches!(
        decoded.to_requested_outputs(),
        Err(CodecError::UnsupportedScript { .. })
    ));
}

#[test]
fn truncated_transaction_never_partially_decodes() {
    let hex_str = encode(&sample_inputs(), &sample_outputs(), 0).unwrap();
    let cut = &hex_str[..hex_str.len() - 10];
    assert!(matches!(decode(cut), Err(FormatError::Truncated { .. })));
}

#[test]
fn decoded_json_uses_camel_case_and_hex_scripts() {
    let decoded = decode(EXAMPLE_TX).unwrap();
    let json = serde_json::to_value(&decoded).unwrap();
    assert_eq!(json["inputCount"], 1);
    assert_eq!(json["outputCount"], 2);
    assert_eq!(json["inputs"][0]["sequence"], "ffffffff");
    assert!(json["outputs"][0]["scriptPubKey"]
        .as_str()
        .unwrap()
        .starts_with("4104ae1a62fe"));
}

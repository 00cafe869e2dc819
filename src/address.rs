//! アドレスとscriptPubKeyの相互変換
//!
//! アドレス文字列はまず `AddressKind` に一度だけ解析され、以降のスクリプト構築や
//! 表示はすべてこの列挙型を通して行う。Base58Check はチェックサムを、bech32/bech32m
//! はエンコーディング種別とプログラム長を検証してから受け入れる。

use bitcoin::base58;
use bitcoin::bech32::{self, Fe32, hrp, segwit};
use bitcoin::hashes::{Hash, sha256d};
use bitcoin::opcodes::all::{
    OP_CHECKSIG, OP_DUP, OP_EQUAL, OP_EQUALVERIFY, OP_HASH160, OP_PUSHBYTES_0, OP_PUSHBYTES_20,
    OP_PUSHNUM_1, OP_PUSHNUM_16,
};

use crate::error::{CodecError, FormatError};

/// メインネット P2PKH のバージョンバイト ('1' で始まる)
const P2PKH_VERSION: u8 = 0x00;
/// メインネット P2SH のバージョンバイト ('3' で始まる)
const P2SH_VERSION: u8 = 0x05;
/// バージョン1バイト + ハッシュ20バイト + チェックサム4バイト
const BASE58_PAYLOAD_LEN: usize = 25;
const CHECKSUM_LEN: usize = 4;

/// 解析済みのアドレス
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressKind {
    LegacyP2pkh([u8; 20]),
    P2sh([u8; 20]),
    /// 20バイト (P2WPKH) または 32バイト (P2WSH) のプログラム
    SegwitV0(Vec<u8>),
    SegwitV1Plus { version: u8, program: Vec<u8> },
}

impl AddressKind {
    /// 先頭文字でアドレス形式を判別して解析する。
    pub fn parse(address: &str) -> Result<Self, CodecError> {
        if address.starts_with('1') {
            let hash = decode_base58check(address, P2PKH_VERSION)?;
            Ok(AddressKind::LegacyP2pkh(hash))
        } else if address.starts_with('3') {
            let hash = decode_base58check(address, P2SH_VERSION)?;
            Ok(AddressKind::P2sh(hash))
        } else if address
            .get(..3)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("bc1"))
        {
            decode_segwit(address)
        } else {
            Err(CodecError::UnsupportedAddress {
                address: address.to_string(),
            })
        }
    }

    /// 標準的なscriptPubKeyから逆にアドレス形式を判別する。
    pub fn from_script(script: &[u8]) -> Option<Self> {
        let dup = OP_DUP.to_u8();
        let hash160 = OP_HASH160.to_u8();
        let push20 = OP_PUSHBYTES_20.to_u8();
        let equal_verify = OP_EQUALVERIFY.to_u8();
        let checksig = OP_CHECKSIG.to_u8();
        let equal = OP_EQUAL.to_u8();

        match script {
            [d, h, p, hash @ .., ev, cs]
                if hash.len() == 20
                    && *d == dup
                    && *h == hash160
                    && *p == push20
                    && *ev == equal_verify
                    && *cs == checksig =>
            {
                hash.try_into().ok().map(AddressKind::LegacyP2pkh)
            }
            [h, p, hash @ .., e] if hash.len() == 20 && *h == hash160 && *p == push20 && *e == equal => {
                hash.try_into().ok().map(AddressKind::P2sh)
            }
            [version_op, push_len, program @ ..]
                if (2..=40).contains(&program.len()) && usize::from(*push_len) == program.len() =>
            {
                let version = witness_version_from_opcode(*version_op)?;
                match version {
                    0 if program.len() == 20 || program.len() == 32 => {
                        Some(AddressKind::SegwitV0(program.to_vec()))
                    }
                    0 => None,
                    _ => Some(AddressKind::SegwitV1Plus {
                        version,
                        program: program.to_vec(),
                    }),
                }
            }
            _ => None,
        }
    }

    /// このアドレスに対応するscriptPubKey
    pub fn script_pubkey(&self) -> Vec<u8> {
        match self {
            AddressKind::LegacyP2pkh(hash) => {
                let mut script = Vec::with_capacity(25);
                script.extend_from_slice(&[OP_DUP.to_u8(), OP_HASH160.to_u8(), OP_PUSHBYTES_20.to_u8()]);
                script.extend_from_slice(hash);
                script.extend_from_slice(&[OP_EQUALVERIFY.to_u8(), OP_CHECKSIG.to_u8()]);
                script
            }
            AddressKind::P2sh(hash) => {
                let mut script = Vec::with_capacity(23);
                script.extend_from_slice(&[OP_HASH160.to_u8(), OP_PUSHBYTES_20.to_u8()]);
                script.extend_from_slice(hash);
                script.push(OP_EQUAL.to_u8());
                script
            }
            AddressKind::SegwitV0(program) => witness_script(0, program),
            AddressKind::SegwitV1Plus { version, program } => witness_script(*version, program),
        }
    }

    /// メインネットのアドレス文字列に戻す
    pub fn to_address(&self) -> Result<String, CodecError> {
        match self {
            AddressKind::LegacyP2pkh(hash) => Ok(encode_base58check(P2PKH_VERSION, hash)),
            AddressKind::P2sh(hash) => Ok(encode_base58check(P2SH_VERSION, hash)),
            AddressKind::SegwitV0(program) => encode_segwit(0, program),
            AddressKind::SegwitV1Plus { version, program } => encode_segwit(*version, program),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            AddressKind::LegacyP2pkh(_) => "P2PKH (Pay-to-PubKey-Hash)",
            AddressKind::P2sh(_) => "P2SH (Pay-to-Script-Hash)",
            AddressKind::SegwitV0(program) if program.len() == 32 => "P2WSH (Native SegWit v0)",
            AddressKind::SegwitV0(_) => "P2WPKH (Native SegWit v0)",
            AddressKind::SegwitV1Plus { version: 1, program } if program.len() == 32 => {
                "P2TR (Taproot)"
            }
            AddressKind::SegwitV1Plus { .. } => "SegWit v1+ (Bech32m)",
        }
    }
}

/// アドレスをscriptPubKeyの16進文字列に変換する。
pub fn address_to_script(address: &str) -> Result<String, CodecError> {
    let kind = AddressKind::parse(address)?;
    let script = kind.script_pubkey();
    log::debug!("アドレス {} -> {}, script={}", address, kind.describe(), hex::encode(&script));
    Ok(hex::encode(script))
}

/// 標準スクリプトをアドレス文字列に変換する。
pub fn script_to_address(script: &[u8]) -> Result<String, CodecError> {
    AddressKind::from_script(script)
        .ok_or_else(|| CodecError::UnsupportedScript {
            script_hex: hex::encode(script),
        })?
        .to_address()
}

fn decode_base58check(address: &str, expected_version: u8) -> Result<[u8; 20], FormatError> {
    let decoded = base58::decode(address).map_err(|e| FormatError::InvalidBase58 {
        address: address.to_string(),
        reason: e.to_string(),
    })?;
    if decoded.len() != BASE58_PAYLOAD_LEN {
        return Err(FormatError::InvalidAddressLength {
            address: address.to_string(),
            len: decoded.len(),
        });
    }

    let (payload, checksum) = decoded.split_at(BASE58_PAYLOAD_LEN - CHECKSUM_LEN);
    let expected = sha256d::Hash::hash(payload).to_byte_array();
    if checksum != &expected[..CHECKSUM_LEN] {
        return Err(FormatError::ChecksumMismatch {
            address: address.to_string(),
        });
    }

    if payload[0] != expected_version {
        return Err(FormatError::UnexpectedVersionByte {
            address: address.to_string(),
            version: payload[0],
        });
    }

    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);
    Ok(hash)
}

fn encode_base58check(version: u8, hash: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(version);
    payload.extend_from_slice(hash);
    base58::encode_check(&payload)
}

fn decode_segwit(address: &str) -> Result<AddressKind, CodecError> {
    let (decoded_hrp, version, program) =
        segwit::decode(address).map_err(|e| FormatError::InvalidBech32 {
            address: address.to_string(),
            reason: e.to_string(),
        })?;
    if decoded_hrp != hrp::BC {
        return Err(FormatError::WrongNetwork {
            address: address.to_string(),
        }
        .into());
    }

    let version = version.to_u8();
    if version == 0 {
        Ok(AddressKind::SegwitV0(program))
    } else {
        Ok(AddressKind::SegwitV1Plus { version, program })
    }
}

fn encode_segwit(version: u8, program: &[u8]) -> Result<String, CodecError> {
    let unsupported = || CodecError::UnsupportedScript {
        script_hex: hex::encode(witness_script(version, program)),
    };
    let witness_version = Fe32::try_from(version).map_err(|_| unsupported())?;
    bech32::segwit::encode(hrp::BC, witness_version, program).map_err(|_| unsupported())
}

/// `<OP_n> <push len> <program>`
fn witness_script(version: u8, program: &[u8]) -> Vec<u8> {
    let version_op = if version == 0 {
        OP_PUSHBYTES_0.to_u8()
    } else {
        OP_PUSHNUM_1.to_u8().saturating_add(version - 1)
    };
    let mut script = Vec::with_capacity(2 + program.len());
    script.push(version_op);
    script.push(program.len() as u8);
    script.extend_from_slice(program);
    script
}

fn witness_version_from_opcode(op: u8) -> Option<u8> {
    if op == OP_PUSHBYTES_0.to_u8() {
        Some(0)
    } else if (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8()).contains(&op) {
        Some(op - OP_PUSHNUM_1.to_u8() + 1)
    } else {
        None
    }
}

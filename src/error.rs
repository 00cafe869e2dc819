use std::path::PathBuf;
use thiserror::Error;

/// 16進文字列やアドレスの形式が不正な場合のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("入力が空です")]
    Empty,

    #[error("16進数以外の文字が含まれています (位置 {position}): {character:?}")]
    InvalidHexCharacter { position: usize, character: char },

    #[error("16進文字列の長さが奇数です: {len}")]
    OddLength { len: usize },

    #[error("入力が途中で終わっています (オフセット {offset} で {needed} バイト必要, 残り {available} バイト)")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("locktimeの後に余分なバイトがあります: {count} バイト")]
    TrailingBytes { count: usize },

    #[error("Base58デコードエラー ({address}): {reason}")]
    InvalidBase58 { address: String, reason: String },

    #[error("デコード後のアドレス長が不正です ({address}): {len} バイト")]
    InvalidAddressLength { address: String, len: usize },

    #[error("アドレスのバージョンバイトが想定外です ({address}): 0x{version:02x}")]
    UnexpectedVersionByte { address: String, version: u8 },

    #[error("Base58Checkのチェックサムが一致しません: {address}")]
    ChecksumMismatch { address: String },

    #[error("Bech32デコードエラー ({address}): {reason}")]
    InvalidBech32 { address: String, reason: String },

    #[error("メインネット以外のアドレスです: {address}")]
    WrongNetwork { address: String },
}

/// 固定長フィールドに値が収まらない場合などのエンコードエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("値 {value} は {width} バイトのフィールドに収まりません")]
    ValueOutOfRange { value: u64, width: usize },

    #[error("サポートされないフィールド幅です: {width} バイト")]
    InvalidWidth { width: usize },

    #[error("無効なTXID形式 (64桁の16進数が必要): {txid}")]
    InvalidTxid { txid: String },
}

/// コーデック全体のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("形式エラー: {0}")]
    Format(#[from] FormatError),

    #[error("エンコードエラー: {0}")]
    Encoding(#[from] EncodingError),

    #[error("サポートされないアドレス形式: {address}")]
    UnsupportedAddress { address: String },

    #[error("アドレスに変換できないスクリプト: {script_hex}")]
    UnsupportedScript { script_hex: String },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/Oエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSONパースエラー ファイル: {file_path:?}, 詳細: {source}")]
    JsonParse {
        file_path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON出力エラー: {0}")]
    JsonOutput(#[from] serde_json::Error),

    #[error("コーデックエラー: {0}")]
    Codec(#[from] CodecError),

    #[error("入力検証エラー: {0}")]
    InputValidation(String),

    #[error("資金不足: 利用可能な総額 {available} sats, 要求額 {required} sats (手数料 {fee} sats を含む)")]
    InsufficientFunds {
        available: u64,
        required: u64,
        fee: u64,
    },
}

impl From<FormatError> for AppError {
    fn from(e: FormatError) -> Self {
        AppError::Codec(CodecError::Format(e))
    }
}

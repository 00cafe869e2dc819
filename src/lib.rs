//! レガシー (非segwit) Bitcoin raw transaction のコーデック
//!
//! 16進文字列のデコード、未署名トランザクションのエンコード、アドレスと
//! scriptPubKeyの変換を提供する。すべて同期的な純粋関数で、I/Oを持たない。

pub mod address;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod primitives;
pub mod transaction;
pub mod types;

pub use address::{AddressKind, address_to_script, script_to_address};
pub use decoder::decode;
pub use encoder::encode;
pub use error::{AppError, CodecError, EncodingError, FormatError};
pub use types::{RawTransaction, RequestedOutput, TxInput, TxOutput, UnspentOutput};

//! ワイヤーフォーマットの基本操作
//!
//! 固定長整数と16進文字列の相互変換、バイト順の反転、Bitcoinの可変長整数 (varint)
//! を扱う。デコード側は `Reader`、エンコード側は `Writer` がそれぞれ位置とバッファを
//! 保持し、16進文字列への変換は最後に一度だけ行う。

use crate::error::{EncodingError, FormatError};

/// varint の幅を示すマーカーバイト
const VARINT_MARKER_U16: u8 = 0xfd;
const VARINT_MARKER_U32: u8 = 0xfe;
const VARINT_MARKER_U64: u8 = 0xff;

/// 16進文字列を検証してバイト列に変換する。
///
/// 空文字列、16進数以外の文字、奇数長はすべて `FormatError` になる。
pub fn decode_hex(hex_str: &str) -> Result<Vec<u8>, FormatError> {
    if hex_str.is_empty() {
        return Err(FormatError::Empty);
    }
    hex::decode(hex_str).map_err(|e| match e {
        hex::FromHexError::InvalidHexCharacter { c, index } => FormatError::InvalidHexCharacter {
            position: index,
            character: c,
        },
        _ => FormatError::OddLength { len: hex_str.len() },
    })
}

/// 非負整数をビッグエンディアンの16進文字列 (`width * 2` 桁, ゼロ埋め) にする。
///
/// `width` バイトで表現できない値は切り詰めずに `EncodingError` を返す。
pub fn to_fixed_hex(value: u64, width: usize) -> Result<String, EncodingError> {
    if width == 0 || width > 8 {
        return Err(EncodingError::InvalidWidth { width });
    }
    if width < 8 && value >> (8 * width) != 0 {
        return Err(EncodingError::ValueOutOfRange { value, width });
    }
    Ok(format!("{:0w$x}", value, w = width * 2))
}

/// 2桁ずつのバイトグループの順序を反転する。大文字小文字はそのまま保持する。
pub fn reverse_byte_order(hex_str: &str) -> Result<String, FormatError> {
    if let Some((position, character)) = hex_str
        .char_indices()
        .find(|(_, c)| !c.is_ascii_hexdigit())
    {
        return Err(FormatError::InvalidHexCharacter { position, character });
    }
    if hex_str.len() % 2 != 0 {
        return Err(FormatError::OddLength { len: hex_str.len() });
    }

    let mut reversed = String::with_capacity(hex_str.len());
    for pair in hex_str.as_bytes().chunks(2).rev() {
        reversed.push(pair[0] as char);
        reversed.push(pair[1] as char);
    }
    Ok(reversed)
}

/// varint を16進文字列にエンコードする。
pub fn encode_varint(n: u64) -> String {
    let mut writer = Writer::new();
    writer.write_varint(n);
    writer.into_hex()
}

/// カーソル位置から varint を1つ読み取り、カーソルを進める。
pub fn decode_varint(reader: &mut Reader<'_>) -> Result<u64, FormatError> {
    reader.read_varint()
}

/// バイト列上の読み取りカーソル
///
/// デコード1回につき1つ作られ、位置は呼び出し側が単独で所有する。
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Reader { data, offset: 0 }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], FormatError> {
        let available = self.remaining();
        if n > available {
            return Err(FormatError::Truncated {
                offset: self.offset,
                needed: n,
                available,
            });
        }
        let bytes = &self.data[self.offset..self.offset + n];
        self.offset += n;
        Ok(bytes)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], FormatError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, FormatError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16_le(&mut self) -> Result<u16, FormatError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32_le(&mut self) -> Result<u32, FormatError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64, FormatError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    /// マーカーが 0xfd 未満ならその値、そうでなければ続くリトルエンディアン整数を返す。
    /// 非最小エンコーディング (例: `fd0100`) も値として受け入れる。
    pub fn read_varint(&mut self) -> Result<u64, FormatError> {
        match self.read_u8()? {
            VARINT_MARKER_U16 => Ok(u64::from(self.read_u16_le()?)),
            VARINT_MARKER_U32 => Ok(u64::from(self.read_u32_le()?)),
            VARINT_MARKER_U64 => self.read_u64_le(),
            b => Ok(u64::from(b)),
        }
    }

    /// varint の長さプレフィックス付きバイト列を読む。
    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], FormatError> {
        let len = self.read_varint()?;
        // usize に収まらない長さはどのみち残りバイト数を超える
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        self.read_bytes(len)
    }
}

/// エンコード用の可変長バッファ
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Writer::default()
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u32_le(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64_le(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_varint(&mut self, n: u64) {
        if n < u64::from(VARINT_MARKER_U16) {
            self.write_u8(n as u8);
        } else if n <= 0xffff {
            self.write_u8(VARINT_MARKER_U16);
            self.buf.extend_from_slice(&(n as u16).to_le_bytes());
        } else if n <= 0xffff_ffff {
            self.write_u8(VARINT_MARKER_U32);
            self.write_u32_le(n as u32);
        } else {
            self.write_u8(VARINT_MARKER_U64);
            self.write_u64_le(n);
        }
    }

    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.write_bytes(bytes);
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn into_hex(self) -> String {
        hex::encode(self.buf)
    }
}

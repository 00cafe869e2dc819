use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use btc_rawtx_codec::error::AppError;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// raw transaction hex をデコードしてJSONで出力する
    Decode {
        /// raw transaction hex
        #[clap(long, value_parser, conflicts_with = "input_file")]
        hex: Option<String>,

        /// raw transaction hex を含むファイルへのパス
        #[clap(short, long, value_parser)]
        input_file: Option<PathBuf>,

        /// 整形してJSONを出力する
        #[clap(long)]
        pretty: bool,
    },

    /// UTXOと送金先を記述したJSONから未署名トランザクションを組み立てる
    Build {
        /// トランザクション情報を記述したJSONファイルへのパス
        #[clap(short, long, value_parser)]
        input_file: PathBuf,

        /// 生成されたraw transaction hexを保存するファイルへのパス
        #[clap(short, long, value_parser)]
        output_file: Option<PathBuf>,

        /// raw hex の代わりに金額の内訳を含むJSONを出力する
        #[clap(long)]
        json: bool,
    },

    /// アドレスをscriptPubKeyに変換する
    Script {
        /// 変換するアドレス ("1...", "3...", "bc1...")
        address: String,
    },
}

/// `--hex` か `--input-file` のどちらかから16進文字列を得る (前後の空白は除去)
pub fn resolve_hex_input(
    hex: Option<String>,
    input_file: Option<PathBuf>,
) -> Result<String, AppError> {
    match (hex, input_file) {
        (Some(hex), _) => Ok(hex.trim().to_string()),
        (None, Some(path)) => {
            let content = fs::read_to_string(&path).map_err(|e| {
                log::error!("入力ファイルの読み込みに失敗しました: {:?}", path);
                AppError::Io(e)
            })?;
            Ok(content.trim().to_string())
        }
        (None, None) => Err(AppError::InputValidation(
            "--hex または --input-file を指定してください".to_string(),
        )),
    }
}

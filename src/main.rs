use std::fs::File;
use std::io::Write;
use clap::Parser;

mod cli;

use btc_rawtx_codec::address::AddressKind;
use btc_rawtx_codec::config::BuildConfig;
use btc_rawtx_codec::error::AppError;
use btc_rawtx_codec::{decoder, transaction};
use cli::{CliArgs, Command, resolve_hex_input};

fn main() -> Result<(), AppError> {
    env_logger::init();

    let args = CliArgs::parse();
    log::info!("アプリケーションを開始します。引数: {:?}", args);

    match args.command {
        Command::Decode { hex, input_file, pretty } => {
            let raw_hex = resolve_hex_input(hex, input_file)?;
            let decoded = decoder::decode(&raw_hex)?;
            let json = if pretty {
                serde_json::to_string_pretty(&decoded)?
            } else {
                serde_json::to_string(&decoded)?
            };
            println!("{}", json);
        }
        Command::Build { input_file, output_file, json } => {
            let config = BuildConfig::load(&input_file)?;
            log::debug!("入力設定ファイルのパース成功: {:?}", config);

            let built = transaction::build_unsigned_transaction(&config)?;
            log::info!("Raw transaction hex: {}", built.raw_hex);
            if json {
                println!("{}", serde_json::to_string_pretty(&built)?);
            } else {
                println!("{}", built.raw_hex);
            }

            if let Some(output_file) = output_file {
                let mut file = File::create(&output_file).map_err(|e| {
                    log::error!("出力ファイルの作成に失敗しました: {:?}", output_file);
                    AppError::Io(e)
                })?;
                file.write_all(built.raw_hex.as_bytes()).map_err(|e| {
                    log::error!("出力ファイルへの書き込みに失敗しました。");
                    AppError::Io(e)
                })?;
                log::info!("Raw transactionを {:?} に保存しました。", output_file);
            }
        }
        Command::Script { address } => {
            let kind = AddressKind::parse(&address)?;
            println!("{}", hex::encode(kind.script_pubkey()));
            println!("{}", kind.describe());
        }
    }

    log::info!("処理が正常に完了しました。");
    Ok(())
}

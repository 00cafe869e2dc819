use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::AppError;
use crate::types::UnspentOutput;

/// `build` サブコマンドの入力JSON
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    pub utxos: Vec<UnspentOutput>,
    pub outputs: Vec<TransactionOutputDef>,
    #[serde(default)]
    pub fee_sats: u64,
    #[serde(default)]
    pub change_address: Option<String>,
    #[serde(default)]
    pub locktime: u32,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutputDef {
    pub address: String,
    pub value_sats: u64,
}

impl BuildConfig {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = fs::read_to_string(path).map_err(|e| {
            log::error!("入力ファイルの読み込みに失敗しました: {:?}", path);
            AppError::Io(e)
        })?;
        serde_json::from_str(&content).map_err(|e| {
            log::error!("入力JSONのパースに失敗しました。");
            AppError::JsonParse {
                file_path: path.to_path_buf(),
                source: e,
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_request_with_defaults() {
        let json = r#"{
            "utxos": [{"txid": "ab", "vout": 1, "valueSats": 5000, "address": "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"}],
            "outputs": [{"address": "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa", "valueSats": 4000}]
        }"#;
        let config: BuildConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.utxos[0].value, 5000);
        assert_eq!(config.outputs[0].value_sats, 4000);
        assert_eq!(config.fee_sats, 0);
        assert_eq!(config.locktime, 0);
        assert!(config.change_address.is_none());
    }

    #[test]
    fn load_reports_missing_file() {
        let err = BuildConfig::load(Path::new("/nonexistent/build.json")).unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}

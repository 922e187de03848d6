use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::patch::{hex_bytes, ConfigurablePatch};

/// A named constant and the bytes that replace it in the template.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct NamedConfigurable {
    pub name: String,
    pub offset: u64,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

impl From<&NamedConfigurable> for ConfigurablePatch {
    fn from(c: &NamedConfigurable) -> Self {
        ConfigurablePatch { offset: c.offset, data: c.data.clone() }
    }
}

/// On-disk configurables: `{ "configurables": [{ "name", "offset", "data" }] }`.
/// List order is patch order.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigurablesFile {
    pub configurables: Vec<NamedConfigurable>,
}

impl ConfigurablesFile {
    pub fn load(path: &Path) -> Result<Self> {
        let f = File::open(path).with_context(|| format!("open {:?}", path))?;
        let cf: Self = serde_json::from_reader(BufReader::new(f))
            .with_context(|| format!("parse configurables {:?}", path))?;
        tracing::debug!(path = %path.display(), count = cf.configurables.len(), "loaded configurables");
        Ok(cf)
    }

    pub fn patches(&self) -> Vec<ConfigurablePatch> {
        self.configurables.iter().map(ConfigurablePatch::from).collect()
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("serialize configurables")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "configurables": [
            { "name": "DECIMALS", "offset": 48, "data": "0000000000000009" },
            { "name": "OWNER", "offset": 8, "data": "0xABCD" }
        ]
    }"#;

    #[test]
    fn parses_named_patches_in_order() {
        let cf: ConfigurablesFile = serde_json::from_str(SAMPLE).unwrap();
        let p = cf.patches();
        assert_eq!(p.len(), 2);
        assert_eq!(p[0], ConfigurablePatch::new(48, vec![0, 0, 0, 0, 0, 0, 0, 9]));
        assert_eq!(p[1], ConfigurablePatch::new(8, vec![0xab, 0xcd]));
        assert_eq!(cf.configurables[1].name, "OWNER");
    }

    #[test]
    fn load_reports_path_on_bad_json() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("cfg.json");
        std::fs::write(&path, r#"{"configurables":[{"name":"X","offset":0,"data":"0g"}]}"#).unwrap();
        let err = ConfigurablesFile::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("cfg.json"));
    }

    #[test]
    fn pretty_json_reloads() {
        let td = tempfile::tempdir().unwrap();
        let path = td.path().join("cfg.json");
        let cf: ConfigurablesFile = serde_json::from_str(SAMPLE).unwrap();
        std::fs::write(&path, cf.to_json_pretty().unwrap()).unwrap();
        assert_eq!(ConfigurablesFile::load(&path).unwrap(), cf);
    }
}

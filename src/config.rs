use anyhow::anyhow;
use modbus_mem::{BankKind, DeviceMap, Discrete, Layout, Register, WritePolicy};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileType {
    Toml,
    Json,
}

impl FileType {
    /// Derive the file type from the extension, JSON being the fallback.
    pub fn from_path(path: &str) -> Self {
        match Path::new(path).extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => FileType::Toml,
            _ => FileType::Json,
        }
    }
}

/// Initial contents of a run of slots. Coils and discrete inputs treat non-zero values as set.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Preset {
    pub kind: BankKind,
    pub address: u16,
    pub values: Vec<u16>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub policy: WritePolicy,
    pub layout: Layout,
    pub presets: Vec<Preset>,
    pub log_interval_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            policy: WritePolicy::default(),
            layout: Layout::uniform(1024),
            presets: Vec::new(),
            log_interval_ms: 500,
        }
    }
}

impl AppConfig {
    /// Read device configuration from file
    pub fn read(path: &str) -> anyhow::Result<Self> {
        match FileType::from_path(path) {
            FileType::Toml => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| anyhow!("Failed to read TOML file {} [{}]", path, e))?;
                Self::from_toml(&content)
            }
            FileType::Json => {
                let file = File::open(path)
                    .map_err(|e| anyhow!("Failed to open JSON file {} [{}]", path, e))?;
                serde_json::from_reader(BufReader::new(file))
                    .map_err(|e| anyhow!("Failed to deserialize JSON [{}]", e))
            }
        }
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).map_err(|e| anyhow!("Failed to deserialize TOML [{}]", e))
    }

    /// Create the device memory and apply all presets.
    pub fn build(&self) -> anyhow::Result<DeviceMap> {
        self.layout.validate()?;
        let map = DeviceMap::new(&self.layout).with_policy(self.policy);
        for preset in self.presets.iter() {
            let bits: Vec<bool> = preset.values.iter().map(|v| *v != 0).collect();
            let result = match preset.kind {
                BankKind::Coil => map.populate(Discrete::Coil, preset.address, &bits),
                BankKind::Input => map.populate(Discrete::Input, preset.address, &bits),
                BankKind::HoldingRegister => {
                    map.populate(Register::Holding, preset.address, &preset.values)
                }
                BankKind::InputRegister => {
                    map.populate(Register::Input, preset.address, &preset.values)
                }
            };
            result.map_err(|e| anyhow!("Invalid preset at address {} [{}]", preset.address, e))?;
        }
        Ok(map)
    }
}

use std::path::Path;

use serde::Deserialize;

use engine_core::TickConfig;

use crate::world::WorldConfig;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetSection {
    pub ws_addr: String,
}

impl Default for NetSection {
    fn default() -> Self {
        Self {
            ws_addr: "0.0.0.0:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TickSection {
    pub tps: u32,
}

impl Default for TickSection {
    fn default() -> Self {
        Self { tps: 50 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldSection {
    pub nb_worlds: usize,
    pub nb_players_per_world: usize,
    pub map_filepath: String,
    pub zone_width: i32,
    pub zone_height: i32,
    /// Base RNG seed; world `i` uses `seed + i`.
    pub seed: Option<u64>,
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            nb_worlds: 1,
            nb_players_per_world: 200,
            map_filepath: "maps/world_server.json".to_string(),
            zone_width: 28,
            zone_height: 12,
            seed: None,
        }
    }
}

/// Top-level game server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub net: NetSection,
    pub tick: TickSection,
    pub world: WorldSection,
}

impl ServerConfig {
    /// Load configuration from an optional TOML file path.
    pub fn load(config_path: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = match config_path {
            Some(path) if Path::new(path).exists() => {
                let content = std::fs::read_to_string(path)?;
                toml::from_str(&content)?
            }
            _ => Self::default(),
        };
        Ok(config)
    }

    pub fn to_tick_config(&self) -> TickConfig {
        TickConfig {
            tps: self.tick.tps,
            max_ticks: 0,
        }
    }

    /// Settings of the world at `index` (0-based).
    pub fn to_world_config(&self, index: usize) -> WorldConfig {
        WorldConfig {
            id: format!("world{}", index + 1),
            max_players: self.world.nb_players_per_world,
            seed: self.world.seed.map(|s| s.wrapping_add(index as u64)),
        }
    }
}

/// Parse CLI arguments and load config.
/// Supports: --config <path>
pub fn parse_cli_args() -> ServerConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<&str> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                if let Some(val) = args.get(i + 1) {
                    config_path = Some(val.as_str());
                    i += 2;
                } else {
                    eprintln!("--config requires a path argument");
                    std::process::exit(1);
                }
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
    }

    match ServerConfig::load(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    }
}

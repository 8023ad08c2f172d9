use std::fs;
use std::io::{self, BufRead};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "imageviewerconfig.ini";

/// Flags read from the plain-text config file: one bare keyword per line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    /// Keep the terminal quiet unless `RUST_LOG` asks otherwise.
    pub hide_console: bool,
    /// Sample from pre-filtered half-size levels when zoomed out.
    pub use_mipmaps: bool,
}

impl Config {
    pub fn parse<R: BufRead>(reader: R) -> io::Result<Self> {
        let mut config = Config::default();
        for line in reader.lines() {
            match line?.trim() {
                "hideconsole" => config.hide_console = true,
                "usemipmaps" => config.use_mipmaps = true,
                _ => {}
            }
        }
        Ok(config)
    }

    /// Read the config at `path`, writing a default one first if it does
    /// not exist. Failures fall back to defaults.
    pub fn load_or_create(path: &Path) -> Self {
        if !path.exists() {
            if let Err(e) = fs::write(path, "hideconsole\nusemipmaps\n") {
                eprintln!("Failed to create {:?}: {}", path, e);
            }
        }
        match fs::File::open(path).and_then(|f| Self::parse(io::BufReader::new(f))) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Failed to open {:?}: {}", path, e);
                Config::default()
            }
        }
    }
}

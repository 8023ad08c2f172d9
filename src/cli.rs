use std::path::PathBuf;

use clap::Parser;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::files::SortMode;

pub const HELP_KEYS: &str = "\
Key Bindings:
  Esc             : Quit
  Right / Left    : Next / previous image
  Ctrl+Right/Left : Skip 10 images
  Shift+Right/Left: Skip 100 images
  , / Home        : First image
  . / End         : Last image
  Wheel           : Zoom at pointer (Ctrl: fine)
  Drag            : Pan
  Double click    : Toggle fit / 100%
  r               : Rotate 90 degrees clockwise
  Ctrl+O          : Open file
  Ctrl+P          : Open folder
  Ctrl+L          : Open folder and subfolders
  Ctrl+S          : Save image as
  F5              : Refresh directory
  F11 / f         : Toggle fullscreen
  Tab             : Settings and adjustments
  i               : Image information
  t               : Toggle thumbnails
  b               : Toggle information bar
  ?               : Toggle this help
";

#[derive(Parser)]
#[command(name = "peek", about = "A simple image viewer", after_help = HELP_KEYS)]
pub struct Cli {
    /// Image or directory to open
    pub path: Option<PathBuf>,

    /// Include images in subdirectories when PATH is a directory
    #[arg(short, long)]
    pub recursive: bool,

    /// Browse every file, not just recognised image extensions
    #[arg(long)]
    pub all_files: bool,

    /// Browsing order
    #[arg(long, value_enum, default_value_t = SortMode::Alphabetical)]
    pub sort: SortMode,

    /// Flag file with `hideconsole` / `usemipmaps` lines
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_arguments() {
        let cli = Cli::try_parse_from(["peek"]).unwrap();
        assert!(cli.path.is_none());
        assert!(!cli.recursive);
        assert!(!cli.all_files);
        assert_eq!(cli.sort, SortMode::Alphabetical);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn parses_every_flag() {
        let cli = Cli::try_parse_from([
            "peek",
            "photos",
            "-r",
            "--all-files",
            "--sort",
            "modified",
            "--config",
            "other.ini",
        ])
        .unwrap();
        assert_eq!(cli.path, Some(PathBuf::from("photos")));
        assert!(cli.recursive);
        assert!(cli.all_files);
        assert_eq!(cli.sort, SortMode::ModifiedDescending);
        assert_eq!(cli.config, PathBuf::from("other.ini"));
    }
}

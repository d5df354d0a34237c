use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use crate::config::Config;
use crate::shader::DEFAULT_DOCUMENT;

/// What `--emit` prints instead of opening a preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Emit {
    /// The assembled GLSL program
    Assembled,
    /// Extracted parameters as JSON
    Params,
    /// The translated WGSL fragment shader
    Wgsl,
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    shaderlab plasma.hlsl                       # Preview in the terminal
    shaderlab --window plasma.hlsl              # Preview in a window
    shaderlab --perf --max-fps 30 plasma.hlsl   # Show FPS, cap terminal refresh at 30
    shaderlab --emit params plasma.hlsl         # Print extracted parameters as JSON
    shaderlab --emit wgsl plasma.hlsl           # Print the translated WGSL")]
pub struct Cli {
    /// Path to the shader document; created with a starter program if missing
    pub shader_file: PathBuf,

    /// Render in a window instead of the terminal
    #[arg(short, long)]
    pub window: bool,

    /// Show frames per second
    #[arg(short, long)]
    pub perf: bool,

    /// Maximum terminal frame rate (frames per second)
    #[arg(long, value_name = "FPS")]
    pub max_fps: Option<u32>,

    /// Configuration file (defaults to ./shaderlab.toml, then the user config dir)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Seed parameter defaults from literal initializers
    #[arg(long)]
    pub seed_initializers: bool,

    /// Print an intermediate form and exit
    #[arg(long, value_enum, value_name = "FORM")]
    pub emit: Option<Emit>,
}

impl Cli {
    /// Read the shader document, writing the starter program first if the file does not exist
    pub fn load_document(&self) -> Result<String> {
        if !self.shader_file.exists() {
            fs::write(&self.shader_file, DEFAULT_DOCUMENT).with_context(|| {
                format!("Failed to create {}", self.shader_file.display())
            })?;
            log::info!("Created {} from the starter program", self.shader_file.display());
        }
        fs::read_to_string(&self.shader_file)
            .with_context(|| format!("Error reading shader file '{}'", self.shader_file.display()))
    }

    /// Command-line flags take precedence over the config file
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(max_fps) = self.max_fps {
            config.display.max_fps = Some(max_fps);
        }
        if self.seed_initializers {
            config.editor.seed_from_initializer = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "shaderlab",
            "--window",
            "--max-fps",
            "24",
            "--emit",
            "wgsl",
            "plasma.hlsl",
        ])
        .unwrap();
        assert!(cli.window);
        assert_eq!(cli.max_fps, Some(24));
        assert_eq!(cli.emit, Some(Emit::Wgsl));
        assert_eq!(cli.shader_file, PathBuf::from("plasma.hlsl"));
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "shaderlab",
            "--max-fps",
            "10",
            "--seed-initializers",
            "a.hlsl",
        ])
        .unwrap();
        let mut config = Config::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.display.max_fps, Some(10));
        assert!(config.editor.seed_from_initializer);
    }

    #[test]
    fn test_load_document_creates_missing_file() {
        let dir = std::env::temp_dir().join(format!("shaderlab-cli-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("new.hlsl");
        let _ = fs::remove_file(&path);

        let cli = Cli::try_parse_from(["shaderlab".into(), path.clone().into_os_string()]).unwrap();
        assert_eq!(cli.load_document().unwrap(), DEFAULT_DOCUMENT);
        assert!(path.exists());

        fs::remove_dir_all(&dir).unwrap();
    }
}

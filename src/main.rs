mod cli;
mod config;
mod controls;
mod file_watcher;
mod generate;
mod gpu;
mod gpu_renderer;
mod renderers;
mod session;
mod shader;
mod terminal;
mod terminal_renderer;
mod threaded_event_loop;
mod threading;
mod windowed_event_loop;
mod workspace;

use std::fs::{self, File};

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Emit};
use config::resolve_config;
use shader::{assemble, extract, ExtractOptions};
use threaded_event_loop::run_threaded_event_loop;
use windowed_event_loop::run_windowed_event_loop;

const LOG_FILE: &str = "shaderlab.log";

// AIDEV-NOTE: The terminal preview owns the screen, so its logs go to a file in the
// cache dir. Window mode and --emit log to stderr.
fn init_logging(to_file: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    if to_file {
        let file = dirs::cache_dir().and_then(|dir| {
            fs::create_dir_all(&dir).ok()?;
            File::create(dir.join(LOG_FILE)).ok()
        });
        match file {
            Some(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            None => {
                builder.filter_level(log::LevelFilter::Off);
            }
        }
    }

    builder.init();
}

fn emit(form: Emit, document: &str, options: &ExtractOptions) -> Result<()> {
    match form {
        Emit::Assembled => println!("{}", assemble(document)),
        Emit::Params => {
            let params = extract(document, options);
            println!("{}", serde_json::to_string_pretty(&params)?);
        }
        Emit::Wgsl => {
            let program = gpu::compile_program(&assemble(document))?;
            println!("{}", program.fragment_wgsl);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(!cli.window && cli.emit.is_none());

    let mut config = resolve_config(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);

    let document = cli.load_document()?;

    if let Some(form) = cli.emit {
        let options = ExtractOptions {
            seed_from_initializer: config.editor.seed_from_initializer,
        };
        return emit(form, &document, &options).context("Failed to compile shader");
    }

    if cli.window {
        run_windowed_event_loop(&cli.shader_file, document, &config, cli.perf)
    } else {
        run_threaded_event_loop(&cli.shader_file, document, &config, cli.perf)
    }
}

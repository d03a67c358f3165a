//! CLI for inspecting the module host.
//!
//! Usage:
//!   cepora paths                 # Print the module search path
//!   cepora resolve <id>          # Print the file an identifier resolves to
//!   cepora load <id>             # Load a module; print its source or export keys

use std::path::PathBuf;
use std::process;
use std::rc::Rc;

use clap::{Parser, Subcommand};

use cepora::logging;
use cepora::runner::diagnostics::dump_trace;
use cepora::runner::ds::error::JErrorType;
use cepora::runner::ds::object::new_object;
use cepora::runner::module::{ModuleSource, ModuleSystem};
use cepora::runner::plugin::config::{CeporaConfig, ConfigError};
use cepora::runner::plugin::types::EvalContext;

#[derive(Parser)]
#[command(name = "cepora")]
#[command(about = "Module host for an embedded JavaScript engine", version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level: off, error, warn, info, debug, trace
    #[arg(long)]
    log_level: Option<String>,

    /// Append log output to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the module search path, one directory per line
    Paths,

    /// Print the file a module identifier resolves to
    Resolve {
        /// Module identifier, e.g. util.coffee
        id: String,
    },

    /// Load a module through the dispatcher
    Load {
        /// Module identifier, e.g. dummy.so
        id: String,
    },
}

fn startup(cli: &Cli) -> Result<Rc<ModuleSystem>, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => CeporaConfig::load(path)?,
        None => CeporaConfig::new(),
    };
    if let Some(level) = &cli.log_level {
        config.log.level = level.clone();
    }
    if let Some(file) = &cli.log_file {
        config.log.file = Some(file.clone());
    }
    logging::init(config.log_level()?, config.log.file.as_deref())?;
    Ok(Rc::new(ModuleSystem::from_config(&config)?))
}

fn run(command: &Commands, modules: &ModuleSystem, ctx: &mut EvalContext) -> Result<(), JErrorType> {
    match command {
        Commands::Paths => {
            for dir in modules.dispatcher().search_paths().dirs() {
                println!("{}", dir.display());
            }
        }
        Commands::Resolve { id } => {
            let path = modules.dispatcher().resolve(id)?;
            println!("{}", path.display());
        }
        Commands::Load { id } => {
            let exports = new_object();
            match modules.dispatcher().require_module(ctx, id, &exports)? {
                ModuleSource::Text(source) => print!("{}", source),
                ModuleSource::Native => {
                    for key in exports.borrow().base().own_property_keys() {
                        println!("{}", key);
                    }
                }
            }
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let modules = match startup(&cli) {
        Ok(modules) => modules,
        Err(e) => {
            eprintln!("cepora: {}", e);
            process::exit(1);
        }
    };

    let mut ctx = EvalContext::new();
    modules.clone().install(&mut ctx);

    if let Err(e) = run(&cli.command, &modules, &mut ctx) {
        dump_trace(&e);
        process::exit(1);
    }
}

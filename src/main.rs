//! cm-modkit - Combat Master mod toolkit

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cm_modkit::backup;
use cm_modkit::config::{self, Config};
use cm_modkit::copier::{self, CopyOutcome, Routing};
use cm_modkit::game_finder::GameFinder;
use cm_modkit::paths::{self, DataDir};
use cm_modkit::prompt::{DialogPrompt, DirectoryPrompt, TerminalPrompt};
use cm_modkit::session::{SelectedFiles, Session};
use cm_modkit::tools::{Tool, ToolManager, ToolState};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cm-modkit")]
#[command(version)]
#[command(about = "Copy mod files into Combat Master and install the recommended modding tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use RUST_LOG=debug for more detail)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding config.json, settings.json and additional_programs/
    #[arg(long, global = true, env = "CM_MODKIT_DATA_DIR", default_value = ".")]
    data_dir: PathBuf,

    /// Pick folders with a native dialog instead of typing them
    #[arg(long, global = true)]
    dialog: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the destination folder, selected files and tool status
    Status,

    /// Detect the game's bundle folder (asks if it can't be found)
    Locate,

    /// Use DIR as the bundle folder from now on
    SetDestination {
        dir: PathBuf,
    },

    /// Manage the list of mod files to copy
    Files {
        #[command(subcommand)]
        action: FilesAction,
    },

    /// Back up the bundle folder without copying anything
    Backup {
        /// Folder to create the backup_<timestamp> folder in
        #[arg(long)]
        to: PathBuf,
    },

    /// Copy the selected files into the game
    Copy {
        /// Back up the bundle folder before copying
        #[arg(long)]
        backup: bool,

        /// Where to put the backup (required with --backup)
        #[arg(long, requires = "backup")]
        backup_to: Option<PathBuf>,

        /// Send .resource files to the game's Data folder
        #[arg(long)]
        route_by_extension: bool,
    },

    /// Download or launch the recommended modding tools
    Tools {
        #[command(subcommand)]
        action: ToolsAction,
    },
}

#[derive(Subcommand)]
enum FilesAction {
    /// Add files to the selection
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Remove files from the selection by file name
    Remove {
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// List the selection
    List,
    /// Empty the selection
    Clear,
}

#[derive(Subcommand)]
enum ToolsAction {
    /// Show each tool and its available action
    List,
    /// Download and unpack a tool (uabea | assetstudio)
    Fetch { tool: Tool },
    /// Launch an installed tool (uabea | assetstudio)
    Open { tool: Tool },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only initialize logging if verbose or RUST_LOG is set
    if cli.verbose || std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(if cli.verbose {
                    "cm_modkit=debug".parse()?
                } else {
                    "cm_modkit=warn".parse()?
                }),
            )
            .init();
    }

    let data = DataDir::new(&cli.data_dir);
    let prompt: Box<dyn DirectoryPrompt> = if cli.dialog {
        Box::new(DialogPrompt)
    } else {
        Box::new(TerminalPrompt)
    };

    match cli.command {
        Commands::Status => {
            let config = Config::load(&data.config_file())?;
            let selected = SelectedFiles::load(&data.selected_files_file())?;
            let manager = ToolManager::new(data.clone())?;

            println!("=== Combat Master ===");
            match config.destination() {
                Some(dest) if dest.exists() => println!("Destination: {}", dest.display()),
                Some(dest) => println!("Destination: {} (missing)", dest.display()),
                None => println!("Destination: not set (run `cm-modkit locate`)"),
            }

            println!("\n=== Selected Files ({}) ===", selected.len());
            for file in selected.files() {
                println!("  {}", paths::display_name(file));
            }

            println!("\n=== Tools ===");
            for tool in Tool::ALL {
                println!("  {:<12} {}", tool.name(), manager.state(tool).action_label(tool));
            }
        }

        Commands::Locate => {
            let (_, dest) = resolve(&data, prompt.as_ref())?;
            println!("Destination: {}", dest.display());
        }

        Commands::SetDestination { dir } => {
            if !dir.is_dir() {
                anyhow::bail!("Not a directory: {}", dir.display());
            }
            let mut config = Config::load(&data.config_file())?;
            config.set_destination(&dir);
            config.save(&data.config_file())?;
            println!("Destination: {}", dir.display());
        }

        Commands::Files { action } => {
            let mut selected = SelectedFiles::load(&data.selected_files_file())?;
            match action {
                FilesAction::Add { paths: inputs } => {
                    let report = selected.add(&inputs)?;
                    for missing in &report.missing {
                        eprintln!("Warning: File not found: {}", missing.display());
                    }
                    println!("Added {} file(s), {} selected", report.added.len(), selected.len());
                }
                FilesAction::Remove { names } => {
                    let mut removed = 0;
                    for name in &names {
                        removed += selected.remove_by_name(name)?;
                    }
                    println!("Removed {} file(s), {} selected", removed, selected.len());
                }
                FilesAction::List => {
                    if selected.is_empty() {
                        println!("No files selected.");
                    }
                    for (i, file) in selected.files().iter().enumerate() {
                        println!("{:>4}  {}", i + 1, file.display());
                    }
                }
                FilesAction::Clear => {
                    selected.clear()?;
                    println!("Selection cleared.");
                }
            }
        }

        Commands::Backup { to } => {
            let (_, dest) = resolve(&data, prompt.as_ref())?;
            let summary = backup::create_backup(&dest, Some(&to))
                .context("Failed to create backup")?;
            println!("Backup created at: {}", summary.path.display());
        }

        Commands::Copy {
            backup,
            backup_to,
            route_by_extension,
        } => {
            let (mut config, _) = resolve(&data, prompt.as_ref())?;
            let selected = SelectedFiles::load(&data.selected_files_file())?;

            let mut session = Session::new(selected);
            if backup {
                session = session.with_backup(backup_to);
            }
            if route_by_extension {
                session = session.with_routing(Routing::ByExtension);
            }

            let outcome = copier::copy_with_fallback(
                &session,
                &mut config,
                &data.config_file(),
                prompt.as_ref(),
            )?;

            match outcome {
                CopyOutcome::NothingSelected => {
                    eprintln!("Warning: No files selected.");
                }
                CopyOutcome::Copied { files, backup } => {
                    if let Some(summary) = backup {
                        println!("Backup created at: {}", summary.path.display());
                    }
                    println!(
                        "All {} file(s) successfully copied to your game files.",
                        files.len()
                    );
                }
            }
        }

        Commands::Tools { action } => {
            let mut manager = ToolManager::new(data.clone())?;
            match action {
                ToolsAction::List => {
                    for tool in Tool::ALL {
                        println!("  {:<12} {}", tool.name(), manager.state(tool).action_label(tool));
                    }
                }
                ToolsAction::Fetch { tool } => {
                    if manager.state(tool) == ToolState::Installed {
                        println!(
                            "{} is already installed. Use `cm-modkit tools open {}`.",
                            tool,
                            tool.name().to_lowercase()
                        );
                        return Ok(());
                    }
                    fetch_tool(&mut manager, tool).await?;
                }
                ToolsAction::Open { tool } => {
                    manager
                        .open(tool)
                        .with_context(|| format!("Could not launch {}", tool))?;
                    println!("Launched {}", tool);
                }
            }
        }
    }

    Ok(())
}

/// Load the config and settle on a bundle folder, detecting or asking for it
fn resolve(data: &DataDir, prompt: &dyn DirectoryPrompt) -> Result<(Config, PathBuf)> {
    let (config, dest) =
        config::resolve_destination(&data.config_file(), &GameFinder::new(), prompt)?;
    let dest = dest.ok_or_else(|| {
        anyhow::anyhow!("No destination folder selected. Run `cm-modkit set-destination <DIR>`.")
    })?;
    Ok((config, dest))
}

/// Run a download on a background task while drawing its progress here
async fn fetch_tool(manager: &mut ToolManager, tool: Tool) -> Result<()> {
    let mut download = manager.start_download(tool)?;

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% | {msg}")?
            .progress_chars("=>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Downloading {}", tool));

    while let Some(percent) = download.progress.recv().await {
        pb.set_position(percent as u64);
    }
    pb.set_message(format!("Installing {}", tool));

    match manager.complete(download).await {
        Ok(dir) => {
            pb.finish_with_message(format!("{} installed", tool));
            println!(
                "{} has been downloaded and unzipped to {}",
                tool.archive_name(),
                dir.display()
            );
            Ok(())
        }
        Err(e) => {
            pb.abandon_with_message(format!("{} failed", tool));
            Err(e).with_context(|| format!("Could not install {}", tool))
        }
    }
}

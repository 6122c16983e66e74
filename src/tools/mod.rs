//! Recommended modding tools
//!
//! UABEA and AssetStudio can be downloaded from their GitHub releases,
//! unpacked into `additional_programs/<Tool>/` and launched from there.
//! Each tool moves `NotDownloaded -> Downloading -> Installed`; once the
//! settings say a tool is installed it stays that way, even if its folder
//! was removed by hand.

mod extract;
mod fetch;

pub use extract::extract_zip_to_dir;
pub use fetch::{fetch_and_install, stream_to_file, HttpClient, ProgressTracker, TotalSize};

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::{Child, Command};
use std::str::FromStr;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::info;

use crate::error::{Error, Result};
use crate::paths::DataDir;
use crate::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Uabea,
    AssetStudio,
}

impl Tool {
    pub const ALL: [Tool; 2] = [Tool::Uabea, Tool::AssetStudio];

    /// Display name, also the install folder name
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Uabea => "UABEA",
            Tool::AssetStudio => "AssetStudio",
        }
    }

    pub fn download_url(&self) -> &'static str {
        match self {
            Tool::Uabea => "https://github.com/nesrak1/UABEA/releases/download/v7/uabea-windows.zip",
            Tool::AssetStudio => {
                "https://github.com/Perfare/AssetStudio/releases/download/v0.16.47/AssetStudio.net6.v0.16.47.zip"
            }
        }
    }

    /// Local name of the transient archive
    pub fn archive_name(&self) -> &'static str {
        match self {
            Tool::Uabea => "UABEA.zip",
            Tool::AssetStudio => "AssetStudio.zip",
        }
    }

    /// Executable inside the install folder
    pub fn executable(&self) -> &'static str {
        match self {
            Tool::Uabea => "UABEAvalonia.exe",
            Tool::AssetStudio => "AssetStudioGUI.exe",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uabea" => Ok(Tool::Uabea),
            "assetstudio" | "asset-studio" => Ok(Tool::AssetStudio),
            other => Err(format!(
                "unknown tool '{}' (expected 'uabea' or 'assetstudio')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolState {
    NotDownloaded,
    Downloading,
    Installed,
}

impl ToolState {
    /// Label of the action offered for a tool in this state
    pub fn action_label(&self, tool: Tool) -> String {
        match self {
            ToolState::NotDownloaded => format!("Download {}", tool),
            ToolState::Downloading => format!("Downloading {}...", tool),
            ToolState::Installed => format!("Open {}", tool),
        }
    }
}

/// A download running on a background task.
///
/// `progress` yields percentages until the task ends; `task` resolves to
/// the install folder.
pub struct Download {
    pub tool: Tool,
    pub progress: UnboundedReceiver<u8>,
    pub task: JoinHandle<Result<PathBuf>>,
}

/// Tracks tool state and owns the settings record.
pub struct ToolManager {
    data: DataDir,
    settings: Settings,
    in_flight: HashSet<Tool>,
    client: HttpClient,
}

impl ToolManager {
    pub fn new(data: DataDir) -> Result<Self> {
        let settings = Settings::load(&data.settings_file());
        Ok(Self {
            data,
            settings,
            in_flight: HashSet::new(),
            client: HttpClient::new()?,
        })
    }

    pub fn state(&self, tool: Tool) -> ToolState {
        if self.settings.is_downloaded(tool) {
            ToolState::Installed
        } else if self.in_flight.contains(&tool) {
            ToolState::Downloading
        } else {
            ToolState::NotDownloaded
        }
    }

    pub fn install_dir(&self, tool: Tool) -> PathBuf {
        self.data.programs_dir().join(tool.name())
    }

    pub fn executable_path(&self, tool: Tool) -> PathBuf {
        self.install_dir(tool).join(tool.executable())
    }

    /// Start downloading `tool` from its release URL.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start_download(&mut self, tool: Tool) -> Result<Download> {
        self.start_download_from(tool, tool.download_url())
    }

    /// Start downloading `tool` from `url` on a background task.
    pub fn start_download_from(&mut self, tool: Tool, url: &str) -> Result<Download> {
        match self.state(tool) {
            ToolState::Downloading => return Err(Error::AlreadyDownloading(tool)),
            ToolState::Installed => return Err(Error::AlreadyInstalled(tool)),
            ToolState::NotDownloaded => {}
        }

        self.in_flight.insert(tool);

        let (tx, rx) = unbounded_channel();
        let client = self.client.clone();
        let url = url.to_string();
        let archive = self.data.root().join(tool.archive_name());
        let install_dir = self.install_dir(tool);

        let task = tokio::spawn(async move {
            fetch_and_install(&client, &url, &archive, &install_dir, tx).await
        });

        Ok(Download {
            tool,
            progress: rx,
            task,
        })
    }

    /// Record the outcome of a finished download.
    ///
    /// Success persists the tool's flag right away; failure returns the tool
    /// to `NotDownloaded` and hands the error back.
    pub fn finish_download(&mut self, tool: Tool, outcome: Result<PathBuf>) -> Result<PathBuf> {
        self.in_flight.remove(&tool);
        let install_dir = outcome?;

        self.settings.mark_downloaded(tool);
        self.settings.save(&self.data.settings_file())?;
        info!("{} installed at {}", tool, install_dir.display());

        Ok(install_dir)
    }

    /// Wait for `download` to end and record its outcome
    pub async fn complete(&mut self, download: Download) -> Result<PathBuf> {
        let outcome = match download.task.await {
            Ok(result) => result,
            Err(e) => Err(Error::Io {
                context: format!("Download task for {} failed", download.tool),
                source: std::io::Error::other(e),
            }),
        };
        self.finish_download(download.tool, outcome)
    }

    /// Launch an installed tool
    pub fn open(&self, tool: Tool) -> Result<Child> {
        if self.state(tool) != ToolState::Installed {
            return Err(Error::Configuration(format!(
                "{} has not been downloaded yet",
                tool
            )));
        }

        let exe = self.executable_path(tool);
        if !exe.is_file() {
            return Err(Error::NotFound(exe));
        }

        Command::new(&exe)
            .current_dir(self.install_dir(tool))
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => Error::NotFound(exe.clone()),
                _ => Error::Io {
                    context: format!("Failed to launch {}", exe.display()),
                    source: e,
                },
            })
    }
}

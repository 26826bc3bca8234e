//! Everything a command needs: settings, project config, the tool handle,
//! and the dataset caches.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::boards::BoardSource;
use crate::cache::ListCache;
use crate::config::ProjectConfig;
use crate::libraries::LibrarySource;
use crate::runner::ArduinoCli;
use crate::settings::{self, Settings};

pub const BOARDS_CACHE: &str = "boards.json";
pub const LIBRARIES_CACHE: &str = "libraries.json";

pub struct AppContext {
    pub home: PathBuf,
    pub project_dir: PathBuf,
    pub settings: Settings,
    pub config: ProjectConfig,
    pub cli: ArduinoCli,
}

impl AppContext {
    /// Resolve home, settings and project configuration.
    ///
    /// `cli_path` overrides the tool path from settings.
    pub fn load(project_dir: &Path, cli_path: Option<PathBuf>) -> Result<Self> {
        let home = settings::inox_home()?;
        Self::load_with_home(home, project_dir, cli_path)
    }

    pub fn load_with_home(
        home: PathBuf,
        project_dir: &Path,
        cli_path: Option<PathBuf>,
    ) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .with_context(|| format!("Project directory {} not found", project_dir.display()))?;
        let settings = Settings::load(&home)?;
        let config = ProjectConfig::load(&project_dir, &settings);
        let cli = ArduinoCli::new(cli_path.unwrap_or_else(|| settings.cli_path.clone()));
        tracing::debug!(
            home = %home.display(),
            project = %project_dir.display(),
            cli = %cli.path().display(),
            "context loaded"
        );

        Ok(Self {
            home,
            project_dir,
            settings,
            config,
            cli,
        })
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.home.join("cache")
    }

    pub fn boards_cache(&self) -> ListCache<BoardSource<'_>> {
        ListCache::new(
            self.cache_dir().join(BOARDS_CACHE),
            BoardSource::new(&self.cli),
        )
    }

    pub fn libraries_cache(&self) -> ListCache<LibrarySource<'_>> {
        ListCache::new(
            self.cache_dir().join(LIBRARIES_CACHE),
            LibrarySource::new(&self.cli),
        )
    }
}

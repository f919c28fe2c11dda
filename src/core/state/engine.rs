use std::sync::Arc;

use tracing::info;

use crate::core::cache::CacheRepository;
use crate::core::config::EngineConfig;
use crate::core::downloader::{Fetcher, HttpFetcher};
use crate::core::error::LauncherResult;
use crate::core::game::{GameDirectory, GameRepository};
use crate::core::install::{build_install_graph, InstallContext};
use crate::core::java::{select_java_runtime, InstalledRuntimes, JavaSelection};
use crate::core::task::{ExecutionReport, TaskExecutor, TaskGraph};
use crate::core::version::{ResolveOptions, ResolvedVersion};

/// One game directory with everything wired up: the version repository,
/// the shared cache, the executor and the network fetcher.
pub struct Engine {
    config: EngineConfig,
    repository: GameRepository,
    install: InstallContext,
    executor: TaskExecutor,
}

impl Engine {
    pub fn new(config: EngineConfig) -> LauncherResult<Self> {
        let fetcher = Arc::new(HttpFetcher::from_config(&config)?);
        Ok(Self::with_fetcher(config, fetcher))
    }

    pub fn with_fetcher(config: EngineConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        info!("Engine rooted at {:?}", config.common_dir);
        let repository = GameRepository::new(
            GameDirectory::new(&config.common_dir),
            ResolveOptions {
                strict: config.strict_inheritance,
            },
        );
        Self {
            install: InstallContext::new(&config, fetcher),
            executor: TaskExecutor::from_config(&config),
            repository,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn repository(&self) -> &GameRepository {
        &self.repository
    }

    pub fn cache(&self) -> &CacheRepository {
        &self.install.cache
    }

    pub fn executor(&self) -> &TaskExecutor {
        &self.executor
    }

    pub fn resolve(&self, id: &str) -> LauncherResult<Arc<ResolvedVersion>> {
        self.repository.resolve(id)
    }

    pub fn build_install_graph(&self, id: &str) -> LauncherResult<TaskGraph> {
        let resolved = self.resolve(id)?;
        build_install_graph(&self.install, &resolved)
    }

    /// Resolve, build and run the install graph for `id`.
    pub async fn install(&self, id: &str) -> LauncherResult<ExecutionReport> {
        let graph = self.build_install_graph(id)?;
        Ok(self.executor.execute(graph).await)
    }

    pub fn select_java_runtime(
        &self,
        id: &str,
        installed: &dyn InstalledRuntimes,
    ) -> LauncherResult<JavaSelection> {
        let resolved = self.resolve(id)?;
        // The jar of a resolved version is the vanilla release it builds on.
        select_java_runtime(resolved.jar_name(), &resolved, installed)
    }
}

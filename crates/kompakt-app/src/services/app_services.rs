// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer. Loads the configuration, locates the engines once
// and hands out the job runner and the quick blocking queries.
//
// Missing engines are not fatal at start-up: without Ghostscript every
// engine call fails with `EngineUnavailable`, without mutool/qpdf Auto mode
// simply never picks a lossless strategy.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use kompakt_core::error::{KompaktError, Result};
use kompakt_core::types::{CompressionProfile, DocumentType, Strategy};
use kompakt_core::AppConfig;
use kompakt_document::{
    PageCount, PdfInfo, classify, is_layered, page_count, read_info, select_profile, select_strategy,
};
use kompakt_engine::diagnostics::{DiagnosticReport, run_diagnostics};
use kompakt_engine::{
    GhostscriptAdapter, OptimizerTools, RenderEngine, StructuralOptimizer, UnavailableEngine,
};
use kompakt_pipeline::{CancelToken, JobRunner, ProbeReport, ProgressSink, probe_presets};
use serde::Serialize;
use tracing::{info, warn};

use super::data_dir;

/// What Auto mode would make of a document.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub document_type: DocumentType,
    pub layered: bool,
    pub strategy: Strategy,
    /// `None` when the strategy is lossless.
    pub profile: Option<CompressionProfile>,
    /// `None` when the parser cannot open the file.
    pub pdf: Option<PdfInfo>,
}

/// Shared services. Clones share the same engines and config.
#[derive(Clone)]
pub struct AppServices {
    engine: Arc<dyn RenderEngine>,
    tools: Option<Arc<dyn StructuralOptimizer>>,
    runner: JobRunner,
    config_path: PathBuf,
    config: Arc<Mutex<AppConfig>>,
}

impl AppServices {
    /// Load the configuration (from `config_override` or the data
    /// directory) and locate the engines. Call once at start-up.
    pub fn init(config_override: Option<&Path>) -> Result<Self> {
        let config_path = match config_override {
            Some(path) => path.to_path_buf(),
            None => data_dir::config_path(&data_dir::data_dir()),
        };
        info!(path = %config_path.display(), "initialising services");

        let config = match load_config(&config_path)? {
            Some(config) => config,
            None if config_override.is_some() => {
                return Err(KompaktError::Config(format!(
                    "configuration file {} does not exist",
                    config_path.display()
                )));
            }
            None => AppConfig::default(),
        };
        config.validate()?;
        Ok(Self::with_config(config, config_path))
    }

    /// Build services around an already loaded configuration.
    pub fn with_config(config: AppConfig, config_path: PathBuf) -> Self {
        let engine: Arc<dyn RenderEngine> = match GhostscriptAdapter::locate(&config) {
            Ok(adapter) => Arc::new(adapter),
            Err(e) => {
                warn!(error = %e, "Ghostscript not found; engine calls will fail");
                Arc::new(UnavailableEngine::new(e.to_string()))
            }
        };
        let tools: Option<Arc<dyn StructuralOptimizer>> =
            match OptimizerTools::locate(config.tools_dir.as_deref()) {
                Ok(tools) => Some(Arc::new(tools)),
                Err(e) => {
                    info!(error = %e, "lossless strategies disabled");
                    None
                }
            };
        Self::from_parts(engine, tools, config, config_path)
    }

    /// Assemble services from explicit engines.
    pub fn from_parts(
        engine: Arc<dyn RenderEngine>,
        tools: Option<Arc<dyn StructuralOptimizer>>,
        config: AppConfig,
        config_path: PathBuf,
    ) -> Self {
        let runner = JobRunner::new(engine.clone(), tools.clone(), config.clone());
        Self {
            engine,
            tools,
            runner,
            config_path,
            config: Arc::new(Mutex::new(config)),
        }
    }

    pub fn runner(&self) -> &JobRunner {
        &self.runner
    }

    pub fn tools_available(&self) -> bool {
        self.tools.is_some()
    }

    // -- Queries --------------------------------------------------------------

    /// Run `query` on a blocking worker.
    pub async fn blocking<T, F>(&self, query: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&AppServices) -> Result<T> + Send + 'static,
    {
        let svc = self.clone();
        tokio::task::spawn_blocking(move || query(&svc))
            .await
            .map_err(|e| KompaktError::Worker(e.to_string()))?
    }

    pub fn classify(&self, path: &Path) -> Result<Classification> {
        let size_bytes = std::fs::metadata(path)
            .map_err(|e| KompaktError::io(path, e))?
            .len();
        let config = self.config();
        let document_type = classify(path, config.classify_scan_bytes);
        let layered = is_layered(path, config.layering_scan_bytes);
        let quality = config.default_image_quality;
        let strategy = select_strategy(document_type, layered, self.tools_available(), quality, false);
        Ok(Classification {
            path: path.to_path_buf(),
            size_bytes,
            document_type,
            layered,
            strategy,
            profile: (strategy != Strategy::Lossless).then(|| select_profile(document_type, quality)),
            pdf: read_info(path),
        })
    }

    pub fn page_count(&self, path: &Path) -> Result<PageCount> {
        page_count(self.engine.as_ref(), path, self.config().fallback_page_count)
    }

    pub fn probe(
        &self,
        path: &Path,
        quality: u8,
        optimize_for_scanned: bool,
        progress: &dyn ProgressSink,
        cancel: &CancelToken,
    ) -> Result<ProbeReport> {
        probe_presets(
            self.engine.as_ref(),
            path,
            quality,
            optimize_for_scanned,
            progress,
            cancel,
        )
    }

    pub fn diagnose(&self) -> DiagnosticReport {
        run_diagnostics(&self.config())
    }

    // -- Config persistence ---------------------------------------------------

    /// A copy of the current configuration.
    pub fn config(&self) -> AppConfig {
        self.config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Validate, store and persist `config`. Engines already located are
    /// kept until the next start.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        config.validate()?;
        *self
            .config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = config.clone();
        persist_config(&self.config_path, config)
    }
}

// -- Config file persistence --------------------------------------------------

/// `Ok(None)` when the file does not exist.
fn load_config(path: &Path) -> Result<Option<AppConfig>> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(KompaktError::io(path, e)),
    };
    serde_json::from_str(&data)
        .map(Some)
        .map_err(|e| KompaktError::Config(format!("{}: {e}", path.display())))
}

fn persist_config(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| KompaktError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json).map_err(|e| KompaktError::io(path, e))?;
    Ok(())
}

use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use crate::domain::extractor::{FileExtraction, SettingExtractor};
use crate::domain::setting::{Diagnostic, SettingRecord};
use crate::error::TreeSourceError;
use crate::infrastructure::concurrency;
use crate::infrastructure::file_walker::relative_source_path;
use crate::ports::TreeSource;

/// A file whose tree could not be obtained.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: TreeSourceError,
}

/// Everything one run produced. Records and diagnostics are in traversal order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub records: Vec<SettingRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub failures: Vec<FileFailure>,
    pub files_scanned: usize,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} settings from {} files ({} skipped declarations, {} failed files)",
            self.records.len(),
            self.files_scanned,
            self.diagnostics.len(),
            self.failures.len()
        )
    }

    fn absorb(&mut self, extraction: FileExtraction) {
        self.records.extend(extraction.records);
        self.diagnostics.extend(extraction.diagnostics);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// `1` processes files sequentially on the calling thread.
    pub workers: usize,
    pub fail_fast: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            workers: 1,
            fail_fast: false,
        }
    }
}

pub struct ExtractUsecase<'a> {
    pub source: &'a dyn TreeSource,
    pub extractor: &'a SettingExtractor,
    /// Base for the `sourceFile` of every record.
    pub root: &'a Path,
}

impl<'a> ExtractUsecase<'a> {
    pub fn run(&self, files: &[PathBuf], options: RunOptions) -> Result<RunReport> {
        info!(files = files.len(), workers = options.workers, "starting extraction");

        let report = if options.workers <= 1 {
            self.run_sequential(files, options.fail_fast)?
        } else {
            let pool = concurrency::build_pool(options.workers)?;
            let failed = AtomicBool::new(false);
            // Indexed collect keeps traversal order regardless of completion order.
            // Under fail-fast, files not yet started once a failure is seen are skipped.
            let outcomes: Vec<_> = pool.install(|| {
                files
                    .par_iter()
                    .map(|path| {
                        if options.fail_fast && failed.load(Ordering::Relaxed) {
                            return (path.clone(), None);
                        }
                        let outcome = self.process_file(path);
                        if outcome.is_err() {
                            failed.store(true, Ordering::Relaxed);
                        }
                        (path.clone(), Some(outcome))
                    })
                    .collect()
            });
            self.merge(outcomes, options.fail_fast)?
        };

        info!("{}", report.summary());
        Ok(report)
    }

    fn run_sequential(&self, files: &[PathBuf], fail_fast: bool) -> Result<RunReport> {
        let mut report = RunReport::default();
        for path in files {
            report.files_scanned += 1;
            match self.process_file(path) {
                Ok(extraction) => report.absorb(extraction),
                Err(error) if fail_fast => {
                    return Err(error).with_context(|| format!("Failed to obtain tree for {}", path.display()));
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping file");
                    report.failures.push(FileFailure {
                        path: path.clone(),
                        error,
                    });
                }
            }
        }
        Ok(report)
    }

    fn merge(
        &self,
        outcomes: Vec<(PathBuf, Option<Result<FileExtraction, TreeSourceError>>)>,
        fail_fast: bool,
    ) -> Result<RunReport> {
        let mut report = RunReport::default();
        // Skipped files only exist when some other file failed under fail-fast.
        for (path, outcome) in outcomes {
            let Some(outcome) = outcome else { continue };
            report.files_scanned += 1;
            match outcome {
                Ok(extraction) => report.absorb(extraction),
                Err(error) if fail_fast => {
                    return Err(error).with_context(|| format!("Failed to obtain tree for {}", path.display()));
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping file");
                    report.failures.push(FileFailure { path, error });
                }
            }
        }
        Ok(report)
    }

    fn process_file(&self, path: &Path) -> Result<FileExtraction, TreeSourceError> {
        let tree = self.source.acquire(path)?;
        let source_file = relative_source_path(self.root, path);
        Ok(self.extractor.extract(&tree, &source_file))
    }
}

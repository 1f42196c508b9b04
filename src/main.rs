// Command-line entry point for Setting Miner.

use anyhow::Context;
use clap::Parser;
use setting_miner::application::{ExtractUsecase, RunOptions};
use setting_miner::config::{ExtractorConfig, OutputFormat};
use setting_miner::domain::extractor::SettingExtractor;
use setting_miner::infrastructure::concurrency::resolve_workers;
use setting_miner::infrastructure::{
    CachingTreeSource, JsonExporter, JsonTreeSource, ServiceTreeSource, SourceWalker, TextExporter,
};
use setting_miner::ports::{RecordExporter, TreeSource};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Root of the codebase; `sourceFile` paths are relative to it
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Sub-path of the root to scan
    #[arg(long)]
    scan: Option<PathBuf>,

    /// Parsing service address (host:port)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Directory of pre-exported JSON trees mirroring the root
    #[arg(long)]
    tree_dir: Option<PathBuf>,

    /// Persistent tree cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Output file path (`-` for stdout)
    #[arg(short, long)]
    output: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Source file extension to scan
    #[arg(long)]
    extension: Option<String>,

    /// Base type name of setting fields
    #[arg(long)]
    setting_type: Option<String>,

    /// Qualifier that marks property flag references
    #[arg(long)]
    property_anchor: Option<String>,

    /// Worker threads (0 = half the cores)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Abort on the first file whose tree cannot be obtained
    #[arg(long)]
    fail_fast: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Errors only
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<ExtractorConfig> {
        let mut config = ExtractorConfig::load(self.config.as_deref())?;

        if let Some(root) = self.root {
            config.root_directory = root;
        }
        if let Some(scan) = self.scan {
            config.scan_path = Some(scan);
        }
        if let Some(endpoint) = self.endpoint {
            config.service_endpoint = Some(endpoint);
        }
        if let Some(tree_dir) = self.tree_dir {
            config.tree_dir = Some(tree_dir);
        }
        if let Some(cache_dir) = self.cache_dir {
            config.cache_dir = Some(cache_dir);
        }
        if let Some(output) = self.output {
            config.output_path = output;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(extension) = self.extension {
            config.file_extension = extension;
        }
        if let Some(setting_type) = self.setting_type {
            config.setting_type_name = setting_type;
        }
        if let Some(anchor) = self.property_anchor {
            config.property_anchor_name = anchor;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        config.fail_fast |= self.fail_fast;

        Ok(config.validate()?)
    }
}

fn main() {
    let cli = Cli::parse();

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(e) => {
            eprintln!("setting-miner error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every file produced a tree.
fn run(cli: Cli) -> anyhow::Result<bool> {
    init_tracing(cli.quiet, cli.verbose)?;
    let config = cli.into_config()?;

    let base = base_source(&config);
    match &config.cache_dir {
        Some(cache_dir) => {
            let cache = CachingTreeSource::open(base, cache_dir)
                .with_context(|| format!("Failed to open tree cache {}", cache_dir.display()))?;
            let clean = extract(&config, &cache)?;
            cache.flush()?;
            Ok(clean)
        }
        None => extract(&config, base.as_ref()),
    }
}

/// Pre-exported trees win over the service; with neither configured trees are
/// expected next to each source file.
fn base_source(config: &ExtractorConfig) -> Box<dyn TreeSource> {
    if let Some(tree_dir) = &config.tree_dir {
        info!(tree_dir = %tree_dir.display(), "reading exported trees");
        return Box::new(JsonTreeSource::mirrored(&config.root_directory, tree_dir));
    }
    if let Some(endpoint) = &config.service_endpoint {
        info!(endpoint, "using parsing service");
        return Box::new(
            ServiceTreeSource::new(endpoint)
                .with_timeout(config.timeout())
                .with_retry(config.retry_policy()),
        );
    }
    info!("reading sidecar tree files");
    Box::new(JsonTreeSource::sidecar())
}

fn extract(config: &ExtractorConfig, source: &dyn TreeSource) -> anyhow::Result<bool> {
    let scan_root = config.scan_root();
    let files = SourceWalker::new(&config.file_extension).collect(&scan_root)?;
    info!(root = %scan_root.display(), files = files.len(), "collected source files");

    let extractor = SettingExtractor::new(&config.setting_type_name, &config.property_anchor_name);
    let usecase = ExtractUsecase {
        source,
        extractor: &extractor,
        root: &config.root_directory,
    };
    let report = usecase.run(
        &files,
        RunOptions {
            workers: resolve_workers(config.jobs),
            fail_fast: config.fail_fast,
        },
    )?;

    let exporter: Box<dyn RecordExporter> = match config.format {
        OutputFormat::Json => Box::new(JsonExporter { pretty: false }),
        OutputFormat::JsonPretty => Box::new(JsonExporter { pretty: true }),
        OutputFormat::Text => Box::new(TextExporter),
    };
    exporter
        .export(&report.records, &config.output_path)
        .with_context(|| format!("Failed to write {}", config.output_path))?;

    for failure in &report.failures {
        eprintln!("[FAILED] {}: {}", failure.path.display(), failure.error);
    }
    eprintln!("{} -> {}", report.summary(), config.output_path);

    Ok(report.is_clean())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("SETTING_MINER_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use setting_miner::error::ConfigError;
    use std::fs;
    use tempfile::tempdir;

    const CONFIG: &str = r#"
root_directory = "/src/elasticsearch"
scan_path = "server/src/main/java"
service_endpoint = "localhost:7000"
output_path = "from-file.json"
setting_type_name = "Setting"
jobs = 2
retries = 5
"#;

    fn write_config(dir: &std::path::Path) -> String {
        let path = dir.join("miner.toml");
        fs::write(&path, CONFIG).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn parse(args: &[&str]) -> anyhow::Result<ExtractorConfig> {
        let mut argv = vec!["setting-miner"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv)?.into_config()
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempdir().unwrap();
        let config_path = write_config(dir.path());

        let config = parse(&[
            "--config",
            &config_path,
            "--output",
            "-",
            "--jobs",
            "8",
            "--format",
            "text",
            "--extension",
            "kt",
        ])
        .unwrap();

        assert_eq!(config.output_path, "-");
        assert_eq!(config.jobs, 8);
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.file_extension, ".kt");
        // Keys without a flag keep the file's values.
        assert_eq!(config.root_directory, PathBuf::from("/src/elasticsearch"));
        assert_eq!(config.service_endpoint.as_deref(), Some("localhost:7000"));
        assert_eq!(config.retries, 5);
        assert!(!config.fail_fast);
    }

    #[test]
    fn test_fail_fast_flag_is_combined_with_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("strict.toml");
        fs::write(&path, "fail_fast = true\n").unwrap();

        let from_file = parse(&["--config", path.to_str().unwrap()]).unwrap();
        assert!(from_file.fail_fast);

        let from_flag = parse(&["--fail-fast"]).unwrap();
        assert!(from_flag.fail_fast);
        assert!(!parse(&[]).unwrap().fail_fast);
    }

    #[test]
    fn test_invalid_override_is_rejected_after_merge() {
        let dir = tempdir().unwrap();
        let config_path = write_config(dir.path());

        let err = parse(&["--config", &config_path, "--setting-type", " "]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ConfigError>(),
            Some(ConfigError::Invalid(_))
        ));

        assert!(parse(&["--endpoint", "no-port"]).is_err());
    }

    #[test]
    fn test_verbose_and_quiet_conflict() {
        assert!(Cli::try_parse_from(["setting-miner", "--verbose", "--quiet"]).is_err());
    }
}

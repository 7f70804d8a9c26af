use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use segsift::pipeline::{self, Pipeline, PipelineConfig, Reduction};
use segsift::segment::Policy;
use std::path::PathBuf;

/// Segment recorded audio and keep a small representative set of segments
#[derive(Parser)]
#[command(name = "segsift")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// More log output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment a file, reduce the segments and write them as WAV files
    Segment {
        /// Input audio file
        input: PathBuf,

        /// Root directory for `<name>_segmented/` (defaults to the input's directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        options: RunOptions,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print detected events and candidate segments as JSON
    Analyze {
        /// Input audio file
        input: PathBuf,

        #[command(flatten)]
        options: RunOptions,
    },
    /// Show the default configuration
    ShowConfig,
    /// Validate a configuration file
    ValidateConfig {
        /// Configuration file to validate
        config: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReductionArg {
    None,
    Density,
    Partition,
}

impl From<ReductionArg> for Reduction {
    fn from(arg: ReductionArg) -> Self {
        match arg {
            ReductionArg::None => Reduction::None,
            ReductionArg::Density => Reduction::Density,
            ReductionArg::Partition => Reduction::Partition,
        }
    }
}

/// Overrides applied on top of the configuration file or defaults.
#[derive(Args)]
struct RunOptions {
    /// Configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Boundary policy: beats, transients, frequency or onsets (default: merge all events)
    #[arg(short, long)]
    policy: Option<String>,

    /// Frequency band for the frequency policy, e.g. "200-2000"
    #[arg(long)]
    freq_range: Option<String>,

    /// Shortest segment kept, in seconds
    #[arg(long)]
    min_length: Option<f64>,

    /// Keep silent segments
    #[arg(long)]
    keep_silence: bool,

    /// Reduction strategy
    #[arg(short, long, value_enum)]
    reduce: Option<ReductionArg>,

    /// Number of clusters for partition reduction and organizing
    #[arg(short = 'k', long)]
    clusters: Option<usize>,

    /// Cosine similarity above which segments are duplicates
    #[arg(long)]
    similarity: Option<f32>,

    /// DBSCAN radius
    #[arg(long)]
    eps: Option<f32>,

    /// DBSCAN core-point size
    #[arg(long)]
    min_samples: Option<usize>,

    /// Group saved segments into cluster directories
    #[arg(long)]
    organize: bool,
}

impl RunOptions {
    fn into_config(self) -> anyhow::Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => pipeline::load_config(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => PipelineConfig::default(),
        };

        if let Some(range) = &self.freq_range {
            let (min_hz, max_hz) = parse_range(range)?;
            config = config.with_freq_range(min_hz, max_hz);
        }
        if let Some(name) = &self.policy {
            let policy = Policy::parse(name, config.freq_range)?;
            config = config.with_policy(Some(policy));
        }
        if let Some(seconds) = self.min_length {
            config = config.with_min_segment_length(seconds);
        }
        if self.keep_silence {
            config.check_silence = false;
        }
        if let Some(reduction) = self.reduce {
            config = config.with_reduction(reduction.into());
        }
        if let Some(k) = self.clusters {
            config = config.with_n_clusters(k);
        }
        if let Some(threshold) = self.similarity {
            config = config.with_similarity_threshold(threshold);
        }
        if let Some(eps) = self.eps {
            config.eps = eps;
        }
        if let Some(min_samples) = self.min_samples {
            config.min_samples = min_samples;
        }
        if self.organize {
            config = config.with_organize(true);
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_range(range: &str) -> anyhow::Result<(f32, f32)> {
    let (lo, hi) = range
        .split_once('-')
        .with_context(|| format!("expected MIN-MAX, got {range:?}"))?;
    Ok((lo.trim().parse()?, hi.trim().parse()?))
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Segment {
            input,
            output,
            options,
            json,
        } => {
            let pipeline = Pipeline::new(options.into_config()?);
            let report = pipeline
                .run(&input, output.as_deref())
                .with_context(|| format!("failed to segment {}", input.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else if !cli.quiet {
                println!(
                    "{}: {} candidates, {} saved",
                    report.source,
                    report.candidates.len(),
                    report.saved.len()
                );
                for record in &report.saved {
                    println!("  {}", record.path.display());
                }
            }
        }
        Commands::Analyze { input, options } => {
            let pipeline = Pipeline::new(options.into_config()?);
            let report = pipeline
                .analyze(&input)
                .with_context(|| format!("failed to analyze {}", input.display()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::ShowConfig => {
            println!("{}", serde_json::to_string_pretty(&PipelineConfig::default())?);
        }
        Commands::ValidateConfig { config } => {
            let config = pipeline::load_config(&config)
                .with_context(|| format!("invalid config {}", config.display()))?;
            println!("Configuration is valid");
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(args: &[&str]) -> PipelineConfig {
        let mut argv = vec!["segsift", "analyze", "in.wav"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Analyze { options, .. } => options.into_config().unwrap(),
            _ => panic!("expected the analyze subcommand"),
        }
    }

    #[test]
    fn test_frequency_policy_uses_given_range() {
        let config = options(&["--freq-range", "300-1200", "-p", "frequency"]);
        assert_eq!(config.freq_range, (300.0, 1200.0));
        assert_eq!(
            config.policy,
            Some(Policy::FrequencyRange {
                min_hz: 300.0,
                max_hz: 1200.0
            })
        );
    }

    #[test]
    fn test_overrides() {
        let config = options(&["-p", "onsets", "-r", "partition", "-k", "4", "--organize"]);
        assert_eq!(config.policy, Some(Policy::Onsets));
        assert_eq!(config.reduction, Reduction::Partition);
        assert_eq!(config.n_clusters, 4);
        assert!(config.organize);
    }

    #[test]
    fn test_bad_range_is_rejected() {
        assert!(parse_range("300").is_err());
        assert!(parse_range("a-b").is_err());
        assert_eq!(parse_range(" 50 - 80 ").unwrap(), (50.0, 80.0));
    }
}

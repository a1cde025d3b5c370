// Copyright 2025 N. Dornseif
//
// Dual-licensed under Apache 2.0 and MIT terms.

//! Command line front end: parses numbers, runs one operation and prints the result.

use std::fs::read_to_string;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pearlstat::config::Settings;
use pearlstat::operations::{
    self, ChiSquareParams, LcgParams, MeanTestParams, MiddleSquareParams, Operation, Outcome,
    SampleParams, VarianceTestParams,
};
use pearlstat::rng_testing::{self, format_suite_summary};
use pearlstat::rngs::{middle_square::Normalization, Generator, ReferenceRand};
use pearlstat::utils::{report_header, write_and_print};

/// Divisor for middle-square output
///
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum NormalizationArg {
    /// x / 10^d
    PowerOfTen,
    /// x / (10^d - 1)
    MaxValue,
}

impl From<NormalizationArg> for Normalization {
    fn from(arg: NormalizationArg) -> Self {
        match arg {
            NormalizationArg::PowerOfTen => Normalization::PowerOfTen,
            NormalizationArg::MaxValue => Normalization::MaxValue,
        }
    }
}

/// Generator to put through the battery
///
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum GeneratorArg {
    MiddleSquare,
    Lcg,
    Reference,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate numbers with the middle-square method
    MiddleSquare {
        /// Seed with an even number of digits
        #[arg(long)]
        seed: u64,
        #[arg(long)]
        count: usize,
        /// Fixed state width, the seed is zero padded to it
        #[arg(long)]
        digits: Option<u32>,
        #[arg(long, value_enum)]
        normalization: Option<NormalizationArg>,
    },
    /// Generate numbers with X(i+1) = a * X(i) mod m
    Lcg {
        #[arg(long, allow_negative_numbers = true)]
        seed: i64,
        #[arg(long, allow_negative_numbers = true)]
        multiplier: i64,
        #[arg(long, allow_negative_numbers = true)]
        modulus: i64,
        #[arg(long)]
        count: usize,
    },
    /// Chi squared uniformity test on observed interval frequencies
    ChiSquare {
        #[arg(long)]
        intervals: usize,
        /// Comma separated observed frequencies
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, required = true)]
        frequencies: Vec<i64>,
        #[arg(long)]
        alpha: Option<f64>,
    },
    /// Kolmogorov-Smirnov uniformity test
    Ks {
        /// Comma separated sample
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, required = true)]
        data: Vec<f64>,
        #[arg(long)]
        alpha: Option<f64>,
    },
    /// Z test (with --sigma) or t test of the sample mean
    Mean {
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, required = true)]
        data: Vec<f64>,
        /// Hypothesized mean
        #[arg(long, allow_negative_numbers = true)]
        mean: f64,
        /// Known population standard deviation
        #[arg(long)]
        sigma: Option<f64>,
        #[arg(long)]
        alpha: Option<f64>,
    },
    /// Mean test of a [0, 1] sample against U(0, 1)
    UniformMean {
        #[arg(long, value_delimiter = ',', required = true)]
        data: Vec<f64>,
        #[arg(long)]
        alpha: Option<f64>,
    },
    /// Two tailed chi squared test of the sample variance
    Variance {
        #[arg(long, value_delimiter = ',', allow_negative_numbers = true, required = true)]
        data: Vec<f64>,
        /// Hypothesized variance
        #[arg(long, allow_negative_numbers = true)]
        variance: f64,
        #[arg(long)]
        alpha: Option<f64>,
    },
    /// Generate a sample and run every uniformity test on it
    Battery {
        #[arg(value_enum)]
        generator: GeneratorArg,
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        seed: i64,
        #[arg(long, allow_negative_numbers = true)]
        multiplier: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        modulus: Option<i64>,
        #[arg(long)]
        digits: Option<u32>,
        /// Number of values to draw, overrides the configuration
        #[arg(long)]
        size: Option<usize>,
    },
    /// Run a JSON array of operations
    Run { file: PathBuf },
    /// Prints the default configuration to stdout
    NewConfig {},
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Verbosity level
    /// 0 - Warn
    /// 1 - Info
    /// 2 - Debug
    /// > 2 - Trace
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// File the printed results are appended to
    #[arg(long)]
    report: Option<PathBuf>,
    /// Print results as JSON
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let settings = match path {
        Some(path) => {
            let json = read_to_string(path)
                .with_context(|| format!("Could not read configuration {}", path.display()))?;
            Settings::from_json(&json)
                .with_context(|| format!("Could not parse configuration {}", path.display()))?
        }
        None => Settings::new(),
    };
    settings.validate()?;
    Ok(settings)
}

fn print_outcome(outcome: &Outcome, json: bool, report: Option<&Path>) -> Result<()> {
    if json {
        write_and_print(serde_json::to_string_pretty(outcome)?, report)?;
        return Ok(());
    }
    match outcome {
        Outcome::MiddleSquare(steps) => {
            for (i, step) in steps.iter().enumerate() {
                write_and_print(
                    format!("r{}: {:.4}     {}", i + 1, step.value, step.format()),
                    report,
                )?;
            }
        }
        Outcome::Lcg(steps) => {
            for (i, step) in steps.iter().enumerate() {
                write_and_print(
                    format!("r{}: {:.4}     {}", i + 1, step.value, step.format()),
                    report,
                )?;
            }
        }
        Outcome::Test(result) => {
            for line in result.workings().lines() {
                write_and_print(format!("  {}", line), report)?;
            }
            write_and_print(result.format(), report)?;
            write_and_print(result.explanation().to_owned(), report)?;
        }
    }
    Ok(())
}

fn run_operation(operation: &Operation, json: bool, report: Option<&Path>) -> Result<()> {
    if !json {
        write_and_print(report_header(operation.id()), report)?;
    }
    let outcome = operation
        .run()
        .with_context(|| format!("Operation `{}` failed", operation.id()))?;
    print_outcome(&outcome, json, report)
}

fn build_operation(command: Commands, settings: &Settings) -> Option<Operation> {
    let alpha = |alpha: Option<f64>| alpha.unwrap_or(settings.alpha);
    let operation = match command {
        Commands::MiddleSquare {
            seed,
            count,
            digits,
            normalization,
        } => Operation::MiddleSquare(MiddleSquareParams {
            seed,
            count,
            digits,
            normalization: normalization.map_or(settings.normalization, Normalization::from),
        }),
        Commands::Lcg {
            seed,
            multiplier,
            modulus,
            count,
        } => Operation::Lcg(LcgParams {
            seed,
            multiplier,
            modulus,
            count,
        }),
        Commands::ChiSquare {
            intervals,
            frequencies,
            alpha: a,
        } => Operation::ChiSquareUniformity(ChiSquareParams {
            intervals,
            observed: frequencies,
            alpha: alpha(a),
        }),
        Commands::Ks { data, alpha: a } => Operation::KsUniformity(SampleParams {
            sample: data,
            alpha: alpha(a),
        }),
        Commands::Mean {
            data,
            mean,
            sigma,
            alpha: a,
        } => Operation::MeanTest(MeanTestParams {
            sample: data,
            hypothesized_mean: mean,
            population_std_dev: sigma,
            alpha: alpha(a),
        }),
        Commands::UniformMean { data, alpha: a } => Operation::UniformMeanTest(SampleParams {
            sample: data,
            alpha: alpha(a),
        }),
        Commands::Variance {
            data,
            variance,
            alpha: a,
        } => Operation::VarianceTest(VarianceTestParams {
            sample: data,
            hypothesized_variance: variance,
            alpha: alpha(a),
        }),
        Commands::Battery { .. } | Commands::Run { .. } | Commands::NewConfig {} => return None,
    };
    Some(operation)
}

fn battery_generator(
    generator: GeneratorArg,
    seed: i64,
    multiplier: Option<i64>,
    modulus: Option<i64>,
    digits: Option<u32>,
    settings: &Settings,
) -> Result<Box<dyn Generator>> {
    let operation = match generator {
        GeneratorArg::Reference => {
            let seed = u64::try_from(seed).context("Reference seeds must not be negative")?;
            return Ok(Box::new(ReferenceRand::new(seed)));
        }
        GeneratorArg::MiddleSquare => Operation::MiddleSquare(MiddleSquareParams {
            seed: u64::try_from(seed).context("Middle-square seeds must not be negative")?,
            count: 0,
            digits,
            normalization: settings.normalization,
        }),
        GeneratorArg::Lcg => Operation::Lcg(LcgParams {
            seed,
            multiplier: multiplier.context("--multiplier is required for the LCG")?,
            modulus: modulus.context("--modulus is required for the LCG")?,
            count: 0,
        }),
    };
    let generator = operations::generator_for(&operation)
        .context("Operation does not describe a generator")??;
    Ok(generator)
}

fn main() -> Result<()> {
    let args = Cli::parse();

    let verbosity = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::from_default_env().add_directive(verbosity.into());
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut settings = load_settings(args.config.as_deref())?;
    debug!(?settings, "loaded settings");
    let report = args.report.as_deref();

    match args.command {
        Commands::NewConfig {} => {
            println!("{}", serde_json::to_string_pretty(&Settings::new())?);
        }
        Commands::Run { file } => {
            let json = read_to_string(&file)
                .with_context(|| format!("Could not read operations {}", file.display()))?;
            let batch = operations::parse_batch(&json)
                .with_context(|| format!("Could not parse operations {}", file.display()))?;
            for operation in batch.iter() {
                run_operation(operation, args.json, report)?;
            }
        }
        Commands::Battery {
            generator,
            seed,
            multiplier,
            modulus,
            digits,
            size,
        } => {
            if let Some(size) = size {
                settings.battery_size = size;
            }
            let mut rng = battery_generator(generator, seed, multiplier, modulus, digits, &settings)?;
            let name = format!("{:?}", generator);
            let suite = rng_testing::test_suite(&mut rng, &settings, &name)?;
            if args.json {
                let results: Vec<_> = suite.entries.iter().map(|entry| &entry.result).collect();
                write_and_print(serde_json::to_string_pretty(&results)?, report)?;
            } else {
                write_and_print(report_header(&format!("Testing: {}", name)), report)?;
                for entry in suite.entries.iter() {
                    write_and_print(entry.format(), report)?;
                }
                write_and_print(format_suite_summary(&suite), report)?;
            }
        }
        command => {
            if let Some(operation) = build_operation(command, &settings) {
                run_operation(&operation, args.json, report)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_generator_rejects_negative_seeds() {
        let settings = Settings::new();
        for generator in [GeneratorArg::Reference, GeneratorArg::MiddleSquare] {
            assert!(battery_generator(generator, -1, None, None, None, &settings).is_err());
        }
        let mut rng =
            battery_generator(GeneratorArg::Reference, 7, None, None, None, &settings).unwrap();
        let mut reference = ReferenceRand::new(7);
        assert_eq!(rng.sample(4), reference.sample(4));
    }

    #[test]
    fn test_battery_generator_needs_lcg_parameters() {
        let settings = Settings::new();
        assert!(battery_generator(GeneratorArg::Lcg, 7, Some(5), None, None, &settings).is_err());
        let mut rng =
            battery_generator(GeneratorArg::Lcg, 7, Some(5), Some(16), None, &settings).unwrap();
        assert_eq!(rng.next_f64(), 3.0 / 16.0);
    }
}

//! Postbox letter inspector.
//!
//! Reads a stream of letters from a file or stdin, validates every letter and
//! prints one report per letter, or re-encodes the stream in canonical form.

use anyhow::{bail, Context};
use clap::Parser;
use letter_wire::{Decode, LegacyMessage, Letter, LetterReader, ParamOrder};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use tracing::info;

#[macro_use]
mod logging;
mod config;
mod report;

use config::{InputFormat, OutputFormat, PostboxConfig};
use report::{Inspect, LetterReport};

/// Decode, validate and re-encode letter streams
#[derive(Parser, Debug)]
#[command(name = "postbox", version, about = "Inspect and validate letter streams")]
struct Args {
    /// Input file, stdin when omitted or `-`
    input: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "POSTBOX_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Report format: text, json
    #[arg(long)]
    output: Option<OutputFormat>,

    /// Input framing: letter, legacy
    #[arg(long)]
    format: Option<InputFormat>,

    /// Param order when re-encoding: sorted, arbitrary
    #[arg(long)]
    param_order: Option<ParamOrder>,

    /// Write decoded letters back to stdout in wire form instead of reports
    #[arg(long)]
    reencode: bool,

    /// Fail on the first letter that does not validate, `=false` to disable
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    stop_on_invalid: Option<bool>,
}

impl Args {
    /// Command-line flags take precedence over file and environment
    fn apply_to(&self, config: &mut PostboxConfig) {
        if let Some(output) = self.output {
            config.output = output;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        if let Some(order) = self.param_order {
            config.param_order = order;
        }
        if let Some(stop) = self.stop_on_invalid {
            config.stop_on_invalid = stop;
        }
    }

    fn open_input(&self) -> anyhow::Result<Box<dyn BufRead>> {
        match &self.input {
            Some(path) if path.as_os_str() != "-" => {
                let file = File::open(path)
                    .with_context(|| format!("failed to open input {:?}", path))?;
                Ok(Box::new(BufReader::new(file)))
            }
            _ => Ok(Box::new(io::stdin().lock())),
        }
    }
}

/// Counters for one inspected stream
#[derive(Debug, Default, PartialEq, Eq)]
struct Summary {
    decoded: u64,
    invalid: u64,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logging::init("postbox", &args.log_level)?;

    info!("Starting postbox v{}", env!("CARGO_PKG_VERSION"));

    let mut config = PostboxConfig::load_from_file(&args.config)?;
    args.apply_to(&mut config);

    let input = args.open_input()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let summary = match config.format {
        InputFormat::Letter => inspect(
            LetterReader::<_, Letter>::new(input),
            &config,
            args.reencode,
            &mut out,
        ),
        InputFormat::Legacy => inspect(
            LetterReader::<_, LegacyMessage>::legacy(input),
            &config,
            args.reencode,
            &mut out,
        ),
    }?;
    out.flush()?;

    component_info!(
        "inspect",
        decoded = summary.decoded,
        invalid = summary.invalid,
        "Finished inspecting stream"
    );

    Ok(())
}

/// Decode every value of the stream, report it and optionally re-encode it
fn inspect<R, T, W>(
    reader: LetterReader<R, T>,
    config: &PostboxConfig,
    reencode: bool,
    out: &mut W,
) -> anyhow::Result<Summary>
where
    R: BufRead,
    T: Decode + Inspect,
    W: Write,
{
    let mut summary = Summary::default();

    for item in reader {
        let value = match item {
            Ok(value) => value,
            Err(err) => {
                component_error!(
                    "decode",
                    index = summary.decoded + 1,
                    class = ?err.class(),
                    "Stream desynchronized: {}",
                    err
                );
                return Err(err).with_context(|| {
                    format!("failed to decode letter #{}", summary.decoded + 1)
                });
            }
        };
        summary.decoded += 1;

        let report = LetterReport::new(summary.decoded, &value);
        if !report.is_valid() {
            summary.invalid += 1;
            component_warn!(
                "validate",
                index = report.index,
                kind = %report.kind,
                "Letter failed validation: {}",
                report.errors.join("; ")
            );
            if config.stop_on_invalid {
                bail!(
                    "letter #{} ({}) failed validation: {}",
                    report.index,
                    report.kind,
                    report.errors.join("; ")
                );
            }
        } else {
            component_debug!("validate", index = report.index, kind = %report.kind, "Letter is valid");
        }

        if reencode {
            value.encode(out, config.param_order)?;
        } else {
            writeln!(out, "{}", report.render(config.output)?)?;
        }
    }

    Ok(summary)
}

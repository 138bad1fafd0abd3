// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Parse calibration arguments into parameters, and run a session.


use std::path::{Path, PathBuf};

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::common::{display_warnings, InfoPrinter, Warn, ARG_FILE_HELP};
use crate::{
    cleaning::CleaningParams,
    constants::{DEFAULT_FILTER_PASSES, DEFAULT_OUTLIER_THRESHOLD, MAX_SUBSTITUTE_TSYS},
    doppler::{DopsetProgram, FixedVelocity, VelocityCorrector},
    metadata::{ExperimentLog, FixedTsys, PromptTsys, RejectInvalidTsys, TsysResolver},
    session::{discover_scan_pairs, session_dir, ScanPairFiles, Session, SessionError, SessionParams},
    FscalError, PipelineConfig, SessionResult,
};

lazy_static::lazy_static! {
    static ref FILTER_PASSES_HELP: String =
        format!("The number of outlier-filtering passes over each column. 0 disables cleaning; more than 5 makes little difference. Default: {DEFAULT_FILTER_PASSES}");

    static ref THRESHOLD_HELP: String =
        format!("The modified z-score at or above which a channel is an outlier. Default: {DEFAULT_OUTLIER_THRESHOLD}");

    static ref TSYS_HELP: String =
        format!("Substitute this system temperature for any invalid one in the experiment log. Must be in (0, {MAX_SUBSTITUTE_TSYS}] K. The default is to fail on invalid values");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
struct SessionArgs {
    /// The directory holding `<source>/<iteration>/` scan directories.
    #[clap(short, long, help_heading = "SESSION")]
    data_dir: Option<PathBuf>,

    /// The name of the observed source, e.g. "cepa".
    #[clap(short, long, help_heading = "SESSION")]
    source: Option<String>,

    /// The iteration (session) number.
    #[clap(short, long, help_heading = "SESSION")]
    iteration: Option<String>,

    /// The experiment log of the session (JSON).
    #[clap(short, long, help_heading = "SESSION")]
    log: Option<PathBuf>,

    /// A directory of experiment logs. If --log isn't given, the log is
    /// `<source>_<iteration>log.dat` in this directory.
    #[clap(long, help_heading = "SESSION")]
    logs_dir: Option<PathBuf>,

    /// The pipeline configuration file (TOML).
    #[clap(short, long, help_heading = "SESSION")]
    config: Option<PathBuf>,

    /// The station whose antenna constants are used. The default is the
    /// location in the experiment log's header.
    #[clap(long, help_heading = "SESSION")]
    site: Option<String>,

    /// The sky frequency of relative frequency 0 [MHz]. The default is derived
    /// from the frequency-switching frequencies in the experiment log.
    #[clap(long, help_heading = "SESSION")]
    freq_start: Option<f64>,

    #[clap(long, help = TSYS_HELP.as_str(), help_heading = "SESSION")]
    tsys: Option<f64>,

    /// Ask on the terminal for a substitute for any invalid system
    /// temperature.
    #[clap(long, help_heading = "SESSION")]
    #[serde(default)]
    prompt_tsys: bool,

    /// The directory the result is written to. Default: the current directory.
    #[clap(short, long, help_heading = "OUTPUT FILES")]
    output_dir: Option<PathBuf>,
}

impl SessionArgs {
    fn merge(self, other: Self) -> Self {
        Self {
            data_dir: self.data_dir.or(other.data_dir),
            source: self.source.or(other.source),
            iteration: self.iteration.or(other.iteration),
            log: self.log.or(other.log),
            logs_dir: self.logs_dir.or(other.logs_dir),
            config: self.config.or(other.config),
            site: self.site.or(other.site),
            freq_start: self.freq_start.or(other.freq_start),
            tsys: self.tsys.or(other.tsys),
            prompt_tsys: self.prompt_tsys || other.prompt_tsys,
            output_dir: self.output_dir.or(other.output_dir),
        }
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
struct CleaningArgs {
    #[clap(short, long, help = FILTER_PASSES_HELP.as_str(), help_heading = "CLEANING")]
    filter_passes: Option<usize>,

    #[clap(short, long, help = THRESHOLD_HELP.as_str(), help_heading = "CLEANING")]
    threshold: Option<f64>,

    /// The rolling-mean window used to replace outliers [channels]. The
    /// default comes from the configuration file.
    #[clap(long, help_heading = "CLEANING")]
    smoothing_window: Option<usize>,
}

impl CleaningArgs {
    fn merge(self, other: Self) -> Self {
        Self {
            filter_passes: self.filter_passes.or(other.filter_passes),
            threshold: self.threshold.or(other.threshold),
            smoothing_window: self.smoothing_window.or(other.smoothing_window),
        }
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
struct VelocityArgs {
    /// Use this receiver velocity for every pair instead of running an
    /// ephemeris program [km/s].
    #[clap(long, allow_hyphen_values = true, help_heading = "VELOCITY CORRECTION")]
    receiver_velocity: Option<f64>,

    /// The `dopset` ephemeris program to get each pair's receiver velocity
    /// from.
    #[clap(long, help_heading = "VELOCITY CORRECTION")]
    dopset: Option<PathBuf>,

    /// The directory `dopset` is run in. Default: the current directory.
    #[clap(long, help_heading = "VELOCITY CORRECTION")]
    dopset_dir: Option<PathBuf>,
}

impl VelocityArgs {
    fn merge(self, other: Self) -> Self {
        Self {
            receiver_velocity: self.receiver_velocity.or(other.receiver_velocity),
            dopset: self.dopset.or(other.dopset),
            dopset_dir: self.dopset_dir.or(other.dopset_dir),
        }
    }
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct CalibrateArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    args_file: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(rename = "session")]
    #[serde(default)]
    session_args: SessionArgs,

    #[clap(flatten)]
    #[serde(rename = "cleaning")]
    #[serde(default)]
    cleaning_args: CleaningArgs,

    #[clap(flatten)]
    #[serde(rename = "velocity")]
    #[serde(default)]
    velocity_args: VelocityArgs,
}

/// Everything needed to run a session.
struct CalibrateParams {
    session_params: SessionParams,
    log: ExperimentLog,
    pairs: Vec<ScanPairFiles>,
    tsys_resolver: Box<dyn TsysResolver>,
    velocity_corrector: Box<dyn VelocityCorrector>,
    output_dir: PathBuf,
}

impl CalibrateArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    ///
    /// This function should only ever merge arguments, and not try to make
    /// sense of them.
    pub(super) fn merge(self) -> Result<CalibrateArgs, FscalError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let CalibrateArgs {
                args_file: _,
                session_args,
                cleaning_args,
                velocity_args,
            } = unpack_arg_file!(arg_file);

            Ok(CalibrateArgs {
                args_file: None,
                session_args: cli_args.session_args.merge(session_args),
                cleaning_args: cli_args.cleaning_args.merge(cleaning_args),
                velocity_args: cli_args.velocity_args.merge(velocity_args),
            })
        } else {
            Ok(cli_args)
        }
    }

    /// Parse the arguments into parameters ready for calibration.
    fn parse(self) -> Result<CalibrateParams, FscalError> {
        debug!("{:#?}", self);

        let CalibrateArgs {
            args_file: _,
            session_args,
            cleaning_args,
            velocity_args,
        } = self;
        let SessionArgs {
            data_dir,
            source,
            iteration,
            log,
            logs_dir,
            config,
            site,
            freq_start,
            tsys,
            prompt_tsys,
            output_dir,
        } = session_args;

        let data_dir = data_dir.ok_or(CalibrateArgsError::NoDataDir)?;
        let source = source.ok_or(CalibrateArgsError::NoSource)?;
        let iteration = iteration.ok_or(CalibrateArgsError::NoIteration)?;
        let log_file = match (log, logs_dir) {
            (Some(log), _) => log,
            (None, Some(dir)) => dir.join(format!("{source}_{iteration}log.dat")),
            (None, None) => return Err(CalibrateArgsError::NoLog.into()),
        };
        let config_file = config.ok_or(CalibrateArgsError::NoConfig)?;

        let config = PipelineConfig::from_file(&config_file)?;
        let log = ExperimentLog::from_file(&log_file)?;

        let mut printer = InfoPrinter::new(format!("Calibrating {source} iteration {iteration}").into());

        let dir = session_dir(&data_dir, &source, &iteration);
        if !dir.is_dir() {
            return Err(CalibrateArgsError::SessionDirMissing(dir.display().to_string()).into());
        }
        let pairs = discover_scan_pairs(&dir)?;
        if pairs.is_empty() {
            return Err(SessionError::NoPairs.into());
        }
        printer.push_block(vec![
            format!("Scans: {}", dir.display()).into(),
            format!("{} scan pairs", pairs.len()).into(),
        ]);

        let site_name = site.unwrap_or_else(|| log.header.location.clone());
        let site = config.site(&site_name)?.clone();
        printer.push_block(vec![
            format!("Experiment log: {}", log_file.display()).into(),
            format!("{} at {}", log.header.dates, log.header.location).into(),
            format!("Antenna constants of {site_name}").into(),
        ]);

        let frequency_start_mhz = match freq_start {
            Some(f) => f,
            None => log.frequency_start_mhz()?,
        };
        let rest_frequencies = config.rest_frequency_table()?;
        printer.push_block(vec![
            format!("Relative frequency 0 is {frequency_start_mhz} MHz").into(),
            format!(
                "{} candidate transitions: {}",
                rest_frequencies.num_transitions(),
                rest_frequencies
                    .iter()
                    .map(|t| t.label.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )
            .into(),
        ]);

        let cuts = config.cuts(&source).to_vec();
        if cuts.is_empty() {
            format!("No SNR exclusion windows for {source}; SNRs use the whole spectrum").warn();
        } else {
            trace!("SNR exclusion windows: {cuts:?}");
        }

        let cleaning = CleaningParams {
            filter_passes: cleaning_args.filter_passes.unwrap_or(DEFAULT_FILTER_PASSES),
            threshold: cleaning_args.threshold.unwrap_or(DEFAULT_OUTLIER_THRESHOLD),
            smoothing_window: cleaning_args
                .smoothing_window
                .unwrap_or(config.cleaning.smoothing_window),
        };
        cleaning.validate()?;
        if cleaning.filter_passes == 0 {
            printer.push_line("Not cleaning outliers".into());
        } else {
            printer.push_line(
                format!(
                    "Cleaning with {} passes, threshold {}, window {}",
                    cleaning.filter_passes, cleaning.threshold, cleaning.smoothing_window
                )
                .into(),
            );
        }

        let tsys_resolver: Box<dyn TsysResolver> = match (tsys, prompt_tsys) {
            (Some(_), true) => return Err(CalibrateArgsError::ConflictingTsys.into()),
            (Some(t), false) => {
                printer.push_line(format!("Invalid system temperatures become {t} K").into());
                Box::new(FixedTsys(t))
            }
            (None, true) => Box::new(PromptTsys),
            (None, false) => Box::new(RejectInvalidTsys),
        };

        let VelocityArgs {
            receiver_velocity,
            dopset,
            dopset_dir,
        } = velocity_args;
        let velocity_corrector: Box<dyn VelocityCorrector> = match (receiver_velocity, dopset) {
            (Some(_), Some(_)) => return Err(CalibrateArgsError::ConflictingVelocity.into()),
            (Some(v), None) => {
                printer.push_line(format!("Receiver velocity: {v} km/s").into());
                Box::new(FixedVelocity(v))
            }
            (None, Some(program)) => {
                let working_dir = dopset_dir.unwrap_or_else(|| PathBuf::from("."));
                printer.push_line(
                    format!(
                        "Receiver velocities from {} (in {})",
                        program.display(),
                        working_dir.display()
                    )
                    .into(),
                );
                Box::new(DopsetProgram::new(program, working_dir)?)
            }
            (None, None) => {
                "No velocity correction was specified; velocities are not corrected".warn();
                Box::new(FixedVelocity(0.0))
            }
        };

        let output_dir = output_dir.unwrap_or_else(|| PathBuf::from("."));
        printer.push_line(format!("Writing the result to {}", output_dir.display()).into());

        printer.display();
        display_warnings();

        Ok(CalibrateParams {
            session_params: SessionParams {
                source,
                iteration,
                cleaning,
                site,
                cuts,
                rest_frequencies,
                frequency_start_mhz,
            },
            log,
            pairs,
            tsys_resolver,
            velocity_corrector,
            output_dir,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<Option<SessionResult>, FscalError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let CalibrateParams {
            session_params,
            log,
            pairs,
            tsys_resolver,
            velocity_corrector,
            output_dir,
        } = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(None);
        }

        let mut session = Session::new(
            session_params,
            log,
            pairs,
            tsys_resolver,
            velocity_corrector,
        )?;
        session.process_remaining()?;
        display_pair_summary(&session);

        let result = session.finalize()?;
        info!(
            "Averaged {} pairs of {} channels; species {}",
            session.num_pairs(),
            result.num_channels(),
            result.species
        );
        let key = session.result_key()?;
        std::fs::create_dir_all(&output_dir)?;
        result.persist(&output_dir, &key)?;
        display_warnings();

        Ok(Some(result))
    }
}

fn display_pair_summary(session: &Session) {
    let acc = session.accumulator();
    let mut printer = InfoPrinter::new("Pairs".into());
    for (i, pair) in acc.pairs().iter().enumerate() {
        let Some(snr) = acc.snr(i) else {
            continue;
        };
        let mut block = vec![format!(
            "Pair {} (scans {} and {}): SNR u1 {:.2}, u9 {:.2}, average {:.2}",
            pair.index, pair.signal_scan, pair.reference_scan, snr.u1, snr.u9, snr.average
        )
        .into()];
        if pair.num_bad_points > 0 {
            block.push(format!("{} channels remain flagged as outliers", pair.num_bad_points).into());
        }
        printer.push_block(block);
    }
    printer.display();
}

/// Write the arguments as TOML, to be used as an arguments file later.
pub(super) fn save_toml(args: &CalibrateArgs, file: &Path) -> Result<(), FscalError> {
    let toml_str = toml::to_string(args)
        .map_err(|e| FscalError::Generic(format!("Couldn't serialise the arguments: {e}")))?;
    std::fs::write(file, toml_str)?;
    info!("Arguments saved to {}", file.display());
    Ok(())
}

/// Errors associated with calibrate arguments.
#[derive(thiserror::Error, Debug)]
pub(super) enum CalibrateArgsError {
    #[error("No data directory was specified")]
    NoDataDir,

    #[error("No source was specified")]
    NoSource,

    #[error("No iteration was specified")]
    NoIteration,

    #[error("No experiment log was specified; use --log or --logs-dir")]
    NoLog,

    #[error("No pipeline configuration file was specified")]
    NoConfig,

    #[error("The session directory '{0}' doesn't exist")]
    SessionDirMissing(String),

    #[error("--tsys and --prompt-tsys can't be used together")]
    ConflictingTsys,

    #[error("--receiver-velocity and --dopset can't be used together")]
    ConflictingVelocity,
}

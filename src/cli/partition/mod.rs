// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.


use std::path::PathBuf;

use clap::Parser;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::common::{display_warnings, InfoPrinter, Warn, ARG_FILE_HELP};
use crate::{
    constants::DEFAULT_NUM_W_PLANES,
    engine::WPlaneScheme,
    io::{MemoryVisStore, VisDataStore, VisReadError},
    params::{ImagingOptions, ImagingOptionsError, PartitionParams},
    GyimagerError,
};

lazy_static::lazy_static! {
    static ref NUM_W_PLANES_HELP: String =
        format!("The number of W-planes, spaced evenly in sqrt(|w|) between 0 and the maximum w. Default: {DEFAULT_NUM_W_PLANES}");
}

#[derive(Parser, Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct PartitionArgs {
    #[clap(name = "ARGUMENTS_FILE", help = ARG_FILE_HELP.as_str(), parse(from_os_str))]
    pub(super) args_file: Option<PathBuf>,

    /// Path to the input visibilities (JSON).
    #[clap(short, long, parse(from_os_str), help_heading = "INPUT DATA")]
    pub(super) data: Option<PathBuf>,

    #[clap(flatten)]
    #[serde(default)]
    pub(super) imaging: ImagingOptions,

    #[clap(long, help = NUM_W_PLANES_HELP.as_str(), help_heading = "W-PLANES")]
    pub(super) num_w_planes: Option<u32>,

    /// Ignore W-planes entirely and only split rows by baseline and time.
    #[clap(long, help_heading = "W-PLANES")]
    #[serde(default)]
    pub(super) no_w_planes: bool,

    /// Write the spans out to this JSON file.
    #[clap(short, long, parse(from_os_str), help_heading = "OUTPUT FILES")]
    pub(super) output: Option<PathBuf>,
}

impl PartitionArgs {
    /// Both command-line and file arguments overlap in terms of what is
    /// available; this function consolidates everything that was specified into
    /// a single struct. Where applicable, it will prefer CLI parameters over
    /// those in the file.
    pub(super) fn merge(self) -> Result<PartitionArgs, GyimagerError> {
        debug!("Merging command-line arguments with the argument file");

        let cli_args = self;

        if let Some(arg_file) = cli_args.args_file {
            let PartitionArgs {
                args_file: _,
                data,
                imaging,
                num_w_planes,
                no_w_planes,
                output,
            } = unpack_arg_file!(arg_file);

            Ok(PartitionArgs {
                args_file: None,
                data: cli_args.data.or(data),
                imaging: cli_args.imaging.merge(imaging),
                num_w_planes: cli_args.num_w_planes.or(num_w_planes),
                no_w_planes: cli_args.no_w_planes || no_w_planes,
                output: cli_args.output.or(output),
            })
        } else {
            Ok(cli_args)
        }
    }

    fn parse(self) -> Result<PartitionParams, PartitionArgsError> {
        debug!("{:#?}", self);

        let Self {
            args_file: _,
            data,
            imaging,
            num_w_planes,
            no_w_planes,
            output,
        } = self;

        let data = data.ok_or(PartitionArgsError::NoData)?;
        let imaging = imaging.parse()?;
        if imaging.oversample % 2 == 0 {
            format!(
                "Oversampling factor {} is even; {} will be used",
                imaging.oversample,
                imaging.oversample + 1
            )
            .warn();
        }

        let scheme = if no_w_planes {
            if num_w_planes.is_some() {
                "--num-w-planes has no effect when W-planes are ignored".warn();
            }
            None
        } else {
            let num_planes = num_w_planes.unwrap_or(DEFAULT_NUM_W_PLANES);
            if num_planes == 0 {
                return Err(PartitionArgsError::NumWPlanesZero);
            }
            Some(WPlaneScheme::new(imaging.w_max, num_planes))
        };

        let store = MemoryVisStore::from_json_file(&data)?;

        let mut printer = InfoPrinter::new("Partitioning visibilities".into());
        printer.push_block(vec![
            format!("Input: {}", data.display()).into(),
            format!(
                "{} rows, {} channels, reference frequency {:.3} MHz",
                store.num_rows(),
                store.spectral_window().channel_frequencies.len(),
                store.spectral_window().reference_frequency / 1e6
            )
            .into(),
        ]);
        printer.push_block(vec![
            format!(
                "uv range: ({}, {}) kλ, |w| < {} m",
                imaging.uv_min, imaging.uv_max, imaging.w_max
            )
            .into(),
            format!("Time window: {} s", imaging.time_window).into(),
        ]);
        match scheme {
            Some(scheme) => printer.push_line(format!("{} W-planes", scheme.num_planes).into()),
            None => printer.push_line("W-planes ignored".into()),
        }
        if let Some(output) = &output {
            printer.push_line(format!("Output: {}", output.display()).into());
        }
        printer.display();

        display_warnings();

        Ok(PartitionParams {
            store,
            imaging,
            scheme,
            output,
        })
    }

    pub(super) fn run(self, dry_run: bool) -> Result<(), GyimagerError> {
        debug!("Converting arguments into parameters");
        trace!("{:#?}", self);
        let params = self.parse()?;

        if dry_run {
            info!("Dry run -- exiting now.");
            return Ok(());
        }

        params.run()?;
        Ok(())
    }
}

#[derive(Error, Debug)]
pub(super) enum PartitionArgsError {
    #[error("No input visibilities were specified")]
    NoData,

    #[error("The number of W-planes must be at least 1")]
    NumWPlanesZero,

    #[error(transparent)]
    ImagingOptions(#[from] ImagingOptionsError),

    #[error(transparent)]
    VisRead(#[from] VisReadError),
}

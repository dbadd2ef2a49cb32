// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

use log::{debug, info};
use serde::Serialize;
use thiserror::Error;

use super::ImagingParams;
use crate::{
    engine::WPlaneScheme,
    io::{MemoryVisStore, VisDataStore, VisReadError},
    partition::{
        partition_by_time, partition_columns, sort_keys, Partition, PartitionError as SplitError,
        Span, VisFilter,
    },
};

/// Everything needed to split a set of visibilities into spans.
pub(crate) struct PartitionParams {
    pub(crate) store: MemoryVisStore,
    pub(crate) imaging: ImagingParams,
    /// If this is `None`, W-planes are ignored.
    pub(crate) scheme: Option<WPlaneScheme>,
    pub(crate) output: Option<PathBuf>,
}

/// What gets written out when the user asks for the partition to be saved.
#[derive(Serialize)]
#[serde(untagged)]
enum PartitionOutput {
    WPlanes(Partition),
    Time(Vec<Span>),
}

impl PartitionParams {
    pub(crate) fn run(&self) -> Result<(), PartitionError> {
        let Self {
            store,
            imaging,
            scheme,
            output,
        } = self;

        let columns = store.read_columns()?;
        let filter = VisFilter::new(
            imaging.w_max,
            imaging.uv_min,
            imaging.uv_max,
            store.spectral_window().reference_frequency,
        )?;

        let result = match scheme {
            Some(scheme) => {
                let ws: Vec<f64> = columns.uvw.iter().map(|uvw| uvw.w).collect();
                let w_index = scheme.indices(&ws);
                let partition =
                    partition_columns(&filter, &columns, &w_index, imaging.time_window)?;

                info!(
                    "{} of {} rows are in {} spans over {} W-planes",
                    partition.num_rows(),
                    columns.num_rows(),
                    partition.num_spans(),
                    partition.buckets.iter().filter(|b| !b.is_empty()).count(),
                );
                for bucket in partition.buckets.iter().filter(|b| !b.is_empty()) {
                    debug!(
                        "W-plane {:4} (w ~ {:.2} m): {} spans, {} rows",
                        bucket.w_index,
                        scheme.w_of_plane(bucket.w_index),
                        bucket.spans.len(),
                        bucket.num_rows()
                    );
                }
                PartitionOutput::WPlanes(partition)
            }

            None => {
                let w_index = vec![0; columns.num_rows()];
                let keys = sort_keys(
                    &filter,
                    &columns.antenna1,
                    &columns.antenna2,
                    &columns.uvw,
                    &w_index,
                )?;
                let spans: Vec<Span> =
                    partition_by_time(&keys, &columns.time_centroid, imaging.time_window)?
                        .into_iter()
                        .filter(|s| !s.is_empty())
                        .collect();
                info!(
                    "{} of {} rows are in {} spans",
                    spans.iter().map(Span::len).sum::<usize>(),
                    columns.num_rows(),
                    spans.len(),
                );
                PartitionOutput::Time(spans)
            }
        };

        if let Some(output) = output {
            let mut f = BufWriter::new(File::create(output)?);
            serde_json::to_writer_pretty(&mut f, &result)?;
            f.flush()?;
            info!("Wrote spans to {}", output.display());
        }

        Ok(())
    }
}

#[derive(Error, Debug)]
pub(crate) enum PartitionError {
    #[error(transparent)]
    VisRead(#[from] VisReadError),

    #[error(transparent)]
    Split(#[from] SplitError),

    #[error("Couldn't serialise the spans: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),
}

// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Splitting visibility rows into independently degriddable spans.
//!
//! Rows that pass a [`VisFilter`] are stably sorted by W-plane index, then
//! baseline. A single pass over the sorted rows then cuts them into spans
//! (same baseline, same W-plane, within a time window of the span's first row)
//! and groups consecutive spans of the same W-plane into buckets.

mod error;

pub use error::PartitionError;

use log::debug;
use marlu::{constants::VEL_C, UVW};
use serde::Serialize;
use vec1::{vec1, Vec1};

use crate::io::VisColumns;

/// Decides which rows take part in degridding.
#[derive(Debug, Clone, Copy)]
pub struct VisFilter {
    /// \[metres\]
    w_max: f64,
    /// \[kilolambda\]
    uv_min: f64,
    /// \[kilolambda\]
    uv_max: f64,
    /// \[metres\]
    reference_wavelength: f64,
}

impl VisFilter {
    /// `uv_min` and `uv_max` are in kilolambda at `reference_frequency` \[Hz\].
    pub fn new(
        w_max: f64,
        uv_min: f64,
        uv_max: f64,
        reference_frequency: f64,
    ) -> Result<VisFilter, PartitionError> {
        if !reference_frequency.is_finite() || reference_frequency <= 0.0 {
            return Err(PartitionError::InvalidReferenceFrequency(
                reference_frequency,
            ));
        }
        Ok(VisFilter {
            w_max,
            uv_min,
            uv_max,
            reference_wavelength: VEL_C / reference_frequency,
        })
    }

    /// The length of the projected (u, v) baseline \[kilolambda\]. w is
    /// ignored.
    pub fn uv_distance(&self, uvw: UVW) -> f64 {
        uvw.u.hypot(uvw.v) / (1e3 * self.reference_wavelength)
    }

    /// All bounds are exclusive.
    pub fn includes(&self, uvw: UVW) -> bool {
        if uvw.w.abs() >= self.w_max {
            return false;
        }
        let uv_distance = self.uv_distance(uvw);
        self.uv_min < uv_distance && uv_distance < self.uv_max
    }
}

/// The ordering of rows prior to partitioning. The W-plane index is the
/// primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey {
    pub w_index: i32,
    pub antenna1: i32,
    pub antenna2: i32,
}

impl SortKey {
    fn baseline(&self) -> (i32, i32) {
        (self.antenna1, self.antenna2)
    }
}

/// Get the sort key of every row, or `None` if the row is excluded by the
/// filter.
pub fn sort_keys(
    filter: &VisFilter,
    antenna1: &[i32],
    antenna2: &[i32],
    uvw: &[UVW],
    w_index: &[i32],
) -> Result<Vec<Option<SortKey>>, PartitionError> {
    let expected = uvw.len();
    for (column, got) in [("ANTENNA1", antenna1.len()), ("ANTENNA2", antenna2.len())] {
        if got != expected {
            return Err(PartitionError::ColumnLengthMismatch {
                column,
                expected,
                got,
            });
        }
    }
    if w_index.len() != expected {
        return Err(PartitionError::WIndexCountMismatch {
            expected,
            got: w_index.len(),
        });
    }

    Ok(uvw
        .iter()
        .zip(antenna1)
        .zip(antenna2)
        .zip(w_index)
        .map(|(((&uvw, &antenna1), &antenna2), &w_index)| {
            filter.includes(uvw).then_some(SortKey {
                w_index,
                antenna1,
                antenna2,
            })
        })
        .collect())
}

/// Row indices sharing a baseline and W-plane, close together in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Span {
    rows: Vec<usize>,
}

impl Span {
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The first and last rows of the span, if it has any.
    pub fn ends(&self) -> Option<(usize, usize)> {
        Some((*self.rows.first()?, *self.rows.last()?))
    }
}

/// The spans of a single W-plane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WPlaneBucket {
    pub w_index: i32,
    pub spans: Vec<Span>,
}

impl WPlaneBucket {
    /// Is there nothing to degrid in this bucket?
    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(Span::is_empty)
    }

    pub fn num_rows(&self) -> usize {
        self.spans.iter().map(Span::len).sum()
    }
}

/// The result of partitioning. There is always at least one bucket; if no rows
/// were included, there is exactly one bucket holding one empty span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub buckets: Vec1<WPlaneBucket>,
}

impl Partition {
    pub fn num_spans(&self) -> usize {
        self.buckets
            .iter()
            .map(|b| b.spans.iter().filter(|s| !s.is_empty()).count())
            .sum()
    }

    pub fn num_rows(&self) -> usize {
        self.buckets.iter().map(WPlaneBucket::num_rows).sum()
    }

    /// All spans in partition order.
    pub fn spans(&self) -> impl Iterator<Item = &Span> {
        self.buckets.iter().flat_map(|b| b.spans.iter())
    }
}

/// Partition rows given their sort keys (`None` for excluded rows) and times
/// \[seconds\]. A new span starts whenever the baseline or W-plane changes, or
/// a row's time is beyond the time window of the span's first row. A new
/// bucket starts whenever the W-plane changes; the in-flight span is closed
/// first. Included rows must have finite times.
pub fn partition_rows(
    keys: &[Option<SortKey>],
    time: &[f64],
    time_window: f64,
) -> Result<Partition, PartitionError> {
    if !time_window.is_finite() || time_window < 0.0 {
        return Err(PartitionError::InvalidTimeWindow(time_window));
    }
    if time.len() != keys.len() {
        return Err(PartitionError::ColumnLengthMismatch {
            column: "TIME",
            expected: keys.len(),
            got: time.len(),
        });
    }

    let mut sorted: Vec<(SortKey, usize)> = keys
        .iter()
        .enumerate()
        .filter_map(|(row, key)| key.map(|key| (key, row)))
        .collect();
    if let Some(&(_, row)) = sorted.iter().find(|&&(_, row)| !time[row].is_finite()) {
        return Err(PartitionError::InvalidTime {
            row,
            time: time[row],
        });
    }
    // Must be stable; ties keep their original row order.
    sorted.sort_by_key(|&(key, _)| key);

    let mut sorted = sorted.into_iter();
    let (mut active, first_row) = match sorted.next() {
        Some(first) => first,
        None => {
            return Ok(Partition {
                buckets: vec1![WPlaneBucket {
                    w_index: 0,
                    spans: vec![Span::default()],
                }],
            })
        }
    };
    let mut expiry = time[first_row] + time_window;
    let mut buckets = vec![];
    let mut spans = vec![];
    let mut span = vec![first_row];

    for (key, row) in sorted {
        let new_w_plane = key.w_index != active.w_index;
        if time[row] > expiry || key.baseline() != active.baseline() || new_w_plane {
            spans.push(Span {
                rows: std::mem::take(&mut span),
            });
            expiry = time[row] + time_window;
        }
        if new_w_plane {
            buckets.push(WPlaneBucket {
                w_index: active.w_index,
                spans: std::mem::take(&mut spans),
            });
        }
        active = key;
        span.push(row);
    }
    spans.push(Span { rows: span });

    Ok(Partition {
        buckets: Vec1::from_vec_push(
            buckets,
            WPlaneBucket {
                w_index: active.w_index,
                spans,
            },
        ),
    })
}

/// Partition rows by baseline and time alone, ignoring W-planes.
pub fn partition_by_time(
    keys: &[Option<SortKey>],
    time: &[f64],
    time_window: f64,
) -> Result<Vec<Span>, PartitionError> {
    let keys: Vec<Option<SortKey>> = keys
        .iter()
        .map(|key| key.map(|key| SortKey { w_index: 0, ..key }))
        .collect();
    let partition = partition_rows(&keys, time, time_window)?;
    Ok(partition
        .buckets
        .into_iter()
        .flat_map(|bucket| bucket.spans)
        .collect())
}

/// Filter and partition the rows of `columns`, using their time centroids.
pub fn partition_columns(
    filter: &VisFilter,
    columns: &VisColumns,
    w_index: &[i32],
    time_window: f64,
) -> Result<Partition, PartitionError> {
    let keys = sort_keys(
        filter,
        &columns.antenna1,
        &columns.antenna2,
        &columns.uvw,
        w_index,
    )?;
    let partition = partition_rows(&keys, &columns.time_centroid, time_window)?;
    debug!(
        "Partitioned {} of {} rows into {} spans over {} W-planes",
        partition.num_rows(),
        columns.num_rows(),
        partition.num_spans(),
        partition.buckets.iter().filter(|b| !b.is_empty()).count()
    );
    Ok(partition)
}

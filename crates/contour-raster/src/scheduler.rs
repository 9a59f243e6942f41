//! Dynamic column scheduler.
//!
//! One output column is the unit of work. Worker `i` starts on column
//! `i * (size / workers)`. When a worker returns a column, the coordinator
//! hands it the next unclaimed column after the one it just finished, or
//! failing that the first unclaimed column anywhere. Each column is claimed
//! exactly once.
//!
//! Only the coordinator touches the claim table and the output buffer.
//! Workers compute into their own column vector and send it back over a
//! channel; the coordinator scatters it into the row-major buffer. A panic
//! while computing one column fills that column with the fallback value and
//! leaves every other column untouched.

use contour_common::{ContourError, ContourResult};
use crossbeam_channel::{bounded, unbounded, Sender};
use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// Column a worker claims before any rebalancing.
#[inline]
pub fn initial_column(worker: usize, size: usize, workers: usize) -> usize {
    worker * (size / workers.max(1))
}

/// Column to hand a worker that just finished `finished`: the first unclaimed
/// column after it, else the first unclaimed column overall.
pub fn next_column(claimed: &[bool], finished: usize) -> Option<usize> {
    let after = finished.saturating_add(1).min(claimed.len());
    claimed[after..]
        .iter()
        .position(|c| !c)
        .map(|offset| after + offset)
        .or_else(|| claimed.iter().position(|c| !c))
}

/// Summary of one scheduled pass.
#[derive(Debug, Clone, Default)]
pub struct PassReport {
    pub columns: usize,
    pub workers: usize,
    /// Columns filled with the fallback value, in completion order.
    pub failed_columns: Vec<usize>,
    pub elapsed: Duration,
}

struct ColumnDone<T> {
    worker: usize,
    column: usize,
    values: Vec<T>,
    ok: bool,
}

/// Fixed-size worker pool that fills a `size x size` buffer column by column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnScheduler {
    workers: usize,
}

impl ColumnScheduler {
    /// A zero worker count is treated as one.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Fill `buffer` (row-major, `buffer[col + row * size]`) by calling
    /// `compute(column, out)` once per column, where `out[row]` receives the
    /// value for `(column, row)`.
    ///
    /// Returns once every column has been written.
    pub fn run<T, F>(
        &self,
        size: usize,
        buffer: &mut [T],
        fallback: T,
        compute: F,
    ) -> ContourResult<PassReport>
    where
        T: Clone + Send,
        F: Fn(usize, &mut [T]) + Sync,
    {
        let expected = size * size;
        if buffer.len() != expected {
            return Err(ContourError::BufferSize {
                expected,
                actual: buffer.len(),
            });
        }

        let start = Instant::now();
        let workers = self.workers.min(size).max(1);
        let mut report = PassReport {
            columns: size,
            workers,
            ..Default::default()
        };
        if size == 0 {
            return Ok(report);
        }

        debug!(columns = size, workers, "Starting column pass");

        let mut claimed = vec![false; size];
        let mut written = vec![false; size];
        let compute = &compute;

        std::thread::scope(|scope| {
            let (result_tx, result_rx) = unbounded::<ColumnDone<T>>();
            let mut job_txs: Vec<Sender<usize>> = Vec::with_capacity(workers);

            for worker in 0..workers {
                let (job_tx, job_rx) = bounded::<usize>(1);
                job_txs.push(job_tx);
                let result_tx = result_tx.clone();
                let fallback = fallback.clone();

                scope.spawn(move || {
                    for column in job_rx.iter() {
                        let mut values = vec![fallback.clone(); size];
                        let ok = panic::catch_unwind(AssertUnwindSafe(|| {
                            compute(column, &mut values)
                        }))
                        .is_ok();
                        if !ok {
                            values.fill(fallback.clone());
                        }

                        let done = ColumnDone {
                            worker,
                            column,
                            values,
                            ok,
                        };
                        if result_tx.send(done).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(result_tx);

            let mut in_flight = 0usize;
            for (worker, job_tx) in job_txs.iter().enumerate() {
                let column = initial_column(worker, size, workers);
                claimed[column] = true;
                if job_tx.send(column).is_ok() {
                    in_flight += 1;
                }
            }

            while in_flight > 0 {
                let Ok(done) = result_rx.recv() else {
                    break;
                };
                in_flight -= 1;

                for (row, value) in done.values.into_iter().enumerate().take(size) {
                    buffer[done.column + row * size] = value;
                }
                written[done.column] = true;

                if done.ok {
                    trace!(worker = done.worker, column = done.column, "Column complete");
                } else {
                    warn!(worker = done.worker, column = done.column, "Column failed, using fallback");
                    report.failed_columns.push(done.column);
                }

                if let Some(next) = next_column(&claimed, done.column) {
                    claimed[next] = true;
                    if job_txs[done.worker].send(next).is_ok() {
                        in_flight += 1;
                    }
                }
            }

            // Closing the job channels lets the workers exit before the scope joins.
            drop(job_txs);
        });

        for column in (0..size).filter(|c| !written[*c]) {
            warn!(column, "Column never completed, using fallback");
            for row in 0..size {
                buffer[column + row * size] = fallback.clone();
            }
            report.failed_columns.push(column);
        }

        report.elapsed = start.elapsed();
        debug!(
            columns = size,
            workers,
            failed = report.failed_columns.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "Column pass finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_columns_spread_evenly() {
        let columns: Vec<_> = (0..4).map(|w| initial_column(w, 100, 4)).collect();
        assert_eq!(columns, vec![0, 25, 50, 75]);
    }

    #[test]
    fn test_next_column_prefers_following() {
        let mut claimed = vec![false; 10];
        claimed[0] = true;
        claimed[4] = true;
        claimed[5] = true;
        assert_eq!(next_column(&claimed, 4), Some(6));
    }

    #[test]
    fn test_next_column_wraps_to_first_unclaimed() {
        let mut claimed = vec![true; 10];
        claimed[2] = false;
        assert_eq!(next_column(&claimed, 9), Some(2));
        assert_eq!(next_column(&claimed, 7), Some(2));
    }

    #[test]
    fn test_next_column_exhausted() {
        assert_eq!(next_column(&[true; 5], 3), None);
    }

    #[test]
    fn test_run_writes_row_major() {
        let size = 16;
        let mut buffer = vec![0usize; size * size];
        let report = ColumnScheduler::new(3)
            .run(size, &mut buffer, usize::MAX, |column, out| {
                for (row, value) in out.iter_mut().enumerate() {
                    *value = column * 1000 + row;
                }
            })
            .unwrap();

        assert_eq!(report.columns, size);
        assert!(report.failed_columns.is_empty());
        for row in 0..size {
            for col in 0..size {
                assert_eq!(buffer[col + row * size], col * 1000 + row);
            }
        }
    }

    #[test]
    fn test_more_workers_than_columns() {
        let size = 3;
        let mut buffer = vec![0u32; size * size];
        let report = ColumnScheduler::new(8)
            .run(size, &mut buffer, 0, |_, out| out.fill(7))
            .unwrap();
        assert_eq!(report.workers, 3);
        assert!(buffer.iter().all(|v| *v == 7));
    }

    #[test]
    fn test_panicking_column_uses_fallback() {
        let size = 8;
        let mut buffer = vec![0.0f64; size * size];
        let report = ColumnScheduler::new(2)
            .run(size, &mut buffer, -1.0, |column, out| {
                if column == 5 {
                    panic!("bad column");
                }
                out.fill(column as f64);
            })
            .unwrap();

        assert_eq!(report.failed_columns, vec![5]);
        for row in 0..size {
            assert_eq!(buffer[5 + row * size], -1.0);
            assert_eq!(buffer[4 + row * size], 4.0);
            assert_eq!(buffer[6 + row * size], 6.0);
        }
    }

    #[test]
    fn test_buffer_length_checked() {
        let mut buffer = vec![0u8; 10];
        let err = ColumnScheduler::new(1)
            .run(4, &mut buffer, 0, |_, _| {})
            .unwrap_err();
        assert!(matches!(
            err,
            ContourError::BufferSize {
                expected: 16,
                actual: 10
            }
        ));
    }
}

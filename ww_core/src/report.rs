//! Read-only reports over the measurement sequence.
//!
//! Both reports expect measurements ordered by date (then id), which is the
//! order the store yields them in, and both consume their input lazily.

use crate::{Error, HistoryPoint, Measurement, Result, Summary};
use chrono::{Duration, NaiveDate};
use std::collections::VecDeque;

/// Mean weight over the last `days` calendar days up to the latest date
///
/// The window is `latest - (days - 1) ..= latest`. Every measurement inside
/// it counts on its own, so a day with two entries weighs twice. Returns
/// `None` when there is nothing to average.
pub fn summary<I>(measurements: I, days: u32) -> Result<Option<Summary>>
where
    I: IntoIterator<Item = Measurement>,
{
    if days == 0 {
        return Err(Error::InvalidWindow(0));
    }
    let span = Duration::days(i64::from(days) - 1);

    // Only the trailing window of the latest date seen so far is kept
    let mut window: VecDeque<(NaiveDate, f64)> = VecDeque::new();
    for measurement in measurements {
        let from = window_start(measurement.date, span);
        while window.front().is_some_and(|(date, _)| *date < from) {
            window.pop_front();
        }
        window.push_back((measurement.date, measurement.weight));
    }

    let Some(&(to, _)) = window.back() else {
        return Ok(None);
    };
    let total: f64 = window.iter().map(|(_, weight)| weight).sum();

    Ok(Some(Summary {
        average: total / window.len() as f64,
        count: window.len(),
        from: window_start(to, span),
        to,
    }))
}

fn window_start(latest: NaiveDate, span: Duration) -> NaiveDate {
    latest.checked_sub_signed(span).unwrap_or(NaiveDate::MIN)
}

/// Simple moving average over the last `periods` measurements by position
///
/// The first `periods - 1` points average over however many measurements
/// precede them. Cloning the adapter restarts it when the source iterator
/// can be cloned.
#[derive(Clone, Debug)]
pub struct MovingAverage<I> {
    inner: I,
    periods: usize,
    window: VecDeque<f64>,
}

impl<I> MovingAverage<I> {
    fn new(inner: I, periods: usize) -> Self {
        Self {
            inner,
            periods,
            // Grows with the series, never sized by `periods` up front
            window: VecDeque::new(),
        }
    }
}

impl<I> Iterator for MovingAverage<I>
where
    I: Iterator<Item = Measurement>,
{
    type Item = HistoryPoint;

    fn next(&mut self) -> Option<HistoryPoint> {
        let measurement = self.inner.next()?;

        if self.window.len() == self.periods {
            self.window.pop_front();
        }
        self.window.push_back(measurement.weight);
        let average = self.window.iter().sum::<f64>() / self.window.len() as f64;

        Some(HistoryPoint {
            id: measurement.id,
            date: measurement.date,
            weight: measurement.weight,
            average,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// History report: one moving-average point per measurement
pub fn history<I>(measurements: I, periods: usize) -> Result<MovingAverage<I::IntoIter>>
where
    I: IntoIterator<Item = Measurement>,
{
    if periods == 0 {
        return Err(Error::InvalidWindow(periods));
    }
    Ok(MovingAverage::new(measurements.into_iter(), periods))
}

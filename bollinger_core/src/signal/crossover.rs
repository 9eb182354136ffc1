use chrono::NaiveDate;
use serde::Serialize;

use crate::common::enums::{BandZone, Signal};
use crate::data::price_series::PriceSeries;
use crate::math::boll::BandTriple;

/// A non-hold signal with the close it fired at
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalPoint {
    pub index: usize,
    pub date: NaiveDate,
    pub close: f64,
    pub signal: Signal,
}

/// Two-step band crossover detector.
///
/// Buy when the previous close was below its lower band and the current
/// close is back at or above it; sell when the previous close was above its
/// upper band and the current one is back at or below it. Dates without
/// bands, and the first date with bands, are `Hold`.
pub fn derive_signals(closes: &[f64], bands: &[Option<BandTriple>]) -> Vec<Signal> {
    let mut prev_zone: Option<BandZone> = None;

    closes
        .iter()
        .zip(bands)
        .map(|(&price, band)| {
            let Some(band) = band else {
                prev_zone = None;
                return Signal::Hold;
            };
            let zone = band.zone(price);
            let signal = match (prev_zone, zone) {
                (Some(BandZone::Below), z) if z != BandZone::Below => Signal::Buy,
                (Some(BandZone::Above), z) if z != BandZone::Above => Signal::Sell,
                _ => Signal::Hold,
            };
            prev_zone = Some(zone);
            signal
        })
        .collect()
}

/// Collect the buy and sell dates for reporting
pub fn signal_points(series: &PriceSeries, signals: &[Signal]) -> Vec<SignalPoint> {
    series
        .points()
        .iter()
        .zip(signals)
        .enumerate()
        .filter(|(_, (_, signal))| signal.is_trade())
        .map(|(index, (p, &signal))| SignalPoint {
            index,
            date: p.date,
            close: p.close,
            signal,
        })
        .collect()
}

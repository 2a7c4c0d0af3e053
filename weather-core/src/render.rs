use chrono::Timelike;
use std::fmt;

use crate::model::{CurrentWeatherReading, ForecastSeries};

pub const ICON_HOST: &str = "https://openweathermap.org/img/wn";
/// 3-hour cadence, so about fifteen hours ahead.
pub const FORECAST_POINTS: usize = 5;
pub const AXIS_HEADROOM: f64 = 5.0;

const BAR_WIDTH: usize = 32;

/// Kelvin to Celsius, rounded to one decimal place.
pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    ((kelvin - 273.15) * 10.0).round() / 10.0
}

pub fn icon_url(icon_id: &str) -> String {
    format!("{ICON_HOST}/{icon_id}@2x.png")
}

/// Current-conditions panel, temperatures in Celsius.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentPanel {
    pub city_name: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_percent: u8,
    pub description: String,
    pub icon_url: String,
    pub wind_speed_mps: f64,
}

pub fn render_current(reading: &CurrentWeatherReading) -> CurrentPanel {
    CurrentPanel {
        city_name: reading.city_name.clone(),
        temperature_c: kelvin_to_celsius(reading.temperature_kelvin),
        feels_like_c: kelvin_to_celsius(reading.feels_like_kelvin),
        humidity_percent: reading.humidity_percent,
        description: reading.description.clone(),
        icon_url: icon_url(&reading.icon_id),
        wind_speed_mps: reading.wind_speed_mps,
    }
}

impl fmt::Display for CurrentPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Weather in {}", self.city_name)?;
        writeln!(f, "  Temperature: {:.1}°C", self.temperature_c)?;
        writeln!(f, "  Feels like:  {:.1}°C", self.feels_like_c)?;
        writeln!(f, "  Humidity:    {}%", self.humidity_percent)?;
        writeln!(f, "  Conditions:  {}", self.description)?;
        writeln!(f, "  Wind:        {} m/s", self.wind_speed_mps)?;
        write!(f, "  Icon:        {}", self.icon_url)
    }
}

/// Suggested y-axis range around the plotted temperatures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    pub suggested_min: f64,
    pub suggested_max: f64,
}

impl AxisBounds {
    /// `None` when there is nothing to plot.
    pub fn around(temps: &[f64]) -> Option<Self> {
        let min = temps.iter().copied().reduce(f64::min)?;
        let max = temps.iter().copied().reduce(f64::max)?;

        Some(Self {
            suggested_min: min - AXIS_HEADROOM,
            suggested_max: max + AXIS_HEADROOM,
        })
    }
}

/// Single-series temperature line chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastChart {
    pub labels: Vec<String>,
    pub temperatures_c: Vec<f64>,
    pub bounds: Option<AxisBounds>,
}

/// Keeps the leading samples in upstream order; labels carry the hour only.
pub fn build_forecast_chart(series: &ForecastSeries) -> ForecastChart {
    let kept = &series.samples[..series.samples.len().min(FORECAST_POINTS)];

    let labels = kept.iter().map(|s| format!("{}:00", s.timestamp.hour())).collect();
    let temperatures_c: Vec<f64> =
        kept.iter().map(|s| kelvin_to_celsius(s.temperature_kelvin)).collect();
    let bounds = AxisBounds::around(&temperatures_c);

    ForecastChart { labels, temperatures_c, bounds }
}

impl fmt::Display for ForecastChart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Temperature (°C)")?;

        let Some(bounds) = self.bounds else {
            return write!(f, "  (no forecast data)");
        };
        let span = bounds.suggested_max - bounds.suggested_min;

        for (i, (label, temp)) in self.labels.iter().zip(&self.temperatures_c).enumerate() {
            let filled = (((temp - bounds.suggested_min) / span) * BAR_WIDTH as f64).round() as usize;
            let bar = "█".repeat(filled.min(BAR_WIDTH));
            write!(f, "  {label:>5} │{bar:<width$} {temp:.1}", width = BAR_WIDTH)?;
            if i + 1 < self.labels.len() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// Owner of the currently drawn chart.
///
/// Each redraw swaps the whole chart; the previous one is discarded.
#[derive(Debug, Default)]
pub struct ChartHandle {
    chart: Option<ForecastChart>,
}

impl ChartHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chart(&self) -> Option<&ForecastChart> {
        self.chart.as_ref()
    }

    fn replace(mut self, chart: ForecastChart) -> Self {
        self.chart = Some(chart);
        self
    }
}

/// Draw `series` into the handle, replacing whatever it held.
pub fn render_forecast(handle: ChartHandle, series: &ForecastSeries) -> ChartHandle {
    handle.replace(build_forecast_chart(series))
}

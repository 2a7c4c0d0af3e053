use std::io::{self, Write};

use weather_core::{
    HistoryEntry, View,
    render::{CurrentPanel, ForecastChart},
};

/// Plain-text rendering of the search flow.
#[derive(Debug)]
pub struct TerminalView<W> {
    out: W,
}

impl TerminalView<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, text: std::fmt::Arguments<'_>) {
        let _ = self.out.write_fmt(text).and_then(|()| self.out.flush());
    }
}

impl<W: Write + Send> View for TerminalView<W> {
    fn show_current(&mut self, panel: &CurrentPanel) {
        self.emit(format_args!("\n{panel}\n"));
    }

    fn show_forecast(&mut self, chart: &ForecastChart) {
        self.emit(format_args!("\n{chart}\n"));
    }

    fn show_history(&mut self, entries: &[HistoryEntry]) {
        if entries.is_empty() {
            self.emit(format_args!("\nNo searches yet.\n"));
            return;
        }
        let cities: Vec<&str> = entries.iter().map(|e| e.city.as_str()).collect();
        self.emit(format_args!("\nHistory: {}\n", cities.join(" · ")));
    }

    fn alert(&mut self, message: &str) {
        self.emit(format_args!("\n[!] {message}\n"));
    }
}

use std::io::{ self, Write, IsTerminal };

use log::debug;

use crate::{
  ops::Hops,
  instrument::{ Captures, Console },
  Tensor,
};


/// Value counts over evenly sized bins spanning `[min, max]`.

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
  pub min: f32,
  pub max: f32,
  pub counts: Vec<usize>,
}

impl Histogram {
  pub const BINS: usize = 40;

  /// Count values into `bins` bins.
  ///
  /// The maximum lands in the last bin. Constant input gets
  /// centered in a range of width one, and empty input spans `[0, 1]`.
  /// Non-finite values are left out.

  pub fn new(values: &[f32], bins: usize) -> Self {
    assert!(bins > 0, "Histogram needs at least one bin");
    let values: Vec<f32> = values.iter().copied().filter(|v| v.is_finite() ).collect();
    let (min, max) = values.iter().fold(None, |acc: Option<(f32, f32)>, &v| match acc {
      None => Some((v, v)),
      Some((min, max)) => Some((min.min(v), max.max(v))),
    }).unwrap_or((0.0, 1.0));
    let (min, max) = if min == max { (min - 0.5, max + 0.5) } else { (min, max) };

    let mut counts = vec![0; bins];
    let range = max - min;
    for value in values {
      let idx = ((value - min) / range * bins as f32) as usize;
      counts[idx.min(bins - 1)] += 1;
    }
    Self { min, max, counts }
  }

  pub fn total(&self) -> usize {
    self.counts.iter().sum()
  }

  pub fn bin_width(&self) -> f32 {
    (self.max - self.min) / self.counts.len() as f32
  }

  /// Lower edge of every bin.

  pub fn edges(&self) -> Vec<f32> {
    let width = self.bin_width();
    (0..self.counts.len()).map(|i| self.min + width * i as f32 ).collect()
  }
}


/// Sink that displays histograms.

pub trait Plotter {
  fn show(&mut self, histogram: &Histogram, title: &str) -> io::Result<()>;
}


/// Draws histograms as horizontal bar charts on stdout.
///
/// Waits for Enter after every chart when stdin is a terminal.

#[derive(Debug, Clone)]
pub struct TerminalPlotter {
  pub width: usize,
}

impl Default for TerminalPlotter {
  fn default() -> Self {
    Self { width: 50 }
  }
}

impl TerminalPlotter {
  pub fn render(&self, histogram: &Histogram, title: &str) -> String {
    let peak = histogram.counts.iter().copied().max().unwrap_or(0).max(1);
    let mut out = format!("{title}\n");
    for (edge, &count) in histogram.edges().iter().zip(&histogram.counts) {
      let len = count * self.width / peak;
      out += &format!("{edge:>10.4} | {:<width$} {count}\n", "#".repeat(len), width = self.width);
    }
    out += &format!("{:>10.4} +{}\n", histogram.max, "-".repeat(self.width + 1));
    out
  }
}

impl Plotter for TerminalPlotter {
  fn show(&mut self, histogram: &Histogram, title: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(self.render(histogram, title).as_bytes())?;
    stdout.flush()?;
    drop(stdout);

    let stdin = io::stdin();
    if stdin.is_terminal() {
      print!("Press Enter to continue...");
      io::stdout().flush()?;
      stdin.read_line(&mut String::new())?;
    }
    Ok(())
  }
}


/// Keeps every plot it is shown instead of displaying it.
///
/// Lets callers check titles and counts of a [visualize] run
/// without a terminal.

#[derive(Debug, Clone, Default)]
pub struct RecordingPlotter {
  pub plots: Vec<(String, Histogram)>,
}

impl Plotter for RecordingPlotter {
  fn show(&mut self, histogram: &Histogram, title: &str) -> io::Result<()> {
    self.plots.push((title.to_string(), histogram.clone()));
    Ok(())
  }
}


/// Flatten a tensor and plot its values over [Histogram::BINS] bins.

pub fn plot_histogram<P: Plotter + ?Sized>(tensor: &Tensor<f32>, title: &str, plotter: &mut P) -> io::Result<()> {
  let values = tensor.flatten().to_vec();
  debug!("plotting {} values as {title}", values.len());
  plotter.show(&Histogram::new(&values, Histogram::BINS), title)
}


/// Plot all captured activations, then all captured gradients.

pub fn visualize<P: Plotter + ?Sized>(captures: &Captures, console: &Console, plotter: &mut P) -> io::Result<()> {
  for (name, tensor) in captures.activations.iter() {
    console.line(format!("\nPlotting activation from {name}"));
    plot_histogram(tensor, &format!("Activation Histogram - {name}"), plotter)?;
  }
  for (name, tensor) in captures.gradients.iter() {
    console.line(format!("\nPlotting gradient from {name}"));
    plot_histogram(tensor, &format!("Gradient Histogram - {name}"), plotter)?;
  }
  Ok(())
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::ops::BaseOps;

  #[test]
  fn counts_every_value() {
    let tensor = Tensor::<f32>::randn(&[16, 64]);
    let mut plotter = RecordingPlotter::default();
    plot_histogram(&tensor, "Activation Histogram - fc1", &mut plotter).unwrap();
    let (title, histogram) = &plotter.plots[0];
    assert_eq!(title, "Activation Histogram - fc1");
    assert_eq!(histogram.counts.len(), 40);
    assert_eq!(histogram.total(), 1024);
  }

  #[test]
  fn maximum_in_last_bin() {
    let histogram = Histogram::new(&[0.0, 1.0, 2.0, 4.0], 4);
    assert_eq!(histogram.counts, vec![1, 1, 1, 1]);
    assert_eq!(histogram.bin_width(), 1.0);
    assert_eq!(histogram.edges(), vec![0.0, 1.0, 2.0, 3.0]);
  }

  #[test]
  fn constant_values_share_one_bin() {
    let histogram = Histogram::new(&[3.0; 10], 40);
    assert_eq!(histogram.min, 2.5);
    assert_eq!(histogram.max, 3.5);
    assert_eq!(histogram.counts.iter().filter(|&&c| c > 0 ).count(), 1);
    assert_eq!(histogram.counts[20], 10);
  }

  #[test]
  fn skips_non_finite_values() {
    let histogram = Histogram::new(&[f32::NAN, 0.0, 1.0, f32::INFINITY, 2.0, 4.0], 4);
    assert_eq!(histogram.counts, vec![1, 1, 1, 1]);
    assert_eq!((histogram.min, histogram.max), (0.0, 4.0));
    let histogram = Histogram::new(&[f32::NAN], 4);
    assert_eq!(histogram.total(), 0);
  }

  #[test]
  fn empty_input() {
    let histogram = Histogram::new(&[], 40);
    assert_eq!(histogram.total(), 0);
    assert_eq!((histogram.min, histogram.max), (0.0, 1.0));
  }

  #[test]
  fn render_scales_to_peak() {
    let plotter = TerminalPlotter { width: 4 };
    let chart = plotter.render(&Histogram::new(&[0.0, 1.0, 1.0], 2), "Gradient Histogram - output");
    let lines: Vec<_> = chart.lines().collect();
    assert_eq!(lines[0], "Gradient Histogram - output");
    assert_eq!(lines[1], "    0.0000 | ##   1");
    assert_eq!(lines[2], "    0.5000 | #### 2");
    assert_eq!(lines.len(), 4);
  }

  #[test]
  fn visualize_activations_before_gradients() {
    let mut captures = Captures::default();
    captures.gradients.insert("output", Tensor::zeros(&[16, 1]));
    captures.activations.insert("fc1", Tensor::ones(&[16, 64]));
    captures.activations.insert("fc2", Tensor::ones(&[16, 1]));
    let console = Console::buffered();
    let mut plotter = RecordingPlotter::default();
    visualize(&captures, &console, &mut plotter).unwrap();
    let titles: Vec<_> = plotter.plots.iter().map(|(title, _)| title.as_str() ).collect();
    assert_eq!(titles, vec![
      "Activation Histogram - fc1",
      "Activation Histogram - fc2",
      "Gradient Histogram - output",
    ]);
    assert_eq!(console.lines(), vec![
      "\nPlotting activation from fc1",
      "\nPlotting activation from fc2",
      "\nPlotting gradient from output",
    ]);
    assert_eq!(plotter.plots[0].1.total(), 1024);
    assert_eq!(captures.activations.get("fc2").unwrap().shape().dims, vec![16, 1]);
  }
}

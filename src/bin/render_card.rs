//! Renders one card from a JSON job file.
//!
//! ```text
//! render_card job.json --format png --theme dark -o card.png
//! ```
//!
//! The job holds a widget spec and its metrics:
//!
//! ```json
//! {
//!   "spec": { "id": "w1", "variant": "bar", "width": 400, "height": 120 },
//!   "metrics": { "label": "Pages Read", "unit": "pages", "current_value": 120, "target_value": 300 }
//! }
//! ```

use clap::{Parser, ValueEnum};
use progress_card::cache::OutputFormat;
use progress_card::config::RenderConfig;
use progress_card::layout::{MetricsData, WidgetSpec};
use progress_card::renderer::CardRenderer;
use progress_card::theme::Theme;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum FormatArg {
  Svg,
  Png,
}

impl FormatArg {
  fn as_format(self) -> OutputFormat {
    match self {
      FormatArg::Svg => OutputFormat::Svg,
      FormatArg::Png => OutputFormat::Png,
    }
  }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
enum ThemeArg {
  Light,
  Dark,
}

impl ThemeArg {
  fn as_theme(self) -> Theme {
    match self {
      ThemeArg::Light => Theme::Light,
      ThemeArg::Dark => Theme::Dark,
    }
  }
}

#[derive(Parser, Debug)]
#[command(name = "render_card", about = "Render a progress card to SVG or PNG")]
struct Args {
  /// Job file with `spec` and `metrics`
  #[arg(value_name = "JOB")]
  job: PathBuf,

  /// Output format
  #[arg(long, value_enum, default_value_t = FormatArg::Svg)]
  format: FormatArg,

  /// Theme; defaults to the one in the job's spec
  #[arg(long, value_enum)]
  theme: Option<ThemeArg>,

  /// Output file; defaults to `<widget id>.<format>`
  #[arg(short, long, value_name = "PATH")]
  output: Option<PathBuf>,

  /// Output pixels per canvas pixel for PNG
  #[arg(long, value_name = "FACTOR")]
  scale: Option<f32>,

  /// Renderer config (JSON); `CARD_*` environment variables still apply
  #[arg(long, value_name = "PATH")]
  config: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct Job {
  spec: WidgetSpec,
  metrics: MetricsData,
}

fn main() {
  env_logger::init();
  if let Err(err) = run() {
    eprintln!("error: {err}");
    std::process::exit(1);
  }
}

fn run() -> Result<(), String> {
  let args = Args::parse();

  let mut config = match &args.config {
    Some(path) => {
      let json = fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))?;
      RenderConfig::from_json(&json).map_err(|e| e.to_string())?
    }
    None => RenderConfig::default(),
  };
  config = config.with_env_overrides().map_err(|e| e.to_string())?;
  if let Some(scale) = args.scale {
    config.raster_scale = scale;
  }

  let raw = fs::read_to_string(&args.job).map_err(|e| format!("{}: {e}", args.job.display()))?;
  let job: Job =
    serde_json::from_str(&raw).map_err(|e| format!("{}: {e}", args.job.display()))?;

  let format = args.format.as_format();
  let theme = args.theme.map(ThemeArg::as_theme).unwrap_or(job.spec.theme);
  let renderer = CardRenderer::builder()
    .config(config)
    .build()
    .map_err(|e| e.to_string())?;
  let output = renderer
    .render_uncached(&job.spec, &job.metrics, theme, format)
    .map_err(|e| e.to_string())?;

  let path = args
    .output
    .unwrap_or_else(|| PathBuf::from(format!("{}.{}", job.spec.id, format.extension())));
  fs::write(&path, &output.bytes).map_err(|e| format!("{}: {e}", path.display()))?;
  log::info!(
    "wrote {} ({} bytes, {})",
    path.display(),
    output.len(),
    output.content_type
  );
  Ok(())
}

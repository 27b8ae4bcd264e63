use image::RgbaImage;
use progress_card::image_compare::{compare_images, compare_png, CompareConfig};
use progress_card::layout::{HistoryPoint, LayoutBuilder, LayoutConfig, MetricsData, Variant, WidgetSpec};
use progress_card::raster::{decode_png, rasterize, render_blocks};
use progress_card::text::FontRegistry;
use progress_card::vector::compose;
use progress_card::Theme;
use resvg::{tiny_skia, usvg};

/// Renders SVG markup with an independent renderer, scaled to the target.
fn render_markup(svg: &str, width: u32, height: u32) -> RgbaImage {
  let tree = usvg::Tree::from_str(svg, &usvg::Options::default()).expect("markup parses");
  let size = tree.size();
  let mut pixmap = tiny_skia::Pixmap::new(width, height).expect("target size is valid");
  let transform = tiny_skia::Transform::from_scale(
    width as f32 / size.width(),
    height as f32 / size.height(),
  );
  resvg::render(&tree, transform, &mut pixmap.as_mut());

  let mut rgba = Vec::with_capacity(pixmap.data().len());
  for pixel in pixmap.pixels() {
    let color = pixel.demultiply();
    rgba.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
  }
  RgbaImage::from_raw(width, height, rgba).expect("buffer matches size")
}

fn assert_parity(spec: WidgetSpec, metrics: MetricsData, theme: Theme, width: u32, height: u32) {
  let fonts = FontRegistry::bundled().unwrap();
  let config = LayoutConfig::default();
  let tree = LayoutBuilder::new(&fonts, &config).build(&spec, &metrics).unwrap();

  let doc = compose(&tree, theme, &fonts).unwrap();
  let via_document = rasterize(&doc, &fonts, width, height).unwrap();
  let direct = render_blocks(&tree, theme, &fonts, width, height).unwrap();

  let diff = compare_png(&via_document, &direct, &CompareConfig::fuzzy()).unwrap();
  assert!(
    diff.is_match(),
    "{} {} {width}x{height}: {}",
    spec.variant,
    theme,
    diff.summary()
  );

  // The emitted markup, drawn by a different SVG renderer, must match too.
  let from_markup = render_markup(&doc.to_svg(), width, height);
  let rasterized = decode_png(&via_document).unwrap();
  let diff = compare_images(&rasterized, &from_markup, &CompareConfig::fuzzy());
  assert!(
    diff.is_match(),
    "{} {} {width}x{height} against markup: {}",
    spec.variant,
    theme,
    diff.summary()
  );
}

#[test]
fn bar_paths_agree() {
  assert_parity(
    WidgetSpec::new("w1", Variant::Bar, 400, 120),
    MetricsData::new("Pages Read", 120.0)
      .with_unit("pages")
      .with_target(300.0),
    Theme::Light,
    800,
    240,
  );
}

#[test]
fn ring_paths_agree() {
  assert_parity(
    WidgetSpec::new("w1", Variant::Ring, 300, 120),
    MetricsData::new("Workouts", 7.0).with_target(10.0),
    Theme::Dark,
    300,
    120,
  );
}

#[test]
fn number_paths_agree() {
  assert_parity(
    WidgetSpec::new("w1", Variant::Number, 200, 100),
    MetricsData::new("Streak", 42.0).with_unit("days"),
    Theme::Light,
    400,
    200,
  );
}

#[test]
fn heatmap_paths_agree() {
  let history = (0..60)
    .map(|day| HistoryPoint::new(day * 86_400, ((day * 7) % 11) as f64))
    .collect();
  assert_parity(
    WidgetSpec::new("w1", Variant::Heatmap, 360, 140),
    MetricsData::new("Commits", 60.0).with_history(history),
    Theme::Dark,
    360,
    140,
  );
}

//! PNG rendering of the exported artifacts.
//!
//! Both images are drawn directly into an RGB buffer: a line chart for one
//! history dataset, and a tile-grid choropleth where each member state is a
//! square placed roughly where it sits on the map.

use std::io::Cursor;

use eumap_core::{format::BUCKETS, indicator::Indicator};
use image::{DynamicImage, ImageFormat, ImageResult, Rgb, RgbImage};

use crate::{history::ChartDataset, state::ViewState};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([64, 64, 64]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const NO_DATA: Rgb<u8> = Rgb([190, 190, 190]);
const UNSELECTED: Rgb<u8> = Rgb([235, 235, 235]);
const LOW: [u8; 3] = [245, 245, 245];

const CHART_WIDTH: u32 = 640;
const CHART_HEIGHT: u32 = 360;
const MARGIN: u32 = 32;

const TILE: u32 = 48;
const GAP: u32 = 4;
const GRID_COLUMNS: u32 = 7;
const GRID_ROWS: u32 = 7;

/// (code, column, row) of every member state on the tile grid.
const TILES: [(&str, u32, u32); 27] = [
  ("SE", 4, 0),
  ("FI", 5, 0),
  ("IE", 0, 1),
  ("DK", 3, 1),
  ("LV", 5, 1),
  ("EE", 6, 1),
  ("BE", 1, 2),
  ("NL", 2, 2),
  ("DE", 3, 2),
  ("PL", 4, 2),
  ("LT", 5, 2),
  ("FR", 1, 3),
  ("LU", 2, 3),
  ("CZ", 3, 3),
  ("SK", 4, 3),
  ("PT", 0, 4),
  ("ES", 1, 4),
  ("AT", 3, 4),
  ("HU", 4, 4),
  ("RO", 5, 4),
  ("IT", 2, 5),
  ("SI", 3, 5),
  ("HR", 4, 5),
  ("BG", 5, 5),
  ("MT", 2, 6),
  ("GR", 5, 6),
  ("CY", 6, 6),
];

fn encode(image: RgbImage) -> ImageResult<Vec<u8>> {
  let mut buffer = Vec::new();
  DynamicImage::ImageRgb8(image).write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
  Ok(buffer)
}

/// Colour of bucket `bucket` on an indicator's ramp, from near-white to the
/// indicator colour.
pub fn bucket_color(indicator: Indicator, bucket: u8) -> Rgb<u8> {
  let base = indicator.rgb();
  let t = f32::from(bucket.min(BUCKETS - 1) + 1) / f32::from(BUCKETS);
  let mix = |i: usize| {
    let (lo, hi) = (f32::from(LOW[i]), f32::from(base[i]));
    (lo + (hi - lo) * t).round() as u8
  };
  Rgb([mix(0), mix(1), mix(2)])
}

fn fill(image: &mut RgbImage, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
  for py in y..(y + h).min(image.height()) {
    for px in x..(x + w).min(image.width()) {
      image.put_pixel(px, py, color);
    }
  }
}

/// Bresenham line, clipped to the image.
fn line(image: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
  let (mut x, mut y) = from;
  let dx = (to.0 - x).abs();
  let dy = -(to.1 - y).abs();
  let sx = if x < to.0 { 1 } else { -1 };
  let sy = if y < to.1 { 1 } else { -1 };
  let mut err = dx + dy;
  loop {
    if let (Ok(px), Ok(py)) = (u32::try_from(x), u32::try_from(y)) {
      if px < image.width() && py < image.height() {
        image.put_pixel(px, py, color);
      }
    }
    if (x, y) == to {
      break;
    }
    let e2 = 2 * err;
    if e2 >= dy {
      err += dy;
      x += sx;
    }
    if e2 <= dx {
      err += dx;
      y += sy;
    }
  }
}

/// Line chart of one dataset. An empty dataset yields just the axes.
pub fn chart_png(dataset: &ChartDataset) -> ImageResult<Vec<u8>> {
  let mut image = RgbImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, BACKGROUND);
  let (left, top) = (MARGIN, MARGIN);
  let (right, bottom) = (CHART_WIDTH - MARGIN, CHART_HEIGHT - MARGIN);

  for step in 0..=4 {
    let y = top + (bottom - top) * step / 4;
    fill(&mut image, left, y, right - left, 1, GRID);
  }
  fill(&mut image, left, top, 1, bottom - top, AXIS);
  fill(&mut image, left, bottom, right - left, 1, AXIS);

  let points: Vec<(i32, f64)> = dataset
    .years
    .iter()
    .copied()
    .zip(dataset.values.iter().copied())
    .filter(|(_, v)| v.is_finite())
    .collect();
  if points.is_empty() {
    return encode(image);
  }

  let (min_year, max_year) = (points[0].0, points[points.len() - 1].0);
  let (mut min_value, mut max_value) = points
    .iter()
    .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(_, v)| (lo.min(v), hi.max(v)));
  if min_value == max_value {
    min_value -= 1.0;
    max_value += 1.0;
  }

  let span_x = f64::from((max_year - min_year).max(1));
  let plot_w = f64::from(right - left);
  let plot_h = f64::from(bottom - top);
  let project = |(year, value): (i32, f64)| {
    let x = f64::from(left) + f64::from(year - min_year) / span_x * plot_w;
    let y = f64::from(bottom) - (value - min_value) / (max_value - min_value) * plot_h;
    (x.round() as i64, y.round() as i64)
  };

  let color = Rgb(dataset.indicator.rgb());
  let projected: Vec<(i64, i64)> = points.into_iter().map(project).collect();
  for pair in projected.windows(2) {
    line(&mut image, pair[0], pair[1], color);
  }
  for &(x, y) in &projected {
    let (x, y) = (x.max(2) as u32 - 2, y.max(2) as u32 - 2);
    fill(&mut image, x, y, 5, 5, color);
  }

  encode(image)
}

/// Tile-grid choropleth of the selected layers. With several layers each
/// tile is split into vertical stripes, one per layer in selection order.
pub fn map_png(state: &ViewState) -> ImageResult<Vec<u8>> {
  let width = GAP + GRID_COLUMNS * (TILE + GAP);
  let height = GAP + GRID_ROWS * (TILE + GAP);
  let mut image = RgbImage::from_pixel(width, height, BACKGROUND);

  let layers = &state.selection;
  for &(code, column, row) in &TILES {
    let x = GAP + column * (TILE + GAP);
    let y = GAP + row * (TILE + GAP);
    if layers.is_empty() {
      fill(&mut image, x, y, TILE, TILE, UNSELECTED);
      continue;
    }

    let stripe = TILE / layers.len() as u32;
    for (i, &indicator) in layers.iter().enumerate() {
      let color = state
        .records_for(indicator)
        .find(|r| r.country_code == code)
        .and_then(|r| r.bucket)
        .map_or(NO_DATA, |b| bucket_color(indicator, b));
      let offset = stripe * i as u32;
      let w = if i + 1 == layers.len() { TILE - offset } else { stripe };
      fill(&mut image, x + offset, y, w, TILE, color);
    }
  }

  encode(image)
}

#[cfg(test)]
mod tests {
  use super::*;

  const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

  #[test]
  fn chart_is_a_png() {
    let dataset = ChartDataset {
      indicator: Indicator::Gdp,
      label:     Indicator::Gdp.aggregate_label(),
      years:     vec![2000, 2001, 2002],
      values:    vec![1.0, 3.0, 2.0],
    };
    let png = chart_png(&dataset).unwrap();
    assert!(png.starts_with(PNG_MAGIC));

    let empty = ChartDataset { years: vec![], values: vec![], ..dataset };
    assert!(chart_png(&empty).unwrap().starts_with(PNG_MAGIC));
  }

  #[test]
  fn empty_map_is_a_png() {
    let png = map_png(&ViewState::default()).unwrap();
    assert!(png.starts_with(PNG_MAGIC));
  }

  #[test]
  fn ramp_darkens_with_bucket() {
    let light = bucket_color(Indicator::Cpi, 0);
    let dark = bucket_color(Indicator::Cpi, BUCKETS - 1);
    assert_eq!(dark, Rgb(Indicator::Cpi.rgb()));
    assert!(light.0[0] > dark.0[0]);
  }

  #[test]
  fn tile_grid_covers_every_member_state() {
    let mut codes: Vec<_> = TILES.iter().map(|t| t.0).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), 27);
    for code in codes {
      assert!(eumap_core::country::by_code(code).is_some(), "{code}");
    }
  }
}

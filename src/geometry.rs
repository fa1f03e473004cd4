/// Assumed height of every wall.
pub const ROOM_HEIGHT_CM: f64 = 250.0;

/// Narrower walls are stretched to this displayed width.
pub const MIN_DISPLAY_WIDTH_CM: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn map_coord_x(&self, x: f64, map_min_x: f64, map_max_x: f64) -> f64 {
        (map_min_x + ((x - self.min_x) / self.width()) * (map_max_x - map_min_x))
            .clamp(map_min_x, map_max_x)
    }

    pub fn map_coord_y(&self, y: f64, map_min_y: f64, map_max_y: f64) -> f64 {
        (map_min_y + ((y - self.min_y) / self.height()) * (map_max_y - map_min_y))
            .clamp(map_min_y, map_max_y)
    }
}

pub fn data_extent(xs: impl IntoIterator<Item = f64>) -> Option<Rect> {
    let (min_x, max_x) = xs
        .into_iter()
        .fold(None, |acc: Option<(f64, f64)>, x| match acc {
            Some((lo, hi)) => Some((lo.min(x), hi.max(x))),
            None => Some((x, x)),
        })?;
    Some(Rect::new(min_x, 0.0, max_x, ROOM_HEIGHT_CM))
}

/// Extent the image is drawn over: at least `MIN_DISPLAY_WIDTH_CM` wide,
/// anchored at the minimum x. The data itself is not changed.
pub fn display_extent(data: &Rect) -> Rect {
    if data.width() >= MIN_DISPLAY_WIDTH_CM {
        *data
    } else {
        Rect::new(
            data.min_x,
            data.min_y,
            data.min_x + MIN_DISPLAY_WIDTH_CM,
            data.max_y,
        )
    }
}

pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

pub fn nice_ticks(min: f64, max: f64, target: usize) -> Vec<f64> {
    let span = max - min;
    if span.is_nan() || span <= 0.0 || target == 0 {
        return vec![min];
    }
    let raw = span / target as f64;
    let magnitude = 10f64.powf(raw.log10().floor());
    let step = [1.0, 2.0, 5.0, 10.0]
        .iter()
        .map(|m| m * magnitude)
        .find(|s| *s >= raw)
        .unwrap_or(10.0 * magnitude);

    let first = (min / step).ceil() as i64;
    let last = (max / step + 1e-9).floor() as i64;
    (first..=last).map(|k| k as f64 * step).collect()
}

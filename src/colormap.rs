#[derive(Debug, Clone)]
pub struct ColorMap {
    colors: Vec<[f64; 3]>,
    thresholds: Vec<f64>,
}

impl ColorMap {
    pub fn new(colors: Vec<[f64; 3]>, thresholds: Vec<f64>) -> Self {
        debug_assert_eq!(colors.len(), thresholds.len());
        debug_assert!(thresholds.windows(2).all(|w| w[0] < w[1]));
        ColorMap { colors, thresholds }
    }

    pub fn from_stops(stops: &[(f64, [f64; 3])]) -> Self {
        let (thresholds, colors) = stops.iter().copied().unzip();
        ColorMap::new(colors, thresholds)
    }

    pub fn evenly_spaced(colors: &[[f64; 3]]) -> Self {
        let last = (colors.len() - 1).max(1) as f64;
        let thresholds = (0..colors.len()).map(|i| i as f64 / last).collect();
        ColorMap::new(colors.to_vec(), thresholds)
    }

    pub fn stops(&self) -> impl Iterator<Item = (f64, [f64; 3])> + '_ {
        self.thresholds.iter().copied().zip(self.colors.iter().copied())
    }

    pub fn get_color(&self, value: f64) -> [f64; 3] {
        if value.is_nan() || value <= self.thresholds[0] {
            return self.colors[0];
        }

        for i in 1..self.thresholds.len() {
            if value < self.thresholds[i] {
                let ratio = (value - self.thresholds[i - 1])
                    / (self.thresholds[i] - self.thresholds[i - 1]);
                let (c1, c2) = (self.colors[i - 1], self.colors[i]);
                return [
                    c1[0] + ratio * (c2[0] - c1[0]),
                    c1[1] + ratio * (c2[1] - c1[1]),
                    c1[2] + ratio * (c2[2] - c1[2]),
                ];
            }
        }

        self.colors[self.colors.len() - 1]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub vmin: f64,
    pub vmax: f64,
}

impl Normalize {
    pub const fn new(vmin: f64, vmax: f64) -> Self {
        Self { vmin, vmax }
    }

    pub fn apply(&self, value: f64) -> f64 {
        ((value - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0)
    }
}

pub mod named {
    pub const DARKGREEN: [f64; 3] = [0.0, 100.0, 0.0];
    pub const GREEN: [f64; 3] = [0.0, 128.0, 0.0];
    pub const GREENYELLOW: [f64; 3] = [173.0, 255.0, 47.0];
    pub const YELLOW: [f64; 3] = [255.0, 255.0, 0.0];
    pub const GOLD: [f64; 3] = [255.0, 215.0, 0.0];
    pub const ORANGE: [f64; 3] = [255.0, 165.0, 0.0];
    pub const DARKORANGE: [f64; 3] = [255.0, 140.0, 0.0];
    pub const RED: [f64; 3] = [255.0, 0.0, 0.0];
    pub const DARKRED: [f64; 3] = [139.0, 0.0, 0.0];
    pub const BLACK: [f64; 3] = [0.0, 0.0, 0.0];
    pub const GREY: [f64; 3] = [128.0, 128.0, 128.0];
}

pub const HUMIDITY_FULL_SCALE: f64 = 200.0;

/// Humidity scale of the moisture meter, indexed by `digits / 200`.
///
/// Up to 40 digits the material is dry, 40-80 moderately humid (equilibrium
/// moisture), 80-100 elevated, 100-150 saturated.
pub fn wall_humidity() -> ColorMap {
    use named::*;

    let stops = [
        (0.0, DARKGREEN),
        (20.0, GREEN),
        (40.0, GREENYELLOW),
        (50.0, YELLOW),
        (80.0, GOLD),
        (90.0, ORANGE),
        (100.0, DARKORANGE),
        (105.0, RED),
        (150.0, DARKRED),
        (HUMIDITY_FULL_SCALE, BLACK),
    ]
    .map(|(digits, color)| (digits / HUMIDITY_FULL_SCALE, color));

    ColorMap::from_stops(&stops)
}

/// ColorBrewer RdBu, reversed: blue for low values, red for high ones.
pub fn diverging_red_blue() -> ColorMap {
    let mut colors = [
        [103.0, 0.0, 31.0],
        [178.0, 24.0, 43.0],
        [214.0, 96.0, 77.0],
        [244.0, 165.0, 130.0],
        [253.0, 219.0, 199.0],
        [247.0, 247.0, 247.0],
        [209.0, 229.0, 240.0],
        [146.0, 197.0, 222.0],
        [67.0, 147.0, 195.0],
        [33.0, 102.0, 172.0],
        [5.0, 48.0, 97.0],
    ];
    colors.reverse();
    ColorMap::evenly_spaced(&colors)
}

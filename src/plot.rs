use std::f64::consts::PI;
use std::rc::Rc;

use gtk4::cairo::{self, Context, FontSlant, FontWeight, Format, ImageSurface};
use gtk4::glib::ExitCode;
use log::{debug, info};
use ndarray::Array2;

use crate::colormap::{self, named, ColorMap, Normalize};
use crate::error::{PlotError, Result};
use crate::geometry::{self, data_extent, display_extent, linspace, Rect, ROOM_HEIGHT_CM};
use crate::measurement::{Measurement, MeasurementTable};
use crate::triangulation::Triangulation;
use crate::window::{Figure, Frame, Layer, Visualizer};

pub const GRID_RESOLUTION: usize = 1000;

const FONT_FAMILY: &str = "Sans";
const FONT_SIZE: f64 = 12.0;
const TITLE_FONT_SIZE: f64 = 14.0;
const TICK_LENGTH: f64 = 4.0;
const MARKER_SIZE: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotOptions {
    pub with_scatter: bool,
    pub with_x_labels: bool,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            with_scatter: true,
            with_x_labels: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Humidity,
    Temperature,
}

impl Field {
    pub fn value(&self, m: &Measurement) -> f64 {
        match self {
            Field::Humidity => m.wall_humidity_digits,
            Field::Temperature => m.wall_temperature_deg_c,
        }
    }

    pub fn colormap(&self) -> ColorMap {
        match self {
            Field::Humidity => colormap::wall_humidity(),
            Field::Temperature => colormap::diverging_red_blue(),
        }
    }

    pub fn norm(&self) -> Normalize {
        match self {
            Field::Humidity => Normalize::new(0.0, colormap::HUMIDITY_FULL_SCALE),
            Field::Temperature => Normalize::new(10.0, 25.0),
        }
    }

    pub fn colorbar_label(&self) -> &'static str {
        match self {
            Field::Humidity => "Feuchtigkeit [digits]",
            Field::Temperature => "Temperatur [°C]",
        }
    }

    pub fn title(&self, room: &str, wall: &str) -> String {
        match self {
            Field::Humidity => format!("Feuchtigkeit: {room}, {wall}"),
            Field::Temperature => format!("Temperatur: {room}, {wall}"),
        }
    }
}

pub struct WallPlot {
    pub field: Field,
    pub data_extent: Rect,
    pub grid: Array2<Option<f64>>,
    figure: Figure,
}

impl WallPlot {
    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    pub fn into_figure(self) -> Figure {
        self.figure
    }
}

pub struct WallPlots {
    pub humidity: WallPlot,
    pub temperature: WallPlot,
}

/// Fails with [`PlotError::EmptySelection`] when the table has no rows for
/// the pair and with [`PlotError::DegenerateSelection`] when the sample
/// positions do not span a triangle.
pub fn create_plots_wall(
    table: &MeasurementTable,
    room: &str,
    wall: &str,
    options: PlotOptions,
) -> Result<WallPlots> {
    let selection = table.select(room, wall);
    let positions: Vec<(f64, f64)> = selection.iter().map(|m| m.position()).collect();
    let extent = data_extent(positions.iter().map(|p| p.0)).ok_or_else(|| {
        PlotError::EmptySelection {
            room: room.to_owned(),
            wall: wall.to_owned(),
        }
    })?;
    let triangulation = Triangulation::new(&positions)?;

    let xi = linspace(extent.min_x, extent.max_x, GRID_RESOLUTION);
    let yi = linspace(0.0, ROOM_HEIGHT_CM, GRID_RESOLUTION);
    info!(
        "Plotting {room}, {wall}: {} samples over x {}..{} cm",
        positions.len(),
        extent.min_x,
        extent.max_x
    );

    let build = |field: Field| -> Result<WallPlot> {
        let values: Vec<f64> = selection.iter().map(|m| field.value(m)).collect();
        let grid = triangulation.griddata_linear(&values, &xi, &yi);
        let figure = build_figure(field, room, wall, &extent, &grid, &positions, options)?;
        Ok(WallPlot {
            field,
            data_extent: extent,
            grid,
            figure,
        })
    };

    Ok(WallPlots {
        humidity: build(Field::Humidity)?,
        temperature: build(Field::Temperature)?,
    })
}

pub fn show_wall_plots(plots: WallPlots) -> ExitCode {
    let mut visualizer = Visualizer::new();
    visualizer.add_figure(plots.humidity.into_figure());
    visualizer.add_figure(plots.temperature.into_figure());
    visualizer.run()
}

fn build_figure(
    field: Field,
    room: &str,
    wall: &str,
    extent: &Rect,
    grid: &Array2<Option<f64>>,
    positions: &[(f64, f64)],
    options: PlotOptions,
) -> Result<Figure> {
    let shown = display_extent(extent);
    if shown != *extent {
        debug!(
            "Wall {room}, {wall} spans {} cm, displayed as {} cm",
            extent.width(),
            shown.width()
        );
    }

    let title = field.title(room, wall);
    let mut figure = Figure::new(title.clone(), shown);
    figure.add_layer(Rc::new(HeatMap::new(grid, &field.colormap(), field.norm())?), 0);
    if options.with_scatter {
        figure.add_layer(Rc::new(SampleMarkers::new(positions.to_vec())), 1);
    }
    figure.add_layer(
        Rc::new(Axes {
            title,
            with_x_labels: options.with_x_labels,
        }),
        2,
    );
    figure.add_layer(
        Rc::new(Colorbar {
            cmap: field.colormap(),
            norm: field.norm(),
            label: field.colorbar_label(),
        }),
        2,
    );
    Ok(figure)
}

/// Premultiplied ARGB pixels of `grid`, top row first. Missing cells are
/// transparent.
pub fn rasterize(grid: &Array2<Option<f64>>, cmap: &ColorMap, norm: Normalize) -> Vec<u32> {
    let (rows, cols) = grid.dim();
    let mut pixels = Vec::with_capacity(rows * cols);
    for j in (0..rows).rev() {
        for i in 0..cols {
            let pixel = match grid[[j, i]] {
                Some(v) if !v.is_nan() => argb(cmap.get_color(norm.apply(v))),
                _ => 0,
            };
            pixels.push(pixel);
        }
    }
    pixels
}

fn argb(color: [f64; 3]) -> u32 {
    let [r, g, b] = color.map(|c| c.round().clamp(0.0, 255.0) as u32);
    0xff00_0000 | (r << 16) | (g << 8) | b
}

fn set_source(cr: &Context, color: [f64; 3]) {
    cr.set_source_rgb(color[0] / 255.0, color[1] / 255.0, color[2] / 255.0);
}

fn text_width(cr: &Context, text: &str) -> std::result::Result<f64, cairo::Error> {
    Ok(cr.text_extents(text)?.x_advance())
}

pub struct HeatMap {
    image: ImageSurface,
}

impl HeatMap {
    pub fn new(grid: &Array2<Option<f64>>, cmap: &ColorMap, norm: Normalize) -> Result<Self> {
        let (rows, cols) = grid.dim();
        let pixels = rasterize(grid, cmap, norm);

        let mut image = ImageSurface::create(Format::ARgb32, cols as i32, rows as i32)?;
        let stride = image.stride() as usize;
        {
            let mut data = image.data()?;
            for (row, line) in pixels.chunks(cols.max(1)).enumerate() {
                for (col, pixel) in line.iter().enumerate() {
                    let offset = row * stride + col * 4;
                    data[offset..offset + 4].copy_from_slice(&pixel.to_ne_bytes());
                }
            }
        }
        Ok(Self { image })
    }

    pub fn size(&self) -> (i32, i32) {
        (self.image.width(), self.image.height())
    }
}

impl Layer for HeatMap {
    fn draw(&self, cr: &Context, frame: &Frame) -> std::result::Result<(), cairo::Error> {
        let (cols, rows) = self.size();
        if cols == 0 || rows == 0 {
            return Ok(());
        }
        let plot = frame.plot;
        cr.save()?;
        cr.translate(plot.min_x, plot.min_y);
        cr.scale(plot.width() / cols as f64, plot.height() / rows as f64);
        cr.set_source_surface(&self.image, 0.0, 0.0)?;
        cr.paint()?;
        cr.restore()
    }
}

pub struct SampleMarkers {
    positions: Vec<(f64, f64)>,
}

impl SampleMarkers {
    pub fn new(positions: Vec<(f64, f64)>) -> Self {
        Self { positions }
    }
}

impl Layer for SampleMarkers {
    fn draw(&self, cr: &Context, frame: &Frame) -> std::result::Result<(), cairo::Error> {
        set_source(cr, named::GREY);
        cr.set_line_width(1.5);
        cr.new_path();
        for &(x, y) in &self.positions {
            let (sx, sy) = frame.to_screen(x, y);
            cr.move_to(sx - MARKER_SIZE, sy - MARKER_SIZE);
            cr.line_to(sx + MARKER_SIZE, sy + MARKER_SIZE);
            cr.move_to(sx - MARKER_SIZE, sy + MARKER_SIZE);
            cr.line_to(sx + MARKER_SIZE, sy - MARKER_SIZE);
        }
        cr.stroke()
    }
}

pub struct Axes {
    title: String,
    with_x_labels: bool,
}

impl Layer for Axes {
    fn draw(&self, cr: &Context, frame: &Frame) -> std::result::Result<(), cairo::Error> {
        let plot = frame.plot;
        let extent = frame.extent;
        cr.select_font_face(FONT_FAMILY, FontSlant::Normal, FontWeight::Normal);
        cr.set_font_size(FONT_SIZE);
        set_source(cr, named::BLACK);
        cr.set_line_width(1.0);

        cr.rectangle(plot.min_x, plot.min_y, plot.width(), plot.height());
        cr.stroke()?;

        for tick in geometry::nice_ticks(extent.min_y, extent.max_y, 5) {
            let (_, sy) = frame.to_screen(extent.min_x, tick);
            cr.move_to(plot.min_x, sy);
            cr.line_to(plot.min_x - TICK_LENGTH, sy);
            cr.stroke()?;
            let label = format!("{tick}");
            let w = text_width(cr, &label)?;
            cr.move_to(plot.min_x - TICK_LENGTH - 3.0 - w, sy + FONT_SIZE / 3.0);
            cr.show_text(&label)?;
        }

        if self.with_x_labels {
            let target = ((plot.width() / 60.0).round() as usize).max(2);
            for tick in geometry::nice_ticks(extent.min_x, extent.max_x, target) {
                let (sx, _) = frame.to_screen(tick, extent.min_y);
                cr.move_to(sx, plot.max_y);
                cr.line_to(sx, plot.max_y + TICK_LENGTH);
                cr.stroke()?;
                let label = format!("{tick}");
                let w = text_width(cr, &label)?;
                cr.move_to(sx - w / 2.0, plot.max_y + TICK_LENGTH + FONT_SIZE + 2.0);
                cr.show_text(&label)?;
            }
            let w = text_width(cr, "X")?;
            cr.move_to(
                (plot.min_x + plot.max_x - w) / 2.0,
                plot.max_y + TICK_LENGTH + 2.0 * FONT_SIZE + 8.0,
            );
            cr.show_text("X")?;
        }

        cr.save()?;
        cr.move_to(plot.min_x - 45.0, (plot.min_y + plot.max_y) / 2.0);
        cr.rotate(-PI / 2.0);
        cr.show_text("Y")?;
        cr.restore()?;

        cr.set_font_size(TITLE_FONT_SIZE);
        let w = text_width(cr, &self.title)?;
        let center = (plot.min_x + plot.max_x) / 2.0;
        let left = (center - w / 2.0).max(4.0);
        cr.move_to(left, plot.min_y - 12.0);
        cr.show_text(&self.title)
    }
}

pub struct Colorbar {
    cmap: ColorMap,
    norm: Normalize,
    label: &'static str,
}

impl Layer for Colorbar {
    fn draw(&self, cr: &Context, frame: &Frame) -> std::result::Result<(), cairo::Error> {
        let bar = frame.colorbar;
        let steps = bar.height().ceil().max(1.0) as usize;
        for k in 0..steps {
            let t = 1.0 - (k as f64 + 0.5) / steps as f64;
            set_source(cr, self.cmap.get_color(t));
            let y = bar.min_y + k as f64 * bar.height() / steps as f64;
            cr.rectangle(bar.min_x, y, bar.width(), bar.height() / steps as f64 + 0.5);
            cr.fill()?;
        }

        set_source(cr, named::BLACK);
        cr.set_line_width(1.0);
        cr.rectangle(bar.min_x, bar.min_y, bar.width(), bar.height());
        cr.stroke()?;

        cr.select_font_face(FONT_FAMILY, FontSlant::Normal, FontWeight::Normal);
        cr.set_font_size(FONT_SIZE);
        for tick in geometry::nice_ticks(self.norm.vmin, self.norm.vmax, 5) {
            let y = bar.max_y - self.norm.apply(tick) * bar.height();
            cr.move_to(bar.max_x, y);
            cr.line_to(bar.max_x + TICK_LENGTH, y);
            cr.stroke()?;
            cr.move_to(bar.max_x + TICK_LENGTH + 3.0, y + FONT_SIZE / 3.0);
            cr.show_text(&format!("{tick}"))?;
        }

        let w = text_width(cr, self.label)?;
        cr.save()?;
        cr.move_to(bar.max_x + 55.0, (bar.min_y + bar.max_y + w) / 2.0);
        cr.rotate(-PI / 2.0);
        cr.show_text(self.label)?;
        cr.restore()
    }
}

use std::rc::Rc;

use gtk4::{
    cairo::{self, Context, Format, ImageSurface},
    gio::ApplicationFlags,
    glib::ExitCode,
    prelude::{ApplicationExt, ApplicationExtManual, DrawingAreaExtManual, GtkWindowExt},
    Application, ApplicationWindow, DrawingArea,
};
use log::{error, info};

use crate::geometry::Rect;

const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 130.0;
const MARGIN_TOP: f64 = 45.0;
const MARGIN_BOTTOM: f64 = 55.0;
const COLORBAR_GAP: f64 = 20.0;
const COLORBAR_WIDTH: f64 = 16.0;
/// Colorbar height relative to the plot height.
const COLORBAR_SHRINK: f64 = 0.8;
/// Pixels per centimetre at the preferred window size.
const PIXELS_PER_CM: f64 = 2.0;

pub trait Layer {
    fn draw(&self, cr: &Context, frame: &Frame) -> Result<(), cairo::Error>;
}

/// Screen layout of one figure.
///
/// `plot` and `colorbar` are in surface pixels with y growing downwards;
/// `extent` is the displayed data rectangle in centimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub width: f64,
    pub height: f64,
    pub plot: Rect,
    pub colorbar: Rect,
    pub extent: Rect,
}

impl Frame {
    pub fn new(width: f64, height: f64, extent: Rect) -> Self {
        let avail_w = (width - MARGIN_LEFT - MARGIN_RIGHT).max(1.0);
        let avail_h = (height - MARGIN_TOP - MARGIN_BOTTOM).max(1.0);
        let aspect = extent.width() / extent.height();

        let (plot_w, plot_h) = if avail_w / avail_h > aspect {
            (avail_h * aspect, avail_h)
        } else {
            (avail_w, avail_w / aspect)
        };
        let left = MARGIN_LEFT + (avail_w - plot_w) / 2.0;
        let top = MARGIN_TOP + (avail_h - plot_h) / 2.0;
        let plot = Rect::new(left, top, left + plot_w, top + plot_h);

        let bar_h = plot_h * COLORBAR_SHRINK;
        let bar_left = plot.max_x + COLORBAR_GAP;
        let bar_top = top + (plot_h - bar_h) / 2.0;
        let colorbar = Rect::new(bar_left, bar_top, bar_left + COLORBAR_WIDTH, bar_top + bar_h);

        Self {
            width,
            height,
            plot,
            colorbar,
            extent,
        }
    }

    pub fn to_screen(&self, x: f64, y: f64) -> (f64, f64) {
        let sx = self.extent.map_coord_x(x, self.plot.min_x, self.plot.max_x);
        let sy = self.plot.max_y - self.extent.map_coord_y(y, 0.0, self.plot.height());
        (sx, sy)
    }
}

pub struct Figure {
    title: String,
    extent: Rect,
    layers: Vec<(Rc<dyn Layer>, usize)>,
}

impl Figure {
    pub fn new(title: impl Into<String>, extent: Rect) -> Self {
        Self {
            title: title.into(),
            extent,
            layers: Vec::new(),
        }
    }

    pub fn add_layer(&mut self, layer: Rc<dyn Layer>, z_index: usize) {
        self.layers.push((layer, z_index));
        self.layers.sort_by_key(|(_, z_index)| *z_index);
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn extent(&self) -> Rect {
        self.extent
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn preferred_size(&self) -> (i32, i32) {
        let width = self.extent.width() * PIXELS_PER_CM + MARGIN_LEFT + MARGIN_RIGHT;
        let height = self.extent.height() * PIXELS_PER_CM + MARGIN_TOP + MARGIN_BOTTOM;
        (width.clamp(320.0, 1600.0) as i32, height.clamp(240.0, 1000.0) as i32)
    }

    pub fn draw(&self, cr: &Context, width: f64, height: f64) -> Result<(), cairo::Error> {
        cr.set_source_rgb(1.0, 1.0, 1.0);
        cr.paint()?;

        let frame = Frame::new(width, height, self.extent);
        for (layer, _) in &self.layers {
            layer.draw(cr, &frame)?;
        }
        Ok(())
    }

    pub fn render(&self, width: i32, height: i32) -> Result<ImageSurface, cairo::Error> {
        let surface = ImageSurface::create(Format::ARgb32, width, height)?;
        {
            let cr = Context::new(&surface)?;
            self.draw(&cr, width as f64, height as f64)?;
        }
        surface.flush();
        Ok(surface)
    }
}

pub struct Visualizer {
    app: Application,
    figures: Vec<Figure>,
}

impl Visualizer {
    pub fn new() -> Self {
        let app = Application::builder()
            .application_id("dev.wallheatmap.viewer")
            .flags(ApplicationFlags::NON_UNIQUE)
            .build();
        Self {
            app,
            figures: Vec::new(),
        }
    }

    pub fn add_figure(&mut self, figure: Figure) {
        self.figures.push(figure);
    }

    /// Opens one window per figure and blocks until all are closed.
    pub fn run(self) -> ExitCode {
        let figures: Vec<Rc<Figure>> = self.figures.into_iter().map(Rc::new).collect();
        info!("Showing {} figure(s)", figures.len());

        self.app.connect_activate(move |app| {
            for figure in &figures {
                let (width, height) = figure.preferred_size();
                let window = ApplicationWindow::builder()
                    .application(app)
                    .default_width(width)
                    .default_height(height)
                    .title(figure.title())
                    .build();

                let drawing_area = DrawingArea::new();
                drawing_area.set_draw_func({
                    let figure = Rc::clone(figure);
                    move |_, cr, width, height| {
                        if let Err(e) = figure.draw(cr, width as f64, height as f64) {
                            error!("Failed to draw {:?}: {e}", figure.title());
                        }
                    }
                });

                window.set_child(Some(&drawing_area));
                window.present();
            }
        });

        // Command line arguments belong to the caller, not to GTK.
        self.app.run_with_args::<&str>(&[])
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Recorder {
        calls: Rc<Cell<Vec<usize>>>,
        id: usize,
    }

    impl Layer for Recorder {
        fn draw(&self, _cr: &Context, _frame: &Frame) -> Result<(), cairo::Error> {
            let mut calls = self.calls.take();
            calls.push(self.id);
            self.calls.set(calls);
            Ok(())
        }
    }

    #[test]
    fn frame_keeps_equal_aspect() {
        let extent = Rect::new(0.0, 0.0, 100.0, 250.0);
        let frame = Frame::new(800.0, 600.0, extent);
        let ratio = frame.plot.width() / frame.plot.height();
        assert!((ratio - 0.4).abs() < 1e-9);
        assert!(frame.plot.min_x >= MARGIN_LEFT);
        assert!(frame.colorbar.max_x <= 800.0);
        assert!((frame.colorbar.height() - 0.8 * frame.plot.height()).abs() < 1e-9);
    }

    #[test]
    fn to_screen_flips_vertical_axis() {
        let extent = Rect::new(10.0, 0.0, 110.0, 250.0);
        let frame = Frame::new(800.0, 600.0, extent);
        assert_eq!(frame.to_screen(10.0, 0.0), (frame.plot.min_x, frame.plot.max_y));
        let (x, y) = frame.to_screen(110.0, 250.0);
        assert!((x - frame.plot.max_x).abs() < 1e-9);
        assert!((y - frame.plot.min_y).abs() < 1e-9);
    }

    #[test]
    fn layers_draw_in_z_order() {
        let calls = Rc::new(Cell::new(Vec::new()));
        let mut figure = Figure::new("Layers", Rect::new(0.0, 0.0, 30.0, 250.0));
        for (id, z) in [(0, 2), (1, 0), (2, 1)] {
            let layer = Recorder {
                calls: Rc::clone(&calls),
                id,
            };
            figure.add_layer(Rc::new(layer), z);
        }
        figure.render(200, 300).unwrap();
        assert_eq!(calls.take(), vec![1, 2, 0]);
    }
}

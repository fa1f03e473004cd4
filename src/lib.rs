pub mod colormap;
pub mod error;
pub mod geometry;
pub mod measurement;
pub mod plot;
pub mod triangulation;
pub mod window;

pub use error::PlotError;
pub use measurement::{Measurement, MeasurementTable};
pub use plot::{create_plots_wall, show_wall_plots, PlotOptions, WallPlots};

use std::fmt;

use gtk4::cairo;

#[derive(Debug)]
pub enum PlotError {
    /// No rows for the requested room/wall pair.
    EmptySelection { room: String, wall: String },
    /// Rows exist but the sample positions do not span a triangle.
    DegenerateSelection { samples: usize },
    Csv(csv::Error),
    Cairo(cairo::Error),
    SurfaceBorrow(cairo::BorrowError),
}

impl fmt::Display for PlotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotError::EmptySelection { room, wall } => {
                write!(f, "no measurements for room {room:?}, wall {wall:?}")
            }
            PlotError::DegenerateSelection { samples } => write!(
                f,
                "{samples} sample(s) do not span an area, need at least 3 non-collinear points"
            ),
            PlotError::Csv(e) => write!(f, "failed to read measurements: {e}"),
            PlotError::Cairo(e) => write!(f, "rendering failed: {e}"),
            PlotError::SurfaceBorrow(e) => write!(f, "image surface unavailable: {e}"),
        }
    }
}

impl std::error::Error for PlotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlotError::Csv(e) => Some(e),
            PlotError::Cairo(e) => Some(e),
            PlotError::SurfaceBorrow(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for PlotError {
    fn from(e: csv::Error) -> Self {
        PlotError::Csv(e)
    }
}

impl From<cairo::Error> for PlotError {
    fn from(e: cairo::Error) -> Self {
        PlotError::Cairo(e)
    }
}

impl From<cairo::BorrowError> for PlotError {
    fn from(e: cairo::BorrowError) -> Self {
        PlotError::SurfaceBorrow(e)
    }
}

pub type Result<T> = std::result::Result<T, PlotError>;

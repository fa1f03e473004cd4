use anyhow::{bail, Context, Result};
use log::{info, warn};
use wall_heatmap::{create_plots_wall, show_wall_plots, MeasurementTable, PlotOptions};

const USAGE: &str = "usage: wall-heatmap <measurements.csv> [<room> <wall>] [--no-scatter] [--no-x-labels]";

struct Args {
    path: String,
    wall: Option<(String, String)>,
    options: PlotOptions,
}

fn parse_args() -> Result<Args> {
    let mut options = PlotOptions::default();
    let mut positional = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--no-scatter" => options.with_scatter = false,
            "--no-x-labels" => options.with_x_labels = false,
            "-h" | "--help" => bail!(USAGE),
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let path = positional.next().context(USAGE)?;
    let wall = match (positional.next(), positional.next()) {
        (Some(room), Some(wall)) => Some((room, wall)),
        (None, None) => None,
        _ => bail!("room and wall must be given together\n{USAGE}"),
    };
    if positional.next().is_some() {
        bail!("too many arguments\n{USAGE}");
    }

    Ok(Args {
        path,
        wall,
        options,
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    let table = MeasurementTable::read_csv(&args.path)
        .with_context(|| format!("reading {}", args.path))?;

    let walls: Vec<(String, String)> = match args.wall {
        Some(wall) => vec![wall],
        None => table
            .walls()
            .into_iter()
            .map(|(room, wall)| (room.to_owned(), wall.to_owned()))
            .collect(),
    };
    if table.is_empty() {
        warn!("{} contains no measurements", args.path);
    }

    for (room, wall) in &walls {
        let plots = create_plots_wall(&table, room, wall, args.options)
            .with_context(|| format!("plotting {room}, {wall}"))?;
        let code = show_wall_plots(plots);
        if code != gtk4::glib::ExitCode::SUCCESS {
            bail!("viewer exited with {code:?}");
        }
        info!("Closed plots of {room}, {wall}");
    }

    Ok(())
}

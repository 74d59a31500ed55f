//! Command-line surface of the `waffle-rank` binary.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::Parser;

use crate::config::{ChartConfig, FigureSize, StyleConfig};
use crate::dataset::{ColumnMapping, ColumnRef, LoadOptions, TieBreak};
use crate::layout::{LayoutConfig, StripAxis};
use crate::render::colors::Colormap;

/// Draw a waffle chart of a CSV leaderboard.
#[derive(Parser, Debug, Clone)]
#[command(name = "waffle-rank", version, about)]
pub struct Args {
    /// Highest rank included in the tiling
    #[arg(short = 'm', long, default_value_t = 10)]
    pub maxrank: u32,

    /// Path to the source CSV (also accepted as `-src`)
    #[arg(long, default_value = "waffle.csv")]
    pub source: PathBuf,

    /// Save the chart to this file (.png, .jpg, .bmp or .svg) instead of opening a window
    #[arg(short = 'f', long)]
    pub fig: Option<PathBuf>,

    /// Figure size in inches: `N` for a square figure or `WxH`.
    ///
    /// The default of 10 in at 100 dpi gives a 1000 px canvas that fits on
    /// common screens; `-s 20 --dpi 50` draws a 20 in figure at that size.
    #[arg(short = 's', long, default_value_t = FigureSize::default(), allow_hyphen_values = true)]
    pub figsize: FigureSize,

    /// Pixels per inch
    #[arg(long, default_value_t = 100.0)]
    pub dpi: f64,

    /// Label every tile with `name=count`
    #[arg(short = 't', long)]
    pub textboxes: bool,

    /// Do not draw the legend (also accepted as `-nl`)
    #[arg(long)]
    pub no_legend: bool,

    /// Do not draw grid lines (also accepted as `-ng`)
    #[arg(long)]
    pub no_grid: bool,

    /// Column holding the entrant name: a header name or a 0-based index
    #[arg(long, default_value = "username")]
    pub name_column: ColumnRef,

    /// Column holding the count: a header name or a 0-based index
    #[arg(long, default_value = "waffles")]
    pub count_column: ColumnRef,

    /// The CSV has no header row; columns given by name fall back to the
    /// event-log layout (uid, waffles, time, username). With the default
    /// columns a headerless event log is also detected automatically.
    #[arg(long)]
    pub no_headers: bool,

    /// Order of entrants with equal counts: input-order or name
    #[arg(long, default_value_t = TieBreak::InputOrder)]
    pub tie_break: TieBreak,

    /// Strip direction: alternate, rows or columns
    #[arg(long, default_value_t = StripAxis::Alternate)]
    pub strips: StripAxis,

    /// Tile colormap: ncar or hue
    #[arg(long, default_value_t = Colormap::Ncar)]
    pub colormap: Colormap,

    /// TrueType font for the legend and labels
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Parse process arguments, accepting the single-dash long flags.
    pub fn parse_env() -> Self {
        Self::parse_from(normalize_legacy_flags(std::env::args_os()))
    }

    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_legacy_flags(args.into_iter().map(Into::into)))
    }

    pub fn load_options(&self) -> LoadOptions {
        let columns = if self.no_headers {
            // Without a header row names cannot resolve; fall back to the
            // event-log layout for any column given by name.
            let event_log = ColumnMapping::event_log();
            ColumnMapping {
                name: index_or(&self.name_column, event_log.name),
                count: index_or(&self.count_column, event_log.count),
            }
        } else {
            ColumnMapping {
                name: self.name_column.clone(),
                count: self.count_column.clone(),
            }
        };
        LoadOptions {
            columns,
            has_headers: !self.no_headers,
            tie_break: self.tie_break,
        }
    }

    pub fn chart_config(&self) -> ChartConfig {
        ChartConfig {
            figure: self.figsize,
            dpi: self.dpi,
            show_legend: !self.no_legend,
            show_grid: !self.no_grid,
            layout: LayoutConfig {
                strip_axis: self.strips,
                textboxes: self.textboxes,
                ..LayoutConfig::default()
            },
            style: StyleConfig {
                colormap: self.colormap,
                font_path: self.font.clone(),
                ..StyleConfig::default()
            },
        }
    }

    /// Default tracing directive for the chosen verbosity.
    pub fn log_directive(&self) -> &'static str {
        match self.verbose {
            0 => "waffle_rank=info",
            1 => "waffle_rank=debug",
            _ => "waffle_rank=trace",
        }
    }
}

fn index_or(column: &ColumnRef, fallback: ColumnRef) -> ColumnRef {
    match column {
        ColumnRef::Index(_) => column.clone(),
        ColumnRef::Name(_) => fallback,
    }
}

/// Rewrite `-src`, `-nl` and `-ng` to their long forms; clap only takes
/// single-character short flags.
pub fn normalize_legacy_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    let mut out = Vec::new();
    let mut after_separator = false;
    for arg in args {
        if after_separator {
            out.push(arg);
            continue;
        }
        let Some(text) = arg.to_str() else {
            out.push(arg);
            continue;
        };
        match text {
            "--" => {
                after_separator = true;
                out.push(arg);
            }
            "-src" => out.push("--source".into()),
            "-nl" => out.push("--no-legend".into()),
            "-ng" => out.push("--no-grid".into()),
            _ => match text.strip_prefix("-src=") {
                Some(value) => out.push(format!("--source={value}").into()),
                None => out.push(arg),
            },
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_args(std::iter::once("waffle-rank").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let args = parse(&[]);
        assert_eq!(args.maxrank, 10);
        assert_eq!(args.source, PathBuf::from("waffle.csv"));
        assert!(args.fig.is_none());
        assert_eq!(args.figsize, FigureSize::default());
        assert!(!args.textboxes);
        assert!(!args.no_legend);
        assert!(!args.no_grid);

        let config = args.chart_config();
        assert!(config.show_legend);
        assert!(config.show_grid);
        assert_eq!(config.canvas_size(), (1000.0, 1000.0));
    }

    #[test]
    fn short_and_legacy_flags() {
        let args = parse(&["-m", "3", "-src", "board.csv", "-f", "out.png", "-s", "8x6", "-t", "-nl", "-ng"]);
        assert_eq!(args.maxrank, 3);
        assert_eq!(args.source, PathBuf::from("board.csv"));
        assert_eq!(args.fig, Some(PathBuf::from("out.png")));
        assert_eq!(
            args.figsize,
            FigureSize {
                width: 8.0,
                height: 6.0
            }
        );
        assert!(args.textboxes);
        assert!(args.no_legend);
        assert!(args.no_grid);

        let config = args.chart_config();
        assert!(!config.show_legend);
        assert!(!config.show_grid);
        assert!(config.layout.textboxes);
    }

    #[test]
    fn long_flags_and_equals_form() {
        let args = parse(&["--maxrank", "5", "-src=x.csv", "--no-legend", "--figsize", "12"]);
        assert_eq!(args.maxrank, 5);
        assert_eq!(args.source, PathBuf::from("x.csv"));
        assert!(args.no_legend);
        assert_eq!(args.figsize, FigureSize::square(12.0));
    }

    #[test]
    fn zero_maxrank_parses_and_is_left_to_the_layout_engine() {
        assert_eq!(parse(&["-m", "0"]).maxrank, 0);
        assert!(Args::try_parse_args(["waffle-rank", "-m", "-1"]).is_err());
    }

    #[test]
    fn negative_figsize_reaches_the_layout_engine() {
        assert_eq!(parse(&["-s", "-5"]).figsize, FigureSize::square(-5.0));
    }

    #[test]
    fn legacy_rewrite_stops_at_separator() {
        let out = normalize_legacy_flags(["prog", "-nl", "--", "-ng"].map(OsString::from));
        assert_eq!(out, ["prog", "--no-legend", "--", "-ng"].map(OsString::from));
    }

    #[test]
    fn headerless_defaults_to_event_log_columns() {
        let options = parse(&["--no-headers"]).load_options();
        assert!(!options.has_headers);
        assert_eq!(options.columns.name, ColumnRef::Index(3));
        assert_eq!(options.columns.count, ColumnRef::Index(1));

        let options = parse(&["--no-headers", "--name-column", "0", "--count-column", "2"]).load_options();
        assert_eq!(options.columns.name, ColumnRef::Index(0));
        assert_eq!(options.columns.count, ColumnRef::Index(2));
    }

    #[test]
    fn default_options_read_a_headerless_event_log() {
        let csv = "\
1,2,2019-01-03 09:00:00,alice
2,1,2019-01-03 09:05:00,bob
";
        let options = parse(&[]).load_options();
        let ds = crate::dataset::load_reader(csv.as_bytes(), &options).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records()[0].name, "alice");
        assert_eq!(ds.records()[0].count, 2);
    }

    #[test]
    fn layout_and_style_options() {
        let args = parse(&["--strips", "rows", "--tie-break", "name", "--colormap", "hue", "-vv"]);
        let config = args.chart_config();
        assert_eq!(config.layout.strip_axis, StripAxis::Rows);
        assert_eq!(config.style.colormap, Colormap::Hue);
        assert_eq!(args.load_options().tie_break, TieBreak::Name);
        assert_eq!(args.log_directive(), "waffle_rank=trace");
    }
}

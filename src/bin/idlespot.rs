use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use clap::Parser;
use idlespot::{
    ClusterConfig, EventWindow, HotspotClusterer, HotspotSink, IdleEvent, IdleSpotResult,
    IdlingReportPage, JsonSink, KmlFile, TextSink, DEFAULT_HISTORY_HOURS, DEFAULT_RADIUS_MILES,
    DEFAULT_TOP_K, EARTH_RADIUS_MILES,
};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::{
    fmt::{self, Display},
    fs::File,
    io::{self, BufReader, BufWriter},
    path::PathBuf,
};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

const KML_NEEDS_OUTPUT: &str = "An output file is required for kml output";

/*-------------------------------------------------------------------------------------------------
 *                               Parse Command Line Arguments
 *-----------------------------------------------------------------------------------------------*/
///
/// Find the places where vehicles spend the most time idling.
///
/// This program reads saved pages of the vehicle idling report, groups idling events that are
/// within a few miles of each other, and reports the largest groups.
///
#[derive(Debug, Parser)]
#[clap(name = "idlespot")]
#[clap(author, version, about)]
struct IdleSpotOptionsInit {
    /// Idling report pages (JSON) in the order they were retrieved.
    #[clap(required = true)]
    inputs: Vec<PathBuf>,

    /// Events within this many miles of a cluster center join the cluster.
    #[clap(short, long)]
    #[clap(env = "IDLESPOT_RADIUS_MILES")]
    #[clap(default_value_t = DEFAULT_RADIUS_MILES)]
    radius: f64,

    /// The number of hotspots to report.
    #[clap(short, long)]
    #[clap(env = "IDLESPOT_TOP_K")]
    #[clap(default_value_t = DEFAULT_TOP_K)]
    top_k: usize,

    /// Only use events that started this many hours before the end time. When only --end is
    /// given this defaults to 8 hours, with neither option every event is used.
    #[clap(long)]
    hours: Option<i64>,

    /// The end time (UTC) for the time window in the format YYYY-MM-DD-HH, defaults to now.
    #[clap(long, parse(try_from_str=parse_datetime))]
    end: Option<DateTime<Utc>>,

    /// Output format, one of text, json, or kml.
    #[clap(short, long, parse(try_from_str=parse_format))]
    #[clap(default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Where to write the report. Defaults to standard output, required for kml.
    #[clap(short, long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[clap(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, EnumIter, EnumString, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "lowercase")]
enum OutputFormat {
    Text,
    Json,
    Kml,
}

impl OutputFormat {
    /// All the format names, for error messages.
    fn names() -> String {
        OutputFormat::iter()
            .map(Into::<&'static str>::into)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Parse a command line format name.
fn parse_format(fmt_str: &str) -> Result<OutputFormat, String> {
    fmt_str.to_lowercase().parse().map_err(|_| {
        format!(
            "unknown format {}, expected one of {}",
            fmt_str,
            OutputFormat::names()
        )
    })
}

/// Parse a command line datetime
fn parse_datetime(dt_str: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    const TIME_FORMAT: &str = "%Y-%m-%d-%H:%M:%S";
    let t_str = format!("{}:00:00", dt_str);

    let naive = NaiveDateTime::parse_from_str(&t_str, TIME_FORMAT)?;
    Ok(Utc.from_utc_datetime(&naive))
}

#[derive(Debug)]
struct IdleSpotOptionsChecked {
    /// Report pages to load.
    inputs: Vec<PathBuf>,

    /// Clustering parameters.
    config: ClusterConfig,

    /// Time window events must start in, if any.
    window: Option<EventWindow>,

    /// Output format.
    format: OutputFormat,

    /// Output destination, None for stdout.
    output: Option<PathBuf>,
}

impl Display for IdleSpotOptionsChecked {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        writeln!(f, "\n")?; // yes, two blank lines.
        for input in &self.inputs {
            writeln!(f, "       Input: {}", input.display())?;
        }
        writeln!(f, "      Radius: {:.2} miles", self.config.radius_miles)?;
        writeln!(f, "       Top K: {}", self.config.top_k)?;
        match self.window {
            Some(EventWindow { start, end }) => {
                writeln!(f, "Window Start: {}", start)?;
                writeln!(f, "  Window End: {}", end)?;
            }
            None => writeln!(f, "      Window: all events")?,
        }
        writeln!(f, "      Format: {}", self.format)?;
        match self.output {
            Some(ref output) => writeln!(f, "      Output: {}", output.display())?,
            None => writeln!(f, "      Output: stdout")?,
        }
        writeln!(f, "\n")?; // yes, two blank lines.

        Ok(())
    }
}

/// Get the command line arguments and check them.
fn parse_args() -> IdleSpotResult<IdleSpotOptionsChecked> {
    let IdleSpotOptionsInit {
        inputs,
        radius,
        top_k,
        hours,
        end,
        format,
        output,
        verbose,
    } = IdleSpotOptionsInit::parse();

    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new().with_level(level).init()?;

    if format == OutputFormat::Kml && output.is_none() {
        return Err(KML_NEEDS_OUTPUT.into());
    }

    let window = match (hours, end) {
        (Some(hours), end) => Some(EventWindow::past_hours(
            end.unwrap_or_else(Utc::now),
            hours,
        )?),
        (None, Some(end)) => Some(EventWindow::past_hours(end, DEFAULT_HISTORY_HOURS)?),
        (None, None) => None,
    };

    let checked = IdleSpotOptionsChecked {
        inputs,
        config: ClusterConfig {
            radius_miles: radius,
            top_k,
            earth_radius_miles: EARTH_RADIUS_MILES,
        },
        window,
        format,
        output,
    };

    if verbose {
        println!("{}", checked);
    }

    Ok(checked)
}

/// Load every page in order and collect the events.
fn load_events(inputs: &[PathBuf]) -> IdleSpotResult<Vec<IdleEvent>> {
    let mut events = vec![];

    for (idx, input) in inputs.iter().enumerate() {
        let f = File::open(input)?;
        let page = IdlingReportPage::from_reader(BufReader::new(f))?;

        if idx + 1 == inputs.len() {
            if let Some(cursor) = page.next_cursor() {
                log::warn!(
                    "{} says more pages follow (cursor {}), the report may be incomplete",
                    input.display(),
                    cursor
                );
            }
        }

        let page_events = page.into_events();
        log::debug!("{} idling report(s) in {}", page_events.len(), input.display());
        events.extend(page_events);
    }

    Ok(events)
}

/*-------------------------------------------------------------------------------------------------
 *                                             MAIN
 *-----------------------------------------------------------------------------------------------*/
fn main() -> IdleSpotResult<()> {
    let opts = parse_args()?;

    let clusterer = HotspotClusterer::new(opts.config)?;
    log::debug!(
        "clustering within {} miles, keeping the top {}",
        clusterer.config().radius_miles,
        clusterer.config().top_k
    );

    let mut events = load_events(&opts.inputs)?;
    log::info!("Found {} idling report(s)", events.len());

    if let Some(window) = opts.window {
        window.retain_window(&mut events);
    }

    let hotspots = clusterer.rank(events)?;
    log::info!("Reporting {} hotspot(s)", hotspots.len());

    let mut sink: Box<dyn HotspotSink> = match (opts.format, opts.output) {
        (OutputFormat::Kml, Some(path)) => Box::new(KmlFile::create(path)?),
        (OutputFormat::Text, Some(path)) => Box::new(TextSink(create_output(path)?)),
        (OutputFormat::Json, Some(path)) => Box::new(JsonSink(create_output(path)?)),
        (OutputFormat::Text, None) => Box::new(TextSink(io::stdout())),
        (OutputFormat::Json, None) => Box::new(JsonSink(io::stdout())),
        (OutputFormat::Kml, None) => return Err(KML_NEEDS_OUTPUT.into()),
    };

    sink.deliver(&hotspots)?;

    Ok(())
}

fn create_output(path: PathBuf) -> IdleSpotResult<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}

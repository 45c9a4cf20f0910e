use std::fmt;
use std::fmt::Write as _;
use std::io::IsTerminal;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::{format::Writer, FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;

/// ANSI color codes for console output
const COLOR_RESET: &str = "\x1b[0m";
const COLOR_CYAN: &str = "\x1b[36m";
const COLOR_GREEN: &str = "\x1b[32m";
const COLOR_BRIGHT_YELLOW: &str = "\x1b[93m";
const COLOR_BRIGHT_RED: &str = "\x1b[91m";
const COLOR_BRIGHT_GRAY: &str = "\x1b[90m";

/// Column widths for alignment
const COMPONENT_WIDTH: usize = 16;
const LOG_LEVEL_WIDTH: usize = 7;

/// Crates whose events are shown at the configured level
const PROTON_TARGETS: [&str; 3] = ["proton_send", "proton_engine", "proton_object"];

/// Formatter printing `[timestamp] [component] [level] message key=value...`
pub struct ProtonLogFormatter {
    program: String,
    color_enabled: bool,
}

/// Log at info level tagged with a component
#[macro_export]
macro_rules! component_info {
    ($component:expr, $($arg:tt)*) => {
        tracing::info!(component = $component, $($arg)*)
    };
}

/// Log at warn level tagged with a component
#[macro_export]
macro_rules! component_warn {
    ($component:expr, $($arg:tt)*) => {
        tracing::warn!(component = $component, $($arg)*)
    };
}

/// Log at debug level tagged with a component
#[macro_export]
macro_rules! component_debug {
    ($component:expr, $($arg:tt)*) => {
        tracing::debug!(component = $component, $($arg)*)
    };
}

/// Level for proton crates: the flag, else `PROTON_LOG`, else info
pub fn level_from(flag: Option<&str>, lookup: impl Fn(&str) -> Option<String>) -> String {
    flag.map(str::to_string)
        .or_else(|| lookup("PROTON_LOG"))
        .unwrap_or_else(|| "info".to_string())
}

/// Install the global subscriber. `RUST_LOG` wins over `level` when set.
pub fn init(program: &str, level: &str) -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => filter_for(level)?,
    };

    let formatter = ProtonLogFormatter::new(program.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(formatter.color_enabled)
        .event_format(formatter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {}", e))
}

/// Filter showing proton crates at `level` and everything else at warn
fn filter_for(level: &str) -> anyhow::Result<EnvFilter> {
    let mut filter = EnvFilter::new("warn");
    for target in PROTON_TARGETS {
        filter = filter.add_directive(format!("{}={}", target, level).parse()?);
    }
    Ok(filter)
}

impl ProtonLogFormatter {
    pub fn new(program: String) -> Self {
        Self {
            program,
            color_enabled: std::io::stderr().is_terminal() && std::env::var("TERM").map_or(false, |t| t != "dumb"),
        }
    }

    /// Component column, padded or truncated to a fixed width
    fn format_component(&self, component: Option<&str>) -> String {
        let name = match component {
            Some(component) => format!("{}-{}", self.program, component),
            None => self.program.clone(),
        };

        if name.chars().count() > COMPONENT_WIDTH {
            let truncated: String = name.chars().take(COMPONENT_WIDTH - 1).collect();
            format!("{}…", truncated)
        } else {
            format!("{:<width$}", name, width = COMPONENT_WIDTH)
        }
    }

    fn format_log_level(&self, level: &tracing::Level) -> String {
        let level_str = match *level {
            tracing::Level::ERROR => "✗ ERROR",
            tracing::Level::WARN => "⚠ WARN",
            tracing::Level::INFO => "ℹ INFO",
            tracing::Level::DEBUG => "◦ DEBUG",
            tracing::Level::TRACE => "◦ TRACE",
        };
        format!("{:<width$}", level_str, width = LOG_LEVEL_WIDTH + 2)
    }

    fn color_for_level(&self, level: &tracing::Level) -> &'static str {
        if !self.color_enabled {
            return "";
        }

        match *level {
            tracing::Level::ERROR => COLOR_BRIGHT_RED,
            tracing::Level::WARN => COLOR_BRIGHT_YELLOW,
            tracing::Level::INFO => COLOR_GREEN,
            tracing::Level::DEBUG | tracing::Level::TRACE => COLOR_BRIGHT_GRAY,
        }
    }
}

impl<S, N> FormatEvent<S, N> for ProtonLogFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(&self, _ctx: &FmtContext<'_, S, N>, mut writer: Writer<'_>, event: &Event<'_>) -> fmt::Result {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let level = event.metadata().level();

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let component = self.format_component(visitor.component.as_deref());
        let formatted_level = self.format_log_level(level);
        let color = self.color_for_level(level);
        let reset = if self.color_enabled { COLOR_RESET } else { "" };
        let cyan = if self.color_enabled { COLOR_CYAN } else { "" };

        write!(
            writer,
            "{}[{}] [{}] [{}{}{}] ",
            cyan, timestamp, component, color, formatted_level, reset
        )?;
        writeln!(writer, "{}{}{}", visitor.message, visitor.fields, reset)
    }
}

/// Collects the message, the component tag and remaining fields
#[derive(Default)]
struct FieldVisitor {
    message: String,
    component: Option<String>,
    fields: String,
}

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn fmt::Debug) {
        match field.name() {
            "message" => self.message = format!("{:?}", value),
            "component" => self.component = Some(format!("{:?}", value).trim_matches('"').to_string()),
            name => {
                let _ = write!(self.fields, " {}={:?}", name, value);
            }
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "component" => self.component = Some(value.to_string()),
            name => {
                let _ = write!(self.fields, " {}={}", name, value);
            }
        }
    }
}

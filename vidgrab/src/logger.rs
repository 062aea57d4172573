use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter, Metadata, Record};
use std::path::Path;

pub struct Logger;

static LOGGER: Logger = Logger;

impl Logger {
    /// Installs the logger once. Later calls only adjust the level.
    pub fn init(level: LevelFilter) {
        let _ = log::set_logger(&LOGGER);
        log::set_max_level(level);
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let line = render(record, log::max_level() >= LevelFilter::Debug);

        // Keeps stdout for menu screens and the progress line.
        if record.level() <= Level::Warn {
            eprintln!("{}", line);
        } else {
            println!("{}", line);
        }
    }

    fn flush(&self) {}
}

/// Info records print bare unless `verbose`, which also adds the source location.
fn render(record: &Record, verbose: bool) -> String {
    if !verbose {
        return match record.level() {
            Level::Info => record.args().to_string(),
            level => format!("{} {}", label(level), record.args()),
        };
    }

    let location = match (record.file(), record.line()) {
        (Some(file), Some(line)) => {
            let file = Path::new(file)
                .file_name()
                .map_or_else(|| file.into(), |x| x.to_string_lossy());
            format!("[{}:{}]", file, line)
        }
        _ => "[unk]".to_owned(),
    };

    format!(
        "{} {} {} {}",
        label(record.level()),
        record.target().dimmed(),
        location.dimmed(),
        record.args()
    )
}

fn label(level: Level) -> ColoredString {
    match level {
        Level::Debug => "[DEBUG]".bold().blue(),
        Level::Error => "[ERROR]".bold().red(),
        Level::Info => "[INFO]".bold().green(),
        Level::Trace => "[TRACE]".bold().purple(),
        Level::Warn => "[WARN]".bold().yellow(),
    }
}

use colored::Colorize;
use std::{
    io::{IsTerminal, stdout},
    process,
};
use vidgrab::{
    App, Settings, System, Terminal, logger::Logger, menu, progress::TerminalSink,
};

fn run() -> anyhow::Result<()> {
    let settings = Settings::from_env();

    if !stdout().is_terminal() {
        colored::control::set_override(false);
    }

    Logger::init(settings.log_level);

    ctrlc::set_handler(|| {
        println!("\n{}", menu::INTERRUPTED);
        process::exit(0);
    })?;

    App::new(
        System::new(&settings),
        Terminal::new(settings.raw_prompts),
        TerminalSink::stdout(),
    )
    .run()?;

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".bold().red(), e);
        process::exit(1);
    }
}

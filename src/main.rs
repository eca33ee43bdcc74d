use std::env;
use std::fs;
use std::io::{self, Write};

use colored::Colorize;
use keycalc::config::{paint, Colours, Settings};
use keycalc::format::{format_number, MAX_DIGITS};
use keycalc::keymap::{label_for_key, split_line};
use keycalc::selftest::run_tests;
use keycalc::session::ERROR_TEXT;
use keycalc::token::LABELS;
use keycalc::{calculate, CalculatorSession};
use rustyline::{error::ReadlineError, Config, DefaultEditor};
use termion::event::Key;
use termion::input::TermRead;
use termion::raw::IntoRawMode;
use tracing::{debug, warn};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, reload, Registry};

type LogHandle = reload::Handle<LevelFilter, Registry>;

fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    let log = init_logging(settings.debug);
    let colours = settings.colours;
    let mut session = CalculatorSession::with_digits(settings.digits);

    if env::args().skip(1).any(|arg| arg == "--keypad") {
        return run_keypad(&mut session, &colours);
    }

    let config = Config::builder().build();
    let mut rl = DefaultEditor::with_config(config)?;
    let history = if settings.history {
        Settings::history_path()
    } else {
        None
    };
    if let Some(path) = &history {
        if let Err(err) = rl.load_history(path) {
            debug!(%err, path = %path.display(), "no history loaded");
        }
    }

    let mut debug = settings.debug;
    print_display(&session, &colours);

    loop {
        let readline = rl.readline("> ");
        match readline {
            Ok(line) => {
                if line.is_empty() {
                    println!("Goodbye!");
                    break;
                }
                rl.add_history_entry(line.as_str())?;

                if let Some(command) = line.trim().strip_prefix(':') {
                    match run_command(command, &mut session, &log, &mut debug, &colours) {
                        Ok(message) => println!("{}", paint(&message, colours.message)),
                        Err(message) => println!("{}", paint(&message, colours.error)),
                    }
                    continue;
                }

                for label in split_line(&line) {
                    session.process_input(&label);
                }
                print_display(&session, &colours);
            }
            Err(ReadlineError::Interrupted) => {
                println!("Pressing enter with no input will exit as well.");
                break;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("{:?}", err);
                break;
            }
        }
    }

    if let Some(path) = &history {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        if let Err(err) = rl.save_history(path) {
            warn!(%err, path = %path.display(), "could not save history");
        }
    }

    Ok(())
}

fn init_logging(debug: bool) -> LogHandle {
    let (filter, handle) = reload::Layer::new(log_level(debug));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .init();
    handle
}

fn log_level(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    }
}

fn run_command(
    command: &str,
    session: &mut CalculatorSession,
    log: &LogHandle,
    debug: &mut bool,
    colours: &Colours,
) -> Result<String, String> {
    let (name, argument) = match command.trim().split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (command.trim(), ""),
    };

    match name {
        s if s.eq_ignore_ascii_case("test") => {
            let (passed, total) = run_tests(colours, session.digits());
            Ok(format!("{}/{} tests passed.", passed, total))
        }
        s if s.eq_ignore_ascii_case("debug") => {
            *debug = !*debug;
            log.modify(|filter| *filter = log_level(*debug))
                .map_err(|err| format!("Could not change log level: {}", err))?;
            Ok(format!("Debug {}", if *debug { "enabled" } else { "disabled" }))
        }
        s if s.eq_ignore_ascii_case("digits") => {
            let digits: usize = argument
                .parse()
                .map_err(|_| "Usage: :digits <0 to 15>".to_owned())?;
            if digits > MAX_DIGITS {
                return Err(format!("Digits must be between 0 and {}!", MAX_DIGITS));
            }
            session.set_digits(digits);
            Ok(format!("Showing {} decimal places.", digits))
        }
        s if s.eq_ignore_ascii_case("eval") => {
            if argument.is_empty() {
                return Err("Usage: :eval <expression>".to_owned());
            }
            calculate(argument)
                .map(|value| format_number(value, session.digits()))
                .map_err(|err| err.to_string())
        }
        s if s.eq_ignore_ascii_case("state") => Ok(format!(
            "stored {}  input '{}'  pending {:?}  evaluated {}  state {:?}",
            session.stored_value(),
            session.current_input(),
            session.pending_operator(),
            session.just_evaluated(),
            session.state()
        )),
        s if s.eq_ignore_ascii_case("help") => Ok(help_text()),
        _ => Err("Unknown command!".to_owned()),
    }
}

fn help_text() -> String {
    format!(
        "Keys: {}\n\
         Shortcuts: r = sqrt, p = pi, [ = a^n, ] = !, c = C\n\
         Root: type a number, r, then the degree (9r2), or r, value, degree (r92)\n\
         Commands: :test :debug :digits N :eval EXPR :state :help\n\
         Keypad mode: start with --keypad; Backspace = CE, Delete = C, Esc quits",
        LABELS.join(" ")
    )
}

fn value_colour(session: &CalculatorSession, colours: &Colours) -> (u8, u8, u8) {
    if session.current_value() == ERROR_TEXT {
        colours.error
    } else {
        colours.value
    }
}

fn print_display(session: &CalculatorSession, colours: &Colours) {
    println!("  {}", paint(session.full_expression(), colours.expression));
    println!(
        "  {}",
        paint(session.current_value(), value_colour(session, colours)).bold()
    );
}

fn run_keypad(session: &mut CalculatorSession, colours: &Colours) -> anyhow::Result<()> {
    let mut stdout = io::stdout().into_raw_mode()?;
    write!(stdout, "{}Esc quits.\r\n", termion::cursor::Hide)?;
    draw_display(&mut stdout, session, colours, false)?;

    for key in io::stdin().keys() {
        match key? {
            Key::Esc | Key::Ctrl('c') | Key::Ctrl('d') | Key::Char('q') => break,
            key => match label_for_key(key) {
                Some(label) => session.process_input(label),
                None => continue,
            },
        }
        draw_display(&mut stdout, session, colours, true)?;
    }

    write!(stdout, "\r\n{}", termion::cursor::Show)?;
    stdout.flush()?;
    Ok(())
}

fn draw_display<W: Write>(
    out: &mut W,
    session: &CalculatorSession,
    colours: &Colours,
    redraw: bool,
) -> io::Result<()> {
    if redraw {
        write!(out, "{}", termion::cursor::Up(1))?;
    }
    write!(
        out,
        "\r{}  {}\r\n{}  {}",
        termion::clear::CurrentLine,
        paint(session.full_expression(), colours.expression),
        termion::clear::CurrentLine,
        paint(session.current_value(), value_colour(session, colours)).bold()
    )?;
    out.flush()
}

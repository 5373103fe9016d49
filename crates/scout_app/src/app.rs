use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use scout_core::{update, AppState, AppViewModel, Msg, SessionState};
use scout_engine::TransportSettings;

use crate::effects::{Deferred, EffectRunner};
use crate::render;
use crate::settings::SettingsStore;

const TICK: Duration = Duration::from_millis(75);

pub(crate) struct AppOptions {
    pub base_url: Option<String>,
    pub request: String,
    pub info_fields: Vec<String>,
    pub interactive: bool,
    pub transport: TransportSettings,
    pub store: SettingsStore,
}

/// Operator input, one line at a time.
enum Command {
    Submit,
    Search(String),
    Add(String),
    Remove(String),
    Stop,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    let (word, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim().to_string();
    match word.to_ascii_lowercase().as_str() {
        "" | "submit" | "go" => Command::Submit,
        "search" if !rest.is_empty() => Command::Search(rest),
        "add" if !rest.is_empty() => Command::Add(rest),
        "remove" | "rm" if !rest.is_empty() => Command::Remove(rest),
        "stop" | "s" | "cancel" => Command::Stop,
        "quit" | "q" | "exit" => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    }
}

pub(crate) fn run(options: AppOptions) -> anyhow::Result<()> {
    if !options.interactive && options.request.trim().is_empty() {
        anyhow::bail!("no request given; pass one as arguments or use --interactive");
    }
    let persisted = options.store.load().base_url;
    let base = options.base_url.clone().or(persisted);

    let runner = EffectRunner::new(options.transport.clone(), options.store.clone());
    let input = spawn_stdin_reader();
    let mut app = App {
        state: AppState::new(),
        runner,
        input,
        printed_offers: 0,
        last_progress: None,
        stream_closed: false,
    };

    if let Some(base) = base {
        app.dispatch(Msg::EndpointLoaded(base));
    }
    for field in &options.info_fields {
        app.dispatch(Msg::InfoFieldAdded(field.clone()));
    }
    println!("Service: {}", app.state.base_url());
    if options.interactive {
        print_help();
    } else {
        println!("Type `stop` and press Enter to cancel.");
    }
    if !options.request.trim().is_empty() {
        app.dispatch(Msg::RequestChanged(options.request.clone()));
        app.dispatch(Msg::SearchSubmitted);
    }

    while app.step(options.interactive) == Step::Continue {}
    app.runner.shutdown();
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Step {
    Continue,
    Exit,
}

struct App {
    state: AppState,
    runner: EffectRunner,
    input: mpsc::Receiver<String>,
    printed_offers: usize,
    last_progress: Option<String>,
    stream_closed: bool,
}

impl App {
    fn step(&mut self, interactive: bool) -> Step {
        while let Ok(line) = self.input.try_recv() {
            match parse_command(&line) {
                Command::Quit => {
                    self.dispatch(Msg::CancelClicked);
                    return Step::Exit;
                }
                command => self.handle_command(command),
            }
        }

        match self.runner.next_msg(TICK) {
            Some(msg) => self.dispatch(msg),
            None => self.dispatch(Msg::Tick),
        }

        if !interactive && self.finished() {
            return Step::Exit;
        }
        Step::Continue
    }

    fn dispatch(&mut self, msg: Msg) {
        let ended_current = match &msg {
            Msg::StreamEnded { session_id } => self.state.active_session() == Some(session_id),
            _ => false,
        };

        let state = std::mem::take(&mut self.state);
        let previous = state.session();
        let (state, effects) = update(state, msg);
        self.state = state;
        if previous != SessionState::Running && self.state.session() == SessionState::Running {
            self.printed_offers = 0;
            self.stream_closed = false;
        }

        for deferred in self.runner.run(effects) {
            match deferred {
                Deferred::PromptForEndpoint {
                    session_id,
                    failed_base,
                } => {
                    let base = self.prompt_for_endpoint(&failed_base);
                    self.dispatch(Msg::EndpointResolved { session_id, base });
                }
            }
        }

        if self.state.consume_dirty() {
            let view = self.state.view();
            self.render(&view, previous);
        }
        if ended_current && self.state.session() == SessionState::Running {
            self.stream_closed = true;
            println!("The stream ended without a final result.");
            for line in render::summary(&self.state.view()) {
                println!("{line}");
            }
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Submit => self.dispatch(Msg::SearchSubmitted),
            Command::Search(text) => {
                self.dispatch(Msg::RequestChanged(text));
                self.dispatch(Msg::SearchSubmitted);
            }
            Command::Add(field) => self.dispatch(Msg::InfoFieldAdded(field)),
            Command::Remove(field) => self.dispatch(Msg::InfoFieldRemoved(field)),
            Command::Stop => self.dispatch(Msg::CancelClicked),
            Command::Quit => {}
            Command::Unknown(line) => {
                println!("Unknown command: {line}");
                print_help();
            }
        }
    }

    /// Blocks until the operator answers; an empty answer or closed stdin declines.
    fn prompt_for_endpoint(&self, failed_base: &str) -> Option<String> {
        println!("Could not reach the search service at {failed_base}.");
        print!("Enter a new service address (empty to give up): ");
        let _ = io::stdout().flush();
        match self.input.recv() {
            Ok(answer) if !answer.trim().is_empty() => {
                engine_info!("Operator supplied replacement address");
                Some(answer.trim().to_string())
            }
            Ok(_) => None,
            Err(_) => {
                engine_warn!("Input closed while waiting for a service address");
                None
            }
        }
    }

    /// Terminal state reached, or the stream closed while still running.
    fn finished(&self) -> bool {
        let session = self.state.session();
        session.is_terminal() || (session == SessionState::Running && self.stream_closed)
    }

    fn render(&mut self, view: &AppViewModel, previous: SessionState) {
        let progress = render::progress_line(view);
        if self.last_progress.as_deref() != Some(progress.as_str()) {
            println!("{progress}");
            self.last_progress = Some(progress);
        }

        if view.session == SessionState::Running {
            for (i, offer) in view.offers.iter().enumerate().skip(self.printed_offers) {
                println!("{}", render::format_offer(i, offer));
            }
            self.printed_offers = view.offers.len();
        }

        if view.session.is_terminal() && !previous.is_terminal() {
            for line in render::summary(view) {
                println!("{line}");
            }
        }
    }
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_help() {
    println!("Commands: search <text> | add <field> | remove <field> | submit | stop | quit");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_parsed_case_insensitively() {
        assert!(matches!(parse_command("STOP"), Command::Stop));
        assert!(matches!(parse_command(""), Command::Submit));
        assert!(matches!(parse_command("q"), Command::Quit));
        assert!(matches!(
            parse_command("search  MS21042L3 qty 10 "),
            Command::Search(text) if text == "MS21042L3 qty 10"
        ));
        assert!(matches!(parse_command("add Lead time"), Command::Add(f) if f == "Lead time"));
        assert!(matches!(parse_command("rm price"), Command::Remove(f) if f == "price"));
        assert!(matches!(parse_command("search"), Command::Unknown(_)));
        assert!(matches!(parse_command("frobnicate"), Command::Unknown(_)));
    }
}

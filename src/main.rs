use std::fs::File;
use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod gemini;
mod handler;
mod listing;
mod session;
mod tui;
mod ui;

use app::App;
use config::Config;
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let mut app = App::new(&config);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut app, &mut terminal, &mut events).await;

    tui::restore()?;
    result
}

async fn run(app: &mut App, terminal: &mut tui::Tui, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        // While a response is streaming in, race terminal events against
        // the fragment channel so typing stays live
        if let Some(mut rx) = app.stream_rx.take() {
            tokio::select! {
                event = events.next() => {
                    app.stream_rx = Some(rx);
                    let Some(event) = event else { break };
                    handler::handle_event(app, event)?;
                }
                fragment = rx.recv() => {
                    // on_stream_event clears stream_rx on Failed/None; put
                    // the receiver back first so it survives fragments
                    app.stream_rx = Some(rx);
                    app.on_stream_event(fragment);
                }
            }
        } else {
            let Some(event) = events.next().await else { break };
            handler::handle_event(app, event)?;
        }
    }

    Ok(())
}

/// Logging goes to a file; stderr belongs to the terminal UI.
fn init_logging() {
    let Some(config_dir) = dirs::config_dir() else {
        return;
    };
    let log_dir = config_dir.join("vistura");
    if std::fs::create_dir_all(&log_dir).is_err() {
        return;
    }
    let Ok(log_file) = File::create(log_dir.join("vistura.log")) else {
        return;
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(log_file))
        .with_ansi(false)
        .init();
}

use super::AppCommand;
use crate::error::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Keyboard input handler translating key presses into gallery commands
pub struct KeyboardInputHandler {
    commands: mpsc::UnboundedSender<AppCommand>,
    cancellation_token: CancellationToken,
}

impl KeyboardInputHandler {
    /// Create a new keyboard input handler
    pub fn new(commands: mpsc::UnboundedSender<AppCommand>) -> Self {
        Self {
            commands,
            cancellation_token: CancellationToken::new(),
        }
    }

    /// Start listening for keyboard input
    pub async fn start(&self) -> Result<()> {
        info!("Starting keyboard input - SPACE or c to take a photo, l to list, q to quit");

        let commands = self.commands.clone();
        let cancellation_token = self.cancellation_token.clone();

        // Spawn a blocking task to handle keyboard input
        task::spawn_blocking(move || {
            // Enable raw mode to capture individual key presses
            if let Err(e) = enable_raw_mode() {
                error!("Failed to enable raw mode for keyboard input: {}", e);
                return;
            }

            debug!("Raw mode enabled - keyboard handler active");

            loop {
                if cancellation_token.is_cancelled() {
                    debug!("Keyboard input handler stopping");
                    break;
                }

                match event::poll(Duration::from_millis(100)) {
                    Ok(true) => {
                        let Ok(Event::Key(key_event)) = event::read() else {
                            continue;
                        };
                        let Some(command) = command_for_key(&key_event) else {
                            debug!("Key pressed: {:?}", key_event.code);
                            continue;
                        };

                        if commands.send(command).is_err() {
                            debug!("Command receiver closed");
                            break;
                        }
                        if command == AppCommand::Quit {
                            info!("Quit key pressed - requesting shutdown");
                            break;
                        }
                    }
                    Ok(false) => {}
                    Err(e) => {
                        warn!("Error polling for keyboard events: {}", e);
                    }
                }
            }

            if let Err(e) = disable_raw_mode() {
                error!("Failed to disable raw mode: {}", e);
            } else {
                debug!("Raw mode disabled");
            }

            debug!("Keyboard input handler task exited");
        });

        Ok(())
    }

    /// Stop the keyboard input handler
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping keyboard input handler");
        self.cancellation_token.cancel();

        // Give the task a moment to clean up and disable raw mode
        tokio::time::sleep(Duration::from_millis(200)).await;

        // Ensure raw mode is disabled even if the task didn't clean up properly
        let _ = disable_raw_mode();

        Ok(())
    }
}

/// Map a key press to a command; releases and unbound keys map to nothing
fn command_for_key(key_event: &KeyEvent) -> Option<AppCommand> {
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    match key_event.code {
        KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(AppCommand::Quit)
        }
        KeyCode::Char(' ') | KeyCode::Char('c') | KeyCode::Enter => Some(AppCommand::Capture),
        KeyCode::Char('l') => Some(AppCommand::List),
        KeyCode::Char('q') | KeyCode::Esc => Some(AppCommand::Quit),
        _ => None,
    }
}

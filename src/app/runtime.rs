use super::{AppCommand, GalleryApp, ShutdownReason};
use crate::error::Result;
use crate::events::GalleryEvent;
use crate::photo::UserPhoto;
use std::io::Write;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::signal;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::{debug, error, info, warn};

#[cfg(feature = "keyboard")]
use super::keyboard_input::KeyboardInputHandler;
#[cfg(feature = "keyboard")]
use super::ComponentState;

/// Longest display URI printed verbatim in a listing
const MAX_LISTED_URI: usize = 64;

impl GalleryApp {
    /// Take a single photo and wait for it to land in the gallery
    pub async fn capture_once(&self) -> Option<UserPhoto> {
        self.gallery.add_new_to_gallery().await
    }

    /// Start a capture in the background; its outcome is reported by `run`
    pub fn request_capture(&mut self) {
        let gallery = Arc::clone(&self.gallery);
        self.captures
            .spawn(async move { gallery.add_new_to_gallery().await });
        debug!("Capture requested ({} in flight)", self.captures.len());
    }

    /// Print the current gallery to stdout
    pub async fn print_gallery(&self) {
        let photos = self.gallery.photos().await;
        print_lines(&gallery_listing(&photos));
    }

    /// Drive the application from a command stream until quit, input close,
    /// or a termination signal.
    pub async fn run(&mut self, mut commands: mpsc::UnboundedReceiver<AppCommand>) -> Result<i32> {
        info!("Photo gallery is running");

        let (shutdown_sender, mut shutdown_receiver) = oneshot::channel();
        self.setup_signal_handlers(shutdown_sender);
        let mut signals_open = true;

        let shutdown_reason = loop {
            tokio::select! {
                signal = &mut shutdown_receiver, if signals_open => match signal {
                    Ok(reason) => break reason,
                    Err(_) => {
                        warn!("Signal handlers exited; shutdown only via commands");
                        signals_open = false;
                    }
                },
                command = commands.recv() => match command {
                    Some(AppCommand::Capture) => self.request_capture(),
                    Some(AppCommand::List) => self.print_gallery().await,
                    Some(AppCommand::Quit) => break ShutdownReason::UserRequest,
                    None => break ShutdownReason::InputClosed,
                },
                Some(joined) = self.captures.join_next(), if !self.captures.is_empty() => {
                    report_capture(joined);
                }
            }
        };

        info!("Shutdown initiated: {:?}", shutdown_reason);
        let _ = self
            .gallery
            .event_bus()
            .publish(GalleryEvent::ShutdownRequested {
                timestamp: SystemTime::now(),
                reason: format!("{:?}", shutdown_reason),
            })
            .await;

        let exit_code = self.shutdown().await?;

        info!("Photo gallery shutdown complete");
        Ok(exit_code)
    }

    /// Run with commands read from the keyboard
    pub async fn run_interactive(&mut self) -> Result<i32> {
        let (command_sender, command_receiver) = mpsc::unbounded_channel();

        #[cfg(feature = "keyboard")]
        {
            self.set_component_state("keyboard", ComponentState::Starting)
                .await;
            let handler = KeyboardInputHandler::new(command_sender.clone());
            handler.start().await?;
            self.keyboard_handler = Some(handler);
            self.set_component_state("keyboard", ComponentState::Running)
                .await;
        }

        #[cfg(not(feature = "keyboard"))]
        warn!("Built without keyboard support; waiting for a shutdown signal");

        // Held so the command stream stays open if the keyboard thread exits
        let _command_sender = command_sender;
        self.run(command_receiver).await
    }

    /// Set up signal handlers for graceful shutdown
    fn setup_signal_handlers(&self, shutdown_sender: oneshot::Sender<ShutdownReason>) {
        let shutdown_sender = Arc::new(Mutex::new(Some(shutdown_sender)));

        // Handle SIGTERM - Unix only
        #[cfg(unix)]
        {
            let shutdown_sender_sigterm = Arc::clone(&shutdown_sender);
            tokio::spawn(async move {
                let mut sigterm =
                    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
                        Ok(sigterm) => sigterm,
                        Err(e) => {
                            warn!("Failed to register SIGTERM handler: {}", e);
                            return;
                        }
                    };
                if let Some(()) = sigterm.recv().await {
                    info!("Received SIGTERM signal");
                    if let Some(sender) = shutdown_sender_sigterm.lock().await.take() {
                        let _ = sender.send(ShutdownReason::Signal("SIGTERM".to_string()));
                    }
                }
            });
        }

        // Handle SIGINT (Ctrl+C) - Cross-platform
        let shutdown_sender_sigint = Arc::clone(&shutdown_sender);
        tokio::spawn(async move {
            match signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received SIGINT signal (Ctrl+C)");
                    if let Some(sender) = shutdown_sender_sigint.lock().await.take() {
                        let _ = sender.send(ShutdownReason::Signal("SIGINT".to_string()));
                    }
                }
                Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
            }
        });
    }
}

/// Render the gallery, newest first, as printable lines
pub fn gallery_listing(photos: &[UserPhoto]) -> Vec<String> {
    if photos.is_empty() {
        return vec!["Gallery is empty".to_string()];
    }

    let mut lines = Vec::with_capacity(photos.len() + 1);
    lines.push(format!(
        "Gallery: {} photo{}",
        photos.len(),
        if photos.len() == 1 { "" } else { "s" }
    ));
    for (index, photo) in photos.iter().enumerate() {
        lines.push(format!(
            "{:>3}. {}  {}",
            index + 1,
            photo.filepath,
            summarize_uri(&photo.webview_path)
        ));
    }
    lines
}

fn summarize_uri(uri: &str) -> String {
    if uri.starts_with("data:") {
        format!("[inline image, {} chars]", uri.len())
    } else if uri.len() > MAX_LISTED_URI {
        let cut = (0..=MAX_LISTED_URI)
            .rev()
            .find(|i| uri.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}...", &uri[..cut])
    } else {
        uri.to_string()
    }
}

// Raw terminal mode needs explicit carriage returns
fn print_lines(lines: &[String]) {
    let mut stdout = std::io::stdout().lock();
    for line in lines {
        let _ = write!(stdout, "{}\r\n", line);
    }
    let _ = stdout.flush();
}

fn report_capture(joined: std::result::Result<Option<UserPhoto>, tokio::task::JoinError>) {
    match joined {
        Ok(Some(photo)) => print_lines(&[format!("Saved {}", photo.filepath)]),
        Ok(None) => print_lines(&["Capture failed, gallery unchanged".to_string()]),
        Err(e) => error!("Capture task failed: {}", e),
    }
}

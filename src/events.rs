use crate::error::EventBusError;
use crate::photo::UserPhoto;
use std::time::SystemTime;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Why the gallery contents changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeReason {
    /// Contents replaced by a startup load
    Loaded,
    /// A new photo was prepended
    PhotoAdded,
}

/// Events that can occur in the photo gallery
#[derive(Debug, Clone)]
pub enum GalleryEvent {
    /// Gallery contents changed; carries the full snapshot after the mutation
    GalleryChanged {
        photos: Vec<UserPhoto>,
        revision: u64,
        reason: ChangeReason,
    },
    /// A capture was requested from the capture service
    CaptureStarted { timestamp: SystemTime },
    /// A captured photo was saved and added to the gallery
    PhotoAdded { photo: UserPhoto },
    /// A capture was abandoned; the gallery is unchanged
    CaptureFailed { error: String },
    /// The persisted index could not be written
    PersistenceFailed { revision: u64, error: String },
    /// Application shutdown requested
    ShutdownRequested {
        timestamp: SystemTime,
        reason: String,
    },
}

impl GalleryEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> String {
        match self {
            GalleryEvent::GalleryChanged {
                photos,
                revision,
                reason,
            } => {
                format!(
                    "Gallery revision {} ({:?}, {} photos)",
                    revision,
                    reason,
                    photos.len()
                )
            }
            GalleryEvent::CaptureStarted { .. } => "Capture started".to_string(),
            GalleryEvent::PhotoAdded { photo } => format!("Photo added: {}", photo.filepath),
            GalleryEvent::CaptureFailed { error } => format!("Capture failed: {}", error),
            GalleryEvent::PersistenceFailed { revision, error } => {
                format!("Failed to persist revision {}: {}", revision, error)
            }
            GalleryEvent::ShutdownRequested { reason, .. } => {
                format!("Shutdown requested: {}", reason)
            }
        }
    }

    /// Get the event type as a string for filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            GalleryEvent::GalleryChanged { .. } => "gallery_changed",
            GalleryEvent::CaptureStarted { .. } => "capture_started",
            GalleryEvent::PhotoAdded { .. } => "photo_added",
            GalleryEvent::CaptureFailed { .. } => "capture_failed",
            GalleryEvent::PersistenceFailed { .. } => "persistence_failed",
            GalleryEvent::ShutdownRequested { .. } => "shutdown_requested",
        }
    }
}

/// Async event bus for gallery observers using broadcast channels
pub struct EventBus {
    sender: broadcast::Sender<GalleryEvent>,
    debug_logging: bool,
}

impl EventBus {
    /// Create a new event bus with the specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: false,
        }
    }

    /// Create a new event bus with debug logging enabled
    pub fn with_debug_logging(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            debug_logging: true,
        }
    }

    pub fn is_debug_logging(&self) -> bool {
        self.debug_logging
    }

    /// Subscribe to events and get a receiver
    pub fn subscribe(&self) -> broadcast::Receiver<GalleryEvent> {
        self.sender.subscribe()
    }

    /// Subscribe with a filter, returning a named receiver
    pub fn subscribe_filtered<S: Into<String>>(&self, filter: EventFilter, name: S) -> EventReceiver {
        EventReceiver::new(self.sender.subscribe(), filter, name.into())
    }

    /// Publish an event to all subscribers
    pub async fn publish(&self, event: GalleryEvent) -> Result<usize, EventBusError> {
        if self.debug_logging {
            debug!("Publishing event: {}", event.description());
        }

        match &event {
            GalleryEvent::PhotoAdded { photo } => {
                info!("Photo added to gallery: {}", photo.filepath);
            }
            GalleryEvent::PersistenceFailed { revision, error } => {
                warn!("Failed to persist gallery revision {}: {}", revision, error);
            }
            GalleryEvent::ShutdownRequested { reason, .. } => {
                info!("Shutdown requested: {}", reason);
            }
            _ => {
                if self.debug_logging {
                    debug!("Event: {}", event.description());
                }
            }
        }

        self.sender
            .send(event)
            .map_err(|e| EventBusError::PublishFailed {
                details: e.to_string(),
            })
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Check if there are any active subscribers
    pub fn has_subscribers(&self) -> bool {
        self.sender.receiver_count() > 0
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            debug_logging: self.debug_logging,
        }
    }
}

/// Event filter for selective event handling
#[derive(Debug, Clone)]
pub enum EventFilter {
    /// Accept all events
    All,
    /// Accept only specific event types
    EventTypes(Vec<&'static str>),
    /// Custom filter function
    Custom(fn(&GalleryEvent) -> bool),
}

impl EventFilter {
    /// Check if an event passes this filter
    pub fn matches(&self, event: &GalleryEvent) -> bool {
        match self {
            EventFilter::All => true,
            EventFilter::EventTypes(types) => types.contains(&event.event_type()),
            EventFilter::Custom(filter_fn) => filter_fn(event),
        }
    }
}

/// Event receiver with filtering capabilities
pub struct EventReceiver {
    receiver: broadcast::Receiver<GalleryEvent>,
    filter: EventFilter,
    name: String,
}

impl EventReceiver {
    /// Create a new event receiver with a filter
    pub fn new(
        receiver: broadcast::Receiver<GalleryEvent>,
        filter: EventFilter,
        name: String,
    ) -> Self {
        Self {
            receiver,
            filter,
            name,
        }
    }

    /// Receive the next filtered event
    pub async fn recv(&mut self) -> Result<GalleryEvent, EventBusError> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        debug!(
                            "Receiver '{}' received event: {}",
                            self.name,
                            event.description()
                        );
                        return Ok(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::Lagged { skipped: n });
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed for receiver '{}'", self.name);
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Try to receive an event without blocking
    pub fn try_recv(&mut self) -> Result<Option<GalleryEvent>, EventBusError> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.filter.matches(&event) {
                        return Ok(Some(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => {
                    return Ok(None);
                }
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!("Receiver '{}' lagged behind by {} events", self.name, n);
                    return Err(EventBusError::Lagged { skipped: n });
                }
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(EventBusError::ChannelClosed);
                }
            }
        }
    }

    /// Name used in log output
    pub fn name(&self) -> &str {
        &self.name
    }
}

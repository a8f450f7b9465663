use crate::error::{CaptureError, Result};
use crate::photo::CapturedPhoto;
use crate::services::camera::{CaptureOptions, CaptureService};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

/// Mock capture service returning scripted results, for testing without a camera
#[derive(Clone, Default)]
pub struct MockCaptureService {
    results: Arc<Mutex<VecDeque<std::result::Result<CapturedPhoto, CaptureError>>>>,
    requests: Arc<Mutex<Vec<CaptureOptions>>>,
}

impl MockCaptureService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful capture
    pub fn push_photo(&self, photo: CapturedPhoto) {
        self.results.lock().push_back(Ok(photo));
    }

    /// Queue a failed capture
    pub fn push_error(&self, error: CaptureError) {
        self.results.lock().push_back(Err(error));
    }

    /// Options received so far, oldest first
    pub fn requests(&self) -> Vec<CaptureOptions> {
        self.requests.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.results.lock().len()
    }
}

#[async_trait]
impl CaptureService for MockCaptureService {
    async fn get_photo(&self, options: &CaptureOptions) -> Result<CapturedPhoto> {
        self.requests.lock().push(*options);

        let next = self.results.lock().pop_front();
        debug!("Mock capture returning {:?}", next);

        match next {
            Some(result) => result.map_err(Into::into),
            None => Err(CaptureError::Unavailable {
                details: "no scripted capture left".to_string(),
            }
            .into()),
        }
    }

    fn service_name(&self) -> &str {
        "mock_camera"
    }
}

//! Recording adapter for the `GenerationBackend` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::backend::{
    BackendFuture, GenerationBackend, ImageArtifact, ImageTask, TextRequest, TextResponse,
    VideoArtifact, VideoTask,
};

/// Port name under which all backend interactions are recorded.
const PORT: &str = "backend";

/// Records backend interactions while delegating to an inner implementation.
///
/// API keys are never part of the recorded input; the request types carry
/// no credentials by construction.
pub struct RecordingBackend {
    inner: Box<dyn GenerationBackend>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingBackend {
    /// Creates a new recording backend wrapping the given implementation.
    pub fn new(inner: Box<dyn GenerationBackend>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl GenerationBackend for RecordingBackend {
    fn generate_text<'a>(
        &'a self,
        api_key: &str,
        request: &TextRequest,
    ) -> BackendFuture<'a, TextResponse> {
        let api_key = api_key.to_string();
        let request = request.clone();
        let recorder = Arc::clone(&self.recorder);

        Box::pin(async move {
            let result = self.inner.generate_text(&api_key, &request).await;
            record_result(&recorder, PORT, "generate_text", &request, &result);
            result
        })
    }

    fn generate_image<'a>(
        &'a self,
        api_key: &str,
        request: &ImageTask,
    ) -> BackendFuture<'a, ImageArtifact> {
        let api_key = api_key.to_string();
        let request = request.clone();
        let recorder = Arc::clone(&self.recorder);

        Box::pin(async move {
            let result = self.inner.generate_image(&api_key, &request).await;
            record_result(&recorder, PORT, "generate_image", &request, &result);
            result
        })
    }

    fn generate_video<'a>(
        &'a self,
        api_key: &str,
        request: &VideoTask,
    ) -> BackendFuture<'a, VideoArtifact> {
        let api_key = api_key.to_string();
        let request = request.clone();
        let recorder = Arc::clone(&self.recorder);

        Box::pin(async move {
            let result = self.inner.generate_video(&api_key, &request).await;
            record_result(&recorder, PORT, "generate_video", &request, &result);
            result
        })
    }
}

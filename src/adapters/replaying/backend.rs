//! Replaying adapter for the `GenerationBackend` port.

use std::sync::{Arc, Mutex};

use super::{next_output, replay_result};
use crate::cassette::replayer::CassetteReplayer;
use crate::error::{ApiErrorKind, GenError};
use crate::ports::backend::{
    BackendFuture, GenerationBackend, ImageArtifact, ImageTask, TextRequest, TextResponse,
    VideoArtifact, VideoTask,
};

const PORT: &str = "backend";

/// Serves recorded backend results from a cassette.
pub struct ReplayingBackend {
    replayer: Arc<Mutex<CassetteReplayer>>,
}

impl ReplayingBackend {
    /// Create a replaying backend backed by the given replayer.
    #[must_use]
    pub fn new(replayer: Arc<Mutex<CassetteReplayer>>) -> Self {
        Self { replayer }
    }
}

/// Replayed errors come back as flat strings; surface them as fatal API
/// errors so the rotation loop does not spin on them.
fn replayed_error(message: String) -> GenError {
    GenError::Api { kind: ApiErrorKind::Other, status: 0, message }
}

impl GenerationBackend for ReplayingBackend {
    fn generate_text<'a>(
        &'a self,
        _api_key: &str,
        _request: &TextRequest,
    ) -> BackendFuture<'a, TextResponse> {
        let output = next_output(&self.replayer, PORT, "generate_text");
        Box::pin(async move { replay_result::<TextResponse>(output).map_err(replayed_error) })
    }

    fn generate_image<'a>(
        &'a self,
        _api_key: &str,
        _request: &ImageTask,
    ) -> BackendFuture<'a, ImageArtifact> {
        let output = next_output(&self.replayer, PORT, "generate_image");
        Box::pin(async move { replay_result::<ImageArtifact>(output).map_err(replayed_error) })
    }

    fn generate_video<'a>(
        &'a self,
        _api_key: &str,
        _request: &VideoTask,
    ) -> BackendFuture<'a, VideoArtifact> {
        let output = next_output(&self.replayer, PORT, "generate_video");
        Box::pin(async move { replay_result::<VideoArtifact>(output).map_err(replayed_error) })
    }
}

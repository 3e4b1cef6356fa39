/// Errors surfaced by the sky engine.
///
/// Only initialization reports errors to the caller. Failures inside a
/// frame are logged and the frame is dropped.
#[derive(Debug, thiserror::Error)]
pub enum SkyError {
    #[error("render backend unavailable: {0}")]
    BackendUnavailable(String),
    #[error("render failed: {0}")]
    Render(String),
}

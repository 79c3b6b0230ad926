pub mod api;
pub mod config;
pub mod ffmpeg;
pub mod generator;
pub mod history;
pub mod init;
pub mod shot_plan;
pub mod topics;

pub(crate) fn logi(message: impl AsRef<str>) {
    tracing::info!("{}", message.as_ref());
}

pub(crate) fn logok(message: impl AsRef<str>) {
    tracing::info!("OK: {}", message.as_ref());
}

pub(crate) fn logw(message: impl AsRef<str>) {
    tracing::warn!("{}", message.as_ref());
}

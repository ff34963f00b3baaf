/// Text-to-speech seam for spoken turn instructions.
pub trait Announcer: Send {
    fn speak(&self, text: &str);
}

/// Speaks into the log; stands in for a platform TTS engine.
#[derive(Debug, Clone, Copy)]
pub struct LogAnnouncer {
    pub rate: f32,
}

impl Default for LogAnnouncer {
    fn default() -> Self {
        Self { rate: 1.0 }
    }
}

impl Announcer for LogAnnouncer {
    fn speak(&self, text: &str) {
        if !text.trim().is_empty() {
            log::info!("[VOICE x{:.1}] {}", self.rate, text);
        }
    }
}

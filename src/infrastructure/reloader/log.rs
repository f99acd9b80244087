use crate::domain::errors::ReloadError;
use crate::domain::events::UpdateNotice;
use crate::domain::ports::PageReloader;
use async_trait::async_trait;
use tracing::info;

/// Dry-run reloader: records the reload in the log and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReloader;

#[async_trait]
impl PageReloader for LogReloader {
    async fn reload(&self, notice: &UpdateNotice) -> Result<(), ReloadError> {
        info!("Page reload requested ({})", notice.display_message());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

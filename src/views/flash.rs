use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use crate::errors::AppResult;
use super::escape;

const FLASH_KEY: &str = "flash";

/// One-shot banner carried across a post/redirect/get.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Flash {
    Success(String),
    Error(String),
}

impl Flash {
    pub async fn set(session: &Session, flash: Flash) -> AppResult<()> {
        session.insert(FLASH_KEY, flash).await?;
        Ok(())
    }

    /// Removes and returns the pending banner, if any.
    pub async fn take(session: &Session) -> AppResult<Option<Flash>> {
        Ok(session.remove::<Flash>(FLASH_KEY).await?)
    }

    /// Banner markup. It dismisses itself once after `dismiss_secs`; the
    /// timer only hides the element, so firing twice is harmless.
    pub fn to_html(&self, dismiss_secs: u64) -> String {
        let (class, message) = match self {
            Flash::Success(message) => ("banner success", message),
            Flash::Error(message) => ("banner error", message),
        };
        format!(
            r#"<div id="flash-banner" class="{}">{}</div>
<script>setTimeout(function () {{ var b = document.getElementById("flash-banner"); if (b) {{ b.hidden = true; }} }}, {});</script>"#,
            class,
            escape(message),
            dismiss_secs * 1000
        )
    }
}

pub fn banner_html(flash: Option<&Flash>, dismiss_secs: u64) -> String {
    flash.map(|f| f.to_html(dismiss_secs)).unwrap_or_default()
}

//! What happens to gathered output.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::host::Host;

// ============================================================================
// OutputAction
// ============================================================================

/// Destination of the collected outputs.
///
/// Serialized with the short codes used in shortcut bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputAction {
    /// Concatenate and copy as plain text.
    #[serde(rename = "ct")]
    CopyText,
    /// Concatenate and copy as HTML.
    #[serde(rename = "ch")]
    CopyHtml,
    /// Concatenate and save to one file.
    #[serde(rename = "s")]
    SaveToFile,
    /// One file per tab.
    #[serde(rename = "dl")]
    DownloadAsFiles,
    /// Discard the output.
    #[serde(rename = "dn")]
    RunOnly,
}

impl OutputAction {
    /// Every action, in menu order.
    pub const ALL: [Self; 5] = [
        Self::CopyText,
        Self::CopyHtml,
        Self::SaveToFile,
        Self::DownloadAsFiles,
        Self::RunOnly,
    ];

    /// Parent menu item ID.
    #[must_use]
    pub const fn menu_id(&self) -> &'static str {
        match self {
            Self::CopyText => "copy_as_text",
            Self::CopyHtml => "copy_as_html",
            Self::SaveToFile => "save_as_file",
            Self::DownloadAsFiles => "download_as_files",
            Self::RunOnly => "run_only",
        }
    }

    /// Parent menu item title.
    #[must_use]
    pub const fn menu_title(&self) -> &'static str {
        match self {
            Self::CopyText => "Copy as Text",
            Self::CopyHtml => "Copy as HTML",
            Self::SaveToFile => "Save Output to File",
            Self::DownloadAsFiles => "Download as Files",
            Self::RunOnly => "Run Only (ignore output)",
        }
    }

    /// Looks up an action by its parent menu ID.
    #[must_use]
    pub fn from_menu_id(menu_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.menu_id() == menu_id)
    }

    /// Sends `outputs` to the destination, then blinks the toolbar badge.
    ///
    /// # Errors
    ///
    /// Host errors propagate; the badge does not blink on failure.
    pub async fn deliver(&self, host: &dyn Host, outputs: &[String]) -> Result<()> {
        match self {
            Self::CopyText => host.write_clipboard_text(&outputs.concat()).await?,
            Self::CopyHtml => host.write_clipboard_html(&outputs.concat()).await?,
            Self::SaveToFile => host.save_text_to_file(&outputs.concat(), "").await?,
            Self::DownloadAsFiles => host.download_each_as_file(outputs).await?,
            Self::RunOnly => {}
        }

        debug!(action = %self, outputs = outputs.len(), "Output delivered");
        host.blink_badge().await
    }
}

impl fmt::Display for OutputAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.menu_id())
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Renders a script completion value as output text.
///
/// Strings are used as-is, `null` is empty and anything else is JSON.
#[must_use]
pub fn render(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::host::MemoryHost;
    use crate::identifiers::WindowId;

    fn outputs() -> Vec<String> {
        vec!["a\n".to_string(), "b\n".to_string()]
    }

    #[test]
    fn test_short_codes() {
        assert_eq!(serde_json::to_value(OutputAction::CopyText).expect("ser"), json!("ct"));
        let action: OutputAction = serde_json::from_value(json!("dl")).expect("de");
        assert_eq!(action, OutputAction::DownloadAsFiles);
        assert!(serde_json::from_value::<OutputAction>(json!("zz")).is_err());
    }

    #[test]
    fn test_menu_ids_round_trip() {
        for action in OutputAction::ALL {
            assert_eq!(OutputAction::from_menu_id(action.menu_id()), Some(action));
        }
        assert_eq!(OutputAction::from_menu_id("configure"), None);
    }

    #[test]
    fn test_render() {
        assert_eq!(render(json!("text")), "text");
        assert_eq!(render(Value::Null), "");
        assert_eq!(render(json!({"n": 1})), r#"{"n":1}"#);
    }

    #[tokio::test]
    async fn test_copy_text_joins_and_blinks() {
        let host = MemoryHost::new(WindowId::new(1));
        OutputAction::CopyText
            .deliver(&host, &outputs())
            .await
            .expect("deliver");

        assert_eq!(host.clipboard_text(), vec!["a\nb\n".to_string()]);
        assert_eq!(host.blinks(), 1);
    }

    #[tokio::test]
    async fn test_save_and_download() {
        let host = MemoryHost::new(WindowId::new(1));
        OutputAction::SaveToFile
            .deliver(&host, &outputs())
            .await
            .expect("save");
        OutputAction::DownloadAsFiles
            .deliver(&host, &outputs())
            .await
            .expect("download");

        assert_eq!(host.saved_files(), vec![(String::new(), "a\nb\n".to_string())]);
        assert_eq!(host.downloads(), vec![outputs()]);
        assert_eq!(host.blinks(), 2);
    }

    #[tokio::test]
    async fn test_run_only_still_blinks() {
        let host = MemoryHost::new(WindowId::new(1));
        OutputAction::RunOnly
            .deliver(&host, &outputs())
            .await
            .expect("deliver");

        assert!(host.clipboard_text().is_empty());
        assert_eq!(host.blinks(), 1);
    }

    #[tokio::test]
    async fn test_failure_skips_blink() {
        let host = MemoryHost::new(WindowId::new(1)).with_failure("clipboard.writeHtml");
        let err = OutputAction::CopyHtml
            .deliver(&host, &outputs())
            .await
            .expect_err("injected");

        assert!(err.is_host_error());
        assert_eq!(host.blinks(), 0);
    }
}

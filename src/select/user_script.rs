//! User selector predicates.
//!
//! A selector body runs inside a function taking the clicked tab and the
//! compared tab:
//!
//! ```js
//! (function (clkTab, cmpTab) {
//!     return new URL(clkTab.url).hostname === new URL(cmpTab.url).hostname;
//! })
//! ```
//!
//! Both tabs travel as structured script arguments. Only the user's own
//! selector source becomes part of the script text.

// ============================================================================
// Imports
// ============================================================================

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Selector;
use crate::error::Result;
use crate::host::Host;
use crate::tabs::Tab;

// ============================================================================
// Functions
// ============================================================================

/// Wraps a selector body into a function expression over `(clkTab, cmpTab)`.
#[must_use]
pub fn predicate_source(body: &str) -> String {
    format!("(function (clkTab, cmpTab) {{\n{body}\n}})")
}

/// Reads and decodes the selector list stored under `key`.
///
/// # Errors
///
/// [`Error::MissingConfiguration`](crate::Error::MissingConfiguration) if the
/// key is unset or malformed; host errors propagate.
pub async fn load_selectors(host: &dyn Host, key: &str) -> Result<Vec<Selector>> {
    let stored = host.storage_get(key).await?;
    Selector::list_from_storage(key, stored)
}

/// Returns the candidates every runnable selector accepts.
///
/// Selectors run in order inside each candidate tab. The first result other
/// than `true` rejects the tab and skips its remaining selectors. A failing
/// script is logged and does not change the verdict reached so far. A tab
/// is accepted only if at least one selector returned `true`.
///
/// # Errors
///
/// Only if a tab cannot be serialized as a script argument.
pub async fn filter_tabs(
    host: &dyn Host,
    selectors: &[Selector],
    clicked: &Tab,
    candidates: Vec<Tab>,
) -> Result<Vec<Tab>> {
    let scripts: Vec<String> = selectors
        .iter()
        .filter(|s| s.is_runnable())
        .map(|s| predicate_source(&s.code))
        .collect();

    let clicked_arg = serde_json::to_value(clicked)?;
    let mut accepted = Vec::new();

    for tab in candidates {
        let args = [clicked_arg.clone(), serde_json::to_value(&tab)?];
        let mut verdict = false;

        for script in &scripts {
            match host.execute_in_tab(Some(tab.id), script, &args).await {
                Ok(Value::Bool(true)) => verdict = true,
                Ok(other) => {
                    debug!(tab_id = %tab.id, result = %other, "Selector rejected tab");
                    verdict = false;
                    break;
                }
                Err(e) => warn!(tab_id = %tab.id, error = %e, "Selector failed"),
            }
        }

        if verdict {
            accepted.push(tab);
        }
    }

    Ok(accepted)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::Error;
    use crate::host::MemoryHost;
    use crate::identifiers::{TabId, WindowId};

    fn tab(id: u32, url: &str) -> Tab {
        Tab::new(TabId::new(id).expect("valid id"), WindowId::new(1))
            .with_index(id - 1)
            .with_url(url)
    }

    fn cmp_url(call: &crate::host::ScriptCall) -> String {
        call.args[1]["url"].as_str().unwrap_or_default().to_string()
    }

    #[test]
    fn test_predicate_source() {
        let source = predicate_source("return true;");
        assert!(source.starts_with("(function (clkTab, cmpTab) {"));
        assert!(source.contains("return true;"));
    }

    #[tokio::test]
    async fn test_args_are_structured() {
        let clicked = tab(1, "https://a.example/\"quoted\"");
        let host = MemoryHost::new(WindowId::new(1)).with_script_handler(|_| Ok(json!(true)));

        let accepted = filter_tabs(
            &host,
            &[Selector::new("return true;")],
            &clicked,
            vec![tab(2, "https://b.example/")],
        )
        .await
        .expect("filter");

        assert_eq!(accepted.len(), 1);
        let call = &host.script_calls()[0];
        assert_eq!(call.args[0]["url"], json!("https://a.example/\"quoted\""));
        assert_eq!(call.args[1]["id"], json!(2));
        assert!(!call.code.contains("a.example"));
    }

    #[tokio::test]
    async fn test_first_non_true_stops() {
        let host = MemoryHost::new(WindowId::new(1)).with_script_handler(|call| {
            if call.code.contains("first") && cmp_url(call).contains("reject") {
                Ok(json!("nope"))
            } else {
                Ok(json!(true))
            }
        });
        let selectors = [
            Selector::new("// first\nreturn x;"),
            Selector::new("// second\nreturn y;"),
        ];

        let accepted = filter_tabs(
            &host,
            &selectors,
            &tab(1, "https://a.example/"),
            vec![tab(2, "https://keep.example/"), tab(3, "https://reject.example/")],
        )
        .await
        .expect("filter");

        assert_eq!(accepted.iter().map(|t| t.id.as_u32()).collect::<Vec<_>>(), [2]);
        // keep: 2 calls, reject: stopped after the first.
        assert_eq!(host.script_calls().len(), 3);
    }

    #[tokio::test]
    async fn test_disabled_and_empty_skipped() {
        let host = MemoryHost::new(WindowId::new(1)).with_script_handler(|_| Ok(json!(true)));
        let selectors = [
            Selector::new("return false;").disabled(),
            Selector::new(""),
            Selector::new("return true;"),
        ];

        let accepted = filter_tabs(&host, &selectors, &tab(1, "u"), vec![tab(2, "v")])
            .await
            .expect("filter");

        assert_eq!(accepted.len(), 1);
        assert_eq!(host.script_calls().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_verdict() {
        let host = MemoryHost::new(WindowId::new(1)).with_script_handler(|call| {
            if call.code.contains("broken") {
                Err(Error::host_call("tabs.executeScript", "no permission"))
            } else {
                Ok(json!(true))
            }
        });
        let selectors = [Selector::new("return true;"), Selector::new("// broken")];

        let accepted = filter_tabs(&host, &selectors, &tab(1, "u"), vec![tab(2, "v")])
            .await
            .expect("filter");
        assert_eq!(accepted.len(), 1);

        let only_broken = filter_tabs(&host, &selectors[1..], &tab(1, "u"), vec![tab(2, "v")])
            .await
            .expect("filter");
        assert!(only_broken.is_empty());
    }

    #[tokio::test]
    async fn test_load_selectors_missing() {
        let host = MemoryHost::new(WindowId::new(1));
        let err = load_selectors(&host, "selectors").await.expect_err("missing");
        assert!(matches!(err, Error::MissingConfiguration { .. }));

        let host = host.with_storage("selectors", json!([{"code": "return true;"}]));
        let selectors = load_selectors(&host, "selectors").await.expect("load");
        assert_eq!(selectors, vec![Selector::new("return true;")]);
    }
}

//! Gather context menu layout.
//!
//! ```text
//! Copy as Text             > <selector titles>
//! Copy as HTML             > ...
//! Save Output to File      > ...
//! Download as Files        > ...
//! Run Only (ignore output) > ...
//! ---------
//! Configure
//! ```
//!
//! Child items are identified as `"<parent>:<selector index>"`.

use crate::config::Selector;
use crate::protocol::{MenuContext, MenuItem};

use super::OutputAction;

/// Contexts every gather item appears in.
const CONTEXTS: &[MenuContext] = &[MenuContext::Tab, MenuContext::Page];

/// ID of the "Configure" item.
pub const MENU_CONFIGURE: &str = "configure";

/// Child item ID for running selector `index` with `action`.
#[must_use]
pub fn child_id(action: OutputAction, index: usize) -> String {
    format!("{}:{index}", action.menu_id())
}

/// Parses a child item ID back into its action and selector index.
#[must_use]
pub fn parse_child_id(menu_item_id: &str) -> Option<(OutputAction, usize)> {
    let (parent, index) = menu_item_id.split_once(':')?;
    let action = OutputAction::from_menu_id(parent)?;
    let index = index.parse().ok()?;
    Some((action, index))
}

/// Builds every gather menu item.
///
/// Selectors that cannot run are left out but keep their index.
#[must_use]
pub fn menu_items(selectors: &[Selector]) -> Vec<MenuItem> {
    let mut items: Vec<MenuItem> = OutputAction::ALL
        .iter()
        .map(|action| MenuItem::new(action.menu_id(), action.menu_title(), CONTEXTS))
        .collect();

    items.push(MenuItem::separator(CONTEXTS));
    items.push(MenuItem::new(MENU_CONFIGURE, "Configure", CONTEXTS));

    for action in OutputAction::ALL {
        for (index, selector) in selectors.iter().enumerate() {
            if !selector.is_runnable() {
                continue;
            }
            items.push(
                MenuItem::new(child_id(action, index), selector.title(), CONTEXTS)
                    .with_parent(action.menu_id()),
            );
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::MenuItemType;

    #[test]
    fn test_child_id_round_trip() {
        let id = child_id(OutputAction::SaveToFile, 3);
        assert_eq!(id, "save_as_file:3");
        assert_eq!(parse_child_id(&id), Some((OutputAction::SaveToFile, 3)));
    }

    #[test]
    fn test_parse_rejects_foreign_ids() {
        assert_eq!(parse_child_id("copy_as_text"), None);
        assert_eq!(parse_child_id("copy_as_text:x"), None);
        assert_eq!(parse_child_id("Parent:1"), None);
        assert_eq!(parse_child_id(MENU_CONFIGURE), None);
    }

    #[test]
    fn test_menu_layout() {
        let selectors = [
            Selector::new("// Title\ndocument.title"),
            Selector::new("// Off\n1").disabled(),
            Selector::new("  // URL  \nlocation.href"),
        ];
        let items = menu_items(&selectors);

        // 5 parents, separator, configure, 2 runnable children per parent
        assert_eq!(items.len(), 5 + 2 + 10);
        assert_eq!(items[5].item_type, MenuItemType::Separator);
        assert_eq!(items[6].id.as_deref(), Some(MENU_CONFIGURE));

        let children: Vec<_> = items
            .iter()
            .filter(|i| i.parent_id.as_deref() == Some("copy_as_text"))
            .collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].title.as_deref(), Some("// Title"));
        assert_eq!(children[1].id.as_deref(), Some("copy_as_text:2"));
        assert_eq!(children[1].title.as_deref(), Some("// URL"));
    }
}

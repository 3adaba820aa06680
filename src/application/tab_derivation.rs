// Tab derivation - Infers the tab list from the settings layout map
use crate::domain::dashboard::{Group, Tab, ALL_TABS};
use crate::domain::yaml_node::{layout_of, scalar_to_string};
use serde_yaml::{Mapping, Value};

/// Distinct `tab` values of `settings.layout`, in first-seen order.
///
/// With no tab referenced at all, a single default tab is synthesized so the
/// UI always has somewhere to render.
pub fn derive_tabs(settings: &Mapping) -> Vec<Tab> {
    let mut names: Vec<String> = Vec::new();
    for entry in layout_of(settings).values() {
        let Value::Mapping(options) = entry else {
            continue;
        };
        if let Some(tab) = options.get("tab").and_then(scalar_to_string) {
            if !tab.is_empty() && !names.contains(&tab) {
                names.push(tab);
            }
        }
    }

    if names.is_empty() {
        return vec![Tab::all_tabs(0)];
    }

    names
        .into_iter()
        .enumerate()
        .map(|(order, name)| Tab::new(name.clone(), name, order))
        .collect()
}

/// Append tabs that groups point at but the layout never named.
///
/// Covers groups whose tab is only reachable through inheritance, and the
/// default tab when some group has no explicit tab.
pub fn reconcile_tabs(tabs: &mut Vec<Tab>, groups: &[Group]) {
    for group in groups {
        if group.tab_id == ALL_TABS || tabs.iter().any(|t| t.id == group.tab_id) {
            continue;
        }
        tracing::debug!(
            tab = %group.tab_id,
            group = %group.name,
            "Adding tab referenced only by a group"
        );
        let order = tabs.len();
        tabs.push(Tab::new(group.tab_id.clone(), group.tab_id.clone(), order));
    }

    let uses_default = groups.iter().any(|g| g.tab_id == ALL_TABS);
    if uses_default && !tabs.iter().any(|t| t.id == ALL_TABS) {
        let order = tabs.len();
        tabs.push(Tab::all_tabs(order));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dashboard::DEFAULT_TAB_NAME;
    use crate::domain::yaml_node::decode_mapping;

    #[test]
    fn test_default_tab_without_layout() {
        for text in ["", "title: Home", "layout: []", "layout: {}"] {
            let tabs = derive_tabs(&decode_mapping(text));
            assert_eq!(tabs.len(), 1, "{}", text);
            assert_eq!(tabs[0].id, ALL_TABS);
            assert_eq!(tabs[0].name, DEFAULT_TAB_NAME);
            assert!(tabs[0].is_all_tabs);
        }
    }

    #[test]
    fn test_tabs_first_seen_order() {
        let settings = decode_mapping(
            "
layout:
  Media:
    tab: Home
  Infra:
    tab: Lab
    style: row
  Downloads:
    tab: Home
  Untabbed:
    columns: 3
",
        );
        let tabs = derive_tabs(&settings);
        let names: Vec<(&str, usize)> = tabs.iter().map(|t| (t.name.as_str(), t.order)).collect();
        assert_eq!(names, vec![("Home", 0), ("Lab", 1)]);
        assert!(tabs.iter().all(|t| !t.is_all_tabs));
    }

    #[test]
    fn test_reconcile_appends_missing_tabs() {
        let settings = decode_mapping("layout:\n  Media:\n    tab: Home\n");
        let mut tabs = derive_tabs(&settings);
        let groups = vec![
            Group::new("Media".to_string(), None, "Home".to_string(), 0),
            Group::new("Lab".to_string(), None, "Garage".to_string(), 0),
            Group::new("Loose".to_string(), None, ALL_TABS.to_string(), 0),
        ];

        reconcile_tabs(&mut tabs, &groups);
        let ids: Vec<(&str, &str, usize)> = tabs
            .iter()
            .map(|t| (t.id.as_str(), t.name.as_str(), t.order))
            .collect();
        assert_eq!(
            ids,
            vec![
                ("Home", "Home", 0),
                ("Garage", "Garage", 1),
                (ALL_TABS, DEFAULT_TAB_NAME, 2)
            ]
        );

        reconcile_tabs(&mut tabs, &groups);
        assert_eq!(tabs.len(), 3);
    }

    #[test]
    fn test_reconcile_keeps_synthesized_default() {
        let mut tabs = derive_tabs(&Mapping::new());
        let groups = vec![Group::new("Media".to_string(), None, ALL_TABS.to_string(), 0)];
        reconcile_tabs(&mut tabs, &groups);
        assert_eq!(tabs.len(), 1);
    }
}

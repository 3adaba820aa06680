// YAML generator - Rebuilds services.yaml and settings.yaml from the canonical model
use crate::domain::dashboard::{
    CanonicalModel, Group, Service, ServiceWidget, ALL_TABS, DEFAULT_TAB_NAME,
};
use crate::domain::yaml_node::{decode_mapping, get_by_name, layout_of};
use serde_yaml::{Mapping, Sequence, Value};

/// Render the nested services.yaml list. Root groups come out in `order`;
/// inside a group, subgroups precede services.
pub fn generate_services(model: &CanonicalModel) -> String {
    let document: Sequence = model
        .child_groups(None)
        .into_iter()
        .map(|group| single_entry(&group.name, Value::Sequence(group_contents(model, group))))
        .collect();

    let unreachable = model
        .services
        .iter()
        .filter(|s| model.group(&s.group_id).is_none())
        .count();
    if unreachable > 0 {
        tracing::warn!(
            count = unreachable,
            "Services without a group are not written to services.yaml"
        );
    }

    encode(&Value::Sequence(document))
}

/// Render settings.yaml: previous settings, overlaid with the model's
/// settings bag, with `layout` rebuilt from tabs and root groups.
pub fn generate_settings(model: &CanonicalModel, previous_text: &str) -> String {
    let mut settings = merge_mappings(decode_mapping(previous_text), &model.settings);
    let prior_layout = layout_of(&settings);

    let tabs = model.sorted_tabs();
    let default_tab_name = tabs
        .first()
        .map(|t| t.name.clone())
        .unwrap_or_else(|| DEFAULT_TAB_NAME.to_string());
    let roots = model.child_groups(None);

    let mut layout = Mapping::new();
    for tab in &tabs {
        let tab_name = if tab.id == ALL_TABS {
            default_tab_name.as_str()
        } else {
            tab.name.as_str()
        };
        for group in roots.iter().filter(|g| g.tab_id == tab.id) {
            layout.insert(
                Value::from(group.name.as_str()),
                layout_entry(get_by_name(&prior_layout, &group.name), tab_name, group),
            );
        }
    }

    // Root groups pointing at a tab that is not in the tab list
    for group in &roots {
        if layout.contains_key(group.name.as_str()) {
            continue;
        }
        let tab_name = if group.tab_id == ALL_TABS {
            default_tab_name.as_str()
        } else {
            group.tab_id.as_str()
        };
        layout.insert(
            Value::from(group.name.as_str()),
            layout_entry(get_by_name(&prior_layout, &group.name), tab_name, group),
        );
    }

    settings.insert(Value::from("layout"), Value::Mapping(layout));
    encode(&Value::Mapping(settings))
}

/// Shallow key-level merge: every key of `overlay` replaces the same key of
/// `base`. Keys keep their position in `base`; new keys are appended.
pub fn merge_mappings(mut base: Mapping, overlay: &Mapping) -> Mapping {
    for (key, value) in overlay {
        base.insert(key.clone(), value.clone());
    }
    base
}

fn group_contents(model: &CanonicalModel, group: &Group) -> Sequence {
    let subgroups = model
        .child_groups(Some(&group.id))
        .into_iter()
        .map(|sub| single_entry(&sub.name, Value::Sequence(group_contents(model, sub))));

    let services = model
        .group_services(&group.id)
        .into_iter()
        .map(|service| single_entry(&service.title, Value::Mapping(service_mapping(service))));

    subgroups.chain(services).collect()
}

/// `advanced_extra` first, then the known fields that are set, then widget
/// configuration merged in as sibling keys.
fn service_mapping(service: &Service) -> Mapping {
    let mut fields = service.advanced_extra.clone();

    let known = [
        ("description", &service.description),
        ("icon", &service.icon),
        ("href", &service.href),
        ("container", &service.container),
        ("server", &service.server),
        ("ping", &service.ping),
        ("site_monitor", &service.site_monitor),
        ("target", &service.target),
        ("namespace", &service.namespace),
        ("pod", &service.pod),
    ];
    for (key, value) in known {
        if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
            fields.insert(Value::from(key), Value::from(value));
        }
    }
    if let Some(port) = service.port {
        fields.insert(Value::from("port"), Value::from(port));
    }

    for widget in &service.widgets {
        merge_widget(&mut fields, widget);
    }
    fields
}

fn merge_widget(fields: &mut Mapping, widget: &ServiceWidget) {
    match serde_yaml::from_str::<Value>(&widget.config_text) {
        Ok(Value::Mapping(config)) => {
            for (key, value) in config {
                fields.insert(key, value);
            }
        }
        Ok(Value::Null) => {}
        Ok(_) | Err(_) => {
            tracing::warn!(
                widget = %widget.widget_type,
                "Widget config is not a YAML mapping, writing a stub"
            );
            let mut stub = Mapping::new();
            stub.insert(Value::from("type"), Value::from(widget.widget_type.as_str()));
            fields.insert(Value::from("widget"), Value::Mapping(stub));
        }
    }
}

/// Previous layout keys, then the current tab, then the group's options.
/// A stale `tab` inside the options never overrides the assignment.
fn layout_entry(prior: Option<&Value>, tab_name: &str, group: &Group) -> Value {
    let base = match prior {
        Some(Value::Mapping(entry)) => entry.clone(),
        _ => Mapping::new(),
    };
    let mut tab = Mapping::new();
    tab.insert(Value::from("tab"), Value::from(tab_name));

    let options: Mapping = group
        .options
        .iter()
        .filter(|(key, _)| key.as_str() != Some("tab"))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Value::Mapping(merge_mappings(merge_mappings(base, &tab), &options))
}

fn single_entry(key: &str, value: Value) -> Value {
    let mut entry = Mapping::new();
    entry.insert(Value::from(key), value);
    Value::Mapping(entry)
}

fn encode(document: &Value) -> String {
    serde_yaml::to_string(document).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize YAML document");
        String::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services_parser::parse;
    use crate::application::tab_derivation::{derive_tabs, reconcile_tabs};
    use crate::domain::dashboard::Tab;

    fn load(services: &str, settings: &str) -> CanonicalModel {
        let settings = decode_mapping(settings);
        let parsed = parse(services, &settings);
        let mut tabs = derive_tabs(&settings);
        reconcile_tabs(&mut tabs, &parsed.groups);
        CanonicalModel {
            settings,
            tabs,
            groups: parsed.groups,
            services: parsed.services,
        }
    }

    fn service_at<'a>(doc: &'a Value, path: &[&str]) -> &'a Value {
        let mut current = doc;
        for key in path {
            current = current
                .as_sequence()
                .and_then(|items| items.iter().find_map(|item| item.get(*key)))
                .or_else(|| current.get(*key))
                .unwrap_or_else(|| panic!("missing {}", key));
        }
        current
    }

    #[test]
    fn test_round_trip_simple() {
        let model = load("- My Group:\n    - Service A:\n        href: http://example.com\n", "");
        let text = generate_services(&model);

        let reparsed = parse(text.as_str(), &Mapping::new());
        assert_eq!(reparsed.groups.len(), 1);
        assert_eq!(reparsed.groups[0].name, "My Group");
        assert_eq!(reparsed.services[0].title, "Service A");
        assert_eq!(reparsed.services[0].href.as_deref(), Some("http://example.com"));
        assert_eq!(reparsed.services[0].group_id, reparsed.groups[0].id);
    }

    #[test]
    fn test_unknown_fields_survive() {
        let model = load(
            "
- Custom Group:
    - Custom Service:
        href: http://test.com
        customField: \"some value\"
",
            "",
        );
        let doc: Value = serde_yaml::from_str(&generate_services(&model)).unwrap();
        let service = service_at(&doc, &["Custom Group", "Custom Service"]);
        assert_eq!(service.get("customField"), Some(&Value::from("some value")));
        assert_eq!(service.get("href"), Some(&Value::from("http://test.com")));
    }

    #[test]
    fn test_key_order_preserved() {
        let model = load(
            "
- G:
    - S:
        statusStyle: dot
        href: http://s
        showStats: true
",
            "",
        );
        let doc: Value = serde_yaml::from_str(&generate_services(&model)).unwrap();
        let keys: Vec<&str> = service_at(&doc, &["G", "S"])
            .as_mapping()
            .unwrap()
            .keys()
            .filter_map(|k| k.as_str())
            .collect();
        assert_eq!(keys, vec!["statusStyle", "showStats", "href"]);
    }

    #[test]
    fn test_absent_fields_not_written_as_null() {
        let mut model = load("- G:\n    - S:\n        href: http://s\n", "");
        model.services[0].icon = None;
        model.services[0].description = Some(String::new());
        let text = generate_services(&model);
        assert!(!text.contains("null"));
        assert!(!text.contains("icon"));
        assert!(!text.contains("description"));
    }

    #[test]
    fn test_subgroups_before_services_and_sorted() {
        let mut model = load(
            "
- Root:
    - Svc1: {href: a}
    - Svc2: {href: b}
    - Sub:
        - Inner: {href: c}
",
            "",
        );
        for service in model.services.iter_mut() {
            if service.title == "Svc1" {
                service.order = 1;
            } else if service.title == "Svc2" {
                service.order = 0;
            }
        }

        let doc: Value = serde_yaml::from_str(&generate_services(&model)).unwrap();
        let contents = service_at(&doc, &["Root"]).as_sequence().unwrap();
        let keys: Vec<&str> = contents
            .iter()
            .map(|entry| entry.as_mapping().unwrap().keys().next().unwrap().as_str().unwrap())
            .collect();
        assert_eq!(keys, vec!["Sub", "Svc2", "Svc1"]);
    }

    #[test]
    fn test_widget_keys_become_service_siblings() {
        let model = load(
            "
- Media:
    - Sonarr:
        href: http://sonarr
        widget:
          type: sonarr
          url: http://sonarr:8989
",
            "",
        );
        let doc: Value = serde_yaml::from_str(&generate_services(&model)).unwrap();
        let service = service_at(&doc, &["Media", "Sonarr"]);
        assert_eq!(service.get("type"), Some(&Value::from("sonarr")));
        assert_eq!(service.get("url"), Some(&Value::from("http://sonarr:8989")));
        assert_eq!(service.get("href"), Some(&Value::from("http://sonarr")));
        assert!(service.get("widget").is_none());
    }

    #[test]
    fn test_broken_widget_becomes_stub() {
        let mut model = load("- Media:\n    - Sonarr: {href: s}\n", "");
        model.services[0].widgets.push(ServiceWidget {
            widget_type: "sonarr".to_string(),
            config_text: "url: [unclosed".to_string(),
        });
        let doc: Value = serde_yaml::from_str(&generate_services(&model)).unwrap();
        let service = service_at(&doc, &["Media", "Sonarr"]);
        let widget = service.get("widget").unwrap();
        assert_eq!(widget.get("type"), Some(&Value::from("sonarr")));
        assert_eq!(service.get("href"), Some(&Value::from("s")));
    }

    #[test]
    fn test_orphaned_services_dropped() {
        let model = load("- Loose: {href: l}\n- G:\n    - S: {href: s}\n", "");
        assert_eq!(model.services.len(), 2);
        let reparsed = parse(generate_services(&model).as_str(), &Mapping::new());
        assert_eq!(reparsed.services.len(), 1);
        assert_eq!(reparsed.services[0].title, "S");
    }

    #[test]
    fn test_empty_model_writes_empty_list() {
        let text = generate_services(&CanonicalModel::default());
        assert_eq!(text.trim(), "[]");
    }

    #[test]
    fn test_settings_keeps_unrelated_keys_and_rebuilds_layout() {
        let previous = "
title: My Homepage
theme: dark
layout:
  Media:
    tab: Home
    style: row
  Removed:
    tab: Home
";
        let mut model = load("- Media: []\n", previous);
        model.settings = Mapping::new();
        model.settings.insert(Value::from("theme"), Value::from("light"));

        let doc = decode_mapping(&generate_settings(&model, previous));
        assert_eq!(doc.get("title"), Some(&Value::from("My Homepage")));
        assert_eq!(doc.get("theme"), Some(&Value::from("light")));

        let layout = layout_of(&doc);
        assert_eq!(layout.len(), 1);
        let media = layout.get("Media").unwrap();
        assert_eq!(media.get("tab"), Some(&Value::from("Home")));
        assert_eq!(media.get("style"), Some(&Value::from("row")));
    }

    #[test]
    fn test_settings_options_overlay_and_tab_forced() {
        let previous = "
layout:
  Media:
    tab: Home
    columns: 2
    header: false
";
        let mut model = load("- Media: []\n", previous);
        model.tabs.push(Tab::new("Work".to_string(), "Work".to_string(), 1));
        let media = model.groups[0].id.clone();
        model.assign_group_tab(&media, "Work").unwrap();
        model.groups[0]
            .options
            .insert(Value::from("columns"), Value::from(4));

        let layout = layout_of(&decode_mapping(&generate_settings(&model, previous)));
        let entry = layout.get("Media").unwrap();
        assert_eq!(entry.get("tab"), Some(&Value::from("Work")));
        assert_eq!(entry.get("columns"), Some(&Value::from(4)));
        assert_eq!(entry.get("header"), Some(&Value::from(false)));
    }

    #[test]
    fn test_settings_never_writes_sentinel() {
        let mut model = load("- A: []\n- B: []\n", "");
        let text = generate_settings(&model, "");
        assert!(!text.contains(ALL_TABS));
        let layout = layout_of(&decode_mapping(&text));
        assert_eq!(layout.get("A").unwrap().get("tab"), Some(&Value::from(DEFAULT_TAB_NAME)));

        model.tabs.insert(0, Tab::new("Home".to_string(), "Home".to_string(), 0));
        model.tabs[1].order = 1;
        let layout = layout_of(&decode_mapping(&generate_settings(&model, "")));
        assert_eq!(layout.get("B").unwrap().get("tab"), Some(&Value::from("Home")));
    }

    #[test]
    fn test_settings_applies_tab_rename_and_order() {
        let previous = "
layout:
  Infra:
    tab: Lab
  Media:
    tab: Home
  Movies:
    tab: Home
";
        let mut model = load("- Media: []\n- Infra: []\n- Movies: []\n", previous);
        model.rename_tab("Home", "Start").unwrap();
        model.reorder_tabs(&["Lab".to_string()]).unwrap();

        let layout = layout_of(&decode_mapping(&generate_settings(&model, previous)));
        let order: Vec<(&str, &str)> = layout
            .iter()
            .map(|(k, v)| (k.as_str().unwrap(), v.get("tab").unwrap().as_str().unwrap()))
            .collect();
        assert_eq!(order, vec![("Infra", "Lab"), ("Media", "Start"), ("Movies", "Start")]);
    }

    #[test]
    fn test_settings_appends_groups_on_unknown_tabs() {
        let mut model = load("- Media: []\n", "layout:\n  Media:\n    tab: Home\n");
        model.tabs.clear();
        let layout = layout_of(&decode_mapping(&generate_settings(&model, "")));
        assert_eq!(layout.get("Media").unwrap().get("tab"), Some(&Value::from("Home")));
    }

    #[test]
    fn test_settings_is_idempotent() {
        let previous = "title: Home\nlayout:\n  Media:\n    tab: Home\n    style: row\n";
        let model = load("- Media: []\n- Other: []\n", previous);
        assert_eq!(generate_settings(&model, previous), generate_settings(&model, previous));
    }

    #[test]
    fn test_settings_malformed_previous() {
        let model = load("- Media: []\n", "");
        let doc = decode_mapping(&generate_settings(&model, "title: [unclosed"));
        assert_eq!(doc.len(), 1);
        assert!(doc.contains_key("layout"));
    }

    #[test]
    fn test_merge_mappings_last_writer_wins() {
        let base = decode_mapping("a: 1\nb: 2\n");
        let overlay = decode_mapping("b: 3\nc: 4\n");
        let merged = merge_mappings(base, &overlay);
        let pairs: Vec<(&str, i64)> = merged
            .iter()
            .map(|(k, v)| (k.as_str().unwrap(), v.as_i64().unwrap()))
            .collect();
        assert_eq!(pairs, vec![("a", 1), ("b", 3), ("c", 4)]);
    }
}

// Services parser - Walks the nested services.yaml tree into canonical groups and services
use crate::domain::dashboard::{
    ChildrenType, Group, Service, ServiceWidget, ALL_TABS, ORPHANED,
};
use crate::domain::yaml_node::{
    decode_lenient, get_by_name, key_to_string, layout_of, scalar_to_string, HierarchyNode,
};
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;

/// Services input as it arrives from a caller: raw text or an already decoded tree
#[derive(Debug, Clone, Copy)]
pub enum ServicesSource<'a> {
    Text(&'a str),
    Value(&'a Value),
}

impl<'a> From<&'a str> for ServicesSource<'a> {
    fn from(text: &'a str) -> Self {
        ServicesSource::Text(text)
    }
}

impl<'a> From<&'a Value> for ServicesSource<'a> {
    fn from(value: &'a Value) -> Self {
        ServicesSource::Value(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedServices {
    pub groups: Vec<Group>,
    pub services: Vec<Service>,
    /// Entries that were neither a group nor a service
    pub skipped: usize,
}

/// Parse one services document against the decoded settings.
///
/// Undecodable text yields an empty result.
pub fn parse<'a>(source: impl Into<ServicesSource<'a>>, settings: &Mapping) -> ParsedServices {
    let mut parser = HierarchyParser::new(settings);
    parser.parse_source(source.into());
    parser.finish()
}

/// Accumulates groups and services over one or more documents
/// (services.yaml, then bookmarks.yaml) that share sibling numbering.
pub struct HierarchyParser {
    layout: Mapping,
    group_tabs: HashMap<String, String>,
    groups: Vec<Group>,
    services: Vec<Service>,
    group_counters: HashMap<(String, Option<String>), usize>,
    service_counters: HashMap<String, usize>,
    skipped: usize,
}

impl HierarchyParser {
    pub fn new(settings: &Mapping) -> Self {
        let layout = layout_of(settings);
        let group_tabs = layout
            .iter()
            .filter_map(|(name, entry)| {
                let name = key_to_string(name)?;
                let tab = match entry {
                    Value::Mapping(options) => options.get("tab").and_then(scalar_to_string)?,
                    _ => return None,
                };
                (!tab.is_empty()).then_some((name, tab))
            })
            .collect();

        Self {
            layout,
            group_tabs,
            groups: Vec::new(),
            services: Vec::new(),
            group_counters: HashMap::new(),
            service_counters: HashMap::new(),
            skipped: 0,
        }
    }

    pub fn parse_source(&mut self, source: ServicesSource<'_>) {
        match source {
            ServicesSource::Text(text) => {
                let value = decode_lenient(text);
                self.parse_document(&value);
            }
            ServicesSource::Value(value) => self.parse_document(value),
        }
    }

    pub fn parse_document(&mut self, document: &Value) {
        let (groups_before, services_before) = (self.groups.len(), self.services.len());

        match document {
            Value::Sequence(items) => self.walk(items, None, ALL_TABS),
            Value::Mapping(_) => self.walk(std::slice::from_ref(document), None, ALL_TABS),
            Value::Null => {}
            other => {
                self.skipped += 1;
                tracing::debug!(kind = ?other, "Services document is not a list, ignoring")
            }
        }

        tracing::debug!(
            groups = self.groups.len() - groups_before,
            services = self.services.len() - services_before,
            "Parsed services document"
        );
    }

    pub fn finish(self) -> ParsedServices {
        ParsedServices {
            groups: self.groups,
            services: self.services,
            skipped: self.skipped,
        }
    }

    /// Entries skipped so far across every parsed document
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    fn walk(&mut self, items: &[Value], parent: Option<&str>, inherited_tab: &str) {
        for item in items {
            let Value::Mapping(entries) = item else {
                self.skipped += 1;
                continue;
            };
            // Every key is its own sibling, not just the first one
            for (key, value) in entries {
                let Some(name) = key_to_string(key) else {
                    self.skipped += 1;
                    continue;
                };
                match HierarchyNode::classify(value) {
                    HierarchyNode::Group(children) => {
                        self.push_group(name, children, parent, inherited_tab)
                    }
                    HierarchyNode::Service(fields) => self.push_service(name, fields, parent),
                    HierarchyNode::Skip => {
                        self.skipped += 1;
                        tracing::debug!(
                            entry = %name,
                            "Skipping entry that is neither group nor service"
                        )
                    }
                }
            }
        }
    }

    fn push_group(
        &mut self,
        name: String,
        children: &[Value],
        parent: Option<&str>,
        inherited_tab: &str,
    ) {
        // Layout only addresses root groups; subgroups follow their parent
        let tab_id = match parent {
            None => self
                .group_tabs
                .get(&name)
                .cloned()
                .unwrap_or_else(|| ALL_TABS.to_string()),
            Some(_) => inherited_tab.to_string(),
        };

        let counter = self
            .group_counters
            .entry((tab_id.clone(), parent.map(str::to_string)))
            .or_insert(0);
        let order = *counter;
        *counter += 1;

        let mut group = Group::new(name, parent.map(str::to_string), tab_id.clone(), order);
        if let Some(Value::Mapping(options)) = get_by_name(&self.layout, &group.name) {
            group.options = options.clone();
        }

        let id = group.id.clone();
        let index = self.groups.len();
        self.groups.push(group);

        self.walk(children, Some(id.as_str()), &tab_id);

        if self.groups[index + 1..]
            .iter()
            .any(|g| g.parent_group_id.as_deref() == Some(id.as_str()))
        {
            self.groups[index].children_type = ChildrenType::Groups;
        }
    }

    fn push_service(&mut self, title: String, fields: &Mapping, parent: Option<&str>) {
        let group_id = parent.unwrap_or(ORPHANED).to_string();
        let counter = self.service_counters.entry(group_id.clone()).or_insert(0);
        let order = *counter;
        *counter += 1;

        let mut service = Service::new(title, group_id, order);
        for (key, value) in fields {
            let lifted = match key.as_str() {
                Some("description") => lift(&mut service.description, value),
                Some("icon") => lift(&mut service.icon, value),
                Some("href") => lift(&mut service.href, value),
                Some("container") => lift(&mut service.container, value),
                Some("server") => lift(&mut service.server, value),
                Some("ping") => lift(&mut service.ping, value),
                Some("site_monitor") => lift(&mut service.site_monitor, value),
                Some("widget") => match value {
                    Value::Mapping(widget) => lift_widget(&mut service.widgets, widget),
                    Value::Null => true,
                    _ => false,
                },
                _ => false,
            };
            if !lifted {
                service.advanced_extra.insert(key.clone(), value.clone());
            }
        }

        self.services.push(service);
    }
}

/// Move a known string field onto the model. Null counts as absent; other
/// shapes stay in `advanced_extra` so nothing is lost.
fn lift(slot: &mut Option<String>, value: &Value) -> bool {
    match value {
        Value::String(s) => {
            *slot = Some(s.clone());
            true
        }
        Value::Null => true,
        _ => false,
    }
}

fn lift_widget(widgets: &mut Vec<ServiceWidget>, widget: &Mapping) -> bool {
    let widget_type = widget
        .get("type")
        .and_then(scalar_to_string)
        .unwrap_or_default();
    match serde_yaml::to_string(widget) {
        Ok(config_text) => {
            widgets.push(ServiceWidget {
                widget_type,
                config_text,
            });
            true
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                widget = %widget_type,
                "Could not re-serialize widget, keeping it verbatim"
            );
            false
        }
    }
}

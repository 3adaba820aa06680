// Dashboard domain model - the canonical, flat view of a homepage config
use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

/// Tab id meaning "no explicit tab assigned". Never written to settings.yaml.
pub const ALL_TABS: &str = "AllTabs";

/// Group id carried by services that have no enclosing group.
pub const ORPHANED: &str = "orphaned";

/// Display name for the default tab.
pub const DEFAULT_TAB_NAME: &str = "Dashboard";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: String,
    pub name: String,
    pub order: usize,
    pub is_all_tabs: bool,
}

impl Tab {
    pub fn new(id: String, name: String, order: usize) -> Self {
        let is_all_tabs = id == ALL_TABS;
        Self {
            id,
            name,
            order,
            is_all_tabs,
        }
    }

    /// The synthesized tab that holds groups without an explicit tab
    pub fn all_tabs(order: usize) -> Self {
        Self::new(ALL_TABS.to_string(), DEFAULT_TAB_NAME.to_string(), order)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildrenType {
    #[default]
    Services,
    Groups,
}

/// A group of services or subgroups.
///
/// `name` is the only identity that survives a round trip through YAML;
/// `id` is regenerated on every parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
    pub parent_group_id: Option<String>,
    pub tab_id: String,
    pub order: usize,
    #[serde(default)]
    pub options: Mapping,
    #[serde(default)]
    pub advanced_extra: Mapping,
    #[serde(default)]
    pub children_type: ChildrenType,
}

impl Group {
    pub fn new(
        name: String,
        parent_group_id: Option<String>,
        tab_id: String,
        order: usize,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            parent_group_id,
            tab_id,
            order,
            options: Mapping::new(),
            advanced_extra: Mapping::new(),
            children_type: ChildrenType::Services,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_group_id.is_none()
    }
}

/// One widget attached to a service, kept as raw YAML text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceWidget {
    #[serde(rename = "type")]
    pub widget_type: String,
    pub config_text: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub title: String,
    pub group_id: String,
    pub order: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_monitor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pod: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default)]
    pub widgets: Vec<ServiceWidget>,
    #[serde(default)]
    pub advanced_extra: Mapping,
}

impl Service {
    pub fn new(title: String, group_id: String, order: usize) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            group_id,
            order,
            ..Self::default()
        }
    }

    pub fn is_orphaned(&self) -> bool {
        self.group_id == ORPHANED
    }
}

/// Flat forest of tabs, groups and services plus the untouched settings bag
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CanonicalModel {
    #[serde(default)]
    pub settings: Mapping,
    #[serde(default)]
    pub tabs: Vec<Tab>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub services: Vec<Service>,
}

impl CanonicalModel {
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.id == id)
    }

    /// Tabs sorted by `order`
    pub fn sorted_tabs(&self) -> Vec<&Tab> {
        let mut tabs: Vec<&Tab> = self.tabs.iter().collect();
        tabs.sort_by_key(|t| t.order);
        tabs
    }

    /// Direct subgroups of `parent` (or root groups for `None`), sorted by `order`
    pub fn child_groups(&self, parent: Option<&str>) -> Vec<&Group> {
        let mut groups: Vec<&Group> = self
            .groups
            .iter()
            .filter(|g| g.parent_group_id.as_deref() == parent)
            .collect();
        groups.sort_by_key(|g| g.order);
        groups
    }

    /// Services directly inside `group_id`, sorted by `order`
    pub fn group_services(&self, group_id: &str) -> Vec<&Service> {
        let mut services: Vec<&Service> = self
            .services
            .iter()
            .filter(|s| s.group_id == group_id)
            .collect();
        services.sort_by_key(|s| s.order);
        services
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tabs_flag() {
        assert!(Tab::all_tabs(0).is_all_tabs);
        assert_eq!(Tab::all_tabs(0).name, DEFAULT_TAB_NAME);
        assert!(!Tab::new("Media".to_string(), "Media".to_string(), 1).is_all_tabs);
    }

    #[test]
    fn test_child_groups_sorted_by_order() {
        let mut model = CanonicalModel::default();
        let a = Group::new("A".to_string(), None, ALL_TABS.to_string(), 1);
        let b = Group::new("B".to_string(), None, ALL_TABS.to_string(), 0);
        let sub = Group::new("Sub".to_string(), Some(a.id.clone()), ALL_TABS.to_string(), 0);
        let a_id = a.id.clone();
        model.groups = vec![a, b, sub];

        let roots: Vec<&str> = model.child_groups(None).iter().map(|g| g.name.as_str()).collect();
        assert_eq!(roots, vec!["B", "A"]);
        assert_eq!(model.child_groups(Some(&a_id)).len(), 1);
    }

    #[test]
    fn test_json_wire_names() {
        let mut group = Group::new("Media".to_string(), None, ALL_TABS.to_string(), 0);
        group.children_type = ChildrenType::Groups;
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["parentGroupId"], serde_json::Value::Null);
        assert_eq!(json["tabId"], "AllTabs");
        assert_eq!(json["childrenType"], "groups");

        let widget = ServiceWidget {
            widget_type: "sonarr".to_string(),
            config_text: "type: sonarr\n".to_string(),
        };
        let json = serde_json::to_value(&widget).unwrap();
        assert_eq!(json["type"], "sonarr");
        assert_eq!(json["configText"], "type: sonarr\n");
    }

    #[test]
    fn test_service_absent_fields_not_serialized() {
        let service = Service::new("Plex".to_string(), ORPHANED.to_string(), 0);
        let json = serde_json::to_value(&service).unwrap();
        assert!(json.get("href").is_none());
        assert_eq!(json["groupId"], "orphaned");
        assert!(service.is_orphaned());
    }
}

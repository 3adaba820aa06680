// Editing operations the UI applies to the canonical model.
//
// Every operation keeps `order` dense (0..n-1) inside the sibling sets it
// touches, even when a client sends a model with gaps. Group siblings share
// `(tab_id, parent_group_id)`, service siblings share `group_id`.
use super::dashboard::{
    CanonicalModel, ChildrenType, Group, Service, Tab, ALL_TABS, ORPHANED,
};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Unknown group: {0}")]
    UnknownGroup(String),

    #[error("Unknown service: {0}")]
    UnknownService(String),

    #[error("Unknown tab: {0}")]
    UnknownTab(String),

    #[error("Name '{name}' is already used by a sibling")]
    DuplicateName { name: String },

    #[error("'{active}' and '{over}' are not siblings")]
    NotSiblings { active: String, over: String },

    #[error("Group {0} is not a root group")]
    NotRootGroup(String),

    #[error("The default tab cannot be removed")]
    DefaultTab,
}

pub type Result<T> = std::result::Result<T, ModelError>;

impl CanonicalModel {
    /// Create a group at the end of its sibling set. Subgroups take the
    /// parent's tab and ignore `tab_id`.
    pub fn add_group(
        &mut self,
        name: &str,
        parent_group_id: Option<&str>,
        tab_id: &str,
    ) -> Result<String> {
        let tab_id = match parent_group_id {
            Some(parent) => self.require_group(parent)?.tab_id.clone(),
            None => {
                self.require_tab(tab_id)?;
                tab_id.to_string()
            }
        };
        self.ensure_group_name_free(name, parent_group_id, None)?;

        let order = self.next_group_order(&tab_id, parent_group_id);
        let group = Group::new(
            name.to_string(),
            parent_group_id.map(str::to_string),
            tab_id.clone(),
            order,
        );
        let id = group.id.clone();
        self.groups.push(group);
        self.renumber_groups(&tab_id, parent_group_id);
        if tab_id == ALL_TABS {
            self.ensure_default_tab();
        }
        if let Some(parent) = parent_group_id {
            self.refresh_children_type(parent);
        }
        Ok(id)
    }

    /// Create a service at the end of `group_id` (which may be `"orphaned"`).
    pub fn add_service(&mut self, title: &str, group_id: &str) -> Result<String> {
        if group_id != ORPHANED {
            self.require_group(group_id)?;
        }
        self.ensure_service_title_free(title, group_id, None)?;

        let order = self.next_service_order(group_id);
        let service = Service::new(title.to_string(), group_id.to_string(), order);
        let id = service.id.clone();
        self.services.push(service);
        self.renumber_services(group_id);
        Ok(id)
    }

    pub fn rename_group(&mut self, id: &str, name: &str) -> Result<()> {
        let parent = self.require_group(id)?.parent_group_id.clone();
        self.ensure_group_name_free(name, parent.as_deref(), Some(id))?;
        if let Some(group) = self.groups.iter_mut().find(|g| g.id == id) {
            group.name = name.to_string();
        }
        Ok(())
    }

    pub fn rename_service(&mut self, id: &str, title: &str) -> Result<()> {
        let group_id = self.require_service(id)?.group_id.clone();
        self.ensure_service_title_free(title, &group_id, Some(id))?;
        if let Some(service) = self.services.iter_mut().find(|s| s.id == id) {
            service.title = title.to_string();
        }
        Ok(())
    }

    /// Remove a group and everything nested under it. Services of removed
    /// groups are kept and become orphaned.
    pub fn delete_group(&mut self, id: &str) -> Result<()> {
        let group = self.require_group(id)?.clone();
        let removed = self.descendant_ids(id);

        self.groups.retain(|g| !removed.contains(&g.id));

        let mut next_orphan = self.next_service_order(ORPHANED);
        for service in self.services.iter_mut() {
            if removed.contains(&service.group_id) {
                service.group_id = ORPHANED.to_string();
                service.order = next_orphan;
                next_orphan += 1;
            }
        }

        self.renumber_groups(&group.tab_id, group.parent_group_id.as_deref());
        self.renumber_services(ORPHANED);
        if let Some(parent) = group.parent_group_id.as_deref() {
            self.refresh_children_type(parent);
        }
        Ok(())
    }

    pub fn delete_service(&mut self, id: &str) -> Result<()> {
        let group_id = self.require_service(id)?.group_id.clone();
        self.services.retain(|s| s.id != id);
        self.renumber_services(&group_id);
        Ok(())
    }

    /// Drag `active_id` onto the position of `over_id` within one sibling set.
    pub fn move_group(&mut self, active_id: &str, over_id: &str) -> Result<()> {
        let active = self.require_group(active_id)?;
        let over = self.require_group(over_id)?;
        if active.tab_id != over.tab_id || active.parent_group_id != over.parent_group_id {
            return Err(ModelError::NotSiblings {
                active: active_id.to_string(),
                over: over_id.to_string(),
            });
        }

        let tab_id = active.tab_id.clone();
        let parent = active.parent_group_id.clone();
        let mut ids = self.sorted_group_ids(&tab_id, parent.as_deref());
        array_move(&mut ids, active_id, over_id);
        self.apply_group_order(&ids);
        Ok(())
    }

    /// Drag `active_id` onto the position of `over_id` within one group.
    pub fn move_service(&mut self, active_id: &str, over_id: &str) -> Result<()> {
        let active = self.require_service(active_id)?;
        let over = self.require_service(over_id)?;
        if active.group_id != over.group_id {
            return Err(ModelError::NotSiblings {
                active: active_id.to_string(),
                over: over_id.to_string(),
            });
        }

        let group_id = active.group_id.clone();
        let mut ids = self.sorted_service_ids(&group_id);
        array_move(&mut ids, active_id, over_id);
        self.apply_service_order(&ids);
        Ok(())
    }

    /// Move a service to the end of another group.
    pub fn move_service_to_group(&mut self, id: &str, group_id: &str) -> Result<()> {
        let service = self.require_service(id)?;
        let (title, old_group) = (service.title.clone(), service.group_id.clone());
        if old_group == group_id {
            return Ok(());
        }
        if group_id != ORPHANED {
            self.require_group(group_id)?;
        }
        self.ensure_service_title_free(&title, group_id, Some(id))?;

        let order = self.next_service_order(group_id);
        if let Some(service) = self.services.iter_mut().find(|s| s.id == id) {
            service.group_id = group_id.to_string();
            service.order = order;
        }
        self.renumber_services(&old_group);
        self.renumber_services(group_id);
        Ok(())
    }

    /// Put a root group (and its subtree) on another tab, last in that tab.
    pub fn assign_group_tab(&mut self, id: &str, tab_id: &str) -> Result<()> {
        let group = self.require_group(id)?;
        if !group.is_root() {
            return Err(ModelError::NotRootGroup(id.to_string()));
        }
        self.require_tab(tab_id)?;

        let old_tab = group.tab_id.clone();
        if old_tab == tab_id {
            return Ok(());
        }

        let order = self.next_group_order(tab_id, None);
        let subtree = self.descendant_ids(id);
        for group in self.groups.iter_mut().filter(|g| subtree.contains(&g.id)) {
            group.tab_id = tab_id.to_string();
            if group.id == id {
                group.order = order;
            }
        }
        self.renumber_groups(&old_tab, None);
        self.renumber_groups(tab_id, None);
        if tab_id == ALL_TABS {
            self.ensure_default_tab();
        }
        Ok(())
    }

    /// Apply a new tab order. Repeated ids count once; tabs missing from
    /// `ids` keep their relative order after the listed ones.
    pub fn reorder_tabs(&mut self, ids: &[String]) -> Result<()> {
        if let Some(unknown) = ids.iter().find(|id| !self.tabs.iter().any(|t| &t.id == *id)) {
            return Err(ModelError::UnknownTab(unknown.clone()));
        }

        let current: Vec<String> = self.sorted_tabs().iter().map(|t| t.id.clone()).collect();
        let mut ordered: Vec<String> = Vec::with_capacity(current.len());
        for id in ids.iter().cloned().chain(current) {
            if !ordered.contains(&id) {
                ordered.push(id);
            }
        }
        for (idx, id) in ordered.iter().enumerate() {
            if let Some(tab) = self.tabs.iter_mut().find(|t| &t.id == id) {
                tab.order = idx;
            }
        }
        Ok(())
    }

    /// Change a tab's display name. The new name is what settings.yaml gets.
    pub fn rename_tab(&mut self, id: &str, name: &str) -> Result<()> {
        let tab = self
            .tabs
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ModelError::UnknownTab(id.to_string()))?;
        tab.name = name.to_string();
        Ok(())
    }

    /// Remove a tab. Its groups fall back to the default tab.
    pub fn remove_tab(&mut self, id: &str) -> Result<()> {
        if id == ALL_TABS {
            return Err(ModelError::DefaultTab);
        }
        if !self.tabs.iter().any(|t| t.id == id) {
            return Err(ModelError::UnknownTab(id.to_string()));
        }

        self.tabs.retain(|t| t.id != id);
        let mut next = self.next_group_order(ALL_TABS, None);
        let mut moved = false;
        for group in self.groups.iter_mut().filter(|g| g.tab_id == id) {
            group.tab_id = ALL_TABS.to_string();
            if group.parent_group_id.is_none() {
                group.order = next;
                next += 1;
            }
            moved = true;
        }
        self.renumber_groups(ALL_TABS, None);
        if moved {
            self.ensure_default_tab();
        }

        let ids: Vec<String> = self.sorted_tabs().iter().map(|t| t.id.clone()).collect();
        self.reorder_tabs(&ids)
    }

    /// Re-densify every sibling set, keeping the current relative order.
    pub fn normalize_order(&mut self) {
        let mut group_sets: Vec<(String, Option<String>)> = Vec::new();
        for group in &self.groups {
            let key = (group.tab_id.clone(), group.parent_group_id.clone());
            if !group_sets.contains(&key) {
                group_sets.push(key);
            }
        }
        for (tab_id, parent) in group_sets {
            self.renumber_groups(&tab_id, parent.as_deref());
        }

        let mut service_sets: Vec<String> = Vec::new();
        for service in &self.services {
            if !service_sets.contains(&service.group_id) {
                service_sets.push(service.group_id.clone());
            }
        }
        for group_id in service_sets {
            self.renumber_services(&group_id);
        }

        let ids: Vec<String> = self.sorted_tabs().iter().map(|t| t.id.clone()).collect();
        for (idx, id) in ids.iter().enumerate() {
            if let Some(tab) = self.tabs.iter_mut().find(|t| &t.id == id) {
                tab.order = idx;
            }
        }
    }

    /// List the default tab once some group sits on it.
    fn ensure_default_tab(&mut self) {
        if !self.tabs.iter().any(|t| t.id == ALL_TABS) {
            let order = self.tabs.iter().map(|t| t.order + 1).max().unwrap_or(0);
            self.tabs.push(Tab::all_tabs(order));
        }
    }

    fn require_group(&self, id: &str) -> Result<&Group> {
        self.group(id)
            .ok_or_else(|| ModelError::UnknownGroup(id.to_string()))
    }

    fn require_service(&self, id: &str) -> Result<&Service> {
        self.service(id)
            .ok_or_else(|| ModelError::UnknownService(id.to_string()))
    }

    fn require_tab(&self, id: &str) -> Result<()> {
        if id == ALL_TABS || self.tabs.iter().any(|t| t.id == id) {
            Ok(())
        } else {
            Err(ModelError::UnknownTab(id.to_string()))
        }
    }

    fn ensure_group_name_free(
        &self,
        name: &str,
        parent: Option<&str>,
        except: Option<&str>,
    ) -> Result<()> {
        let taken = self.groups.iter().any(|g| {
            g.parent_group_id.as_deref() == parent
                && g.name == name
                && Some(g.id.as_str()) != except
        });
        if taken {
            return Err(ModelError::DuplicateName {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn ensure_service_title_free(
        &self,
        title: &str,
        group_id: &str,
        except: Option<&str>,
    ) -> Result<()> {
        let taken = self.services.iter().any(|s| {
            s.group_id == group_id && s.title == title && Some(s.id.as_str()) != except
        });
        if taken {
            return Err(ModelError::DuplicateName {
                name: title.to_string(),
            });
        }
        Ok(())
    }

    /// `id` plus the ids of every group nested under it
    fn descendant_ids(&self, id: &str) -> HashSet<String> {
        let mut found = HashSet::from([id.to_string()]);
        let mut frontier = vec![id.to_string()];
        while let Some(current) = frontier.pop() {
            for group in &self.groups {
                if group.parent_group_id.as_deref() == Some(current.as_str())
                    && found.insert(group.id.clone())
                {
                    frontier.push(group.id.clone());
                }
            }
        }
        found
    }

    fn refresh_children_type(&mut self, id: &str) {
        let has_subgroups = self
            .groups
            .iter()
            .any(|g| g.parent_group_id.as_deref() == Some(id));
        if let Some(group) = self.groups.iter_mut().find(|g| g.id == id) {
            group.children_type = if has_subgroups {
                ChildrenType::Groups
            } else {
                ChildrenType::Services
            };
        }
    }

    fn sorted_group_ids(&self, tab_id: &str, parent: Option<&str>) -> Vec<String> {
        let mut siblings: Vec<&Group> = self
            .groups
            .iter()
            .filter(|g| g.tab_id == tab_id && g.parent_group_id.as_deref() == parent)
            .collect();
        siblings.sort_by_key(|g| g.order);
        siblings.into_iter().map(|g| g.id.clone()).collect()
    }

    fn sorted_service_ids(&self, group_id: &str) -> Vec<String> {
        self.group_services(group_id)
            .into_iter()
            .map(|s| s.id.clone())
            .collect()
    }

    /// One past the highest `order` in a group sibling set
    fn next_group_order(&self, tab_id: &str, parent: Option<&str>) -> usize {
        self.groups
            .iter()
            .filter(|g| g.tab_id == tab_id && g.parent_group_id.as_deref() == parent)
            .map(|g| g.order + 1)
            .max()
            .unwrap_or(0)
    }

    fn next_service_order(&self, group_id: &str) -> usize {
        self.services
            .iter()
            .filter(|s| s.group_id == group_id)
            .map(|s| s.order + 1)
            .max()
            .unwrap_or(0)
    }

    fn renumber_groups(&mut self, tab_id: &str, parent: Option<&str>) {
        let ids = self.sorted_group_ids(tab_id, parent);
        self.apply_group_order(&ids);
    }

    fn renumber_services(&mut self, group_id: &str) {
        let ids = self.sorted_service_ids(group_id);
        self.apply_service_order(&ids);
    }

    fn apply_group_order(&mut self, ids: &[String]) {
        for (idx, id) in ids.iter().enumerate() {
            if let Some(group) = self.groups.iter_mut().find(|g| &g.id == id) {
                group.order = idx;
            }
        }
    }

    fn apply_service_order(&mut self, ids: &[String]) {
        for (idx, id) in ids.iter().enumerate() {
            if let Some(service) = self.services.iter_mut().find(|s| &s.id == id) {
                service.order = idx;
            }
        }
    }
}

/// Move `active` to the index currently held by `over`.
fn array_move(ids: &mut Vec<String>, active: &str, over: &str) {
    let from = ids.iter().position(|id| id == active);
    let to = ids.iter().position(|id| id == over);
    if let (Some(from), Some(to)) = (from, to) {
        let item = ids.remove(from);
        ids.insert(to, item);
    }
}

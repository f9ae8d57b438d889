//! Core bootcfg service
//!
//! Group selection, Profile resolution and validated access to stored
//! records. Each call reads the store independently: a selection lists
//! Groups and then fetches one Profile, with no snapshot spanning the two.

use crate::error::{BootcfgError, ErrorKind, Result};
use crate::render::{IgnitionTemplates, TemplateSource};
use crate::store::Store;
use bootcfg_model::{sort_by_specificity, Group, Labels, Profile, TemplateNamespace};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The bootcfg core, shared by all request handlers
#[derive(Clone)]
pub struct Server {
    store: Arc<dyn Store>,
}

impl Server {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Source for `include` in rendered templates
    pub fn template_source(&self) -> Arc<dyn TemplateSource> {
        Arc::new(IgnitionTemplates::new(self.store.clone()))
    }

    // === Selection ===

    /// Most specific Group whose selector is satisfied by `labels`
    ///
    /// Groups are tried by descending selector count, ties by ascending
    /// id. A Group with an empty selector matches anything and so only wins
    /// when nothing more specific does.
    pub fn select_group(&self, labels: &Labels) -> Result<Group> {
        let mut groups = self.store.group_list()?;
        sort_by_specificity(&mut groups);

        match groups.into_iter().find(|g| g.matches(labels)) {
            Some(group) => {
                debug!(group = %group.id, ?labels, "matched group");
                Ok(group)
            }
            None => {
                info!(?labels, "no matching group");
                Err(BootcfgError::NoMatchingGroup(labels.clone()))
            }
        }
    }

    /// Profile of the Group selected by `labels`
    pub fn select_profile(&self, labels: &Labels) -> Result<Profile> {
        let group = self.select_group(labels)?;
        self.profile_for_group(&group)
    }

    /// Resolve a Group's Profile
    ///
    /// A missing or invalid Profile is reported as `NoMatchingProfile` so
    /// it can be told apart from an unmatched request. An empty profile id
    /// never reaches the store.
    pub fn profile_for_group(&self, group: &Group) -> Result<Profile> {
        if group.profile.is_empty() {
            info!(group = %group.id, "group has no profile");
            return Err(BootcfgError::NoMatchingProfile {
                group: group.id.clone(),
                reason: "no profile id".to_string(),
            });
        }

        match self.profile_get(&group.profile) {
            Ok(profile) => Ok(profile),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::Invalid) => {
                info!(group = %group.id, profile = %group.profile, error = %e, "no usable profile");
                Err(BootcfgError::NoMatchingProfile {
                    group: group.id.clone(),
                    reason: e.to_string(),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch the template a Profile names in `namespace`
    ///
    /// An unset or empty reference never reaches the store.
    pub fn profile_template(&self, profile: &Profile, namespace: TemplateNamespace) -> Result<String> {
        let Some(name) = profile.template_ref(namespace) else {
            info!(profile = %profile.id, %namespace, "profile names no template");
            return Err(BootcfgError::MissingTemplateRef {
                profile: profile.id.clone(),
                namespace,
            });
        };

        self.store.template_get(namespace, name).map_err(|e| {
            info!(profile = %profile.id, %namespace, template = name, error = %e, "template unavailable");
            e.into()
        })
    }

    // === Groups ===

    /// Validate and store a Group
    ///
    /// A `mac` selector is stored in the same lower-case colon form that
    /// request labels are normalized to, so either spelling matches.
    pub fn group_put(&self, group: &Group) -> Result<()> {
        let group = group
            .clone()
            .normalized()
            .map_err(|source| BootcfgError::InvalidGroup {
                id: group.id.clone(),
                source,
            })?;
        self.store.group_put(&group)?;
        debug!(group = %group.id, "stored group");
        Ok(())
    }

    pub fn group_get(&self, id: &str) -> Result<Group> {
        Ok(self.store.group_get(id)?)
    }

    pub fn group_list(&self) -> Result<Vec<Group>> {
        Ok(self.store.group_list()?)
    }

    // === Profiles ===

    /// Validate and store a Profile
    pub fn profile_put(&self, profile: &Profile) -> Result<()> {
        profile.validate().map_err(|source| BootcfgError::InvalidProfile {
            id: profile.id.clone(),
            source,
        })?;
        self.store.profile_put(profile)?;
        debug!(profile = %profile.id, "stored profile");
        Ok(())
    }

    /// Fetch a Profile, refusing structurally broken records
    pub fn profile_get(&self, id: &str) -> Result<Profile> {
        let profile = self.store.profile_get(id)?;
        profile.validate().map_err(|source| {
            warn!(profile = id, error = %source, "stored profile is invalid");
            BootcfgError::InvalidProfile {
                id: id.to_string(),
                source,
            }
        })?;
        Ok(profile)
    }

    pub fn profile_list(&self) -> Result<Vec<Profile>> {
        Ok(self.store.profile_list()?)
    }

    // === Templates ===

    pub fn ignition_put(&self, name: &str, contents: &str) -> Result<()> {
        Ok(self.store.ignition_put(name, contents)?)
    }

    pub fn ignition_get(&self, name: &str) -> Result<String> {
        Ok(self.store.ignition_get(name)?)
    }

    pub fn cloud_put(&self, name: &str, contents: &str) -> Result<()> {
        Ok(self.store.cloud_put(name, contents)?)
    }

    pub fn cloud_get(&self, name: &str) -> Result<String> {
        Ok(self.store.cloud_get(name)?)
    }

    pub fn generic_put(&self, name: &str, contents: &str) -> Result<()> {
        Ok(self.store.generic_put(name, contents)?)
    }

    pub fn generic_get(&self, name: &str) -> Result<String> {
        Ok(self.store.generic_get(name)?)
    }
}

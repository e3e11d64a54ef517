//! Action descriptors and grant registry
//!
//! The host environment gates every operation behind a named action. The
//! descriptors below are static data registered once at startup through
//! [`ActionProvider::register_many`]; the in-process [`ActionRegistry`]
//! records what was registered and answers grant queries from the
//! configuration's granted set.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::RwLock;

/// Plugin identifier carried on every descriptor
pub const PLUGIN_NAME: &str = "repobridge";

/// A registrable action descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionDescriptor {
    pub section: &'static str,
    pub sub_category: Option<&'static str>,
    pub display_name: &'static str,
    pub uid: &'static str,
    pub plugin: &'static str,
}

/// The five actions this tool exposes
pub const ACTIONS: [ActionDescriptor; 5] = [
    ActionDescriptor {
        section: "plugins",
        sub_category: None,
        display_name: "View and access the plugin",
        uid: "use",
        plugin: PLUGIN_NAME,
    },
    ActionDescriptor {
        section: "plugins",
        sub_category: Some("Repositories"),
        display_name: "Read GitHub repositories",
        uid: "repos.read",
        plugin: PLUGIN_NAME,
    },
    ActionDescriptor {
        section: "plugins",
        sub_category: Some("Projects"),
        display_name: "Read projects",
        uid: "projects.read",
        plugin: PLUGIN_NAME,
    },
    ActionDescriptor {
        section: "plugins",
        sub_category: Some("Projects"),
        display_name: "Create projects from GitHub repositories",
        uid: "projects.create",
        plugin: PLUGIN_NAME,
    },
    ActionDescriptor {
        section: "plugins",
        sub_category: Some("Projects"),
        display_name: "Delete projects",
        uid: "projects.delete",
        plugin: PLUGIN_NAME,
    },
];

/// Capability-registration interface exposed by the host
#[async_trait]
pub trait ActionProvider: Send + Sync {
    /// Register a batch of action descriptors
    async fn register_many(&self, actions: &[ActionDescriptor]) -> Result<()>;
}

/// Register the static action list with the host
pub async fn register_actions(provider: &dyn ActionProvider) -> Result<()> {
    provider.register_many(&ACTIONS).await
}

/// In-process action registry with a config-supplied granted set
///
/// An action is usable only when it has been registered AND granted;
/// querying an unregistered uid always answers false.
pub struct ActionRegistry {
    registered: RwLock<HashSet<String>>,
    granted: HashSet<String>,
}

impl ActionRegistry {
    /// Create a registry for an operator holding the given grants
    pub fn new(granted: &[String]) -> Self {
        Self {
            registered: RwLock::new(HashSet::new()),
            granted: granted.iter().cloned().collect(),
        }
    }

    /// Whether the action is registered and granted to this operator
    pub fn is_granted(&self, uid: &str) -> bool {
        let registered = self
            .registered
            .read()
            .expect("action registry lock poisoned");

        registered.contains(uid) && self.granted.contains(uid)
    }

    /// Uids registered so far, sorted
    pub fn registered_uids(&self) -> Vec<String> {
        let registered = self
            .registered
            .read()
            .expect("action registry lock poisoned");

        let mut uids: Vec<String> = registered.iter().cloned().collect();
        uids.sort();
        uids
    }
}

#[async_trait]
impl ActionProvider for ActionRegistry {
    async fn register_many(&self, actions: &[ActionDescriptor]) -> Result<()> {
        let mut registered = self
            .registered
            .write()
            .expect("action registry lock poisoned");

        for action in actions {
            registered.insert(action.uid.to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_granted() -> Vec<String> {
        ACTIONS.iter().map(|action| action.uid.to_string()).collect()
    }

    #[test]
    fn test_action_list_shape() {
        assert_eq!(ACTIONS.len(), 5);
        assert!(ACTIONS.iter().all(|action| action.section == "plugins"));
        assert!(ACTIONS.iter().all(|action| action.plugin == PLUGIN_NAME));

        let uids: Vec<&str> = ACTIONS.iter().map(|action| action.uid).collect();
        assert_eq!(
            uids,
            vec![
                "use",
                "repos.read",
                "projects.read",
                "projects.create",
                "projects.delete"
            ]
        );
    }

    #[tokio::test]
    async fn test_register_and_query() {
        let registry = ActionRegistry::new(&all_granted());
        register_actions(&registry).await.unwrap();

        assert!(registry.is_granted("use"));
        assert!(registry.is_granted("projects.create"));
        assert_eq!(registry.registered_uids().len(), 5);
    }

    #[tokio::test]
    async fn test_ungranted_action_is_refused() {
        let granted = vec!["use".to_string(), "repos.read".to_string()];
        let registry = ActionRegistry::new(&granted);
        register_actions(&registry).await.unwrap();

        assert!(registry.is_granted("repos.read"));
        assert!(!registry.is_granted("projects.delete"));
    }

    #[test]
    fn test_unregistered_action_is_refused_even_if_granted() {
        let registry = ActionRegistry::new(&all_granted());

        // Nothing registered yet
        assert!(!registry.is_granted("use"));
    }
}

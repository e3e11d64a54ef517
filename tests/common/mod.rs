//! Common test utilities and fixtures for RepoBridge tests

use repobridge::{Config, Project, Repository};

/// Configuration pointing at a test backend, with an inline credential so
/// tests never depend on process environment
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.backend.base_url = base_url.to_string();
    config.auth.method = "inline".to_string();
    config.auth.token = Some("test-token".to_string());
    config
}

/// Repository fixture
pub fn repository(id: &str, name: &str, project_id: Option<&str>) -> Repository {
    Repository {
        id: id.to_string(),
        name: name.to_string(),
        short_description: format!("Description of {}", name),
        url: format!("https://github.com/acme/{}", name),
        project_id: project_id.map(str::to_string),
    }
}

/// Project descriptor fixture
pub fn project(id: &str, title: &str, repository_id: &str) -> Project {
    Project {
        id: id.to_string(),
        title: title.to_string(),
        repository_id: repository_id.to_string(),
    }
}

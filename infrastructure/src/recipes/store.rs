//! File-based recipe store.
//!
//! Loads `<name>.toml` from an ordered list of search directories:
//! the project-level `./recipes/` first, then any configured directory,
//! then the user's config directory. The first match wins. Files are read
//! fresh on every load so edits take effect on the next run.

use super::schema::RecipeFile;
use async_trait::async_trait;
use maestro_application::ports::recipe_store::{RecipeStoreError, RecipeStorePort};
use maestro_domain::RecipeDefinition;
use std::path::PathBuf;
use tracing::debug;

/// Recipe store over plain TOML files.
pub struct FileRecipeStore {
    search_dirs: Vec<PathBuf>,
}

impl FileRecipeStore {
    /// Create a store over the default search path.
    pub fn new() -> Self {
        Self {
            search_dirs: Self::default_dirs(),
        }
    }

    /// Create a store over an explicit list of directories.
    pub fn with_dirs(search_dirs: Vec<PathBuf>) -> Self {
        Self { search_dirs }
    }

    /// Insert a configured directory after the project-level one.
    pub fn with_configured_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let position = self.search_dirs.len().min(1);
        self.search_dirs.insert(position, dir.into());
        self
    }

    /// Default search path: `./recipes`, then
    /// `<config_dir>/maestro/recipes`.
    pub fn default_dirs() -> Vec<PathBuf> {
        let mut dirs = vec![PathBuf::from("recipes")];
        if let Some(config) = dirs::config_dir() {
            dirs.push(config.join("maestro").join("recipes"));
        }
        dirs
    }

    fn searched_display(&self) -> Vec<String> {
        self.search_dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect()
    }
}

impl Default for FileRecipeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecipeStorePort for FileRecipeStore {
    async fn load(&self, name: &str) -> Result<RecipeDefinition, RecipeStoreError> {
        // Recipe names are identifiers, not paths.
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(RecipeStoreError::Invalid {
                name: name.to_string(),
                reason: "recipe names must not contain path separators".to_string(),
            });
        }

        for dir in &self.search_dirs {
            let path = dir.join(format!("{}.toml", name));
            if !path.is_file() {
                continue;
            }
            debug!("Loading recipe '{}' from {}", name, path.display());

            let content =
                std::fs::read_to_string(&path).map_err(|e| RecipeStoreError::Unreadable {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;

            let file: RecipeFile =
                toml::from_str(&content).map_err(|e| RecipeStoreError::Invalid {
                    name: name.to_string(),
                    reason: e.to_string(),
                })?;

            return Ok(file.into_definition(name));
        }

        Err(RecipeStoreError::NotFound {
            name: name.to_string(),
            searched: self.searched_display(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn store_in(dir: &std::path::Path) -> FileRecipeStore {
        FileRecipeStore::with_dirs(vec![dir.to_path_buf()])
    }

    #[tokio::test]
    async fn loads_recipe_from_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(
            temp_dir.path().join("greet.toml"),
            r#"
user = "Say hello to {{who|world}}"

[defaults]
format = "plain"
"#,
        )
        .unwrap();

        let recipe = store_in(temp_dir.path()).load("greet").await.unwrap();
        assert_eq!(recipe.name, "greet");
        assert_eq!(recipe.user_template, "Say hello to {{who|world}}");
        assert_eq!(recipe.defaults.get("format").map(String::as_str), Some("plain"));
    }

    #[tokio::test]
    async fn first_matching_directory_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("dup.toml"), "user = \"from first\"").unwrap();
        fs::write(second.path().join("dup.toml"), "user = \"from second\"").unwrap();

        let store = FileRecipeStore::with_dirs(vec![
            first.path().to_path_buf(),
            second.path().to_path_buf(),
        ]);
        let recipe = store.load("dup").await.unwrap();
        assert_eq!(recipe.user_template, "from first");
    }

    #[tokio::test]
    async fn unknown_recipe_lists_searched_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let err = store_in(temp_dir.path()).load("ghost").await.unwrap_err();

        match &err {
            RecipeStoreError::NotFound { name, searched } => {
                assert_eq!(name, "ghost");
                assert_eq!(searched.len(), 1);
            }
            other => panic!("expected NotFound, got {:?}", other),
        }
        assert!(err.to_string().contains("ghost"));
        assert!(err.to_string().contains(temp_dir.path().to_str().unwrap()));
    }

    #[tokio::test]
    async fn malformed_recipe_is_invalid() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("bad.toml"), "user = [not toml").unwrap();

        let err = store_in(temp_dir.path()).load("bad").await.unwrap_err();
        assert!(matches!(err, RecipeStoreError::Invalid { .. }));
    }

    #[tokio::test]
    async fn path_like_names_are_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = store_in(temp_dir.path());

        assert!(matches!(
            store.load("../escape").await.unwrap_err(),
            RecipeStoreError::Invalid { .. }
        ));
        assert!(matches!(
            store.load("sub/dir").await.unwrap_err(),
            RecipeStoreError::Invalid { .. }
        ));
    }

    #[tokio::test]
    async fn reloads_fresh_on_every_call() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("live.toml");
        let store = store_in(temp_dir.path());

        fs::write(&path, "user = \"v1\"").unwrap();
        assert_eq!(store.load("live").await.unwrap().user_template, "v1");

        fs::write(&path, "user = \"v2\"").unwrap();
        assert_eq!(store.load("live").await.unwrap().user_template, "v2");
    }

    #[test]
    fn configured_dir_sits_after_project_dir() {
        let store = FileRecipeStore::new().with_configured_dir("/etc/maestro/recipes");
        assert_eq!(store.search_dirs[0], PathBuf::from("recipes"));
        assert_eq!(store.search_dirs[1], PathBuf::from("/etc/maestro/recipes"));
    }
}

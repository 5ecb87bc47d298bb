//! Filesystem collaborators of the output coordinator
//!
//! Each concern sits behind its own trait so the coordinator can be driven
//! against mocks:
//! - [`NamingService`]: where output for a project lives
//! - [`DeletionService`]: clear an output directory
//! - [`SavingService`]: persist one rendered unit
//! - [`PromotionService`]: swap a finished staging directory into place

use crate::error::WriteError;
use async_trait::async_trait;
use specgen_synth::{SourceRenderer, SourceUnit, TargetLanguage};
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default output directory name
pub const DEFAULT_DIRECTORY_NAME: &str = "GeneratedSpecs";

/// Computes the output directory for a project
#[cfg_attr(test, mockall::automock)]
pub trait NamingService: Send + Sync {
    /// Output directory for `project_path`
    fn output_path(&self, project_path: &Path) -> PathBuf;
}

/// Clears an output directory
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeletionService: Send + Sync {
    /// Remove everything under `path`, leaving an empty directory
    ///
    /// A path that does not exist yet is not an error.
    async fn delete(&self, path: &Path) -> Result<(), WriteError>;
}

/// Persists rendered units
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SavingService: Send + Sync {
    /// File name the unit is saved under
    fn file_name(&self, unit: &SourceUnit) -> String;

    /// Save one unit into `directory`, returning the written file
    async fn save(&self, unit: &SourceUnit, directory: &Path) -> Result<PathBuf, WriteError>;
}

/// Moves a completed staging directory over the live output
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromotionService: Send + Sync {
    /// Replace `output` with `staging`
    async fn promote(&self, staging: &Path, output: &Path) -> Result<(), WriteError>;
}

/// Output lives in a named directory next to the project file
///
/// `App/App.csproj` and `App/` both map to `App/<directory_name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiblingDirectoryNaming {
    directory_name: String,
}

impl SiblingDirectoryNaming {
    /// Create naming service
    #[inline]
    #[must_use]
    pub fn new(directory_name: impl Into<String>) -> Self {
        Self {
            directory_name: directory_name.into(),
        }
    }

    /// Directory name appended to the project root
    #[inline]
    #[must_use]
    pub fn directory_name(&self) -> &str {
        &self.directory_name
    }
}

impl Default for SiblingDirectoryNaming {
    fn default() -> Self {
        Self::new(DEFAULT_DIRECTORY_NAME)
    }
}

// A path that does not exist is treated as a directory; the coordinator
// rejects those before asking for an output path.
impl NamingService for SiblingDirectoryNaming {
    fn output_path(&self, project_path: &Path) -> PathBuf {
        let root = if project_path.is_file() {
            project_path.parent().unwrap_or(project_path)
        } else {
            project_path
        };
        root.join(&self.directory_name)
    }
}

/// Removes and recreates directories with `tokio::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsDeletion;

#[async_trait]
impl DeletionService for FsDeletion {
    async fn delete(&self, path: &Path) -> Result<(), WriteError> {
        match tokio::fs::remove_dir_all(path).await {
            Ok(()) => debug!(path = %path.display(), "removed existing output"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(WriteError::io("remove", path, e)),
        }

        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| WriteError::io("create", path, e))
    }
}

/// Renders units and writes them with `tokio::fs`
#[derive(Clone)]
pub struct FsSaving {
    renderer: Arc<dyn SourceRenderer>,
}

impl FsSaving {
    /// Create saving service
    #[must_use]
    pub fn new(renderer: Arc<dyn SourceRenderer>) -> Self {
        Self { renderer }
    }

    /// Saving service for a target language
    #[must_use]
    pub fn for_language(language: TargetLanguage) -> Self {
        Self::new(language.renderer())
    }
}

impl Default for FsSaving {
    fn default() -> Self {
        Self::for_language(TargetLanguage::default())
    }
}

impl std::fmt::Debug for FsSaving {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsSaving")
            .field("extension", &self.renderer.file_extension())
            .finish()
    }
}

#[async_trait]
impl SavingService for FsSaving {
    fn file_name(&self, unit: &SourceUnit) -> String {
        self.renderer.file_name(unit)
    }

    async fn save(&self, unit: &SourceUnit, directory: &Path) -> Result<PathBuf, WriteError> {
        let path = directory.join(self.file_name(unit));
        let text = self.renderer.render(unit);

        tokio::fs::write(&path, text)
            .await
            .map_err(|e| WriteError::io("write", &path, e))?;

        debug!(path = %path.display(), "saved unit");
        Ok(path)
    }
}

/// Swaps directories with two renames
///
/// The live output is moved aside, the staging directory renamed into its
/// place, and the old output removed. If the second rename fails the old
/// output is moved back. A retired directory left by an earlier run is
/// cleared first, and once the swap succeeds a failure to remove the old
/// output is only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsPromotion;

#[async_trait]
impl PromotionService for FsPromotion {
    async fn promote(&self, staging: &Path, output: &Path) -> Result<(), WriteError> {
        let retired = sibling_path(output, "retired");

        match tokio::fs::remove_dir_all(&retired).await {
            Ok(()) => debug!(path = %retired.display(), "removed leftover retired output"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(WriteError::io("remove", &retired, e)),
        }

        let had_output = match tokio::fs::rename(output, &retired).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(WriteError::io("retire", output, e)),
        };

        if let Err(e) = tokio::fs::rename(staging, output).await {
            if had_output {
                if let Err(restore) = tokio::fs::rename(&retired, output).await {
                    warn!(
                        retired = %retired.display(),
                        output = %output.display(),
                        "could not restore previous output: {restore}"
                    );
                }
            }
            return Err(WriteError::io("promote", staging, e));
        }

        if had_output {
            if let Err(e) = tokio::fs::remove_dir_all(&retired).await {
                warn!(path = %retired.display(), "could not remove retired output: {e}");
            }
        }
        Ok(())
    }
}

/// Staging directory used when regenerating `output`
#[must_use]
pub fn staging_path(output: &Path) -> PathBuf {
    sibling_path(output, "staging")
}

/// `<parent>/.<name>.<suffix>`
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or(path.as_os_str()));
    name.push(".");
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use specgen_model::Specification;
    use specgen_synth::{CodeSynthesizer, FixedNamespace, TestFramework};

    fn unit(name: &str) -> SourceUnit {
        CodeSynthesizer::new(
            Arc::new(FixedNamespace::new("Specs.Generated")),
            Arc::new(TestFramework::XUnit),
        )
        .generate_code(&Specification::new(name).with_scenario("Only"))
        .unwrap()
    }

    #[test]
    fn naming_uses_project_file_parent() {
        let dir = tempfile::tempdir().unwrap();
        let project = dir.path().join("App.csproj");
        std::fs::write(&project, "<Project />").unwrap();

        let naming = SiblingDirectoryNaming::default();
        assert_eq!(naming.output_path(&project), dir.path().join("GeneratedSpecs"));
    }

    #[test]
    fn naming_accepts_project_directory() {
        let dir = tempfile::tempdir().unwrap();
        let naming = SiblingDirectoryNaming::new("Out");
        assert_eq!(naming.output_path(dir.path()), dir.path().join("Out"));
    }

    #[test]
    fn staging_is_hidden_sibling() {
        assert_eq!(
            staging_path(Path::new("/work/App/GeneratedSpecs")),
            PathBuf::from("/work/App/.GeneratedSpecs.staging")
        );
    }

    #[tokio::test]
    async fn deletion_tolerates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing");

        FsDeletion.delete(&target).await.unwrap();

        assert!(target.is_dir());
        assert_eq!(std::fs::read_dir(&target).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn deletion_clears_nested_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out");
        std::fs::create_dir_all(target.join("nested")).unwrap();
        std::fs::write(target.join("Stale.cs"), "old").unwrap();
        std::fs::write(target.join("nested/Other.cs"), "old").unwrap();

        FsDeletion.delete(&target).await.unwrap();

        assert_eq!(std::fs::read_dir(&target).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn saving_writes_class_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let saving = FsSaving::default();

        let path = saving.save(&unit("Login Flow"), dir.path()).await.unwrap();

        assert_eq!(path, dir.path().join("LoginFlow.cs"));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("public class LoginFlow"));
    }

    #[tokio::test]
    async fn saving_into_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FsSaving::default()
            .save(&unit("Spec"), &dir.path().join("absent"))
            .await
            .unwrap_err();
        assert!(matches!(err, WriteError::Io { operation: "write", .. }));
    }

    #[tokio::test]
    async fn promotion_replaces_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        let staging = staging_path(&output);
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(output.join("Old.cs"), "old").unwrap();
        std::fs::create_dir_all(&staging).unwrap();
        std::fs::write(staging.join("New.cs"), "new").unwrap();

        FsPromotion.promote(&staging, &output).await.unwrap();

        assert!(output.join("New.cs").is_file());
        assert!(!output.join("Old.cs").exists());
        assert!(!staging.exists());
        assert!(!sibling_path(&output, "retired").exists());
    }

    #[tokio::test]
    async fn promotion_without_previous_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        let staging = staging_path(&output);
        std::fs::create_dir_all(&staging).unwrap();

        FsPromotion.promote(&staging, &output).await.unwrap();

        assert!(output.is_dir());
        assert!(!staging.exists());
    }

    #[tokio::test]
    async fn promotion_clears_leftover_retired_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        let staging = staging_path(&output);
        let retired = sibling_path(&output, "retired");
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(output.join("Old.cs"), "old").unwrap();
        std::fs::create_dir_all(&retired).unwrap();
        std::fs::write(retired.join("Leftover.cs"), "older").unwrap();
        std::fs::create_dir_all(&staging).unwrap();
        std::fs::write(staging.join("New.cs"), "new").unwrap();

        FsPromotion.promote(&staging, &output).await.unwrap();

        assert!(output.join("New.cs").is_file());
        assert!(!output.join("Old.cs").exists());
        assert!(!retired.exists());
    }

    #[tokio::test]
    async fn repeated_promotions_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        let staging = staging_path(&output);

        for name in ["First.cs", "Second.cs"] {
            std::fs::create_dir_all(&staging).unwrap();
            std::fs::write(staging.join(name), name).unwrap();
            FsPromotion.promote(&staging, &output).await.unwrap();
        }

        assert_eq!(std::fs::read_dir(&output).unwrap().count(), 1);
        assert!(output.join("Second.cs").is_file());
    }

    #[tokio::test]
    async fn failed_promotion_restores_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out");
        std::fs::create_dir_all(&output).unwrap();
        std::fs::write(output.join("Old.cs"), "old").unwrap();

        let err = FsPromotion
            .promote(&staging_path(&output), &output)
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::Io { operation: "promote", .. }));
        assert!(output.join("Old.cs").is_file());
    }
}

//! Output coordinator
//!
//! Regenerates the output directory of a project from a list of
//! specifications:
//!
//! 1. compute the output path
//! 2. clear it
//! 3. synthesize every specification concurrently
//! 4. join; any failure aborts the run before anything is saved
//! 5. save units one at a time, in completion order
//!
//! In [`OutputMode::Staged`] steps 2-5 target a sibling staging directory
//! which is promoted over the output only after every unit is saved.

use crate::error::{SpecFailure, WriteError};
use crate::services::{
    staging_path, DeletionService, FsDeletion, FsPromotion, FsSaving, NamingService,
    PromotionService, SavingService, SiblingDirectoryNaming,
};
use serde::{Deserialize, Serialize};
use specgen_model::Specification;
use specgen_synth::{CodeSynthesizer, SourceUnit};
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// How the output directory is replaced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Clear the output directory first, then write into it
    #[default]
    InPlace,
    /// Write into a staging directory and swap it in on success
    Staged,
}

/// Parallelism used when none is configured
#[must_use]
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism().map_or(4, NonZeroUsize::get)
}

/// Coordinates deletion, synthesis and saving for one project
#[derive(Clone)]
pub struct OutputCoordinator {
    naming: Arc<dyn NamingService>,
    deletion: Arc<dyn DeletionService>,
    saving: Arc<dyn SavingService>,
    promotion: Arc<dyn PromotionService>,
    synthesizer: Arc<CodeSynthesizer>,
    mode: OutputMode,
    max_parallelism: usize,
}

impl OutputCoordinator {
    /// Create coordinator writing in place
    #[must_use]
    pub fn new(
        naming: Arc<dyn NamingService>,
        synthesizer: Arc<CodeSynthesizer>,
        deletion: Arc<dyn DeletionService>,
        saving: Arc<dyn SavingService>,
    ) -> Self {
        Self {
            naming,
            deletion,
            saving,
            promotion: Arc::new(FsPromotion),
            synthesizer,
            mode: OutputMode::default(),
            max_parallelism: default_parallelism(),
        }
    }

    /// Coordinator backed by the filesystem services
    #[must_use]
    pub fn with_filesystem(synthesizer: Arc<CodeSynthesizer>) -> Self {
        Self::new(
            Arc::new(SiblingDirectoryNaming::default()),
            synthesizer,
            Arc::new(FsDeletion),
            Arc::new(FsSaving::default()),
        )
    }

    /// With output mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// With promotion service (staged mode only)
    #[inline]
    #[must_use]
    pub fn with_promotion(mut self, promotion: Arc<dyn PromotionService>) -> Self {
        self.promotion = promotion;
        self
    }

    /// With maximum concurrent synthesis tasks (at least one)
    #[inline]
    #[must_use]
    pub fn with_max_parallelism(mut self, max_parallelism: usize) -> Self {
        self.max_parallelism = max_parallelism.max(1);
        self
    }

    /// Output mode
    #[inline]
    #[must_use]
    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Output directory for a project
    #[inline]
    #[must_use]
    pub fn output_path(&self, project_path: &Path) -> PathBuf {
        self.naming.output_path(project_path)
    }

    /// Regenerate the output directory of `project_path`
    ///
    /// Callers serialize invocations per project.
    ///
    /// # Errors
    /// - `WriteError::Argument` if `project_path` is empty or does not exist
    /// - `WriteError::Synthesis` listing every failing specification; in
    ///   place the directory is left cleared, staged the old output survives
    /// - `WriteError::DuplicateUnit` if two specifications produce one file
    /// - `WriteError::Io` from deletion, saving or promotion
    /// - `WriteError::Cancelled` if `cancel` fires
    #[tracing::instrument(
        skip_all,
        fields(project = %project_path.display(), specifications = specifications.len(), mode = ?self.mode)
    )]
    pub async fn write_specifications(
        &self,
        specifications: Vec<Specification>,
        project_path: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, WriteError> {
        if project_path.as_os_str().is_empty() {
            return Err(WriteError::argument("project_path", "project path must not be empty"));
        }
        if cancel.is_cancelled() {
            return Err(WriteError::Cancelled);
        }
        if tokio::fs::metadata(project_path).await.is_err() {
            return Err(WriteError::argument(
                "project_path",
                format!("project path {} does not exist", project_path.display()),
            ));
        }

        let output = self.naming.output_path(project_path);
        let target = match self.mode {
            OutputMode::InPlace => output.clone(),
            OutputMode::Staged => staging_path(&output),
        };

        self.deletion.delete(&target).await?;
        tracing::info!("Cleared {}", target.display());

        let written = self.synthesize_and_save(specifications, &target, cancel).await;

        if self.mode == OutputMode::Staged {
            if let Err(e) = written {
                self.discard_staging(&target).await;
                return Err(e);
            }
            self.promotion.promote(&target, &output).await?;
            tracing::info!("Promoted staging output to {}", output.display());
        } else {
            written?;
        }

        Ok(output)
    }

    async fn synthesize_and_save(
        &self,
        specifications: Vec<Specification>,
        target: &Path,
        cancel: &CancellationToken,
    ) -> Result<(), WriteError> {
        let units = self.synthesize_all(specifications, cancel).await?;
        self.check_unique_files(&units)?;

        for unit in &units {
            if cancel.is_cancelled() {
                return Err(WriteError::Cancelled);
            }
            self.saving.save(unit, target).await?;
        }

        tracing::info!("Saved {} units", units.len());
        Ok(())
    }

    /// Fan out synthesis and join every task before returning
    async fn synthesize_all(
        &self,
        specifications: Vec<Specification>,
        cancel: &CancellationToken,
    ) -> Result<Vec<SourceUnit>, WriteError> {
        let total = specifications.len();
        let permits = Arc::new(Semaphore::new(self.max_parallelism));
        let mut tasks = JoinSet::new();

        for (index, specification) in specifications.into_iter().enumerate() {
            let synthesizer = Arc::clone(&self.synthesizer);
            let permits = Arc::clone(&permits);

            tasks.spawn(async move {
                // The semaphore is never closed
                let _permit = permits.acquire_owned().await.ok();
                let result = synthesizer.generate_code(&specification);
                (index, specification.name, result)
            });
        }

        let mut units = Vec::with_capacity(total);
        let mut failures = Vec::new();

        loop {
            let joined = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tasks.abort_all();
                    return Err(WriteError::Cancelled);
                }
                joined = tasks.join_next() => joined,
            };
            let Some(joined) = joined else { break };

            match joined {
                Ok((_, _, Ok(unit))) => {
                    tracing::debug!(class = ?unit.class_name().map(|c| c.as_str()), "synthesized");
                    units.push(unit);
                }
                Ok((index, specification, Err(error))) => failures.push(SpecFailure {
                    index,
                    specification,
                    error,
                }),
                Err(e) => return Err(WriteError::TaskFailed(e.to_string())),
            }
        }

        if !failures.is_empty() {
            failures.sort_by_key(|f| f.index);
            tracing::error!("Synthesis failed for {} of {} specifications", failures.len(), total);
            return Err(WriteError::Synthesis { failures });
        }

        Ok(units)
    }

    fn check_unique_files(&self, units: &[SourceUnit]) -> Result<(), WriteError> {
        let mut seen: HashMap<String, &str> = HashMap::with_capacity(units.len());

        for unit in units {
            let file_name = self.saving.file_name(unit);
            if let Some(other) = seen.insert(file_name.clone(), &unit.source_name) {
                let (first, second) = if other <= unit.source_name.as_str() {
                    (other, unit.source_name.as_str())
                } else {
                    (unit.source_name.as_str(), other)
                };
                return Err(WriteError::DuplicateUnit {
                    file_name,
                    first: first.to_string(),
                    second: second.to_string(),
                });
            }
        }
        Ok(())
    }

    async fn discard_staging(&self, staging: &Path) {
        if let Err(e) = tokio::fs::remove_dir_all(staging).await {
            tracing::warn!("Could not remove staging directory {}: {}", staging.display(), e);
        }
    }
}

impl std::fmt::Debug for OutputCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputCoordinator")
            .field("mode", &self.mode)
            .field("max_parallelism", &self.max_parallelism)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{MockDeletionService, MockNamingService, MockSavingService};
    use mockall::Sequence;
    use specgen_synth::{FixedNamespace, TestFramework};
    use std::sync::Mutex;

    fn synthesizer() -> Arc<CodeSynthesizer> {
        Arc::new(CodeSynthesizer::new(
            Arc::new(FixedNamespace::new("Specs.Generated")),
            Arc::new(TestFramework::XUnit),
        ))
    }

    fn naming() -> MockNamingService {
        let mut naming = MockNamingService::new();
        naming
            .expect_output_path()
            .returning(|project| project.join("GeneratedSpecs"));
        naming
    }

    fn class_file_names(saving: &mut MockSavingService) {
        saving
            .expect_file_name()
            .returning(|unit| format!("{}.cs", unit.class_name().unwrap()));
    }

    fn coordinator(
        naming: MockNamingService,
        deletion: MockDeletionService,
        saving: MockSavingService,
    ) -> OutputCoordinator {
        OutputCoordinator::new(
            Arc::new(naming),
            synthesizer(),
            Arc::new(deletion),
            Arc::new(saving),
        )
    }

    #[tokio::test]
    async fn deletes_before_saving_and_returns_output_path() {
        let project = tempfile::tempdir().unwrap();
        let mut seq = Sequence::new();
        let mut deletion = MockDeletionService::new();
        let expected = project.path().join("GeneratedSpecs");
        deletion
            .expect_delete()
            .withf(move |path| path == expected)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let mut saving = MockSavingService::new();
        class_file_names(&mut saving);
        saving
            .expect_save()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|unit, dir| Ok(dir.join(format!("{}.cs", unit.class_name().unwrap()))));

        let specs = vec![
            Specification::new("Login Flow").with_scenario("Valid login"),
            Specification::new("Checkout").with_scenario("Pay"),
        ];
        let output = coordinator(naming(), deletion, saving)
            .write_specifications(specs, project.path(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output, project.path().join("GeneratedSpecs"));
    }

    #[tokio::test]
    async fn empty_list_only_clears() {
        let project = tempfile::tempdir().unwrap();
        let mut deletion = MockDeletionService::new();
        deletion.expect_delete().times(1).returning(|_| Ok(()));
        let mut saving = MockSavingService::new();
        saving.expect_save().never();

        let output = coordinator(naming(), deletion, saving)
            .write_specifications(vec![], project.path(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output, project.path().join("GeneratedSpecs"));
    }

    #[tokio::test]
    async fn any_synthesis_failure_saves_nothing() {
        let project = tempfile::tempdir().unwrap();
        let mut deletion = MockDeletionService::new();
        deletion.expect_delete().times(1).returning(|_| Ok(()));
        let mut saving = MockSavingService::new();
        saving.expect_save().never();

        let specs = vec![
            Specification::new("Good").with_scenario("One"),
            Specification::new("   "),
            Specification::new("Also good"),
            Specification::new("Bad").with_scenario("!!!"),
        ];
        let err = coordinator(naming(), deletion, saving)
            .write_specifications(specs, project.path(), &CancellationToken::new())
            .await
            .unwrap_err();

        let indices: Vec<_> = err.failures().iter().map(|f| f.index).collect();
        assert_eq!(indices, [1, 3]);
        assert_eq!(err.failures()[0].error.parameter(), Some("specification"));
    }

    #[tokio::test]
    async fn colliding_class_names_save_nothing() {
        let project = tempfile::tempdir().unwrap();
        let mut deletion = MockDeletionService::new();
        deletion.expect_delete().returning(|_| Ok(()));
        let mut saving = MockSavingService::new();
        class_file_names(&mut saving);
        saving.expect_save().never();

        let specs = vec![Specification::new("Log in"), Specification::new("Log-in")];
        let err = coordinator(naming(), deletion, saving)
            .write_specifications(specs, project.path(), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            WriteError::DuplicateUnit {
                file_name,
                first,
                second,
            } => {
                assert_eq!(file_name, "Login.cs");
                assert_eq!((first.as_str(), second.as_str()), ("Log in", "Log-in"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn deletion_failure_stops_run() {
        let project = tempfile::tempdir().unwrap();
        let mut deletion = MockDeletionService::new();
        deletion.expect_delete().returning(|path| {
            Err(WriteError::io(
                "remove",
                path,
                std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
            ))
        });
        let mut saving = MockSavingService::new();
        saving.expect_save().never();

        let err = coordinator(naming(), deletion, saving)
            .write_specifications(
                vec![Specification::new("Spec")],
                project.path(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::Io { operation: "remove", .. }));
    }

    #[tokio::test]
    async fn empty_project_path_is_argument_error() {
        let mut naming = MockNamingService::new();
        naming.expect_output_path().never();
        let mut deletion = MockDeletionService::new();
        deletion.expect_delete().never();

        let err = coordinator(naming, deletion, MockSavingService::new())
            .write_specifications(vec![], Path::new(""), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::Argument { parameter: "project_path", .. }));
    }

    #[tokio::test]
    async fn missing_project_path_is_argument_error() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("Typo").join("App.csproj");
        let mut naming = MockNamingService::new();
        naming.expect_output_path().never();
        let mut deletion = MockDeletionService::new();
        deletion.expect_delete().never();

        let err = coordinator(naming, deletion, MockSavingService::new())
            .write_specifications(vec![], &missing, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::Argument { parameter: "project_path", .. }));
        assert!(!root.path().join("Typo").exists());
    }

    #[tokio::test]
    async fn cancelled_before_start_touches_nothing() {
        let project = tempfile::tempdir().unwrap();
        let mut deletion = MockDeletionService::new();
        deletion.expect_delete().never();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = coordinator(naming(), deletion, MockSavingService::new())
            .write_specifications(vec![], project.path(), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, WriteError::Cancelled));
    }

    #[tokio::test]
    async fn every_unit_saved_exactly_once() {
        let project = tempfile::tempdir().unwrap();
        let saved = Arc::new(Mutex::new(Vec::new()));
        let mut deletion = MockDeletionService::new();
        deletion.expect_delete().returning(|_| Ok(()));
        let mut saving = MockSavingService::new();
        class_file_names(&mut saving);
        let record = Arc::clone(&saved);
        saving.expect_save().returning(move |unit, dir| {
            let name = unit.class_name().unwrap().to_string();
            record.lock().unwrap().push(name.clone());
            Ok(dir.join(name))
        });

        let specs: Vec<_> = (0..20).map(|i| Specification::new(format!("Spec {i}"))).collect();
        coordinator(naming(), deletion, saving)
            .with_max_parallelism(3)
            .write_specifications(specs, project.path(), &CancellationToken::new())
            .await
            .unwrap();

        let mut saved = saved.lock().unwrap().clone();
        saved.sort();
        let mut expected: Vec<_> = (0..20).map(|i| format!("Spec{i}")).collect();
        expected.sort();
        assert_eq!(saved, expected);
    }

    #[test]
    fn parallelism_is_at_least_one() {
        let coordinator = OutputCoordinator::with_filesystem(synthesizer()).with_max_parallelism(0);
        assert_eq!(coordinator.max_parallelism, 1);
        assert_eq!(coordinator.mode(), OutputMode::InPlace);
    }

    #[test]
    fn output_mode_serde_names() {
        assert_eq!(serde_json::to_string(&OutputMode::InPlace).unwrap(), "\"in_place\"");
        assert_eq!(
            serde_json::from_str::<OutputMode>("\"staged\"").unwrap(),
            OutputMode::Staged
        );
    }
}

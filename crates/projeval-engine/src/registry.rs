//! The projects of one build and their evaluation state.

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use projeval_utils::error::{ConfigError, ProjectConfigurationError, ProjevalError};
use projeval_utils::types::{ProjectIdentity, ProjectPath};

use crate::evaluator::{LifecycleEvaluator, ProjectEvaluator};
use crate::project::Project;
use crate::state::{EvaluationPhase, EvaluationState};

struct RegisteredProject {
    project: Project,
    state: Mutex<EvaluationState>,
}

impl RegisteredProject {
    fn state(&self) -> MutexGuard<'_, EvaluationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Result of configuring one project.
#[derive(Debug, Clone)]
pub struct ProjectOutcome {
    pub identity: ProjectIdentity,
    pub phase: EvaluationPhase,
    pub failure: Option<ProjectConfigurationError>,
    pub duration: Duration,
}

impl ProjectOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Outcomes of configuring several projects, in project path order.
#[derive(Debug, Clone, Default)]
pub struct BuildConfigurationReport {
    pub outcomes: Vec<ProjectOutcome>,
}

impl BuildConfigurationReport {
    pub fn failures(&self) -> impl Iterator<Item = &ProjectOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.succeeded())
    }

    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    #[must_use]
    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.succeeded()).count()
    }

    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.failures().count()
    }

    /// The failure of the first failed project, in path order.
    pub fn rethrow_first(&self) -> Result<(), ProjectConfigurationError> {
        match self.failures().find_map(|outcome| outcome.failure.clone()) {
            Some(failure) => Err(failure),
            None => Ok(()),
        }
    }
}

/// Owns the projects of a build and evaluates them through a shared
/// [`LifecycleEvaluator`].
///
/// Each project's [`EvaluationState`] lives behind its own lock, so distinct
/// projects can be configured on different threads while any one project is
/// configured at most once.
pub struct ProjectRegistry<D> {
    evaluator: LifecycleEvaluator<D>,
    projects: BTreeMap<ProjectPath, RegisteredProject>,
}

impl<D> std::fmt::Debug for ProjectRegistry<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectRegistry")
            .field("projects", &self.projects.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl<D: ProjectEvaluator> ProjectRegistry<D> {
    #[must_use]
    pub fn new(evaluator: LifecycleEvaluator<D>) -> Self {
        Self {
            evaluator,
            projects: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn evaluator(&self) -> &LifecycleEvaluator<D> {
        &self.evaluator
    }

    /// Add a project. Each project path may be registered once.
    pub fn register(&mut self, project: Project) -> Result<&Project, ProjevalError> {
        let path = project.identity().project_path.clone();
        if self.projects.contains_key(&path) {
            return Err(ConfigError::InvalidProjectPath {
                path: path.to_string(),
                reason: "project is already registered".to_string(),
            }
            .into());
        }
        let registered = self.projects.entry(path).or_insert(RegisteredProject {
            project,
            state: Mutex::new(EvaluationState::new()),
        });
        Ok(&registered.project)
    }

    #[must_use]
    pub fn project(&self, path: &ProjectPath) -> Option<&Project> {
        self.projects.get(path).map(|registered| &registered.project)
    }

    /// Snapshot of a project's evaluation state.
    #[must_use]
    pub fn state(&self, path: &ProjectPath) -> Option<EvaluationState> {
        self.projects.get(path).map(|registered| registered.state().clone())
    }

    pub fn paths(&self) -> impl Iterator<Item = &ProjectPath> {
        self.projects.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Configure one project, returning its failure if configuration failed.
    ///
    /// A project that is already configured, or being configured, is left
    /// alone and reported as successful.
    pub fn configure(&self, path: &ProjectPath) -> Result<(), ProjevalError> {
        let registered = self.lookup(path)?;
        let mut state = registered.state();
        self.evaluator.evaluate(&registered.project, &mut state)?;
        Ok(())
    }

    /// Configure every project.
    #[must_use]
    pub fn configure_all(&self, parallel: bool) -> BuildConfigurationReport {
        let projects: Vec<&RegisteredProject> = self.projects.values().collect();
        self.configure_projects(&projects, parallel)
    }

    /// Configure the projects at `paths`, failing up front on unknown paths.
    pub fn configure_selected(
        &self,
        paths: &[ProjectPath],
        parallel: bool,
    ) -> Result<BuildConfigurationReport, ProjevalError> {
        let mut projects = paths
            .iter()
            .map(|path| self.lookup(path))
            .collect::<Result<Vec<_>, _>>()?;
        projects.sort_by(|a, b| a.project.identity().project_path.cmp(&b.project.identity().project_path));
        projects.dedup_by(|a, b| a.project.identity().project_path == b.project.identity().project_path);
        Ok(self.configure_projects(&projects, parallel))
    }

    fn lookup(&self, path: &ProjectPath) -> Result<&RegisteredProject, ProjevalError> {
        self.projects
            .get(path)
            .ok_or_else(|| ProjevalError::UnknownProject {
                path: path.to_string(),
            })
    }

    fn configure_projects(
        &self,
        projects: &[&RegisteredProject],
        parallel: bool,
    ) -> BuildConfigurationReport {
        let outcomes = if parallel && projects.len() > 1 {
            self.configure_parallel(projects)
        } else {
            projects
                .iter()
                .map(|registered| self.configure_one(registered))
                .collect()
        };
        BuildConfigurationReport { outcomes }
    }

    /// Configure `projects` on at most [`worker_count`] threads. Each worker
    /// takes a contiguous chunk, so outcomes keep the input order.
    fn configure_parallel(&self, projects: &[&RegisteredProject]) -> Vec<ProjectOutcome> {
        let chunk_size = projects.len().div_ceil(worker_count(projects.len()));
        thread::scope(|scope| {
            let pending: Vec<_> = projects
                .chunks(chunk_size)
                .enumerate()
                .map(|(index, chunk)| {
                    let spawned = thread::Builder::new()
                        .name(format!("projeval-configure-{index}"))
                        .spawn_scoped(scope, move || self.configure_chunk(chunk));
                    match spawned {
                        Ok(handle) => Ok(handle),
                        Err(e) => {
                            tracing::warn!(
                                projects = chunk.len(),
                                error = %e,
                                "Could not spawn configuration thread, configuring inline"
                            );
                            Err(chunk)
                        }
                    }
                })
                .collect();

            pending
                .into_iter()
                .flat_map(|pending| match pending {
                    Ok(handle) => handle
                        .join()
                        .unwrap_or_else(|panic| std::panic::resume_unwind(panic)),
                    Err(chunk) => self.configure_chunk(chunk),
                })
                .collect()
        })
    }

    fn configure_chunk(&self, chunk: &[&RegisteredProject]) -> Vec<ProjectOutcome> {
        chunk.iter().map(|registered| self.configure_one(registered)).collect()
    }

    fn configure_one(&self, registered: &RegisteredProject) -> ProjectOutcome {
        let started = Instant::now();
        let mut state = registered.state();
        // The recorded failure is read back from the state below, so repeat
        // requests still report it.
        let _ = self.evaluator.evaluate(&registered.project, &mut state);
        ProjectOutcome {
            identity: registered.project.identity().clone(),
            phase: state.phase(),
            failure: state.failure().cloned(),
            duration: started.elapsed(),
        }
    }
}

/// Threads used to configure `projects` projects in parallel.
fn worker_count(projects: usize) -> usize {
    let available = thread::available_parallelism().map_or(4, NonZeroUsize::get);
    available.min(projects).max(1)
}

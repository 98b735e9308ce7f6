use crate::{Origin, RequiredBy, ResolutionError, ResolvedGraph};
use podvend_catalog::{CatalogError, PackageSource, PackageSpec};
use podvend_manifest::{Platform, Requirement};
use podvend_version::PodVersion;
use std::{
    collections::{BTreeSet, HashMap, HashSet, VecDeque},
    sync::Arc,
};

/// Finds a version for every required pod such that every constraint holds.
///
/// The search is a depth-first walk over an explicit stack of decisions. Newer versions are
/// preferred. On a conflict the search jumps back to the most recent decision that took part in
/// it, and falls back to plain chronological backtracking once that decision runs out of
/// candidates.
#[must_use]
pub struct Resolver<'a, Source: ?Sized> {
    source: &'a Source,
    platforms: &'a [Platform],
}

/// A decision: the spec chosen for `name` and the candidates left to try, highest first.
struct Frame {
    name: String,
    spec: Arc<PackageSpec>,
    remaining: VecDeque<PodVersion>,
}

/// Discovery order and accumulated constraints implied by the manifest and the current decisions.
#[derive(Default)]
struct Derived {
    order: Vec<String>,
    constraints: HashMap<String, Vec<RequiredBy>>,
}

impl Derived {
    fn new(requirements: &[Requirement], stack: &[Frame]) -> Self {
        let mut derived = Derived::default();
        for requirement in requirements {
            let origin = Origin::Manifest { target: requirement.target.clone() };
            let constraint = requirement.constraint.clone();
            derived.add(&requirement.name, RequiredBy { constraint, origin });
        }
        for frame in stack {
            for dependency in &frame.spec.dependencies {
                let origin =
                    Origin::Pod { name: frame.name.clone(), version: frame.spec.version.clone() };
                let constraint = dependency.constraint.clone();
                derived.add(&dependency.name, RequiredBy { constraint, origin });
            }
        }
        derived
    }

    fn add(&mut self, name: &str, required: RequiredBy) {
        if !self.constraints.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.constraints.entry(name.to_string()).or_default().push(required);
    }

    fn constraints_on(&self, name: &str) -> &[RequiredBy] {
        self.constraints.get(name).map(Vec::as_slice).unwrap_or_default()
    }
}

/// A dead end and the pods whose decisions led to it.
struct Failure {
    error: ResolutionError,
    involved: BTreeSet<String>,
}

enum Step {
    Push(Frame),
    Fail(Failure),
    Done,
}

fn pods_among(constraints: &[RequiredBy]) -> BTreeSet<String> {
    constraints
        .iter()
        .filter_map(|required| required.origin.pod_name())
        .map(str::to_string)
        .collect()
}

/// The smallest subset of `constraints` that no version in `versions` satisfies: a single
/// impossible constraint, else a competing pair, else all of them.
fn competing(constraints: &[RequiredBy], versions: &[PodVersion]) -> Vec<RequiredBy> {
    let satisfiable = |subset: &[&RequiredBy]| {
        versions
            .iter()
            .any(|version| subset.iter().all(|required| required.constraint.matches(version)))
    };

    if let Some(alone) = constraints.iter().find(|required| !satisfiable(&[*required])) {
        return vec![alone.clone()];
    }

    for (index, left) in constraints.iter().enumerate() {
        for right in &constraints[index + 1..] {
            if !satisfiable(&[left, right]) {
                return vec![left.clone(), right.clone()];
            }
        }
    }

    constraints.to_vec()
}

impl<'a, Source> Resolver<'a, Source>
where
    Source: PackageSource + ?Sized,
{
    /// `platforms` are the platforms of every target; a pod must support all of them.
    pub fn new(source: &'a Source, platforms: &'a [Platform]) -> Self {
        Resolver { source, platforms }
    }

    /// Resolve `requirements` into a graph.
    ///
    /// Source failures abort the search immediately. Otherwise, when every alternative is
    /// exhausted, the first failure met during the search is returned.
    pub fn resolve(self, requirements: &[Requirement]) -> Result<ResolvedGraph, ResolutionError> {
        let mut versions = HashMap::<String, Option<Vec<PodVersion>>>::new();
        let mut stack = Vec::<Frame>::new();
        let mut first_failure = None::<ResolutionError>;
        let mut steps = 0usize;

        loop {
            steps += 1;
            let failure = match self.step(requirements, &stack, &mut versions)? {
                Step::Done => break,
                Step::Push(frame) => {
                    tracing::debug!(target: "podvend::resolve", pod = %frame.spec.to_pin_string(), depth = stack.len(), "Choose");
                    stack.push(frame);
                    continue;
                }
                Step::Fail(failure) => failure,
            };

            let Failure { error, involved } = failure;
            tracing::debug!(target: "podvend::resolve", %error, ?involved, "Dead end");
            let first = first_failure.take().unwrap_or(error);

            if !self.backjump(&mut stack, &involved)? {
                tracing::info!(target: "podvend::resolve", steps, "Unsatisfiable");
                return Err(first);
            }
            first_failure = Some(first);
        }

        let graph = ResolvedGraph::new(stack.into_iter().map(|frame| frame.spec));
        tracing::info!(target: "podvend::resolve", pods = graph.len(), steps, "Resolved");
        Ok(graph)
    }

    fn step(
        &self,
        requirements: &[Requirement],
        stack: &[Frame],
        versions: &mut HashMap<String, Option<Vec<PodVersion>>>,
    ) -> Result<Step, ResolutionError> {
        let derived = Derived::new(requirements, stack);

        for frame in stack {
            let constraints = derived.constraints_on(&frame.name);
            if constraints.iter().all(|required| required.constraint.matches(&frame.spec.version)) {
                continue;
            }
            let available = self.versions(versions, &frame.name)?.unwrap_or_default();
            let mut involved = pods_among(constraints);
            involved.insert(frame.name.clone());
            let error = ResolutionError::Conflict {
                name: frame.name.clone(),
                constraints: competing(constraints, &available),
            };
            return Ok(Step::Fail(Failure { error, involved }));
        }

        let assigned: HashSet<&str> = stack.iter().map(|frame| frame.name.as_str()).collect();
        let Some(name) = derived.order.iter().find(|name| !assigned.contains(name.as_str())) else {
            return Ok(Step::Done);
        };
        let constraints = derived.constraints_on(name);
        let involved = pods_among(constraints);

        let Some(available) = self.versions(versions, name)? else {
            let error = ResolutionError::NoSuchPod { name: name.clone() };
            return Ok(Step::Fail(Failure { error, involved }));
        };

        let mut remaining: VecDeque<PodVersion> = available
            .iter()
            .filter(|version| {
                constraints.iter().all(|required| required.constraint.matches(version))
            })
            .cloned()
            .collect();
        if remaining.is_empty() {
            let error = ResolutionError::Conflict {
                name: name.clone(),
                constraints: competing(constraints, &available),
            };
            return Ok(Step::Fail(Failure { error, involved }));
        }

        match self.next_supported(name, &mut remaining)? {
            Some(spec) => Ok(Step::Push(Frame { name: name.clone(), spec, remaining })),
            None => {
                let error = ResolutionError::UnsupportedPlatform {
                    name: name.clone(),
                    platforms: self.platforms.to_vec(),
                };
                Ok(Step::Fail(Failure { error, involved }))
            }
        }
    }

    /// Truncate the stack to the most recent involved decision and advance it to its next
    /// candidate, backtracking chronologically past exhausted decisions.
    ///
    /// Returns `false` when no decision is left to change.
    fn backjump(
        &self,
        stack: &mut Vec<Frame>,
        involved: &BTreeSet<String>,
    ) -> Result<bool, ResolutionError> {
        let Some(target) = stack.iter().rposition(|frame| involved.contains(&frame.name)) else {
            return Ok(false);
        };
        stack.truncate(target + 1);

        while let Some(mut frame) = stack.pop() {
            if let Some(spec) = self.next_supported(&frame.name, &mut frame.remaining)? {
                tracing::debug!(target: "podvend::resolve", pod = %spec.to_pin_string(), depth = stack.len(), "Backjump");
                stack.push(Frame { spec, ..frame });
                return Ok(true);
            }
        }

        Ok(false)
    }

    /// Pop candidates until one supports every target platform.
    fn next_supported(
        &self,
        name: &str,
        remaining: &mut VecDeque<PodVersion>,
    ) -> Result<Option<Arc<PackageSpec>>, ResolutionError> {
        while let Some(version) = remaining.pop_front() {
            let spec = self.source.spec(name, &version).map_err(ResolutionError::Catalog)?;
            if self.platforms.iter().all(|platform| spec.supports(platform)) {
                return Ok(Some(spec));
            }
            tracing::debug!(target: "podvend::resolve", pod = %spec.to_pin_string(), "Skip unsupported platform");
        }
        Ok(None)
    }

    /// Available versions of `name`, highest first, or `None` if the pod doesn't exist.
    fn versions(
        &self,
        cache: &mut HashMap<String, Option<Vec<PodVersion>>>,
        name: &str,
    ) -> Result<Option<Vec<PodVersion>>, ResolutionError> {
        if let Some(versions) = cache.get(name) {
            return Ok(versions.clone());
        }
        let versions = match self.source.versions(name) {
            Ok(mut versions) => {
                versions.sort_by(|left, right| right.cmp(left));
                Some(versions)
            }
            Err(CatalogError::PodNotFound { .. }) => None,
            Err(error) => return Err(ResolutionError::Catalog(error)),
        };
        cache.insert(name.to_string(), versions.clone());
        Ok(versions)
    }
}

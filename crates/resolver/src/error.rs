use crate::origin::{join_required_by, Origin, RequiredBy};
use derive_more::{Display, Error};
use miette::Diagnostic;
use podvend_catalog::CatalogError;
use podvend_manifest::Platform;
use podvend_version::{Dependency, PodVersion};

/// Error type of [`Resolver::resolve`](crate::Resolver::resolve).
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum ResolutionError {
    #[display("Unable to find a version of {name:?} that satisfies {}", join_required_by(constraints))]
    #[diagnostic(
        code(podvend_resolver::conflict),
        help("Relax one of the listed constraints in Podfile.json")
    )]
    Conflict { name: String, constraints: Vec<RequiredBy> },

    #[display("Pod {name:?} isn't available in any source")]
    #[diagnostic(code(podvend_resolver::no_such_pod))]
    NoSuchPod { name: String },

    #[display("No version of {name:?} supports {}", join_platforms(platforms))]
    #[diagnostic(code(podvend_resolver::unsupported_platform))]
    UnsupportedPlatform { name: String, platforms: Vec<Platform> },

    #[diagnostic(transparent)]
    Catalog(#[error(source)] CatalogError),
}

fn join_platforms(platforms: &[Platform]) -> String {
    platforms.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// Error type of [`ResolvedGraph::verify`](crate::ResolvedGraph::verify).
#[derive(Debug, Display, Error, Diagnostic)]
#[non_exhaustive]
pub enum VerifyGraphError {
    #[display("{dependency} required by {origin} isn't part of the graph")]
    #[diagnostic(code(podvend_resolver::missing_pod))]
    Missing { dependency: Dependency, origin: Origin },

    #[display("{name} ({version}) doesn't satisfy {required}")]
    #[diagnostic(code(podvend_resolver::unsatisfied))]
    Unsatisfied { name: String, version: PodVersion, required: RequiredBy },
}

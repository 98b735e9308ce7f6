mod error;
mod graph;
mod origin;
mod resolver;

pub use error::{ResolutionError, VerifyGraphError};
pub use graph::ResolvedGraph;
pub use origin::{Origin, RequiredBy};
pub use resolver::Resolver;

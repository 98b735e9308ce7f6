use crate::{CatalogError, PackageSource, PackageSpec};
use podvend_version::PodVersion;
use std::{collections::BTreeMap, sync::Arc};

/// A [`PackageSource`] backed by podspecs kept in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    pods: BTreeMap<String, Vec<Arc<PackageSpec>>>,
}

impl MemorySource {
    pub fn new() -> Self {
        MemorySource::default()
    }

    /// Add a podspec, replacing any previous spec with the same name and version.
    pub fn insert(&mut self, spec: PackageSpec) {
        let versions = self.pods.entry(spec.name.clone()).or_default();
        versions.retain(|existing| existing.version != spec.version);
        versions.push(Arc::new(spec));
    }

    /// Builder form of [`MemorySource::insert`].
    #[must_use]
    pub fn with(mut self, spec: PackageSpec) -> Self {
        self.insert(spec);
        self
    }
}

impl FromIterator<PackageSpec> for MemorySource {
    fn from_iter<Specs: IntoIterator<Item = PackageSpec>>(specs: Specs) -> Self {
        specs.into_iter().fold(MemorySource::new(), MemorySource::with)
    }
}

impl PackageSource for MemorySource {
    fn versions(&self, name: &str) -> Result<Vec<PodVersion>, CatalogError> {
        self.pods
            .get(name)
            .map(|specs| specs.iter().map(|spec| spec.version.clone()).collect())
            .ok_or_else(|| CatalogError::PodNotFound { name: name.to_string() })
    }

    fn spec(&self, name: &str, version: &PodVersion) -> Result<Arc<PackageSpec>, CatalogError> {
        self.pods
            .get(name)
            .ok_or_else(|| CatalogError::PodNotFound { name: name.to_string() })?
            .iter()
            .find(|spec| &spec.version == version)
            .map(Arc::clone)
            .ok_or_else(|| CatalogError::VersionNotFound {
                name: name.to_string(),
                version: version.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PodSource;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn spec(name: &str, version: &str) -> PackageSpec {
        PackageSpec::new(
            name,
            version.parse().unwrap(),
            PodSource::Path { path: PathBuf::from(name) },
        )
    }

    #[test]
    fn lookup() {
        let source: MemorySource =
            [spec("KissXML", "5.0"), spec("KissXML", "5.1"), spec("InflectorKit", "0.0.1")]
                .into_iter()
                .collect();

        assert_eq!(source.versions("KissXML").unwrap().len(), 2);
        let found = source.spec("KissXML", &"5.1.0".parse().unwrap()).unwrap();
        assert_eq!(found.to_pin_string(), "KissXML (5.1)");
        assert!(matches!(source.versions("Nope"), Err(CatalogError::PodNotFound { .. })));
        assert!(matches!(
            source.spec("KissXML", &"9".parse().unwrap()),
            Err(CatalogError::VersionNotFound { .. }),
        ));
    }

    #[test]
    fn insert_replaces_same_version() {
        let mut replaced = spec("KissXML", "5.0");
        replaced.build_settings.libraries.insert("xml2".to_string());
        let source = MemorySource::new().with(spec("KissXML", "5.0")).with(replaced);
        assert_eq!(source.versions("KissXML").unwrap().len(), 1);
        let found = source.spec("KissXML", &"5.0".parse().unwrap()).unwrap();
        assert!(found.build_settings.libraries.contains("xml2"));
    }
}

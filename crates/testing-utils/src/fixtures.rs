//! The AFNetworking scenario: `AFIncrementalStore` needs `AFNetworking (~> 1.3.2)` while
//! `AFNetworking 1.3.3` is also published.

use podvend_catalog::{PackageSpec, PodSource, PODSPEC_EXTENSION};
use std::{
    fs,
    path::{Path, PathBuf},
};
use text_block_macros::text_block_fnl;

/// Manifest that pins `AFNetworking 1.3.2` and leaves the deployment target to the config.
pub const AF_PODFILE: &str = text_block_fnl! {
    "{"
    "  \"targets\": ["
    "    {"
    "      \"name\": \"Pods\","
    "      \"platform\": \"ios\","
    "      \"dependencies\": ["
    "        [\"AFNetworking\", \"1.3.2\"],"
    "        [\"AFIncrementalStore\", \"0.5.1\"],"
    "        \"AFKissXMLRequestOperation\""
    "      ]"
    "    }"
    "  ]"
    "}"
};

/// Names of the pods of the resolved AFNetworking scenario, sorted.
pub const AF_PODS: [&str; 6] = [
    "AFIncrementalStore",
    "AFKissXMLRequestOperation",
    "AFNetworking",
    "InflectorKit",
    "KissXML",
    "TransformerKit",
];

/// Location of a written fixture.
#[derive(Debug, Clone)]
pub struct AfFixture {
    /// Spec repository laid out as `<Name>/<version>/<Name>.podspec.json`.
    pub spec_repo: PathBuf,
    /// Local sources of every pod, one directory per `<Name>-<version>`.
    pub sources_dir: PathBuf,
}

fn pod(
    sources_dir: &Path,
    name: &str,
    version: &str,
    dependencies: &[&str],
    frameworks: &[&str],
) -> PackageSpec {
    let path = sources_dir.join(format!("{name}-{version}"));
    let mut spec =
        PackageSpec::new(name, version.parse().expect("parse version"), PodSource::Path { path });
    spec.dependencies =
        dependencies.iter().map(|text| text.parse().expect("parse dependency")).collect();
    spec.build_settings.frameworks = frameworks.iter().map(ToString::to_string).collect();
    spec.platforms.insert("ios".parse().expect("parse platform"), Some("5.0".parse().unwrap()));
    spec.platforms.insert("osx".parse().expect("parse platform"), Some("10.7".parse().unwrap()));
    spec
}

impl AfFixture {
    /// Every podspec of the scenario, with sources under `sources_dir`.
    pub fn specs(sources_dir: &Path) -> Vec<PackageSpec> {
        let af_networking_frameworks =
            ["CoreGraphics", "MobileCoreServices", "Security", "SystemConfiguration"];
        let mut kiss_xml = pod(sources_dir, "KissXML", "5.0", &[], &[]);
        kiss_xml.build_settings.libraries.insert("xml2".to_string());
        kiss_xml
            .build_settings
            .header_search_paths
            .insert("$(SDKROOT)/usr/include/libxml2".to_string());
        vec![
            pod(sources_dir, "AFNetworking", "1.3.2", &[], &af_networking_frameworks),
            pod(sources_dir, "AFNetworking", "1.3.3", &[], &af_networking_frameworks),
            pod(
                sources_dir,
                "AFIncrementalStore",
                "0.5.1",
                &["AFNetworking (~> 1.3.2)", "InflectorKit", "TransformerKit"],
                &["CoreData"],
            ),
            pod(
                sources_dir,
                "AFKissXMLRequestOperation",
                "0.0.1",
                &["AFNetworking (>= 0.9)", "KissXML"],
                &[],
            ),
            kiss_xml,
            pod(sources_dir, "InflectorKit", "0.0.1", &[], &["Foundation"]),
            pod(sources_dir, "TransformerKit", "0.2.2", &[], &["Foundation", "UIKit"]),
        ]
    }

    /// Write the spec repository and the sources under `root`.
    pub fn write(root: &Path) -> Self {
        let spec_repo = root.join("specs");
        let sources_dir = root.join("sources");
        for spec in AfFixture::specs(&sources_dir) {
            let PodSource::Path { path } = &spec.source else {
                unreachable!("fixtures only use local sources");
            };
            let header = path.join("Classes").join(format!("{}.h", spec.name));
            fs::create_dir_all(header.parent().unwrap()).expect("create source dir");
            fs::write(&header, format!("// {}\n", spec.to_pin_string())).expect("write header");

            let spec_dir = spec_repo.join(&spec.name).join(spec.version.to_string());
            fs::create_dir_all(&spec_dir).expect("create spec dir");
            let spec_path = spec_dir.join(format!("{}.{PODSPEC_EXTENSION}", spec.name));
            let json = serde_json::to_string_pretty(&spec).expect("serialize podspec");
            fs::write(spec_path, json).expect("write podspec");
        }
        AfFixture { spec_repo, sources_dir }
    }

    /// Write [`AF_PODFILE`] into `project_dir` and return its path.
    pub fn write_podfile(project_dir: &Path) -> PathBuf {
        let path = project_dir.join("Podfile.json");
        fs::create_dir_all(project_dir).expect("create project dir");
        fs::write(&path, AF_PODFILE).expect("write Podfile.json");
        path
    }
}

use serde::{Deserialize, Serialize};

/// Raw dependency manifest as fetched from the action's repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyManifest {
    /// File name, e.g. `package.json` or `requirements.txt`.
    pub file_name: String,
    pub contents: String,
}

/// Dependencies extracted from a [`DependencyManifest`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySurface {
    pub format: Option<ManifestFormat>,
    pub dependencies: Vec<Dependency>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    pub version_constraint: Option<String>,
    pub is_dev: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestFormat {
    PackageJson,
    PipRequirements,
}

impl ManifestFormat {
    pub fn from_file_name(name: &str) -> Option<Self> {
        let base = name.rsplit('/').next().unwrap_or(name);
        match base {
            "package.json" => Some(Self::PackageJson),
            "requirements.txt" => Some(Self::PipRequirements),
            _ if base.starts_with("requirements") && base.ends_with(".txt") => {
                Some(Self::PipRequirements)
            }
            _ => None,
        }
    }
}

const NPM_SECTIONS: &[(&str, bool)] = &[
    ("dependencies", false),
    ("devDependencies", true),
    ("peerDependencies", false),
    ("optionalDependencies", false),
];

impl DependencySurface {
    /// Extract dependencies. Unknown formats and unparsable contents yield
    /// an empty surface.
    pub fn parse(manifest: &DependencyManifest) -> Self {
        match ManifestFormat::from_file_name(&manifest.file_name) {
            Some(ManifestFormat::PackageJson) => Self::from_package_json(&manifest.contents),
            Some(ManifestFormat::PipRequirements) => Self::from_requirements(&manifest.contents),
            None => {
                tracing::warn!(file = %manifest.file_name, "unsupported dependency manifest");
                Self::default()
            }
        }
    }

    fn from_package_json(contents: &str) -> Self {
        let json: serde_json::Value = match serde_json::from_str(contents) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "package.json is not valid JSON");
                return Self {
                    format: Some(ManifestFormat::PackageJson),
                    dependencies: Vec::new(),
                };
            }
        };

        let mut dependencies = Vec::new();
        for &(section, is_dev) in NPM_SECTIONS {
            if let Some(deps) = json.get(section).and_then(|d| d.as_object()) {
                for (name, version) in deps {
                    dependencies.push(Dependency {
                        name: name.clone(),
                        version_constraint: version.as_str().map(str::to_string),
                        is_dev,
                    });
                }
            }
        }

        Self {
            format: Some(ManifestFormat::PackageJson),
            dependencies,
        }
    }

    fn from_requirements(contents: &str) -> Self {
        let dependencies = contents
            .lines()
            .map(|l| l.split('#').next().unwrap_or_default().trim())
            .filter(|l| !l.is_empty() && !l.starts_with('-'))
            .filter_map(|line| {
                let end = line
                    .find(|c: char| matches!(c, '=' | '<' | '>' | '~' | '!' | ';' | '[' | ' '))
                    .unwrap_or(line.len());
                let name = line[..end].trim();
                if name.is_empty() {
                    return None;
                }
                let constraint = line[end..].trim();
                Some(Dependency {
                    name: name.to_string(),
                    version_constraint: (!constraint.is_empty()).then(|| constraint.to_string()),
                    is_dev: false,
                })
            })
            .collect();

        Self {
            format: Some(ManifestFormat::PipRequirements),
            dependencies,
        }
    }

    /// Whether any dependency matches one of `libraries`. Python package
    /// names compare case-insensitively.
    pub fn uses_any(&self, libraries: &[String]) -> bool {
        self.dependencies.iter().any(|dep| {
            libraries.iter().any(|lib| match self.format {
                Some(ManifestFormat::PipRequirements) => dep.name.eq_ignore_ascii_case(lib),
                _ => dep.name == *lib,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(file_name: &str, contents: &str) -> DependencyManifest {
        DependencyManifest {
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }

    #[test]
    fn parses_package_json_sections() {
        let surface = DependencySurface::parse(&manifest(
            "package.json",
            r#"{
                "name": "x",
                "dependencies": { "@actions/core": "^1.10.0", "@actions/github": "^5.1.1" },
                "devDependencies": { "jest": "^29.0.0" }
            }"#,
        ));
        assert_eq!(surface.dependencies.len(), 3);
        assert!(surface.dependencies.iter().any(|d| d.name == "jest" && d.is_dev));
        assert!(surface.uses_any(&["@actions/github".to_string()]));
        assert!(!surface.uses_any(&["@octokit/rest".to_string()]));
    }

    #[test]
    fn invalid_package_json_is_empty() {
        let surface = DependencySurface::parse(&manifest("package.json", "{ not json"));
        assert!(surface.dependencies.is_empty());
    }

    #[test]
    fn parses_requirements() {
        let surface = DependencySurface::parse(&manifest(
            "requirements.txt",
            "# deps\nPyGithub==1.58.0\nrequests >= 2.0 ; python_version > '3'\n-r other.txt\n",
        ));
        let names: Vec<_> = surface.dependencies.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["PyGithub", "requests"]);
        assert!(surface.uses_any(&["pygithub".to_string()]));
    }

    #[test]
    fn unknown_manifest_is_empty() {
        let surface = DependencySurface::parse(&manifest("go.mod", "module x"));
        assert_eq!(surface, DependencySurface::default());
    }
}

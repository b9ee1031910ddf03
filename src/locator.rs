//! Resource locators and description loading.
//!
//! Descriptions are addressed with resource-retriever style locators:
//!
//! - `package://my_robot/urdf/robot.urdf`
//! - `file:///tmp/robot.urdf`
//! - `http://example.com/robot.urdf` (requires the `http` feature)
//!
//! The [`ResourceRetriever`] trait is the seam for custom retrieval; the
//! [`LocalRetriever`] covers the common local cases.

use crate::error::RetrievalError;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Environment variable listing package search roots, colon separated.
pub const PACKAGE_PATH_VAR: &str = "ROS_PACKAGE_PATH";

/// A parsed resource locator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceLocator {
    /// `package://<package>/<path>`
    Package { package: String, path: PathBuf },
    /// `file://<absolute path>`
    File(PathBuf),
    /// `http://...` or `https://...`, kept verbatim.
    Http(String),
}

impl ResourceLocator {
    /// Parses `locator` into one of the supported forms.
    pub fn parse(locator: &str) -> Result<Self, RetrievalError> {
        let (scheme, rest) = locator
            .split_once("://")
            .ok_or_else(|| RetrievalError::InvalidLocator(locator.to_string()))?;

        match scheme {
            "package" => {
                let (package, path) = rest.split_once('/').unwrap_or((rest, ""));
                if package.is_empty() {
                    return Err(RetrievalError::InvalidLocator(locator.to_string()));
                }
                Ok(Self::Package {
                    package: package.to_string(),
                    path: PathBuf::from(path),
                })
            }
            "file" => {
                // Only the empty and `localhost` authorities name this machine.
                let path = rest.strip_prefix("localhost").unwrap_or(rest);
                if !path.starts_with('/') {
                    return Err(RetrievalError::InvalidLocator(locator.to_string()));
                }
                Ok(Self::File(PathBuf::from(path)))
            }
            "http" | "https" => Ok(Self::Http(locator.to_string())),
            other => Err(RetrievalError::UnsupportedScheme {
                scheme: other.to_string(),
                locator: locator.to_string(),
            }),
        }
    }
}

/// Turns a locator string into the text it points at.
pub trait ResourceRetriever {
    fn retrieve(&self, locator: &str) -> Result<String, RetrievalError>;
}

/// Retrieves `file://` and `package://` resources from the local filesystem,
/// and `http(s)://` resources when built with the `http` feature.
///
/// Packages resolve first through explicitly registered directories, then by
/// looking for a `<root>/<package>` directory under each search root in order.
#[derive(Clone, Debug, Default)]
pub struct LocalRetriever {
    packages: HashMap<String, PathBuf>,
    search_paths: Vec<PathBuf>,
}

impl LocalRetriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// A retriever whose search roots come from [`PACKAGE_PATH_VAR`].
    pub fn from_env() -> Self {
        let mut retriever = Self::new();
        if let Some(value) = std::env::var_os(PACKAGE_PATH_VAR) {
            retriever.search_paths = std::env::split_paths(&value)
                .filter(|p| !p.as_os_str().is_empty())
                .collect();
        }
        retriever
    }

    /// Maps `name` directly to `dir` (builder pattern).
    pub fn with_package(mut self, name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.packages.insert(name.into(), dir.into());
        self
    }

    /// Appends a package search root (builder pattern).
    pub fn with_search_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.search_paths.push(dir.into());
        self
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// Finds the directory of `package`.
    pub fn package_dir(&self, package: &str) -> Option<PathBuf> {
        if let Some(dir) = self.packages.get(package) {
            return Some(dir.clone());
        }
        self.search_paths
            .iter()
            .map(|root| root.join(package))
            .find(|candidate| candidate.is_dir())
    }

    /// Resolves `locator` to a local path without reading it.
    pub fn resolve_path(&self, locator: &str) -> Result<PathBuf, RetrievalError> {
        match ResourceLocator::parse(locator)? {
            ResourceLocator::File(path) => Ok(path),
            ResourceLocator::Package { package, path } => self
                .package_dir(&package)
                .map(|dir| dir.join(path))
                .ok_or_else(|| RetrievalError::UnknownPackage {
                    package,
                    locator: locator.to_string(),
                }),
            ResourceLocator::Http(_) => Err(RetrievalError::UnsupportedScheme {
                scheme: "http".to_string(),
                locator: locator.to_string(),
            }),
        }
    }
}

impl ResourceRetriever for LocalRetriever {
    fn retrieve(&self, locator: &str) -> Result<String, RetrievalError> {
        if let ResourceLocator::Http(url) = ResourceLocator::parse(locator)? {
            return fetch_http(&url);
        }
        let path = self.resolve_path(locator)?;
        read_local(&path, locator)
    }
}

fn read_local(path: &Path, locator: &str) -> Result<String, RetrievalError> {
    tracing::debug!("reading {} from {}", locator, path.display());
    fs::read_to_string(path).map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            RetrievalError::NotFound {
                locator: locator.to_string(),
            }
        } else {
            RetrievalError::Io {
                locator: locator.to_string(),
                source,
            }
        }
    })
}

#[cfg(feature = "http")]
fn fetch_http(url: &str) -> Result<String, RetrievalError> {
    let network = |e: reqwest::Error| RetrievalError::Network {
        locator: url.to_string(),
        message: e.to_string(),
    };
    tracing::debug!("fetching {}", url);
    let response = reqwest::blocking::get(url).map_err(network)?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(RetrievalError::NotFound {
            locator: url.to_string(),
        });
    }
    response
        .error_for_status()
        .map_err(network)?
        .text()
        .map_err(network)
}

#[cfg(not(feature = "http"))]
fn fetch_http(url: &str) -> Result<String, RetrievalError> {
    let scheme = url.split_once("://").map_or("http", |(s, _)| s);
    Err(RetrievalError::UnsupportedScheme {
        scheme: scheme.to_string(),
        locator: url.to_string(),
    })
}

/// The raw text of a robot description and its semantic companion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawDescriptions {
    pub robot: String,
    pub semantic: String,
}

/// Fetches the two description texts through a [`ResourceRetriever`].
pub struct DescriptionLoader<'r> {
    retriever: &'r dyn ResourceRetriever,
}

impl<'r> DescriptionLoader<'r> {
    pub fn new(retriever: &'r dyn ResourceRetriever) -> Self {
        Self { retriever }
    }

    /// Retrieves both descriptions. The robot locator is fetched first, so its
    /// failure is the one reported when both are unresolvable.
    pub fn load_by_locator(
        &self,
        robot_locator: &str,
        semantic_locator: &str,
    ) -> Result<RawDescriptions, RetrievalError> {
        let robot = self.retriever.retrieve(robot_locator)?;
        let semantic = self.retriever.retrieve(semantic_locator)?;
        Ok(RawDescriptions { robot, semantic })
    }

    /// Wraps already-fetched text.
    pub fn load_from_text(
        robot_text: impl Into<String>,
        semantic_text: impl Into<String>,
    ) -> RawDescriptions {
        RawDescriptions {
            robot: robot_text.into(),
            semantic: semantic_text.into(),
        }
    }
}

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{MinibarsError, MinibarsResult};

/// Somewhere raw template text can be fetched from by name.
pub trait TemplateSource {
    /// `fetch` returns the text of the named template.
    ///
    /// # Errors
    /// - `MinibarsError::MissingTemplate` if no template has that name.
    /// - `MinibarsError::TemplateLoad` if the template exists but cannot be read.
    fn fetch(&self, name: &str) -> MinibarsResult<String>;
}

/// Templates registered up front and kept in memory.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemorySource {
    templates: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// `add_template` makes a new template available under `name`.
    ///
    /// # Errors
    /// - If the template name is a duplicate.
    pub fn add_template<N: AsRef<str>, C: Into<String>>(
        &mut self,
        name: N,
        content: C,
    ) -> MinibarsResult<()> {
        let name = name.as_ref();

        if self.templates.contains_key(name) {
            return Err(MinibarsError::TemplateExists {
                template_name: name.to_string(),
            });
        }

        self.templates.insert(name.to_string(), content.into());
        Ok(())
    }

    pub fn contains<N: AsRef<str>>(&self, name: N) -> bool {
        self.templates.contains_key(name.as_ref())
    }
}

impl TemplateSource for MemorySource {
    fn fetch(&self, name: &str) -> MinibarsResult<String> {
        self.templates
            .get(name)
            .cloned()
            .ok_or_else(|| MinibarsError::MissingTemplate {
                template_name: name.to_string(),
            })
    }
}

/// Templates stored as files below a root directory.
///
/// The template `emails/welcome` is read from `<root>/emails/welcome`, with
/// the configured extension appended when there is one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectorySource {
    root: PathBuf,
    extension: Option<String>,
}

impl DirectorySource {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self {
            root: root.into(),
            extension: None,
        }
    }

    #[must_use]
    pub fn with_extension<E: Into<String>>(mut self, extension: E) -> Self {
        self.extension = Some(extension.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> MinibarsResult<PathBuf> {
        let relative = Path::new(name);
        let stays_inside_root = !name.is_empty()
            && relative
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !stays_inside_root {
            return Err(MinibarsError::TemplateLoad {
                template_name: name.to_string(),
                reason: "template names must be relative paths without '..'".to_string(),
            });
        }

        let mut path = self.root.join(relative);
        if let Some(extension) = &self.extension {
            let mut file_name = path.file_name().unwrap_or_default().to_os_string();
            file_name.push(".");
            file_name.push(extension);
            path.set_file_name(file_name);
        }
        Ok(path)
    }
}

impl TemplateSource for DirectorySource {
    fn fetch(&self, name: &str) -> MinibarsResult<String> {
        let path = self.path_for(name)?;
        std::fs::read_to_string(&path).map_err(|error| match error.kind() {
            std::io::ErrorKind::NotFound => MinibarsError::MissingTemplate {
                template_name: name.to_string(),
            },
            _ => MinibarsError::TemplateLoad {
                template_name: name.to_string(),
                reason: format!("{}: {}", path.display(), error),
            },
        })
    }
}

/// Memoizing front for a [`TemplateSource`].
///
/// The first successful `load` of a name is cached and every later `load`
/// returns the cached text until it is invalidated. Failed loads are not
/// cached. The cache may be shared between threads; two threads loading the
/// same uncached name at once may both fetch it, and the first to finish is
/// kept.
///
/// # Examples
///
/// ```
/// use minibars::{MemorySource, TemplateLoader};
///
/// let mut source = MemorySource::new();
/// source.add_template("greeting", "Hello, {{name}}!").unwrap();
///
/// let loader = TemplateLoader::new(source);
/// assert_eq!(&*loader.load("greeting").unwrap(), "Hello, {{name}}!");
/// assert!(loader.is_cached("greeting"));
///
/// loader.remove_from_cache("greeting");
/// assert!(!loader.is_cached("greeting"));
/// ```
#[derive(Debug, Default)]
pub struct TemplateLoader<S> {
    source: S,
    cache: RwLock<HashMap<String, Arc<str>>>,
}

impl<S: TemplateSource> TemplateLoader<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Returns the cached text for `name`, fetching it from the source on a
    /// miss.
    ///
    /// # Errors
    /// - Whatever the source reports for a failed fetch.
    pub fn load(&self, name: &str) -> MinibarsResult<Arc<str>> {
        if let Some(cached) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
        {
            tracing::debug!(template = name, "Template cache hit");
            return Ok(Arc::clone(cached));
        }

        tracing::debug!(template = name, "Template cache miss");
        let text: Arc<str> = match self.source.fetch(name) {
            Ok(text) => Arc::from(text),
            Err(error) => {
                tracing::warn!(template = name, %error, "Failed to load template");
                return Err(error);
            }
        };

        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let cached = cache.entry(name.to_string()).or_insert(text);
        Ok(Arc::clone(cached))
    }

    pub fn is_cached(&self, name: &str) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn clear_cache(&self) {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        tracing::debug!(entries = cache.len(), "Clearing template cache");
        cache.clear();
    }

    /// Drops one cached template. Returns whether it was cached.
    pub fn remove_from_cache(&self, name: &str) -> bool {
        let removed = self
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name)
            .is_some();
        if removed {
            tracing::debug!(template = name, "Removed template from cache");
        }
        removed
    }
}

//! Pluggable image loaders, looked up by file extension

use std::path::Path;

use crate::bitmap::{Bitmap, MemBitmap};
use crate::config::DecodeOptions;
use crate::decoder::PngDecoder;
use crate::error::LoadError;

/// Entry for a file dialog: a description and a `;`-separated glob list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    pub description: String,
    pub pattern: String,
}

impl ExtensionFilter {
    pub fn new(description: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            pattern: pattern.into(),
        }
    }
}

pub trait ImageLoader: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the file name looks like something this loader decodes
    fn handles(&self, path: &Path) -> bool;

    /// Decode into `bitmap`. With `check_extension` set, files this loader
    /// doesn't handle fail with [`LoadError::UnsupportedExtension`] without
    /// being opened.
    fn load_into(
        &self,
        path: &Path,
        check_extension: bool,
        bitmap: &mut dyn Bitmap,
    ) -> Result<(), LoadError>;

    fn load(&self, path: &Path, check_extension: bool) -> Result<MemBitmap, LoadError> {
        let mut bitmap = MemBitmap::default();
        self.load_into(path, check_extension, &mut bitmap)?;
        Ok(bitmap)
    }

    fn extension_filter(&self) -> ExtensionFilter;
}

/// Case-insensitive `.png` suffix check on the file name
pub fn has_png_extension(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.rsplit_once('.'))
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("png"))
}

#[derive(Debug, Clone, Default)]
pub struct PngLoader {
    decoder: PngDecoder,
}

impl PngLoader {
    pub fn new(options: DecodeOptions) -> Self {
        Self {
            decoder: PngDecoder::new(options),
        }
    }
}

impl ImageLoader for PngLoader {
    fn name(&self) -> &str {
        "png"
    }

    fn handles(&self, path: &Path) -> bool {
        has_png_extension(path)
    }

    fn load_into(
        &self,
        path: &Path,
        check_extension: bool,
        bitmap: &mut dyn Bitmap,
    ) -> Result<(), LoadError> {
        if check_extension && !self.handles(path) {
            return Err(LoadError::UnsupportedExtension(path.to_path_buf()));
        }
        self.decoder.load_into(path, bitmap)
    }

    fn extension_filter(&self) -> ExtensionFilter {
        ExtensionFilter::new("PNG files (*.PNG)", "*.PNG")
    }
}

/// Ordered set of loaders, built once at start-up and shared read-only after.
///
/// Lookups try loaders in registration order.
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn ImageLoader>>,
}

impl std::fmt::Debug for LoaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_list()
            .entries(self.loaders.iter().map(|loader| loader.name()))
            .finish()
    }
}

impl LoaderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the PNG loader with the given options
    pub fn with_png(options: DecodeOptions) -> Self {
        let mut registry = Self::new();
        register_png_loader(&mut registry, options);
        registry
    }

    pub fn register(&mut self, loader: impl ImageLoader + 'static) -> &mut Self {
        log::debug!("Registered image loader `{}`", loader.name());
        self.loaders.push(Box::new(loader));
        self
    }

    pub fn loaders(&self) -> impl Iterator<Item = &dyn ImageLoader> {
        self.loaders.iter().map(|loader| loader.as_ref())
    }

    pub fn len(&self) -> usize {
        self.loaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaders.is_empty()
    }

    pub fn load(
        &self,
        path: impl AsRef<Path>,
        try_ignore_extension: bool,
    ) -> Result<MemBitmap, LoadError> {
        let mut bitmap = MemBitmap::default();
        self.load_into(path, try_ignore_extension, &mut bitmap)?;
        Ok(bitmap)
    }

    /// Try every loader that claims the extension; with
    /// `try_ignore_extension`, then offer the file to every loader regardless.
    ///
    /// A loader that fails to decode doesn't stop the search. The last such
    /// failure is returned if nothing succeeds.
    pub fn load_into(
        &self,
        path: impl AsRef<Path>,
        try_ignore_extension: bool,
        bitmap: &mut dyn Bitmap,
    ) -> Result<(), LoadError> {
        let path = path.as_ref();
        let mut last_err = None;

        let passes: &[bool] = if try_ignore_extension {
            &[true, false]
        } else {
            &[true]
        };

        for &check_extension in passes {
            if !check_extension {
                log::warn!(
                    "No loader took {}, retrying without extension checks",
                    path.display()
                );
            }

            for loader in self.loaders() {
                match loader.load_into(path, check_extension, bitmap) {
                    Ok(()) => {
                        log::trace!("`{}` loaded {}", loader.name(), path.display());
                        return Ok(());
                    }
                    Err(LoadError::UnsupportedExtension(_)) => {}
                    Err(e) => {
                        log::warn!("`{}` failed on {}: {}", loader.name(), path.display(), e);
                        last_err = Some(e);
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| LoadError::UnsupportedExtension(path.to_path_buf())))
    }

    /// One entry per loader, preceded by an "All supported images" entry
    /// when more than one pattern is known
    pub fn extension_filters(&self) -> Vec<ExtensionFilter> {
        let filters: Vec<_> = self.loaders().map(|l| l.extension_filter()).collect();

        let mut all = Vec::with_capacity(filters.len() + 1);
        if filters.len() > 1 {
            let patterns: Vec<&str> = filters.iter().map(|f| f.pattern.as_str()).collect();
            all.push(ExtensionFilter::new("All supported images", patterns.join(";")));
        }
        all.extend(filters);
        all
    }
}

/// Add the PNG loader to `registry`
pub fn register_png_loader(registry: &mut LoaderRegistry, options: DecodeOptions) {
    registry.register(PngLoader::new(options));
}

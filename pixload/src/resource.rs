//! Application resources: images compiled into the binary or shipped next to it

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceId {
    Id(u32),
    Name(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResourceId::Id(id) => write!(f, "#{id}"),
            ResourceId::Name(name) => f.write_str(name),
        }
    }
}

impl From<u32> for ResourceId {
    fn from(id: u32) -> Self {
        ResourceId::Id(id)
    }
}

impl From<&str> for ResourceId {
    fn from(name: &str) -> Self {
        ResourceId::Name(name.to_string())
    }
}

/// Looks up the raw bytes of a resource
pub trait ResourceProvider {
    fn find(&self, id: &ResourceId) -> Option<Cow<'_, [u8]>>;
}

/// Resources baked into the binary, usually with `include_bytes!`
#[derive(Debug, Default, Clone)]
pub struct EmbeddedResources {
    entries: HashMap<ResourceId, &'static [u8]>,
}

impl EmbeddedResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<ResourceId>, data: &'static [u8]) -> &mut Self {
        self.entries.insert(id.into(), data);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ResourceProvider for EmbeddedResources {
    fn find(&self, id: &ResourceId) -> Option<Cow<'_, [u8]>> {
        self.entries.get(id).map(|data| Cow::Borrowed(*data))
    }
}

/// Resource directory of an application bundle.
///
/// Named resources are plain files inside it; numeric ids map to `<id>.png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleResources {
    dir: PathBuf,
}

impl BundleResources {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Resources of the running executable, see [`resources_dir_for`]
    pub fn for_current_exe() -> std::io::Result<Self> {
        let dir = resources_dir_for(&std::env::current_exe()?);
        log::debug!("Bundle resources at {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

/// `Foo.app/Contents/MacOS/foo` resolves to `Foo.app/Contents/Resources`;
/// any other layout uses the executable's own directory.
pub fn resources_dir_for(exe: &Path) -> PathBuf {
    let exe_dir = exe.parent().unwrap_or(Path::new("."));

    match exe_dir.file_name() {
        Some(name) if name == "MacOS" => exe_dir
            .parent()
            .map(|contents| contents.join("Resources"))
            .unwrap_or_else(|| exe_dir.to_path_buf()),
        _ => exe_dir.to_path_buf(),
    }
}

impl ResourceProvider for BundleResources {
    fn find(&self, id: &ResourceId) -> Option<Cow<'_, [u8]>> {
        let path = match id {
            ResourceId::Id(id) => self.path_for(&format!("{id}.png")),
            ResourceId::Name(name) => self.path_for(name),
        };

        std::fs::read(&path)
            .map_err(|e| log::debug!("Resource {} unreadable: {}", path.display(), e))
            .ok()
            .map(Cow::Owned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::{pack_rgba, Bitmap};
    use crate::decoder::{load_png_from_named_resource, load_png_from_resource, PngDecoder};
    use crate::error::ErrorKind;

    // 1x1 opaque red, RGB 8-bit
    fn red_dot() -> Vec<u8> {
        let mut out = Vec::new();
        let mut encoder = png::Encoder::new(&mut out, 1, 1);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&[255, 0, 0]).unwrap();
        writer.finish().unwrap();
        out
    }

    #[test]
    fn embedded_by_id_and_name() {
        let data: &'static [u8] = red_dot().leak();
        let mut resources = EmbeddedResources::new();
        resources.insert(101u32, data).insert("icons/red.png", data);
        assert_eq!(resources.len(), 2);

        let decoder = PngDecoder::default();
        let by_id = decoder.load_from_resource(&resources, &ResourceId::Id(101)).unwrap();
        let by_name = decoder
            .load_from_resource(&resources, &ResourceId::from("icons/red.png"))
            .unwrap();

        assert_eq!(by_id, by_name);
        assert_eq!(by_id.pixel(0, 0), Some(pack_rgba(255, 0, 0, 255)));
        assert_eq!(load_png_from_resource(&resources, &ResourceId::Id(101)).unwrap(), by_id);
    }

    #[test]
    fn missing_and_tiny_resources() {
        let mut resources = EmbeddedResources::new();
        resources.insert(7u32, b"\x89PNG");
        let decoder = PngDecoder::default();

        let err = decoder.load_from_resource(&resources, &ResourceId::Id(8)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);

        let err = decoder.load_from_resource(&resources, &ResourceId::Id(7)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedSignature);
    }

    #[test]
    fn bundle_dir_next_to_executable() {
        assert_eq!(
            resources_dir_for(Path::new("/Applications/Foo.app/Contents/MacOS/foo")),
            Path::new("/Applications/Foo.app/Contents/Resources")
        );
        assert_eq!(
            resources_dir_for(Path::new("/opt/foo/bin/foo")),
            Path::new("/opt/foo/bin")
        );

        let bundle = BundleResources::for_current_exe().unwrap();
        let exe = std::env::current_exe().unwrap();
        assert_eq!(bundle.dir(), resources_dir_for(&exe));
    }

    #[test]
    fn bundle_lookup_by_path_and_id() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dot.png"), red_dot()).unwrap();
        std::fs::write(dir.path().join("12.png"), red_dot()).unwrap();
        let bundle = BundleResources::new(dir.path());
        let decoder = PngDecoder::default();

        let named = decoder.load_from_named_resource(&bundle, "dot.png").unwrap();
        assert_eq!((named.width(), named.height()), (1, 1));

        let by_id = decoder.load_from_resource(&bundle, &ResourceId::Id(12)).unwrap();
        assert_eq!(named, by_id);
        assert_eq!(load_png_from_named_resource(&bundle, "12.png").unwrap(), named);

        let err = decoder
            .load_from_named_resource(&bundle, "absent.png")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
    }
}

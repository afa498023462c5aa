pub mod bitmap;
pub mod config;
pub mod decoder;
pub mod error;
pub mod loader;
pub mod resource;

// Re-export commonly used types
pub use bitmap::{pack_rgba, unpack, Bitmap, MemBitmap, SliceBitmap};
pub use config::{DecodeOptions, ShortRead};
pub use decoder::{
    load_png, load_png_from_memory, load_png_from_memory_into, load_png_from_named_resource,
    load_png_from_resource, load_png_into, PngDecoder, Source,
};
pub use error::{ErrorKind, LoadError};
pub use loader::{register_png_loader, ExtensionFilter, ImageLoader, LoaderRegistry, PngLoader};
pub use resource::{
    resources_dir_for, BundleResources, EmbeddedResources, ResourceId, ResourceProvider,
};

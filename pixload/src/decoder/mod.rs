//! PNG decoding into 32-bit bitmaps
//!
//! The `png` crate does the heavy lifting (inflate, unfiltering, Adam7); this
//! module normalizes whatever it produces into packed pixels and writes them
//! straight into the destination's rows, honoring bottom-up storage.

mod header;
mod rows;
mod source;

pub use source::MemoryReader;

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::bitmap::{Bitmap, MemBitmap};
use crate::config::DecodeOptions;
use crate::error::LoadError;
use crate::resource::{BundleResources, ResourceId, ResourceProvider};

use header::{Header, Transforms};
use rows::RowTable;

/// Where the encoded bytes come from
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    File(&'a Path),
    Memory(&'a [u8]),
}

#[derive(Debug, Clone, Default)]
pub struct PngDecoder {
    options: DecodeOptions,
}

impl PngDecoder {
    pub fn new(options: DecodeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<MemBitmap, LoadError> {
        self.decode(Source::File(path.as_ref()))
    }

    pub fn load_into<B>(&self, path: impl AsRef<Path>, bitmap: &mut B) -> Result<(), LoadError>
    where
        B: Bitmap + ?Sized,
    {
        self.decode_into(Source::File(path.as_ref()), bitmap)
    }

    pub fn load_from_memory(&self, data: &[u8]) -> Result<MemBitmap, LoadError> {
        self.decode(Source::Memory(data))
    }

    pub fn load_from_memory_into<B>(&self, data: &[u8], bitmap: &mut B) -> Result<(), LoadError>
    where
        B: Bitmap + ?Sized,
    {
        self.decode_into(Source::Memory(data), bitmap)
    }

    pub fn load_from_resource<P>(&self, provider: &P, id: &ResourceId) -> Result<MemBitmap, LoadError>
    where
        P: ResourceProvider + ?Sized,
    {
        let mut bitmap = MemBitmap::default();
        self.load_from_resource_into(provider, id, &mut bitmap)?;
        Ok(bitmap)
    }

    pub fn load_from_resource_into<P, B>(
        &self,
        provider: &P,
        id: &ResourceId,
        bitmap: &mut B,
    ) -> Result<(), LoadError>
    where
        P: ResourceProvider + ?Sized,
        B: Bitmap + ?Sized,
    {
        let data = provider
            .find(id)
            .ok_or_else(|| LoadError::ResourceNotFound(id.to_string()))?;
        log::trace!("Resource {id}: {} bytes", data.len());
        self.decode_into(Source::Memory(&data), bitmap)
    }

    /// Decode `name` from the bundle's resource directory, by file path
    pub fn load_from_named_resource(
        &self,
        bundle: &BundleResources,
        name: &str,
    ) -> Result<MemBitmap, LoadError> {
        self.load(bundle.path_for(name))
    }

    /// Decode into a freshly allocated top-down bitmap of the image's size
    pub fn decode(&self, source: Source<'_>) -> Result<MemBitmap, LoadError> {
        let mut bitmap = MemBitmap::default();
        self.decode_into(source, &mut bitmap)?;
        Ok(bitmap)
    }

    /// Decode into `bitmap`, resizing it to the image's size.
    ///
    /// On failure the bitmap may already be resized and partially written.
    pub fn decode_into<B>(&self, source: Source<'_>, bitmap: &mut B) -> Result<(), LoadError>
    where
        B: Bitmap + ?Sized,
    {
        match source {
            Source::File(path) => {
                let file = File::open(path).map_err(|source| LoadError::SourceUnavailable {
                    path: path.to_path_buf(),
                    source,
                })?;
                log::trace!("Decoding {}", path.display());
                self.read_into(BufReader::new(file), bitmap)
            }
            Source::Memory(data) => {
                source::check_signature(data)?;
                log::trace!("Decoding {} byte buffer", data.len());
                self.read_into(MemoryReader::new(data, self.options.short_read), bitmap)
            }
        }
    }

    fn read_into<R, B>(&self, input: R, bitmap: &mut B) -> Result<(), LoadError>
    where
        R: Read,
        B: Bitmap + ?Sized,
    {
        let mut decoder = png::Decoder::new_with_limits(input, self.options.limits());
        decoder.set_transformations(Transforms::DECODER);
        decoder.ignore_checksums(self.options.ignore_checksums);
        let mut reader = decoder.read_info()?;

        let header = Header::from_info(reader.info());
        let plan = Transforms::for_header(&header);
        let (color_type, bit_depth) = reader.output_color_type();

        log::debug!(
            "PNG {}x{} {:?} {}-bit (tRNS: {}, interlaced: {}), {:?}",
            header.width,
            header.height,
            header.color_type,
            header.bit_depth as u8,
            header.has_trns,
            header.interlaced,
            plan
        );

        if (color_type, bit_depth) != plan.decoded_format(&header) {
            return Err(LoadError::UnsupportedFormat(format!(
                "{color_type:?} at {} bits decoded from {:?}",
                bit_depth as u8, header.color_type
            )));
        }

        bitmap.resize(header.width, header.height);
        let actual = (bitmap.width(), bitmap.height());
        if actual != header.dimensions() {
            return Err(LoadError::DestinationSizeMismatch {
                expected: header.dimensions(),
                actual,
            });
        }

        let rows = RowTable::new(
            header.width,
            header.height,
            bitmap.row_span(),
            bitmap.is_flipped(),
            bitmap.bits().len(),
        )?;
        let bits = bitmap.bits_mut();

        if header.interlaced {
            // Adam7 passes only make sense once all of them are in, so the
            // decoder reassembles the frame before we can place rows.
            let size = reader.output_buffer_size();
            if size > self.options.max_bytes {
                return Err(LoadError::DecoderInitFailed(format!(
                    "interlaced frame needs {size} bytes, limit is {}",
                    self.options.max_bytes
                )));
            }
            let mut frame = vec![0; size];
            let info = reader.next_frame(&mut frame)?;
            for (row, line) in frame.chunks_exact(info.line_size).take(rows.len()).enumerate() {
                rows::write_argb_row(&plan, line, rows.row_mut(bits, row));
            }
        } else {
            for row in 0..rows.len() {
                let line = reader.next_row()?.ok_or_else(truncated)?;
                rows::write_argb_row(&plan, line.data(), rows.row_mut(bits, row));
            }
        }
        drop(reader);

        rows.pack_all(bits);
        Ok(())
    }
}

fn truncated() -> LoadError {
    LoadError::Decode(io::Error::from(io::ErrorKind::UnexpectedEof).into())
}

/// Decode a PNG file into a new bitmap with default options
pub fn load_png(path: impl AsRef<Path>) -> Result<MemBitmap, LoadError> {
    PngDecoder::default().load(path)
}

/// Decode a PNG file into a caller-owned bitmap with default options
pub fn load_png_into<B: Bitmap + ?Sized>(
    path: impl AsRef<Path>,
    bitmap: &mut B,
) -> Result<(), LoadError> {
    PngDecoder::default().load_into(path, bitmap)
}

/// Decode an in-memory PNG into a new bitmap with default options
pub fn load_png_from_memory(data: &[u8]) -> Result<MemBitmap, LoadError> {
    PngDecoder::default().load_from_memory(data)
}

/// Decode an in-memory PNG into a caller-owned bitmap with default options
pub fn load_png_from_memory_into<B: Bitmap + ?Sized>(
    data: &[u8],
    bitmap: &mut B,
) -> Result<(), LoadError> {
    PngDecoder::default().load_from_memory_into(data, bitmap)
}

/// Decode a resource looked up through `provider` with default options
pub fn load_png_from_resource<P>(provider: &P, id: &ResourceId) -> Result<MemBitmap, LoadError>
where
    P: ResourceProvider + ?Sized,
{
    PngDecoder::default().load_from_resource(provider, id)
}

/// Decode `name` from a bundle's resource directory with default options
pub fn load_png_from_named_resource(
    bundle: &BundleResources,
    name: &str,
) -> Result<MemBitmap, LoadError> {
    PngDecoder::default().load_from_named_resource(bundle, name)
}

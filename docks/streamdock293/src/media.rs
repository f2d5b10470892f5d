//! Image rendering and bulk upload for key icons and the boot logo.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use dock_sync_core::{ResourceError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use rayon::iter::ParallelIterator;
use rayon::slice::ParallelSlice;
use tracing::debug;

use crate::abi;
use crate::transfer::Serializer;

/// Key icon edge length in pixels
pub const ICON_SIZE: u32 = 100;
/// Boot logo dimensions
pub const BOOT_WIDTH: u32 = 800;
pub const BOOT_HEIGHT: u32 = 480;
/// Raw boot logo length, three bytes per pixel
pub const BOOT_IMAGE_LEN: usize = (BOOT_WIDTH * BOOT_HEIGHT * 3) as usize;

/// Where an image comes from
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageSource {
    /// Read the source into memory
    pub async fn resolve(&self) -> std::result::Result<Cow<'_, [u8]>, ResourceError> {
        match self {
            ImageSource::Path(path) => tokio::fs::read(path)
                .await
                .map(Cow::Owned)
                .map_err(|source| ResourceError::Read {
                    path: path.clone(),
                    source,
                }),
            ImageSource::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for ImageSource {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

/// Interpolation used when scaling to the device size
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Resize {
    #[default]
    Smooth,
    Nearest,
}

impl Resize {
    fn filter(self) -> FilterType {
        match self {
            Resize::Smooth => FilterType::Triangle,
            Resize::Nearest => FilterType::Nearest,
        }
    }
}

fn decode(bytes: &[u8]) -> std::result::Result<DynamicImage, ResourceError> {
    image::load_from_memory(bytes).map_err(ResourceError::Decode)
}

/// Render a key icon: 100x100, upside down, max quality jpeg
pub fn render_icon(bytes: &[u8], resize: Resize) -> std::result::Result<Vec<u8>, ResourceError> {
    let rgb = decode(bytes)?
        .resize_exact(ICON_SIZE, ICON_SIZE, resize.filter())
        .rotate180()
        .to_rgb8();

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, 100)
        .encode_image(&rgb)
        .map_err(ResourceError::Encode)?;
    Ok(buf)
}

/// Render the boot logo: 800x480, upside down, raw BGR triples
pub fn render_boot_image(
    bytes: &[u8],
    resize: Resize,
) -> std::result::Result<Vec<u8>, ResourceError> {
    let rgb = decode(bytes)?
        .resize_exact(BOOT_WIDTH, BOOT_HEIGHT, resize.filter())
        .rotate180()
        .to_rgb8();

    let buf: Vec<u8> = rgb
        .as_raw()
        .par_chunks_exact(3)
        .flat_map_iter(|p| [p[2], p[1], p[0]])
        .collect();
    debug_assert_eq!(buf.len(), BOOT_IMAGE_LEN);
    Ok(buf)
}

/// Upload header size field for an encoded buffer
fn header_size(len: usize) -> std::result::Result<u32, ResourceError> {
    u32::try_from(len).map_err(|_| ResourceError::TooLarge { len })
}

/// Announce, stream and commit an encoded icon
pub async fn upload_icon(serializer: &Serializer, key: u8, icon: &[u8]) -> Result<()> {
    let size = header_size(icon.len())?;
    debug!(key, size, "uploading key icon");
    serializer.send_command(&abi::begin_icon(size, key)).await?;
    serializer.send_chunked(icon).await?;
    serializer.send_command(&abi::commit()).await?;
    Ok(())
}

/// Announce, stream and commit a raw boot logo
pub async fn upload_boot_image(serializer: &Serializer, image: &[u8]) -> Result<()> {
    debug!(len = image.len(), "uploading boot image");
    serializer.send_command(&abi::begin_boot_image()).await?;
    serializer.send_chunked(image).await?;
    serializer.send_command(&abi::commit()).await?;
    Ok(())
}

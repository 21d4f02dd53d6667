//! Testing utilities and mock implementations.
//!
//! Mocks for every external dependency of the NFT pipeline, so the sequencer
//! and the HTTP layer can be tested without a worker program, the video API
//! or a bucket.
//!
//! # Example
//!
//! ```rust,ignore
//! use arnft_core::testing::{MockArtifactStore, MockMarkerCompiler, MockVideoGenerator};
//!
//! let store = Arc::new(MockArtifactStore::new());
//! let compiler = Arc::new(MockMarkerCompiler::new(temp_dir.path()));
//! let generator = Arc::new(MockVideoGenerator::new().with_store(store.clone()));
//!
//! let service = NftService::new(compiler, generator, store);
//! ```

mod mock_compiler;
mod mock_generator;
mod mock_store;

pub use mock_compiler::MockMarkerCompiler;
pub use mock_generator::MockVideoGenerator;
pub use mock_store::{MockArtifactStore, StoredObject};

/// Test fixtures and helper functions.
pub mod fixtures {
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    /// A PNG of the given size with a simple gradient.
    pub fn png_image(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        });
        let mut buf = Cursor::new(Vec::new());
        // Encoding into memory only fails on unsupported formats.
        let _ = DynamicImage::ImageRgb8(img).write_to(&mut buf, ImageFormat::Png);
        buf.into_inner()
    }

    /// A JPEG of the given size with a flat color.
    pub fn jpeg_image(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, Rgb([30, 144, 255]));
        let mut buf = Cursor::new(Vec::new());
        let _ = DynamicImage::ImageRgb8(img).write_to(&mut buf, ImageFormat::Jpeg);
        buf.into_inner()
    }
}

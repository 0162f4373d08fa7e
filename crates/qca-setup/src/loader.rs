//! Firmware image sources
//!
//! An image is owned by the download that requested it and released when dropped.
use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use derive_ctor::ctor;
use getset::Getters;

use crate::{Result, err::Error};

/// Resolve a firmware name to its bytes
pub trait FirmwareLoader {
    /// Image buffer, patched in place but never resized
    type Image: AsRef<[u8]> + AsMut<[u8]>;

    fn request(&mut self, name: &str) -> Result<Self::Image>;
}

impl<L: FirmwareLoader + ?Sized> FirmwareLoader for &mut L {
    type Image = L::Image;

    fn request(&mut self, name: &str) -> Result<Self::Image> {
        (**self).request(name)
    }
}

/// Loads `<root>/<name>` from disk
#[derive(Debug, Clone, Getters, ctor)]
pub struct DirLoader {
    #[getset(get = "pub")]
    #[ctor(into)]
    root: PathBuf,
}

impl Default for DirLoader {
    fn default() -> Self {
        Self {
            root: PathBuf::from("/lib/firmware/qca"),
        }
    }
}

impl FirmwareLoader for DirLoader {
    type Image = Vec<u8>;

    fn request(&mut self, name: &str) -> Result<Self::Image> {
        if Path::new(name).file_name().is_none_or(|f| f != name) {
            return Err(Error::InvalidArgument("firmware name must be a plain file name"));
        }

        fs::read(self.root.join(name)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::ImageNotFound(name.to_string()),
            _ => e.into(),
        })
    }
}

/// Images kept in memory, every request gets its own copy
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    images: HashMap<String, Vec<u8>>,
}

impl MemoryLoader {
    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> &mut Self {
        self.images.insert(name.into(), data.into());
        self
    }
}

impl<N: Into<String>, D: Into<Vec<u8>>> FromIterator<(N, D)> for MemoryLoader {
    fn from_iter<I: IntoIterator<Item = (N, D)>>(iter: I) -> Self {
        Self {
            images: iter
                .into_iter()
                .map(|(n, d)| (n.into(), d.into()))
                .collect(),
        }
    }
}

impl FirmwareLoader for MemoryLoader {
    type Image = Vec<u8>;

    fn request(&mut self, name: &str) -> Result<Self::Image> {
        self.images
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ImageNotFound(name.to_string()))
    }
}

// src/resource.rs

//! Fully qualified URLs for uploaded media.

use crate::environment::EnvironmentResolver;
use crate::models::Diary;
use crate::utils::url;

/// Resolves media paths against the current resource base.
///
/// Nothing is cached: every call asks the resolver again.
#[derive(Clone)]
pub struct ResourceUrls {
    env: EnvironmentResolver,
}

impl ResourceUrls {
    pub fn new(env: EnvironmentResolver) -> Self {
        Self { env }
    }

    pub fn to_absolute(&self, path: &str) -> String {
        url::to_absolute(&self.env.resolve_resource_base(), path)
    }

    /// Rewrite every media reference of a diary.
    pub fn absolutize(&self, diary: &mut Diary) {
        let base = self.env.resolve_resource_base();
        diary.map_media(|path| url::to_absolute(&base, path));
    }
}

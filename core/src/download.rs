//! Downloadable objects and their retrieval URLs
//!
//! Mirrors the browser's object URL model: bytes are registered once and
//! handed out behind an opaque `blob:` URL until the URL is revoked. A
//! [`DownloadTarget`] holds at most one live URL, and publishing a new object
//! to it revokes the previous one so repeated downloads do not pile up.

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;

const URL_PREFIX: &str = "blob:totalgb/";

/// Host-owned bytes offered for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadableObject {
    bytes: Arc<[u8]>,
    file_name: String,
    mime_type: String,
}

impl DownloadableObject {
    pub fn new(
        bytes: impl Into<Arc<[u8]>>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            bytes: bytes.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

/// An opaque retrieval URL for a registered object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl(String);

impl ObjectUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Table of live object URLs.
#[derive(Debug, Default)]
pub struct ObjectUrlRegistry {
    next_id: u64,
    objects: HashMap<ObjectUrl, DownloadableObject>,
}

impl ObjectUrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object and return a fresh URL for it.
    pub fn create_object_url(&mut self, object: DownloadableObject) -> ObjectUrl {
        self.next_id += 1;
        let url = ObjectUrl(format!("{URL_PREFIX}{}", self.next_id));
        self.objects.insert(url.clone(), object);
        url
    }

    /// Drop the object behind `url`. Returns false if it was not live.
    pub fn revoke_object_url(&mut self, url: &ObjectUrl) -> bool {
        self.objects.remove(url).is_some()
    }

    pub fn resolve(&self, url: &ObjectUrl) -> Option<&DownloadableObject> {
        self.objects.get(url)
    }

    /// Number of live URLs.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Register `object` and point `target` at it, revoking whatever the
    /// target pointed at before.
    pub fn publish(&mut self, target: &mut DownloadTarget, object: DownloadableObject) -> ObjectUrl {
        let url = self.create_object_url(object);
        if let Some(previous) = target.href.replace(url.clone()) {
            self.revoke_object_url(&previous);
            tracing::debug!(element = %target.id, url = %previous, "Revoked previous download URL");
        }
        url
    }
}

/// The UI element a download is published to (e.g. a download link).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    id: String,
    href: Option<ObjectUrl>,
}

impl DownloadTarget {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            href: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The currently published URL, if any.
    pub fn href(&self) -> Option<&ObjectUrl> {
        self.href.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive(bytes: &[u8]) -> DownloadableObject {
        DownloadableObject::new(bytes.to_vec(), "saves.zip", "application/zip")
    }

    #[test]
    fn created_urls_are_unique_and_resolvable() {
        let mut registry = ObjectUrlRegistry::new();
        let a = registry.create_object_url(archive(b"a"));
        let b = registry.create_object_url(archive(b"b"));

        assert_ne!(a, b);
        assert!(a.as_str().starts_with("blob:totalgb/"));
        assert_eq!(registry.resolve(&a).unwrap().bytes(), b"a");
        assert_eq!(registry.resolve(&b).unwrap().bytes(), b"b");
    }

    #[test]
    fn revoke_drops_object_once() {
        let mut registry = ObjectUrlRegistry::new();
        let url = registry.create_object_url(archive(b"zip"));

        assert!(registry.revoke_object_url(&url));
        assert!(!registry.revoke_object_url(&url));
        assert!(registry.resolve(&url).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn republishing_replaces_previous_url() {
        let mut registry = ObjectUrlRegistry::new();
        let mut target = DownloadTarget::new("DlSaves");

        let first = registry.publish(&mut target, archive(b"one"));
        let second = registry.publish(&mut target, archive(b"two"));

        assert_eq!(target.href(), Some(&second));
        assert!(registry.resolve(&first).is_none());
        assert_eq!(registry.resolve(&second).unwrap().bytes(), b"two");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn repeated_downloads_do_not_accumulate() {
        let mut registry = ObjectUrlRegistry::new();
        let mut target = DownloadTarget::new("DlSaves");
        for i in 0..50u8 {
            registry.publish(&mut target, archive(&[i]));
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn targets_are_independent() {
        let mut registry = ObjectUrlRegistry::new();
        let mut saves = DownloadTarget::new("DlSaves");
        let mut states = DownloadTarget::new("DlStates");

        registry.publish(&mut saves, archive(b"s"));
        registry.publish(&mut states, archive(b"t"));
        registry.publish(&mut saves, archive(b"s2"));

        assert_eq!(registry.len(), 2);
        assert_eq!(saves.id(), "DlSaves");
        assert_eq!(
            registry.resolve(states.href().unwrap()).unwrap().bytes(),
            b"t"
        );
    }
}

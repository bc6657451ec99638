use std::collections::HashSet;
use std::path::Path;

use once_cell::sync::Lazy;

use super::photo::CatalogEntry;
use crate::gallery::LayoutError;
use crate::layout::ViewportMode;

static BUILTIN_ENTRIES: Lazy<Vec<CatalogEntry>> = Lazy::new(|| {
    vec![
        CatalogEntry::new(
            1,
            "activity/1.webp",
            "Study Visit from IPWIJA University Jakarta",
        )
        .desktop_only(),
        CatalogEntry::new(2, "activity/2.webp", "Campus Introduction Expo"),
        CatalogEntry::new(3, "activity/3.webp", "Basic Programming Lab Assistant 2024"),
        CatalogEntry::new(4, "activity/4.webp", "LLDIKTI Region XVI Accreditation Visit"),
        CatalogEntry::new(8, "activity/8.webp", "ITENAS Badminton Student Unit").desktop_only(),
        CatalogEntry::new(9, "activity/9.webp", "Cheator Team - Prokimnas"),
        CatalogEntry::new(10, "activity/10.webp", "Itenas Award 2025 - ICT Lab"),
        CatalogEntry::new(11, "activity/11.webp", "Industrial Visit to Huawei"),
    ]
});

/// Ordered, fixed set of photos the board can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Builds a catalog, rejecting empty sets and repeated ids.
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self, LayoutError> {
        if entries.is_empty() {
            return Err(LayoutError::EmptyCatalog);
        }
        let mut seen = HashSet::with_capacity(entries.len());
        for entry in &entries {
            if !seen.insert(entry.id) {
                return Err(LayoutError::DuplicateId(entry.id));
            }
        }
        Ok(Self { entries })
    }

    /// The activity photos shipped with the board.
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_ENTRIES.clone(),
        }
    }

    /// Resolves relative photo sources against `root`. Absolute sources are kept.
    pub fn with_asset_root(&self, root: &Path) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|entry| {
                let mut entry = entry.clone();
                if entry.src.is_relative() {
                    entry.src = root.join(&entry.src);
                }
                entry
            })
            .collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries valid for `mode`, in catalog order.
    pub fn visible_in(&self, mode: ViewportMode) -> impl Iterator<Item = &CatalogEntry> {
        self.entries.iter().filter(move |entry| entry.visible_in(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PhotoId;
    use std::path::PathBuf;

    impl Catalog {
        fn get(&self, id: PhotoId) -> Option<&CatalogEntry> {
            self.entries.iter().find(|entry| entry.id == id)
        }
    }

    fn ids(catalog: &Catalog, mode: ViewportMode) -> Vec<u32> {
        catalog.visible_in(mode).map(|entry| entry.id.0).collect()
    }

    #[test]
    fn builtin_catalog_has_eight_desktop_and_six_mobile_photos() {
        let catalog = Catalog::builtin();
        assert_eq!(ids(&catalog, ViewportMode::Desktop), vec![1, 2, 3, 4, 8, 9, 10, 11]);
        assert_eq!(ids(&catalog, ViewportMode::Mobile), vec![2, 3, 4, 9, 10, 11]);
    }

    #[test]
    fn new_rejects_duplicate_ids() {
        let result = Catalog::new(vec![
            CatalogEntry::new(2, "a.webp", "a"),
            CatalogEntry::new(2, "b.webp", "b"),
        ]);
        assert_eq!(result, Err(LayoutError::DuplicateId(PhotoId(2))));
    }

    #[test]
    fn new_rejects_empty_catalog() {
        assert_eq!(Catalog::new(Vec::new()), Err(LayoutError::EmptyCatalog));
    }

    #[test]
    fn asset_root_only_rewrites_relative_sources() {
        let catalog = Catalog::new(vec![
            CatalogEntry::new(1, "activity/1.webp", "rel"),
            CatalogEntry::new(2, "/srv/photos/2.webp", "abs"),
        ])
        .unwrap();

        let rooted = catalog.with_asset_root(Path::new("/opt/board"));
        assert_eq!(
            rooted.get(PhotoId(1)).unwrap().src,
            PathBuf::from("/opt/board/activity/1.webp")
        );
        assert_eq!(
            rooted.get(PhotoId(2)).unwrap().src,
            PathBuf::from("/srv/photos/2.webp")
        );
    }
}

//! PDF concatenation on top of `lopdf`.
//!
//! Each source document is renumbered into a shared object space, its pages
//! are re-parented under one new page tree and everything else the pages
//! reference is carried over unchanged. Sources that cannot be loaded are
//! reported back instead of aborting the merge.

use std::collections::{BTreeMap, BTreeSet};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};

use crate::error::{Error, Result};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Bound on page-tree ancestry walks; guards against Parent cycles.
const MAX_TREE_DEPTH: usize = 64;

/// Result of [`merge_pdfs`].
#[derive(Debug, Clone)]
pub struct MergedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Names of sources that could not be read, in input order.
    pub failed: Vec<String>,
}

/// Concatenate the pages of `sources` (name, bytes) in the given order.
///
/// Returns [`Error::NoOutput`] when no source contributed a page.
pub fn merge_pdfs<'a, I>(sources: I) -> Result<MergedPdf>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut failed = Vec::new();

    for (name, bytes) in sources {
        let mut doc = match Document::load_mem(bytes) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("Skipping {name}: {e}");
                failed.push(name.to_string());
                continue;
            }
        };

        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        if page_ids.is_empty() {
            log::warn!("Skipping {name}: document has no pages");
            failed.push(name.to_string());
            continue;
        }
        log::debug!("Appending {} page(s) from {name}", page_ids.len());

        for &id in &page_ids {
            let Ok(dict) = doc.get_dictionary(id) else {
                log::warn!("{name}: page object {id:?} is not a dictionary");
                continue;
            };
            let mut page = dict.clone();
            for key in INHERITABLE {
                if !page.has(key) {
                    if let Some(value) = inherited_attribute(&doc, dict, key) {
                        page.set(key, value);
                    }
                }
            }
            pages.push((id, page));
        }

        let page_set: BTreeSet<ObjectId> = page_ids.into_iter().collect();
        for (id, object) in std::mem::take(&mut doc.objects) {
            if page_set.contains(&id) || is_tree_node(&object) {
                continue;
            }
            objects.insert(id, object);
        }
    }

    if pages.is_empty() {
        return Err(Error::NoOutput);
    }

    let mut merged = Document::with_version("1.5");
    merged.objects = objects;
    merged.max_id = max_id;

    let pages_id = merged.new_object_id();
    let page_count = pages.len();
    let mut kids = Vec::with_capacity(page_count);
    for (id, mut page) in pages {
        page.set("Parent", pages_id);
        merged.objects.insert(id, Object::Dictionary(page));
        kids.push(Object::Reference(id));
    }
    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
        }),
    );
    let catalog_id = merged.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    merged.trailer.set("Root", catalog_id);
    merged.compress();

    let mut bytes = Vec::new();
    merged.save_to(&mut bytes)?;
    log::info!(
        "Merged {page_count} page(s), {} source(s) skipped",
        failed.len()
    );

    Ok(MergedPdf {
        bytes,
        page_count,
        failed,
    })
}

/// Catalog, page-tree and outline objects are rebuilt or dropped.
fn is_tree_node(object: &Object) -> bool {
    matches!(
        object.type_name().ok(),
        Some("Catalog" | "Pages" | "Outlines" | "Outline")
    )
}

/// Look `key` up on the ancestors of `page`.
fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(id) = parent {
        if depth >= MAX_TREE_DEPTH {
            break;
        }
        let node = doc.get_dictionary(id).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }
    None
}

/// Number of pages in a PDF, or `None` if it cannot be read.
pub fn page_count(bytes: &[u8]) -> Option<usize> {
    Document::load_mem(bytes).ok().map(|doc| doc.get_pages().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A PDF with one page per tag; MediaBox and Resources live on the page
    /// tree root so pages must inherit them.
    fn sample_pdf(tags: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let kids: Vec<Object> = tags
            .iter()
            .map(|tag| {
                doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "Tag" => *tag,
                })
                .into()
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => tags.len() as i64,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(595),
                    Object::Integer(842),
                ],
                "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    fn page_tags(bytes: &[u8]) -> Vec<String> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|&id| {
                let page = doc.get_dictionary(id).unwrap();
                String::from_utf8_lossy(page.get(b"Tag").unwrap().as_name().unwrap()).into_owned()
            })
            .collect()
    }

    #[test]
    fn pages_are_concatenated_in_order() {
        let a = sample_pdf(&["a1", "a2"]);
        let b = sample_pdf(&["b1"]);
        let merged = merge_pdfs([("a.pdf", &a[..]), ("b.pdf", &b[..])]).unwrap();
        assert_eq!(merged.page_count, 3);
        assert!(merged.failed.is_empty());
        assert_eq!(page_tags(&merged.bytes), vec!["a1", "a2", "b1"]);

        let merged = merge_pdfs([("b.pdf", &b[..]), ("a.pdf", &a[..])]).unwrap();
        assert_eq!(page_tags(&merged.bytes), vec!["b1", "a1", "a2"]);
    }

    #[test]
    fn inherited_attributes_survive() {
        let a = sample_pdf(&["a1"]);
        let merged = merge_pdfs([("a.pdf", &a[..])]).unwrap();
        let doc = Document::load_mem(&merged.bytes).unwrap();
        for id in doc.get_pages().into_values() {
            let page = doc.get_dictionary(id).unwrap();
            assert!(page.has(b"MediaBox"));
            assert!(page.has(b"Resources"));
        }
    }

    #[test]
    fn unreadable_sources_are_reported() {
        let a = sample_pdf(&["a1"]);
        let merged = merge_pdfs([
            ("broken.pdf", &b"not a pdf at all"[..]),
            ("a.pdf", &a[..]),
        ])
        .unwrap();
        assert_eq!(merged.page_count, 1);
        assert_eq!(merged.failed, vec!["broken.pdf".to_string()]);
    }

    #[test]
    fn nothing_to_merge() {
        let result = merge_pdfs([("broken.pdf", &b"%PDF-garbage"[..])]);
        assert!(matches!(result, Err(Error::NoOutput)));
    }

    #[test]
    fn counts_pages() {
        assert_eq!(page_count(&sample_pdf(&["x", "y"])), Some(2));
        assert_eq!(page_count(b"nope"), None);
    }
}

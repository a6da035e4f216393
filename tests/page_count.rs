use chunk_dispatch::{
    Error,
    page_count::{PageCounter, PdfPageCounter},
};
use lopdf::{Document, Object, dictionary};
use std::path::Path;

fn write_pdf(path: &Path, pages: u32) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::new();
    for _ in 0..pages {
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        });
        kids.push(Object::Reference(page_id));
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(pages as i64),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

#[test]
fn counts_pages_of_a_real_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("seven.pdf");
    write_pdf(&path, 7);
    assert_eq!(PdfPageCounter.count_pages(&path).unwrap(), 7);
}

#[test]
fn empty_pdf_has_zero_pages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.pdf");
    write_pdf(&path, 0);
    assert_eq!(PdfPageCounter.count_pages(&path).unwrap(), 0);
}

#[test]
fn garbage_is_a_document_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.pdf");
    std::fs::write(&path, b"definitely not a pdf").unwrap();
    let err = PdfPageCounter.count_pages(&path).unwrap_err();
    assert!(matches!(err, Error::DocumentRead { .. }));
}

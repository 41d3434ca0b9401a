//! Extract holdings from statement PDFs written with lopdf.
//!
//! Each page draws all of its lines inside a single `BT`/`ET` text object,
//! moving down with `T*`, which is how most statement generators lay out text.

use approx::assert_relative_eq;
use lopdf::{content::Content, content::Operation, Dictionary, Document, Object, Stream};
use statement_core::extract::read_statement_pages;
use statement_core::{extract_statement, Config};
use std::path::Path;
use tempfile::tempdir;

const CDN_PAGE: &[&str] = &[
    "Asset Review",
    "CDN Account - December 31, 2020",
    "Common Shares",
    "AlphaCorp ALP 100 12.50 1,000.00 1,250.00",
    "BetaInc BET 40 5.00 180.00 200.00",
    "TotalValueofCommonShares 1,450.00",
];

const ACTIVITY_PAGE: &[&str] = &[
    "Account Activity",
    "December 31, 2020",
    "Dividend ALP 12.00",
];

const US_PAGE: &[&str] = &[
    "Asset Review",
    "US Account - December 31, 2020",
    "Foreign Securities",
    "Gamma GAM 10 45.00 400.00 450.00",
    "TotalValueofForeignSecurities 450.00",
];

fn text_block(lines: &[&str]) -> Content {
    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![Object::Name(b"F1".to_vec()), Object::Integer(10)],
        ),
        Operation::new("TL", vec![Object::Integer(14)]),
        Operation::new("Td", vec![Object::Integer(50), Object::Integer(760)]),
    ];
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            operations.push(Operation::new("T*", vec![]));
        }
        operations.push(Operation::new(
            "Tj",
            vec![Object::String(
                line.as_bytes().to_vec(),
                lopdf::StringFormat::Literal,
            )],
        ));
    }
    operations.push(Operation::new("ET", vec![]));
    Content { operations }
}

fn write_statement(path: &Path, pages: &[&[&str]]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![(
            "F1",
            Object::Reference(font_id),
        )])),
    )]));

    let mut page_ids = Vec::new();
    for lines in pages {
        let content = text_block(lines);
        let content_id =
            doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
        ]));
        page_ids.push(page_id);
    }

    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(page_ids.len() as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    doc.save(path).unwrap();
}

#[test]
fn test_marked_pages_keep_line_order() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("investments_2020.pdf");
    write_statement(&path, &[CDN_PAGE, ACTIVITY_PAGE, US_PAGE]);

    let pages = read_statement_pages(&path, "Asset Review").unwrap();

    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0], CDN_PAGE);
    assert_eq!(pages[1], US_PAGE);
}

#[test]
fn test_extract_statement_from_pdf() {
    let config = Config::default();
    let dir = tempdir().unwrap();
    let path = dir.path().join("investments_2020.pdf");
    write_statement(&path, &[CDN_PAGE, ACTIVITY_PAGE, US_PAGE]);

    let tables = extract_statement(&path, &config).unwrap();

    assert_eq!(tables.suffix, "investments");
    assert_eq!(tables.domestic.columns(), &["Quantity_2020", "Price_2020"]);
    assert_eq!(
        tables.domestic.symbols().collect::<Vec<_>>(),
        vec!["ALP", "BET"]
    );
    assert_relative_eq!(tables.domestic.get("ALP", "Quantity_2020").unwrap(), 100.0);
    assert_relative_eq!(tables.domestic.get("ALP", "Price_2020").unwrap(), 12.5);
    assert_relative_eq!(tables.domestic.get("BET", "Price_2020").unwrap(), 5.0);

    assert_eq!(tables.foreign.symbols().collect::<Vec<_>>(), vec!["GAM"]);
    assert_relative_eq!(tables.foreign.get("GAM", "Quantity_2020").unwrap(), 10.0);
    assert_relative_eq!(tables.foreign.get("GAM", "Price_2020").unwrap(), 45.0);
}

#[test]
fn test_statement_without_marked_pages() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("investments_2020.pdf");
    write_statement(&path, &[ACTIVITY_PAGE]);

    let pages = read_statement_pages(&path, "Asset Review").unwrap();
    assert!(pages.is_empty());
}

//! Fixtures shared by the integration tests: small image headers and hand-built
//! packages held in memory.
#![allow(dead_code)]

use docx_oxml::ooxml::opc::MemPhysPkg;
use docx_oxml::ooxml::opc::constants::{content_type as ct, relationship_type as rt};
use docx_oxml::ooxml::oxml::ns;

pub const DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Signature plus IHDR; enough for the header reader.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data.extend_from_slice(&[0; 4]);
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(b"IEND");
    data.extend_from_slice(&[0; 4]);
    data
}

/// `word/document.xml` with `body` as the body content.
pub fn document_xml(body: &str) -> String {
    format!(
        r#"{decl}
<w:document xmlns:w="{w}" xmlns:wp="{wp}" xmlns:a="{a}" xmlns:pic="{pic}" xmlns:r="{r}"><w:body>{body}</w:body></w:document>"#,
        decl = DECLARATION,
        w = ns::W,
        wp = ns::WP,
        a = ns::A,
        pic = ns::PIC,
        r = ns::R,
        body = body
    )
}

/// An inline drawing run whose graphic data declares `uri`.
pub fn inline_run(id: u32, uri: &str, cx: i64, cy: i64, graphic: &str) -> String {
    format!(
        r#"<w:r><w:drawing><wp:inline><wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{id}" name="Shape {id}"/><a:graphic><a:graphicData uri="{uri}">{graphic}</a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#
    )
}

/// A picture graphic with the given blip references.
pub fn pic(embed: Option<&str>, link: Option<&str>) -> String {
    let mut refs = String::new();
    if let Some(embed) = embed {
        refs.push_str(&format!(r#" r:embed="{}""#, embed));
    }
    if let Some(link) = link {
        refs.push_str(&format!(r#" r:link="{}""#, link));
    }
    format!(r#"<pic:pic><pic:blipFill><a:blip{}/></pic:blipFill></pic:pic>"#, refs)
}

/// A minimal .docx: content types, package rels, the document and its rels,
/// plus `media` members under `word/media/`. Targets with a scheme are
/// written as external.
pub fn docx(body: &str, document_rels: &[(&str, &str, &str)], media: &[(&str, Vec<u8>)]) -> MemPhysPkg {
    let mut phys = MemPhysPkg::new();
    phys.insert(
        "[Content_Types].xml",
        format!(
            r#"{decl}
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="{rels}"/><Default Extension="xml" ContentType="{xml}"/><Default Extension="png" ContentType="{png}"/><Override PartName="/word/document.xml" ContentType="{doc}"/></Types>"#,
            decl = DECLARATION,
            rels = ct::OPC_RELATIONSHIPS,
            xml = ct::XML,
            png = ct::PNG,
            doc = ct::WML_DOCUMENT_MAIN
        ),
    );
    phys.insert(
        "_rels/.rels",
        format!(
            r#"{decl}
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{t}" Target="word/document.xml"/></Relationships>"#,
            decl = DECLARATION,
            t = rt::OFFICE_DOCUMENT
        ),
    );
    phys.insert("word/document.xml", document_xml(body));
    if !document_rels.is_empty() {
        let rels: String = document_rels
            .iter()
            .map(|(id, reltype, target)| {
                let mode = if target.contains("://") { r#" TargetMode="External""# } else { "" };
                format!(r#"<Relationship Id="{id}" Type="{reltype}" Target="{target}"{mode}/>"#)
            })
            .collect();
        phys.insert(
            "word/_rels/document.xml.rels",
            format!(
                r#"{decl}
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#,
                decl = DECLARATION,
                rels = rels
            ),
        );
    }
    for (name, blob) in media {
        phys.insert(&format!("word/media/{}", name), blob.clone());
    }
    phys
}

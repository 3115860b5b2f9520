//! Receipt PDF builder for tests
//!
//! Produces small but well-formed PDFs whose content streams contain
//! exactly the text runs given, in order. Pages start with the Helvetica
//! resource `F1`; further fonts are registered with [`ReceiptPdf::font`].

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};

/// One text-showing operator
#[derive(Debug, Clone)]
pub enum TextRun {
    /// `(text) Tj`
    Shown(String),
    /// `(text) '`
    NextLine(String),
    /// `[(text) adjustment ...] TJ`
    Kerned(Vec<(String, f32)>),
    /// `<hex> Tj` with raw character codes
    Codes(Vec<u8>),
    /// `/name 11 Tf`; shows nothing
    Font(String),
}

/// Extra font resource
#[derive(Debug, Clone)]
pub enum FontSpec {
    /// Type1 font with an optional named base encoding
    Simple { encoding: Option<String> },
    /// Type0 font with `Identity-H` codes and an optional ToUnicode program
    Composite { to_unicode: Option<String> },
}

/// Assigns two-byte glyph ids to characters and writes the matching
/// ToUnicode CMap, the way subsetting PDF writers do
#[derive(Debug, Clone, Default)]
pub struct GlyphMap {
    glyphs: Vec<char>,
}

impl GlyphMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Glyph codes for `text`, allocating ids for unseen characters
    pub fn encode(&mut self, text: &str) -> Vec<u8> {
        let mut codes = Vec::with_capacity(text.len() * 2);
        for ch in text.chars() {
            let index = match self.glyphs.iter().position(|&g| g == ch) {
                Some(index) => index,
                None => {
                    self.glyphs.push(ch);
                    self.glyphs.len() - 1
                }
            };
            // Glyph 0 is .notdef
            let glyph = (index + 1) as u16;
            codes.extend_from_slice(&glyph.to_be_bytes());
        }
        codes
    }

    /// ToUnicode CMap program covering every allocated glyph
    pub fn to_unicode(&self) -> String {
        let mut cmap = String::from(
            "/CIDInit /ProcSet findresource begin\n\
             12 dict begin\n\
             begincmap\n\
             /CMapName /Adobe-Identity-UCS def\n\
             /CMapType 2 def\n\
             1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
        );

        // At most 100 entries per bfchar block
        let entries: Vec<(usize, char)> = self.glyphs.iter().copied().enumerate().collect();
        for block in entries.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", block.len()));
            for (index, ch) in block {
                let mut units = [0u16; 2];
                let dest: String = ch
                    .encode_utf16(&mut units)
                    .iter()
                    .map(|unit| format!("{:04X}", unit))
                    .collect();
                cmap.push_str(&format!("<{:04X}> <{}>\n", index + 1, dest));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
        cmap
    }
}

/// Builder for multi-page receipt PDFs
#[derive(Debug, Clone, Default)]
pub struct ReceiptPdf {
    pages: Vec<Vec<TextRun>>,
    fonts: Vec<(String, FontSpec)>,
}

impl ReceiptPdf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page of `Tj` runs
    pub fn page<I, S>(mut self, runs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.pages
            .push(runs.into_iter().map(|r| TextRun::Shown(r.into())).collect());
        self
    }

    /// Append a page of arbitrary runs
    pub fn runs(mut self, runs: Vec<TextRun>) -> Self {
        self.pages.push(runs);
        self
    }

    /// Register a font resource available on every page
    pub fn font(mut self, name: impl Into<String>, spec: FontSpec) -> Self {
        self.fonts.push((name.into(), spec));
        self
    }

    /// Builder holding a single page with the usual receipt labels
    pub fn receipt(payer: &str, amount: &str, date: &str) -> Self {
        Self::new().page([
            "Commercial Bank of Ethiopia",
            "Payment Receipt",
            "Payer",
            payer,
            "Transferred Amount",
            amount,
            "Payment Date & Time",
            date,
        ])
    }

    /// Serialize to PDF bytes
    pub fn to_bytes(&self) -> lopdf::Result<Vec<u8>> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ]));
        let mut font_resources = Dictionary::from_iter(vec![("F1", Object::Reference(font_id))]);
        for (name, spec) in &self.fonts {
            let id = add_font(&mut doc, spec)?;
            font_resources.set(name.as_bytes().to_vec(), Object::Reference(id));
        }
        let resources_id = doc.add_object(Dictionary::from_iter(vec![(
            "Font",
            Object::Dictionary(font_resources),
        )]));

        let mut page_ids = Vec::with_capacity(self.pages.len());
        for runs in &self.pages {
            let content = Content {
                operations: page_operations(runs),
            };
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(612),
                        Object::Integer(792),
                    ]),
                ),
                ("Resources", Object::Reference(resources_id)),
                ("Contents", Object::Reference(content_id)),
            ]);
            page_ids.push(doc.add_object(page));
        }

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(page_ids.len() as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}

fn add_font(doc: &mut Document, spec: &FontSpec) -> lopdf::Result<lopdf::ObjectId> {
    let font = match spec {
        FontSpec::Simple { encoding } => {
            let mut font = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Font".to_vec())),
                ("Subtype", Object::Name(b"Type1".to_vec())),
                ("BaseFont", Object::Name(b"Times-Roman".to_vec())),
            ]);
            if let Some(encoding) = encoding {
                font.set("Encoding", Object::Name(encoding.as_bytes().to_vec()));
            }
            font
        }
        FontSpec::Composite { to_unicode } => {
            let descendant_id = doc.add_object(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Font".to_vec())),
                ("Subtype", Object::Name(b"CIDFontType2".to_vec())),
                ("BaseFont", Object::Name(b"ABCDEF+ReceiptSans".to_vec())),
                (
                    "CIDSystemInfo",
                    Object::Dictionary(Dictionary::from_iter(vec![
                        ("Registry", Object::string_literal("Adobe")),
                        ("Ordering", Object::string_literal("Identity")),
                        ("Supplement", Object::Integer(0)),
                    ])),
                ),
            ]));

            let mut font = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Font".to_vec())),
                ("Subtype", Object::Name(b"Type0".to_vec())),
                ("BaseFont", Object::Name(b"ABCDEF+ReceiptSans".to_vec())),
                ("Encoding", Object::Name(b"Identity-H".to_vec())),
                (
                    "DescendantFonts",
                    Object::Array(vec![Object::Reference(descendant_id)]),
                ),
            ]);
            if let Some(program) = to_unicode {
                let mut stream = Stream::new(Dictionary::new(), program.as_bytes().to_vec());
                stream.compress()?;
                font.set("ToUnicode", Object::Reference(doc.add_object(stream)));
            }
            font
        }
    };

    Ok(doc.add_object(font))
}

fn page_operations(runs: &[TextRun]) -> Vec<Operation> {
    let literal = |text: &str| Object::String(text.as_bytes().to_vec(), StringFormat::Literal);

    let mut operations = vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(11)]),
        Operation::new("TL", vec![Object::Integer(14)]),
        Operation::new("Td", vec![Object::Integer(72), Object::Integer(720)]),
    ];

    for run in runs {
        let op = match run {
            TextRun::Shown(text) => Operation::new("Tj", vec![literal(text)]),
            TextRun::NextLine(text) => Operation::new("'", vec![literal(text)]),
            TextRun::Kerned(parts) => {
                let mut items = Vec::with_capacity(parts.len() * 2);
                for (text, adjustment) in parts {
                    items.push(literal(text));
                    items.push(Object::Real(*adjustment));
                }
                Operation::new("TJ", vec![Object::Array(items)])
            }
            TextRun::Codes(codes) => Operation::new(
                "Tj",
                vec![Object::String(codes.clone(), StringFormat::Hexadecimal)],
            ),
            TextRun::Font(name) => {
                operations.push(Operation::new(
                    "Tf",
                    vec![Object::Name(name.as_bytes().to_vec()), Object::Integer(11)],
                ));
                continue;
            }
        };
        operations.push(op);
        operations.push(Operation::new("T*", vec![]));
    }

    operations.push(Operation::new("ET", vec![]));
    operations
}

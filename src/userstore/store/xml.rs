use super::{read_document, write_atomic, DocumentStore, RecoveryPolicy, Roster};
use crate::error::{FileRole, Result, StoreError};
use crate::model::{FormatKind, User, UserView};
use encoding_rs::{Encoding, UTF_8};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::fs;
use std::path::Path;

const ROOT_NAME: &str = "usuarios";
const USER_TAG: &str = "usuario";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with its attributes and children in document order. Text
/// between child elements is kept so a save reproduces the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.children.push(XmlNode::Text(text.into()));
        element
    }

    pub fn elements<'a>(
        &'a self,
        name: &'a str,
    ) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.children.iter().filter_map(move |node| match node {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find_map(|node| match node {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut XmlElement> {
        self.children.iter_mut().find_map(|node| match node {
            XmlNode::Element(e) if e.name == name => Some(e),
            _ => None,
        })
    }

    /// Concatenated text directly inside this element.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect()
    }

    fn set_text(&mut self, text: impl Into<String>) {
        self.children.retain(|node| !matches!(node, XmlNode::Text(_)));
        self.children.insert(0, XmlNode::Text(text.into()));
    }

    fn push_text(&mut self, text: &str) {
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }
}

fn child_text(element: &XmlElement, name: &str) -> String {
    element.child(name).map(XmlElement::text).unwrap_or_default()
}

fn id_matches(user: &XmlElement, id: i64) -> bool {
    user.child("id")
        .is_some_and(|e| e.text().trim() == id.to_string().as_str())
}

/// A parsed XML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlElement,
}

impl XmlDocument {
    pub fn new(root: XmlElement) -> Self {
        Self { root }
    }

    /// A document holding only an empty root element.
    pub fn empty(root_name: &str) -> Self {
        Self::new(XmlElement::new(root_name))
    }

    pub fn parse(bytes: &[u8]) -> std::result::Result<Self, String> {
        parse_tree(bytes).map(Self::new)
    }

    pub fn root(&self) -> &XmlElement {
        &self.root
    }

    /// Index among the root's children of the first user with `id`.
    fn user_position(&self, id: i64) -> Option<usize> {
        self.root.children.iter().position(|node| {
            matches!(node, XmlNode::Element(e) if e.name == USER_TAG && id_matches(e, id))
        })
    }

    /// Serializes with a UTF-8 declaration followed by the tree.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(|e| StoreError::Xml(e.to_string()))?;
        writer.get_mut().push(b'\n');
        write_element(&mut writer, &self.root)?;
        Ok(writer.into_inner())
    }
}

impl Roster for XmlDocument {
    fn users(&self) -> Option<Vec<UserView>> {
        Some(
            self.root
                .elements(USER_TAG)
                .map(|u| UserView {
                    id: child_text(u, "id"),
                    nombre: child_text(u, "nombre"),
                    edad: child_text(u, "edad"),
                })
                .collect(),
        )
    }

    fn update_age(&mut self, id: i64, edad: i64) -> bool {
        let Some(position) = self.user_position(id) else {
            return false;
        };
        let XmlNode::Element(user) = &mut self.root.children[position] else {
            return false;
        };
        match user.child_mut("edad") {
            Some(age) => age.set_text(edad.to_string()),
            None => user
                .children
                .push(XmlNode::Element(XmlElement::with_text("edad", edad.to_string()))),
        }
        true
    }

    fn append(&mut self, user: &User) -> bool {
        let mut element = XmlElement::new(USER_TAG);
        element.children = vec![
            XmlNode::Element(XmlElement::with_text("id", user.id.to_string())),
            XmlNode::Element(XmlElement::with_text("nombre", user.nombre.clone())),
            XmlNode::Element(XmlElement::with_text("edad", user.edad.to_string())),
        ];
        self.root.children.push(XmlNode::Element(element));
        true
    }

    fn remove(&mut self, id: i64) -> usize {
        let Some(position) = self.user_position(id) else {
            return 0;
        };
        self.root.children.remove(position);
        // The text following an element goes with it.
        if matches!(self.root.children.get(position), Some(XmlNode::Text(_))) {
            self.root.children.remove(position);
        }
        1
    }
}

fn element_from(start: &BytesStart) -> std::result::Result<XmlElement, String> {
    let name = std::str::from_utf8(start.name().as_ref())
        .map_err(|e| e.to_string())?
        .to_string();
    let mut element = XmlElement::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| e.to_string())?
            .to_string();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        element.attributes.push((key, value.into_owned()));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> std::result::Result<(), String> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
    } else if root.is_some() {
        return Err("junk after document element".to_string());
    } else {
        *root = Some(element);
    }
    Ok(())
}

fn add_text(stack: &mut [XmlElement], text: &str) -> std::result::Result<(), String> {
    match stack.last_mut() {
        Some(parent) => parent.push_text(text),
        None if text.trim().is_empty() => {}
        None => return Err("text outside the document element".to_string()),
    }
    Ok(())
}

/// Encoding named by the XML declaration, if the document starts with one.
fn declared_encoding(bytes: &[u8]) -> std::result::Result<Option<&'static Encoding>, String> {
    let mut reader = Reader::from_reader(bytes);
    let Ok(Event::Decl(decl)) = reader.read_event() else {
        return Ok(None);
    };
    match decl.encoding() {
        Some(Ok(label)) => Encoding::for_label(&label).map(Some).ok_or_else(|| {
            format!("unknown encoding '{}'", String::from_utf8_lossy(&label))
        }),
        Some(Err(e)) => Err(e.to_string()),
        None => Ok(None),
    }
}

/// Decodes the document to text. A byte order mark wins over the
/// declaration; without either the input is UTF-8.
fn decode_input(bytes: &[u8]) -> std::result::Result<Cow<'_, str>, String> {
    let encoding = match Encoding::for_bom(bytes) {
        Some((encoding, _)) => encoding,
        None => declared_encoding(bytes)?.unwrap_or(UTF_8),
    };
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(format!("invalid {} byte sequence", encoding.name()));
    }
    Ok(text)
}

fn parse_tree(bytes: &[u8]) -> std::result::Result<XmlElement, String> {
    let input = decode_input(bytes)?;
    let mut reader = Reader::from_str(&input);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| format!("{} (at byte {})", e, reader.buffer_position()))?;
        match event {
            Event::Start(start) => stack.push(element_from(&start)?),
            Event::Empty(start) => {
                let element = element_from(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(end) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| "closing tag without opening tag".to_string())?;
                if end.name().as_ref() != element.name.as_bytes() {
                    return Err(format!("mismatched closing tag for <{}>", element.name));
                }
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(text) => {
                let text = text.unescape().map_err(|e| e.to_string())?;
                add_text(&mut stack, &text)?;
            }
            Event::CData(data) => {
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                add_text(&mut stack, &text)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes
            // are not kept.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(format!("unclosed element <{}>", open.name));
    }
    root.ok_or_else(|| "no element found".to_string())
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() {
        return writer
            .write_event(Event::Empty(start))
            .map_err(|e| StoreError::Xml(e.to_string()));
    }

    writer
        .write_event(Event::Start(start))
        .map_err(|e| StoreError::Xml(e.to_string()))?;
    for child in &element.children {
        match child {
            XmlNode::Element(e) => write_element(writer, e)?,
            XmlNode::Text(t) => writer
                .write_event(Event::Text(BytesText::new(t)))
                .map_err(|e| StoreError::Xml(e.to_string()))?,
        }
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(|e| StoreError::Xml(e.to_string()))
}

/// XML document store. Initialization copies the origin byte for byte and a
/// failed init or load falls back to an empty `<usuarios/>` document.
#[derive(Debug, Default, Clone, Copy)]
pub struct XmlStore;

impl XmlStore {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentStore for XmlStore {
    type Document = XmlDocument;

    fn kind(&self) -> FormatKind {
        FormatKind::Xml
    }

    fn recovery(&self) -> RecoveryPolicy {
        RecoveryPolicy::FallBackToEmpty
    }

    fn load(&self, path: &Path) -> Result<XmlDocument> {
        let bytes = read_document(path)?;
        let doc = XmlDocument::parse(&bytes).map_err(|reason| {
            StoreError::malformed(path, FileRole::Working, FormatKind::Xml, reason)
        })?;
        tracing::debug!(path = %path.display(), "xml document loaded");
        Ok(doc)
    }

    fn save(&self, path: &Path, doc: &XmlDocument) -> Result<()> {
        let content = doc.to_bytes()?;
        write_atomic(path, &content)
    }

    fn initialize(&self, origin: &Path, destination: &Path) -> Result<()> {
        if !origin.exists() {
            return Err(StoreError::missing(origin, FileRole::Origin));
        }
        let bytes = fs::read(origin).map_err(StoreError::Io)?;
        if let Err(reason) = parse_tree(&bytes) {
            return Err(StoreError::malformed(
                origin,
                FileRole::Origin,
                FormatKind::Xml,
                reason,
            ));
        }
        write_atomic(destination, &bytes)?;
        tracing::info!(
            origin = %origin.display(),
            destination = %destination.display(),
            "xml working file initialized"
        );
        Ok(())
    }

    fn empty_document(&self) -> XmlDocument {
        XmlDocument::empty(ROOT_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ORIGIN: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<usuarios>\n\
    <usuario>\n\
        <id>1</id>\n\
        <nombre>Ana</nombre>\n\
        <edad>30</edad>\n\
    </usuario>\n\
    <usuario>\n\
        <id>2</id>\n\
        <nombre>Luis</nombre>\n\
        <edad>25</edad>\n\
    </usuario>\n\
</usuarios>\n";

    fn doc(text: &str) -> XmlDocument {
        XmlDocument::parse(text.as_bytes()).unwrap()
    }

    fn ids(doc: &XmlDocument) -> Vec<String> {
        doc.users().unwrap().into_iter().map(|u| u.id).collect()
    }

    #[test]
    fn load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = XmlStore.load(&dir.path().join("datos_usuarios.xml"));
        assert!(matches!(result, Err(StoreError::MissingFile { .. })));
    }

    #[test]
    fn load_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("datos_usuarios.xml");
        fs::write(&path, "<usuarios><usuario><id>1</id></usuarios>").unwrap();

        let err = XmlStore.load(&path).unwrap_err();
        assert!(matches!(
            err,
            StoreError::MalformedDocument {
                format: FormatKind::Xml,
                ..
            }
        ));
        assert!(err.to_string().contains("formato XML inválido"));
    }

    #[test]
    fn parse_rejects_ill_formed_documents() {
        for input in [
            "",
            "   \n",
            "<usuarios>",
            "<a></b>",
            "</a>",
            "<a/><b/>",
            "texto<a/>",
        ] {
            assert!(
                XmlDocument::parse(input.as_bytes()).is_err(),
                "accepted: {:?}",
                input
            );
        }
    }

    #[test]
    fn load_lists_users_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("datos_usuarios.xml");
        fs::write(&path, ORIGIN).unwrap();

        let users = XmlStore.load(&path).unwrap().users().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].to_string(), "ID: 1, Nombre: Ana, Edad: 30");
        assert_eq!(users[1].to_string(), "ID: 2, Nombre: Luis, Edad: 25");
    }

    #[test]
    fn missing_child_renders_empty() {
        let document = doc("<usuarios><usuario><id>7</id></usuario></usuarios>");
        assert_eq!(
            document.users().unwrap()[0].to_string(),
            "ID: 7, Nombre: , Edad: "
        );
    }

    #[test]
    fn save_writes_declaration_and_preserves_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.xml");

        XmlStore.save(&path, &doc(ORIGIN)).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<usuarios>"));
        assert!(written.contains("    <usuario>\n        <id>1</id>\n"));
        assert_eq!(XmlStore.load(&path).unwrap(), doc(ORIGIN));
    }

    #[test]
    fn save_escapes_text_and_keeps_attributes() {
        let mut document = doc(r#"<usuarios version="2"><extra a="x &amp; y"/></usuarios>"#);
        document.append(&User::new(3, "Ana & <Luis>", 40));

        let bytes = document.to_bytes().unwrap();
        let reparsed = XmlDocument::parse(&bytes).unwrap();

        assert_eq!(reparsed, document);
        assert_eq!(
            reparsed.root().attributes,
            vec![("version".to_string(), "2".to_string())]
        );
        assert_eq!(reparsed.users().unwrap()[0].nombre, "Ana & <Luis>");
    }

    #[test]
    fn update_changes_only_first_match() {
        let mut document = doc(
            "<usuarios>\
             <usuario><id>1</id><nombre>Ana</nombre><edad>30</edad></usuario>\
             <usuario><id>1</id><nombre>Otra</nombre><edad>50</edad></usuario>\
             </usuarios>",
        );

        assert!(document.update_age(1, 31));

        let users = document.users().unwrap();
        assert_eq!(users[0].edad, "31");
        assert_eq!(users[1].edad, "50");
    }

    #[test]
    fn update_unknown_id_leaves_document_unchanged() {
        let mut document = doc(ORIGIN);
        let before = document.clone();

        assert!(!document.update_age(99, 1));

        assert_eq!(document, before);
    }

    #[test]
    fn update_tolerates_whitespace_around_id() {
        let mut document =
            doc("<usuarios><usuario><id> 1 </id><edad>30</edad></usuario></usuarios>");
        assert!(document.update_age(1, 31));
        assert_eq!(document.users().unwrap()[0].edad, "31");
    }

    #[test]
    fn append_adds_record_at_end() {
        let mut document = doc(ORIGIN);

        assert!(document.append(&User::new(3, "Pedro", 40)));

        let users = document.users().unwrap();
        assert_eq!(users.len(), 3);
        assert_eq!(users[2].to_string(), "ID: 3, Nombre: Pedro, Edad: 40");
    }

    #[test]
    fn remove_takes_only_first_match() {
        let mut document = doc(
            "<usuarios>\
             <usuario><id>2</id><nombre>A</nombre></usuario>\
             <usuario><id>1</id><nombre>B</nombre></usuario>\
             <usuario><id>2</id><nombre>C</nombre></usuario>\
             </usuarios>",
        );

        assert_eq!(document.remove(2), 1);

        assert_eq!(ids(&document), vec!["1", "2"]);
        assert_eq!(document.users().unwrap()[1].nombre, "C");
    }

    #[test]
    fn remove_drops_trailing_text_of_element() {
        let mut document = doc(ORIGIN);

        assert_eq!(document.remove(1), 1);

        assert_eq!(ids(&document), vec!["2"]);
        let text_nodes = document
            .root()
            .children
            .iter()
            .filter(|n| matches!(n, XmlNode::Text(_)))
            .count();
        assert_eq!(text_nodes, 2);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut document = doc(ORIGIN);
        assert_eq!(document.remove(42), 0);
        assert_eq!(document, doc(ORIGIN));
    }

    fn latin1_document() -> Vec<u8> {
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n<usuarios><usuario><id>7</id><nombre>Jos".to_vec();
        bytes.push(0xE9);
        bytes.extend_from_slice(b"</nombre><edad>52</edad></usuario></usuarios>\n");
        bytes
    }

    #[test]
    fn load_decodes_declared_encoding() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("datos_usuarios.xml");
        fs::write(&path, latin1_document()).unwrap();

        let document = XmlStore.load(&path).unwrap();

        let users = document.users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].nombre, "José");
        assert_eq!(users[0].edad, "52");
    }

    #[test]
    fn save_after_latin1_load_writes_utf8() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("datos_usuarios.xml");
        fs::write(&path, latin1_document()).unwrap();

        let document = XmlStore.load(&path).unwrap();
        XmlStore.save(&path, &document).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("<nombre>José</nombre>"));
    }

    #[test]
    fn parse_strips_byte_order_mark() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"<usuarios><usuario><id>1</id></usuario></usuarios>");
        let document = XmlDocument::parse(&bytes).unwrap();
        assert_eq!(ids(&document), vec!["1"]);
    }

    #[test]
    fn parse_rejects_bytes_invalid_for_the_encoding() {
        let bytes = b"<usuarios><nombre>Jos\xE9</nombre></usuarios>";
        assert!(XmlDocument::parse(bytes).is_err());
    }

    #[test]
    fn parse_rejects_unknown_declared_encoding() {
        let input = "<?xml version=\"1.0\" encoding=\"klingon\"?><usuarios/>";
        let err = XmlDocument::parse(input.as_bytes()).unwrap_err();
        assert!(err.contains("klingon"));
    }

    #[test]
    fn initialize_accepts_latin1_origin() {
        let dir = TempDir::new().unwrap();
        let origin = dir.path().join("datos_usuarios_orig.xml");
        let dest = dir.path().join("datos_usuarios.xml");
        fs::write(&origin, latin1_document()).unwrap();

        XmlStore.initialize(&origin, &dest).unwrap();

        assert_eq!(fs::read(&dest).unwrap(), latin1_document());
    }

    #[test]
    fn empty_document_has_no_users() {
        let document = XmlStore.empty_document();
        assert_eq!(document.root().name, "usuarios");
        assert_eq!(document.users(), Some(Vec::new()));
    }

    #[test]
    fn initialize_copies_bytes_exactly() {
        let dir = TempDir::new().unwrap();
        let origin = dir.path().join("datos_usuarios_orig.xml");
        let dest = dir.path().join("datos_usuarios.xml");
        let content = "<?xml version='1.0'?>\n<!-- plantilla -->\n<usuarios>\n\t<usuario><id>1</id></usuario>\n</usuarios>";
        fs::write(&origin, content).unwrap();

        XmlStore.initialize(&origin, &dest).unwrap();

        assert_eq!(fs::read_to_string(&dest).unwrap(), content);
    }

    #[test]
    fn initialize_requires_origin() {
        let dir = TempDir::new().unwrap();
        let err = XmlStore
            .initialize(
                &dir.path().join("datos_usuarios_orig.xml"),
                &dir.path().join("datos_usuarios.xml"),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::MissingFile {
                role: FileRole::Origin,
                ..
            }
        ));
    }

    #[test]
    fn initialize_rejects_malformed_origin_and_keeps_destination() {
        let dir = TempDir::new().unwrap();
        let origin = dir.path().join("datos_usuarios_orig.xml");
        let dest = dir.path().join("datos_usuarios.xml");
        fs::write(&origin, "<usuarios>").unwrap();
        fs::write(&dest, ORIGIN).unwrap();

        let err = XmlStore.initialize(&origin, &dest).unwrap_err();

        assert!(matches!(
            err,
            StoreError::MalformedDocument {
                role: FileRole::Origin,
                format: FormatKind::Xml,
                ..
            }
        ));
        assert_eq!(fs::read_to_string(&dest).unwrap(), ORIGIN);
    }
}

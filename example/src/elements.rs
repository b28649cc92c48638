//! A small typed message-element set built on the registry.

use satori_xhtml::{
    Bind, BindError, Element, Map, Record, Registry, RegistryError, TypedElement, bind_attrs,
};

#[derive(Bind, Record, Debug, Default, Clone, PartialEq)]
pub struct Text {
    #[attr(omitempty)]
    pub text: String,
}

#[derive(Bind, Record, Debug, Default, Clone, PartialEq)]
pub struct At {
    #[attr(omitempty)]
    pub id: Option<String>,
    #[attr(omitempty)]
    pub name: Option<String>,
    #[attr(omitempty)]
    pub role: Option<String>,
    #[attr(omitempty)]
    pub r#type: Option<String>,
}

#[derive(Bind, Record, Debug, Default, Clone, PartialEq)]
pub struct Sharp {
    pub id: String,
    #[attr(omitempty)]
    pub name: Option<String>,
}

#[derive(Bind, Record, Debug, Default, Clone, PartialEq)]
pub struct Link {
    pub href: String,
}

/// Shared by `img`, `audio`, `video` and `file`.
#[derive(Bind, Record, Debug, Default, Clone, PartialEq)]
pub struct Resource {
    pub src: String,
    #[attr(omitempty)]
    pub title: Option<String>,
    #[attr(omitempty)]
    pub cache: Option<bool>,
    #[attr(omitempty)]
    pub width: Option<u32>,
    #[attr(omitempty)]
    pub height: Option<u32>,
}

#[derive(Bind, Record, Debug, Default, Clone, PartialEq)]
pub struct Message {
    #[attr(omitempty)]
    pub id: Option<String>,
    #[attr(omitempty)]
    pub forward: Option<bool>,
}

#[derive(Bind, Record, Debug, Default, Clone, PartialEq)]
pub struct Author {
    #[attr(omitempty)]
    pub id: Option<String>,
    #[attr(omitempty)]
    pub name: Option<String>,
    #[attr(omitempty)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    Text(Text),
    At(At),
    Sharp(Sharp),
    Link(Link),
    Resource(&'static str, Resource),
    Styled(&'static str),
    Break,
    Paragraph,
    Message(Message),
    Quote,
    Author(Author),
    /// Any tag without a dedicated type
    Extension(String, Map),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MessageElement {
    pub kind: Kind,
    pub children: Vec<MessageElement>,
}

impl MessageElement {
    pub fn new(kind: Kind) -> Self {
        MessageElement {
            kind,
            children: Vec::new(),
        }
    }

    pub fn attrs(&self) -> Map {
        match &self.kind {
            Kind::Text(text) => text.to_map(),
            Kind::At(at) => at.to_map(),
            Kind::Sharp(sharp) => sharp.to_map(),
            Kind::Link(link) => link.to_map(),
            Kind::Resource(_, resource) => resource.to_map(),
            Kind::Message(message) => message.to_map(),
            Kind::Author(author) => author.to_map(),
            Kind::Extension(_, attrs) => attrs.clone(),
            Kind::Styled(_) | Kind::Break | Kind::Paragraph | Kind::Quote => Map::new(),
        }
    }

    pub fn to_element(&self) -> Element {
        Element::new(
            self.tag(),
            self.attrs(),
            self.children.iter().map(MessageElement::to_element).collect(),
        )
    }
}

impl TypedElement for MessageElement {
    fn tag(&self) -> &str {
        match &self.kind {
            Kind::Text(_) => "text",
            Kind::At(_) => "at",
            Kind::Sharp(_) => "sharp",
            Kind::Link(_) => "a",
            Kind::Resource(tag, _) | Kind::Styled(tag) => *tag,
            Kind::Break => "br",
            Kind::Paragraph => "p",
            Kind::Message(_) => "message",
            Kind::Quote => "quote",
            Kind::Author(_) => "author",
            Kind::Extension(tag, _) => tag.as_str(),
        }
    }

    fn push_child(&mut self, child: Self) {
        self.children.push(child);
    }

    fn to_markup(&self, strip: bool) -> String {
        self.to_element().to_markup(strip)
    }
}

fn extension(tag: &str, attrs: &Map) -> Result<MessageElement, BindError> {
    Ok(MessageElement::new(Kind::Extension(tag.to_string(), attrs.clone())))
}

macro_rules! register_unit {
    ($registry:ident, $($tag:literal => $kind:expr),* $(,)?) => {$(
        $registry.register($tag, |_| Ok(MessageElement::new($kind)))?;
    )*};
}

macro_rules! register_resources {
    ($registry:ident, $($tag:literal),* $(,)?) => {$(
        $registry.register($tag, |attrs| Ok(MessageElement::new(Kind::Resource($tag, bind_attrs(attrs)?))))?;
    )*};
}

/// Registry for the standard message elements. Unknown tags become
/// [`Kind::Extension`] nodes.
pub fn registry() -> Result<Registry<MessageElement>, RegistryError> {
    let mut registry = Registry::new().with_fallback(extension);

    registry.register("text", |attrs| Ok(MessageElement::new(Kind::Text(bind_attrs(attrs)?))))?;
    registry.register("at", |attrs| Ok(MessageElement::new(Kind::At(bind_attrs(attrs)?))))?;
    registry.register("sharp", |attrs| Ok(MessageElement::new(Kind::Sharp(bind_attrs(attrs)?))))?;
    registry.register("a", |attrs| Ok(MessageElement::new(Kind::Link(bind_attrs(attrs)?))))?;
    registry.register("message", |attrs| Ok(MessageElement::new(Kind::Message(bind_attrs(attrs)?))))?;
    registry.register("author", |attrs| Ok(MessageElement::new(Kind::Author(bind_attrs(attrs)?))))?;
    register_resources!(registry, "img", "audio", "video", "file");
    register_unit!(registry,
        "b" => Kind::Styled("b"),
        "i" => Kind::Styled("i"),
        "u" => Kind::Styled("u"),
        "s" => Kind::Styled("s"),
        "spl" => Kind::Styled("spl"),
        "code" => Kind::Styled("code"),
        "sup" => Kind::Styled("sup"),
        "sub" => Kind::Styled("sub"),
        "br" => Kind::Break,
        "p" => Kind::Paragraph,
        "quote" => Kind::Quote,
    );

    for (alias, tag) in [
        ("strong", "b"),
        ("em", "i"),
        ("ins", "u"),
        ("del", "s"),
        ("image", "img"),
    ] {
        registry.register_alias(alias, tag)?;
    }
    Ok(registry)
}

//! WXR document assembly and XML rendering.
//!
//! [`build`] turns a [`Mapping`] into a [`Document`]: channel metadata,
//! the provenance category, tags, and one flat list of items. [`render`]
//! serializes that document as WordPress eXtended RSS 1.2:
//!
//! ```text
//! <rss version="2.0" xmlns:excerpt=… xmlns:content=… xmlns:wfw=… xmlns:dc=… xmlns:wp=…>
//!   <channel>
//!     title, link, description, language, wp:wxr_version, wp:base_*_url
//!     wp:author?          (when channel.author_login is set)
//!     wp:category         (From Flickr)
//!     wp:tag*             (one per referenced album)
//!     generator
//!     item*               (post, then its attachment, in input order)
//!   </channel>
//! </rss>
//! ```
//!
//! ## Items
//!
//! Posts and attachments are two variants of one [`Item`]: a shared
//! [`ItemBase`] (ID, status, title, slug, dates) plus an [`ItemKind`] with
//! the variant-specific fields. Both go through the same writer with a
//! `match` on the kind, so the common elements are written in one place.
//!
//! Text that WordPress itself exports as CDATA (titles, content, term names,
//! meta) is written as CDATA here too. A literal `]]>` inside is split
//! across two sections.

use crate::config::ExportConfig;
use crate::dates::NormalizedDate;
use crate::mapping::{Category, Mapping, Tag};
use quick_xml::Writer;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;

pub const WXR_VERSION: &str = "1.2";

/// Namespace declarations on the `rss` root.
pub const NAMESPACES: &[(&str, &str)] = &[
    ("xmlns:excerpt", "http://wordpress.org/export/1.2/excerpt/"),
    ("xmlns:content", "http://purl.org/rss/1.0/modules/content/"),
    ("xmlns:wfw", "http://wellformedweb.org/CommentAPI/"),
    ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
    ("xmlns:wp", "http://wordpress.org/export/1.2/"),
];

#[derive(Error, Debug)]
pub enum WxrError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("rendered document is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

// ============================================================================
// Document model
// ============================================================================

#[derive(Debug, Clone)]
pub struct Author {
    pub login: String,
    pub display_name: String,
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub title: String,
    pub link: String,
    pub description: String,
    pub language: String,
    pub base_site_url: String,
    pub base_blog_url: String,
    pub generator: String,
    pub author: Option<Author>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostType {
    Post,
    Attachment,
}

impl PostType {
    pub fn as_str(self) -> &'static str {
        match self {
            PostType::Post => "post",
            PostType::Attachment => "attachment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Private,
    Inherit,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Private => "private",
            Status::Inherit => "inherit",
        }
    }
}

/// A term reference on a post: `<category domain=… nicename=…>`.
#[derive(Debug, Clone, PartialEq)]
pub struct TermRef {
    pub domain: &'static str,
    pub name: String,
    pub slug: String,
}

impl From<&Tag> for TermRef {
    fn from(tag: &Tag) -> Self {
        Self {
            domain: "post_tag",
            name: tag.name.clone(),
            slug: tag.slug.clone(),
        }
    }
}

impl From<&Category> for TermRef {
    fn from(category: &Category) -> Self {
        Self {
            domain: "category",
            name: category.name.clone(),
            slug: category.slug.clone(),
        }
    }
}

/// Fields every item has.
#[derive(Debug, Clone)]
pub struct ItemBase {
    pub id: u64,
    pub status: Status,
    pub title: String,
    pub slug: String,
    pub link: String,
    pub guid: String,
    pub dates: NormalizedDate,
}

#[derive(Debug, Clone)]
pub enum ItemKind {
    Post {
        content: String,
        terms: Vec<TermRef>,
        meta: Vec<(String, String)>,
    },
    Attachment {
        parent: u64,
        url: String,
        /// EXIF text; no `description` element is written when empty.
        description: String,
    },
}

#[derive(Debug, Clone)]
pub struct Item {
    pub base: ItemBase,
    pub kind: ItemKind,
}

impl Item {
    pub fn post_type(&self) -> PostType {
        match self.kind {
            ItemKind::Post { .. } => PostType::Post,
            ItemKind::Attachment { .. } => PostType::Attachment,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub channel: Channel,
    pub category: Category,
    pub tags: Vec<Tag>,
    pub items: Vec<Item>,
    /// `wp:comment_status` and `wp:ping_status` for every item.
    pub comment_status: String,
}

impl Document {
    pub fn posts(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|i| i.post_type() == PostType::Post)
    }

    pub fn attachments(&self) -> impl Iterator<Item = &Item> {
        self.items
            .iter()
            .filter(|i| i.post_type() == PostType::Attachment)
    }
}

// ============================================================================
// Build
// ============================================================================

/// Generator string written to the channel.
pub fn generator() -> String {
    format!("flickr-wxr/{}", env!("CARGO_PKG_VERSION"))
}

/// Assemble the WXR document for a mapped export.
pub fn build(mapping: &Mapping, config: &ExportConfig) -> Document {
    let channel_config = &config.channel;
    let blog_url = channel_config.blog_url().trim_end_matches('/');

    let author = Some(channel_config.author_login.trim())
        .filter(|login| !login.is_empty())
        .map(|login| Author {
            login: login.to_string(),
            display_name: match channel_config.author_display_name.trim() {
                "" => login.to_string(),
                name => name.to_string(),
            },
        });

    let channel = Channel {
        title: channel_config.title.clone(),
        link: channel_config.link.clone(),
        description: channel_config.description.clone(),
        language: channel_config.language.clone(),
        base_site_url: channel_config.site_url().to_string(),
        base_blog_url: channel_config.blog_url().to_string(),
        generator: generator(),
        author,
    };

    let mut items = Vec::with_capacity(mapping.posts.len() + mapping.attachments.len());
    for post in &mapping.posts {
        let attachment = mapping.attachment_for(post);

        let mut terms: Vec<TermRef> = post
            .tags
            .iter()
            .map(|&t| TermRef::from(&mapping.tags[t]))
            .collect();
        terms.push(TermRef::from(&mapping.category));

        let mut meta = vec![
            ("flickr_photo_id".to_string(), post.photo_id.clone()),
            ("flickr_photopage".to_string(), post.photopage.clone()),
        ];
        if let Some(a) = attachment {
            meta.push(("_thumbnail_id".to_string(), a.id.to_string()));
        }

        let link = format!("{blog_url}/?p={}", post.id);
        items.push(Item {
            base: ItemBase {
                id: post.id,
                status: Status::Private,
                title: post.title.clone(),
                slug: post.slug.clone(),
                guid: link.clone(),
                link,
                dates: post.dates.clone(),
            },
            kind: ItemKind::Post {
                content: post.content.clone(),
                terms,
                meta,
            },
        });

        if let Some(a) = attachment {
            items.push(Item {
                base: ItemBase {
                    id: a.id,
                    status: Status::Inherit,
                    title: a.title.clone(),
                    slug: a.slug.clone(),
                    link: format!("{blog_url}/?attachment_id={}", a.id),
                    guid: a.url.clone(),
                    dates: a.dates.clone(),
                },
                kind: ItemKind::Attachment {
                    parent: post.id,
                    url: a.url.clone(),
                    description: a.description.clone(),
                },
            });
        }
    }

    Document {
        channel,
        category: mapping.category.clone(),
        tags: mapping.tags.clone(),
        items,
        comment_status: config.posts.comment_status.clone(),
    }
}

// ============================================================================
// Render
// ============================================================================

type XmlWriter = Writer<Vec<u8>>;

fn start(w: &mut XmlWriter, name: &str) -> Result<(), WxrError> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    Ok(())
}

fn end(w: &mut XmlWriter, name: &str) -> Result<(), WxrError> {
    w.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// `<name>text</name>`, escaped. Always writes a text node so empty
/// elements stay on one line with no whitespace content.
fn text_element(w: &mut XmlWriter, name: &str, text: &str) -> Result<(), WxrError> {
    start(w, name)?;
    w.write_event(Event::Text(BytesText::new(text)))?;
    end(w, name)
}

/// Write `text` as one or more CDATA sections.
fn cdata(w: &mut XmlWriter, text: &str) -> Result<(), WxrError> {
    let mut rest = text;
    while let Some(pos) = rest.find("]]>") {
        w.write_event(Event::CData(BytesCData::new(&rest[..pos + 2])))?;
        rest = &rest[pos + 2..];
    }
    w.write_event(Event::CData(BytesCData::new(rest)))?;
    Ok(())
}

fn cdata_element(w: &mut XmlWriter, name: &str, text: &str) -> Result<(), WxrError> {
    start(w, name)?;
    cdata(w, text)?;
    end(w, name)
}

fn write_author(w: &mut XmlWriter, author: &Author) -> Result<(), WxrError> {
    start(w, "wp:author")?;
    text_element(w, "wp:author_id", "1")?;
    cdata_element(w, "wp:author_login", &author.login)?;
    cdata_element(w, "wp:author_email", "")?;
    cdata_element(w, "wp:author_display_name", &author.display_name)?;
    cdata_element(w, "wp:author_first_name", "")?;
    cdata_element(w, "wp:author_last_name", "")?;
    end(w, "wp:author")
}

fn write_category(w: &mut XmlWriter, category: &Category) -> Result<(), WxrError> {
    start(w, "wp:category")?;
    text_element(w, "wp:term_id", &category.term_id.to_string())?;
    cdata_element(w, "wp:category_nicename", &category.slug)?;
    cdata_element(w, "wp:category_parent", "")?;
    cdata_element(w, "wp:cat_name", &category.name)?;
    end(w, "wp:category")
}

fn write_tag(w: &mut XmlWriter, tag: &Tag) -> Result<(), WxrError> {
    start(w, "wp:tag")?;
    text_element(w, "wp:term_id", &tag.term_id.to_string())?;
    cdata_element(w, "wp:tag_slug", &tag.slug)?;
    cdata_element(w, "wp:tag_name", &tag.name)?;
    end(w, "wp:tag")
}

fn write_term_ref(w: &mut XmlWriter, term: &TermRef) -> Result<(), WxrError> {
    let mut el = BytesStart::new("category");
    el.push_attribute(("domain", term.domain));
    el.push_attribute(("nicename", term.slug.as_str()));
    w.write_event(Event::Start(el))?;
    cdata(w, &term.name)?;
    end(w, "category")
}

fn write_meta(w: &mut XmlWriter, key: &str, value: &str) -> Result<(), WxrError> {
    start(w, "wp:postmeta")?;
    cdata_element(w, "wp:meta_key", key)?;
    cdata_element(w, "wp:meta_value", value)?;
    end(w, "wp:postmeta")
}

fn write_item(
    w: &mut XmlWriter,
    item: &Item,
    channel: &Channel,
    comment_status: &str,
) -> Result<(), WxrError> {
    let base = &item.base;
    let creator = channel.author.as_ref().map(|a| a.login.as_str()).unwrap_or("");

    start(w, "item")?;
    text_element(w, "title", &base.title)?;
    text_element(w, "link", &base.link)?;
    text_element(w, "pubDate", &base.dates.rfc2822)?;
    cdata_element(w, "dc:creator", creator)?;

    let mut guid = BytesStart::new("guid");
    guid.push_attribute(("isPermaLink", "false"));
    w.write_event(Event::Start(guid))?;
    w.write_event(Event::Text(BytesText::new(&base.guid)))?;
    end(w, "guid")?;

    match &item.kind {
        ItemKind::Post { content, .. } => {
            text_element(w, "description", "")?;
            cdata_element(w, "content:encoded", content)?;
        }
        ItemKind::Attachment { description, .. } => {
            if !description.is_empty() {
                text_element(w, "description", description)?;
            }
            cdata_element(w, "content:encoded", "")?;
        }
    }
    cdata_element(w, "excerpt:encoded", "")?;

    text_element(w, "wp:post_id", &base.id.to_string())?;
    cdata_element(w, "wp:post_date", &base.dates.local)?;
    cdata_element(w, "wp:post_date_gmt", &base.dates.gmt)?;
    cdata_element(w, "wp:comment_status", comment_status)?;
    cdata_element(w, "wp:ping_status", comment_status)?;
    cdata_element(w, "wp:post_name", &base.slug)?;
    cdata_element(w, "wp:status", base.status.as_str())?;

    let parent = match &item.kind {
        ItemKind::Post { .. } => 0,
        ItemKind::Attachment { parent, .. } => *parent,
    };
    text_element(w, "wp:post_parent", &parent.to_string())?;
    text_element(w, "wp:menu_order", "0")?;
    cdata_element(w, "wp:post_type", item.post_type().as_str())?;
    cdata_element(w, "wp:post_password", "")?;
    text_element(w, "wp:is_sticky", "0")?;

    match &item.kind {
        ItemKind::Post { terms, meta, .. } => {
            for term in terms {
                write_term_ref(w, term)?;
            }
            for (key, value) in meta {
                write_meta(w, key, value)?;
            }
        }
        ItemKind::Attachment { url, .. } => {
            cdata_element(w, "wp:attachment_url", url)?;
        }
    }

    end(w, "item")
}

/// Serialize a document as WXR XML.
pub fn render(doc: &Document) -> Result<String, WxrError> {
    let mut w = Writer::new_with_indent(Vec::new(), b'\t', 1);

    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    w.write_event(Event::Comment(BytesText::from_escaped(
        " WordPress eXtended RSS generated from a Flickr export. Import it with Tools > Import > WordPress. ",
    )))?;

    let mut rss = BytesStart::new("rss");
    rss.push_attribute(("version", "2.0"));
    for &(name, uri) in NAMESPACES {
        rss.push_attribute((name, uri));
    }
    w.write_event(Event::Start(rss))?;
    start(&mut w, "channel")?;

    let channel = &doc.channel;
    text_element(&mut w, "title", &channel.title)?;
    text_element(&mut w, "link", &channel.link)?;
    text_element(&mut w, "description", &channel.description)?;
    text_element(&mut w, "language", &channel.language)?;
    text_element(&mut w, "wp:wxr_version", WXR_VERSION)?;
    text_element(&mut w, "wp:base_site_url", &channel.base_site_url)?;
    text_element(&mut w, "wp:base_blog_url", &channel.base_blog_url)?;

    if let Some(author) = &channel.author {
        write_author(&mut w, author)?;
    }
    write_category(&mut w, &doc.category)?;
    for tag in &doc.tags {
        write_tag(&mut w, tag)?;
    }
    text_element(&mut w, "generator", &channel.generator)?;

    for item in &doc.items {
        write_item(&mut w, item, channel, &doc.comment_status)?;
    }

    end(&mut w, "channel")?;
    end(&mut w, "rss")?;

    let mut bytes = w.into_inner();
    bytes.push(b'\n');
    Ok(String::from_utf8(bytes)?)
}

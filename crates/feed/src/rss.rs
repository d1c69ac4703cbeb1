// ABOUTME: RSS 2.0 serialization of a generated Feed using quick-xml's event writer.
// ABOUTME: Fixed-shape output: channel metadata followed by one <item> per FeedItem.

use std::io;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;

use crate::error::FeedError;
use crate::models::{Feed, FeedItem};

type XmlWriter = Writer<Vec<u8>>;

fn text_element(w: &mut XmlWriter, name: &str, value: &str) -> io::Result<()> {
    w.write_event(Event::Start(BytesStart::new(name)))?;
    w.write_event(Event::Text(BytesText::new(value)))?;
    w.write_event(Event::End(BytesEnd::new(name)))
}

fn write_item(w: &mut XmlWriter, item: &FeedItem) -> io::Result<()> {
    w.write_event(Event::Start(BytesStart::new("item")))?;
    text_element(w, "title", &item.title)?;
    text_element(w, "link", &item.link)?;
    text_element(w, "description", &item.description)?;

    let guid = BytesStart::new("guid").with_attributes([("isPermaLink", "false")]);
    w.write_event(Event::Start(guid))?;
    w.write_event(Event::Text(BytesText::new(&item.guid)))?;
    w.write_event(Event::End(BytesEnd::new("guid")))?;

    if let Some(date) = &item.pub_date {
        text_element(w, "pubDate", date)?;
    }
    if let Some(author) = &item.author {
        text_element(w, "author", author)?;
    }
    w.write_event(Event::End(BytesEnd::new("item")))
}

fn write_feed(w: &mut XmlWriter, feed: &Feed) -> io::Result<()> {
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    let rss = BytesStart::new("rss").with_attributes([("version", "2.0")]);
    w.write_event(Event::Start(rss))?;
    w.write_event(Event::Start(BytesStart::new("channel")))?;
    text_element(w, "title", &feed.title)?;
    text_element(w, "link", &feed.link)?;
    text_element(w, "description", &feed.description)?;
    for item in &feed.items {
        write_item(w, item)?;
    }
    w.write_event(Event::End(BytesEnd::new("channel")))?;
    w.write_event(Event::End(BytesEnd::new("rss")))
}

impl Feed {
    /// Serializes the feed as an indented RSS 2.0 document.
    pub fn to_rss(&self) -> Result<String, FeedError> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        write_feed(&mut writer, self).map_err(|e| FeedError::render(e.to_string()))?;
        String::from_utf8(writer.into_inner()).map_err(|e| FeedError::render(e.to_string()))
    }
}

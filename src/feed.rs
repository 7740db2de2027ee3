//! Support for creating Atom feeds from a list of articles.

use atom_syndication::{Entry, Feed, FixedDateTime, Link, Person, Text};
use chrono::{NaiveTime, Utc};

use crate::article::Article;
use crate::config::Author;

/// Bundled configuration for creating a feed.
pub struct FeedConfig<'a> {
    pub title: &'a str,
    pub subtitle: &'a str,
    pub id: &'a str,
    pub author: Option<&'a Author>,
    pub home_page: &'a str,
}

/// Creates an Atom feed document from some configuration ([`FeedConfig`])
/// and a list of [`Article`]s (most recent first).
pub fn atom(config: &FeedConfig, articles: &[Article]) -> String {
    feed(config, articles).to_string()
}

fn feed(config: &FeedConfig, articles: &[Article]) -> Feed {
    let now: FixedDateTime = Utc::now().fixed_offset();
    let entries: Vec<Entry> = articles.iter().map(|a| entry(config, a, now)).collect();
    let updated = entries.iter().map(|e| e.updated).max().unwrap_or(now);

    Feed {
        title: Text::from(config.title),
        subtitle: (!config.subtitle.is_empty()).then(|| Text::from(config.subtitle)),
        id: config.id.to_owned(),
        updated,
        authors: author_to_people(config.author),
        links: vec![alternate(config.home_page)],
        entries,
        ..Default::default()
    }
}

fn entry(config: &FeedConfig, article: &Article, fallback: FixedDateTime) -> Entry {
    // Articles carry a date without a time; publish them at midnight UTC.
    let date = article
        .date()
        .map(|d| d.and_time(NaiveTime::MIN).and_utc().fixed_offset())
        .unwrap_or(fallback);

    Entry {
        id: article.url.to_string(),
        title: Text::from(article.title()),
        updated: date,
        published: Some(date),
        authors: author_to_people(config.author),
        links: vec![alternate(article.url.as_str())],
        summary: Some(Text::html(article.summary.clone())),
        ..Default::default()
    }
}

fn alternate(href: &str) -> Link {
    Link {
        href: href.to_owned(),
        rel: "alternate".to_owned(),
        ..Default::default()
    }
}

fn author_to_people(author: Option<&Author>) -> Vec<Person> {
    match author {
        Some(author) => vec![Person {
            name: author.name.clone(),
            email: author.email.clone(),
            ..Default::default()
        }],
        None => Vec::new(),
    }
}

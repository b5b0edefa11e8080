//! Row fixtures shared by the integration tests.
#![allow(dead_code)]

use keyweave::prelude::*;
use std::rc::Rc;

///
/// Author
///

#[derive(Clone, Debug, PartialEq)]
pub struct Author {
    pub id: u64,
    pub handle: String,
    pub retired: bool,
}

impl Author {
    pub fn new(id: u64, handle: &str) -> Self {
        Self {
            id,
            handle: handle.to_string(),
            retired: false,
        }
    }

    pub fn with_handle(&self, handle: &str) -> Self {
        Self {
            handle: handle.to_string(),
            ..self.clone()
        }
    }
}

impl Row for Author {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }
}

///
/// Post
///
/// Keeps its prior snapshot so updates can be read through `Versioned`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    pub id: u64,
    pub author: Option<String>,
    pub prior: Option<Box<Self>>,
}

impl Post {
    pub fn new(id: u64, author: Option<&str>) -> Self {
        Self {
            id,
            author: author.map(str::to_string),
            prior: None,
        }
    }

    pub fn moved_to(&self, author: Option<&str>) -> Self {
        Self {
            id: self.id,
            author: author.map(str::to_string),
            prior: Some(Box::new(self.clone())),
        }
    }
}

impl Row for Post {
    type Id = u64;

    fn id(&self) -> u64 {
        self.id
    }
}

impl Versioned for Post {
    fn get_version(&self, version: RecordVersion) -> &Self {
        match version {
            RecordVersion::Current => self,
            RecordVersion::Previous => self.prior.as_deref().unwrap_or(self),
            RecordVersion::Original => {
                let mut oldest = self;
                while let Some(prior) = oldest.prior.as_deref() {
                    oldest = prior;
                }
                oldest
            }
        }
    }
}

/// Unique index over the handles of authors who are not retired.
pub fn author_handles() -> Rc<UniqueIndex<String, Author>> {
    UniqueIndex::builder("author.handle")
        .has_index(|row: &Author| row.handle.clone())
        .has_filter(|row: &Author| !row.retired)
        .build()
        .expect("author index config")
}

/// Foreign index from posts to author handles; anonymous posts are skipped.
pub fn post_authors(
    authors: &Rc<UniqueIndex<String, Author>>,
) -> Rc<ForeignIndex<String, Post, Author>> {
    ForeignIndex::builder("post.author", authors)
        .has_index(|row: &Post| row.author.clone().unwrap_or_default())
        .has_filter(|row: &Post| row.author.is_some())
        .build()
        .expect("post index config")
}

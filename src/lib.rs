#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use docmap_mapper as mapper;
pub use docmap_mapper::{Document, bson};

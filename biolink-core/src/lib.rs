#![doc = "biolink-core: core logic library for biolink."]

//! This crate holds the data model and both build-time flows of the link-in-bio page:
//! asset localization (download, favicons, marker) and contact card generation.
//! The `biolink` CLI crate is thin glue over it.
//!
//! # Usage
//! Build a [`config::SiteConfig`] once, then hand it to [`pipeline::localize`] or turn it into a
//! [`vcard::ContactCardInput`] for [`vcard::generate_contact_card`].

pub mod assets;
pub mod bio;
pub mod config;
pub mod contract;
pub mod download;
pub mod envfile;
pub mod favicon;
pub mod marker;
pub mod page;
pub mod pipeline;
pub mod vcard;

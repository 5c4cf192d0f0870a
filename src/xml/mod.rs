// SPDX-License-Identifier: MIT
// Copyright 2025. Triad National Security, LLC.

//! Parsers for the two XML documents produced by drbdadm: the static configuration (`drbdadm
//! dump-xml`) and the runtime status (`drbdadm status`).

pub mod config;
pub mod status;

pub use config::parse_config;
pub use status::parse_status;

/// Iterate over the child elements of `node` with the given tag name.
fn child_elements<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    tag: &'a str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |child| child.is_element() && child.has_tag_name(tag))
}

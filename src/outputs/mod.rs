//! Output generation.
//!
//! The harvest ends in a single delimited file:
//!
//! ```text
//! Headline,URL,Date
//! Man dies in accident,http://tech.mit.edu/V109/N1/a.html,"Jan 1, 1990"
//! ```
//!
//! - [`tabular`]: CSV writer for filtered or discovery-only runs

pub mod tabular;

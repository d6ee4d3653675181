/// Attribute codec kinds, prediction flags and the geometric transforms both sides apply.
pub mod attribute;

/// The CLERS alphabet and the traversal front shared by the connectivity coders.
pub mod connectivity;

/// The entropy mode and the Tunstall dictionary construction.
pub mod entropy;

/// The container header layout.
pub mod header;

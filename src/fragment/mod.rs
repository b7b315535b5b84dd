//! Fragment introspection.
//!
//! A fragment is an immutable, timestamped unit of committed writes. The
//! [`FragmentCatalog`] is a read-only snapshot of the fragments present at
//! construction time, built once from an [`crate::engine::FragmentSource`]
//! and never mutated, so concurrent readers need no locking. Fragments
//! committed later are only visible to a newly opened catalog.
//!
//! Fragment directories are named `__<start>_<end>_<id>_<version>`: the
//! write-start timestamp, write-end timestamp, and format version sit in the
//! 3rd, 4th, and last underscore-delimited tokens. [`parse_fragment_name`]
//! recovers them, and the catalog's [`timestamp_range`](FragmentCatalog::timestamp_range)
//! and [`format_version`](FragmentCatalog::format_version) accessors agree
//! with that encoding.

use tracing::debug;

use crate::array::ArrayKind;
use crate::engine::FragmentSource;
use crate::error::{CatalogError, Result};

/// Bounding range of actually-written coordinates along one dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonEmptyDomain {
    /// Inclusive bounds in the dimension's integer domain
    Fixed(i64, i64),
    /// Raw byte bounds for a variable-length (string) dimension
    Var(Vec<u8>, Vec<u8>),
}

/// One committed fragment's metadata. Immutable once committed.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub uri: String,
    pub size_bytes: u64,
    pub kind: ArrayKind,
    /// Inclusive (write-start, write-end) commit timestamps
    pub timestamp_range: (u64, u64),
    /// Per-dimension non-empty domain, in domain order
    pub non_empty: Vec<NonEmptyDomain>,
    pub cell_count: u64,
    pub format_version: u32,
    pub has_consolidated_metadata: bool,
}

/// Timestamps and format version recovered from a fragment directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentNameFields {
    pub timestamp_start: u64,
    pub timestamp_end: u64,
    pub format_version: u32,
}

/// Decode the `__<start>_<end>_<id>_<version>` fragment name encoding.
///
/// Accepts either a bare directory name or a URI; only the last path segment
/// is examined.
pub fn parse_fragment_name(name: &str) -> std::result::Result<FragmentNameFields, CatalogError> {
    let dir = name.trim_end_matches('/').rsplit('/').next().unwrap_or(name);
    let malformed = || CatalogError::BadFragmentName {
        name: dir.to_string(),
    };

    let tokens: Vec<&str> = dir.split('_').collect();
    // Leading "__" yields two empty tokens, so the start timestamp is the
    // 3rd token and at least one id token sits before the version.
    if tokens.len() < 6 || !tokens[0].is_empty() || !tokens[1].is_empty() {
        return Err(malformed());
    }
    let timestamp_start = tokens[2].parse().map_err(|_| malformed())?;
    let timestamp_end = tokens[3].parse().map_err(|_| malformed())?;
    let format_version = tokens[tokens.len() - 1].parse().map_err(|_| malformed())?;
    Ok(FragmentNameFields {
        timestamp_start,
        timestamp_end,
        format_version,
    })
}

/// Reference to a dimension by index or by name.
#[derive(Debug, Clone, Copy)]
pub enum DimensionKey<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for DimensionKey<'_> {
    fn from(index: usize) -> Self {
        DimensionKey::Index(index)
    }
}

impl<'a> From<&'a str> for DimensionKey<'a> {
    fn from(name: &'a str) -> Self {
        DimensionKey::Name(name)
    }
}

/// Read-only snapshot over the committed fragments of one array.
#[derive(Debug)]
pub struct FragmentCatalog {
    array_uri: String,
    dim_names: Vec<String>,
    fragments: Vec<Fragment>,
}

impl FragmentCatalog {
    /// Enumerate all fragments committed at call time, in commit order.
    ///
    /// Fails with [`CatalogError::ArrayNotFound`] when the URI has no schema
    /// or no committed fragments.
    pub fn open(source: &impl FragmentSource, uri: &str) -> Result<Self> {
        let (dim_names, fragments) = source.load_fragments(uri)?;
        if fragments.is_empty() {
            return Err(CatalogError::ArrayNotFound {
                uri: uri.to_string(),
            }
            .into());
        }
        debug!(uri, fragments = fragments.len(), "opened fragment catalog");
        Ok(Self {
            array_uri: uri.to_string(),
            dim_names,
            fragments,
        })
    }

    /// URI of the array this catalog describes.
    pub fn array_uri(&self) -> &str {
        &self.array_uri
    }

    /// Number of committed fragments in the snapshot.
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    fn fragment(&self, index: usize) -> std::result::Result<&Fragment, CatalogError> {
        self.fragments.get(index).ok_or(CatalogError::IndexOutOfRange {
            index,
            count: self.fragments.len(),
        })
    }

    fn dim_index(&self, key: DimensionKey<'_>) -> std::result::Result<usize, CatalogError> {
        match key {
            DimensionKey::Index(i) if i < self.dim_names.len() => Ok(i),
            DimensionKey::Index(i) => Err(CatalogError::DimensionNotFound {
                dim: i.to_string(),
            }),
            DimensionKey::Name(name) => self
                .dim_names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| CatalogError::DimensionNotFound {
                    dim: name.to_string(),
                }),
        }
    }

    /// Fragment directory URI.
    pub fn uri(&self, index: usize) -> Result<&str> {
        Ok(&self.fragment(index)?.uri)
    }

    /// On-disk size of the fragment in bytes.
    pub fn size_bytes(&self, index: usize) -> Result<u64> {
        Ok(self.fragment(index)?.size_bytes)
    }

    /// True for a dense fragment. Exactly one of `is_dense`/`is_sparse`
    /// holds for every fragment.
    pub fn is_dense(&self, index: usize) -> Result<bool> {
        Ok(self.fragment(index)?.kind == ArrayKind::Dense)
    }

    /// True for a sparse fragment.
    pub fn is_sparse(&self, index: usize) -> Result<bool> {
        Ok(self.fragment(index)?.kind == ArrayKind::Sparse)
    }

    /// Inclusive (write-start, write-end) commit timestamps.
    pub fn timestamp_range(&self, index: usize) -> Result<(u64, u64)> {
        Ok(self.fragment(index)?.timestamp_range)
    }

    /// Number of cells written in the fragment.
    pub fn cell_count(&self, index: usize) -> Result<u64> {
        Ok(self.fragment(index)?.cell_count)
    }

    /// Fragment format version.
    pub fn format_version(&self, index: usize) -> Result<u32> {
        Ok(self.fragment(index)?.format_version)
    }

    /// Whether the fragment's metadata has been consolidated.
    pub fn has_consolidated_metadata(&self, index: usize) -> Result<bool> {
        Ok(self.fragment(index)?.has_consolidated_metadata)
    }

    /// Number of fragments still lacking consolidated metadata.
    pub fn unconsolidated_fragment_count(&self) -> usize {
        self.fragments
            .iter()
            .filter(|f| !f.has_consolidated_metadata)
            .count()
    }

    /// Non-empty domain of a fixed-type dimension.
    pub fn non_empty_domain<'a>(
        &self,
        index: usize,
        dim: impl Into<DimensionKey<'a>>,
    ) -> Result<(i64, i64)> {
        let (dim, domain) = self.domain_entry(index, dim.into())?;
        match domain {
            NonEmptyDomain::Fixed(lo, hi) => Ok((*lo, *hi)),
            NonEmptyDomain::Var(..) => Err(CatalogError::WrongDomainKind {
                dim: self.dim_names[dim].clone(),
                actual: "variable-length",
            }
            .into()),
        }
    }

    /// Raw byte bounds of a variable-length (string) dimension.
    pub fn non_empty_domain_var<'a>(
        &self,
        index: usize,
        dim: impl Into<DimensionKey<'a>>,
    ) -> Result<(&[u8], &[u8])> {
        let (dim, domain) = self.domain_entry(index, dim.into())?;
        match domain {
            NonEmptyDomain::Var(lo, hi) => Ok((lo.as_slice(), hi.as_slice())),
            NonEmptyDomain::Fixed(..) => Err(CatalogError::WrongDomainKind {
                dim: self.dim_names[dim].clone(),
                actual: "fixed",
            }
            .into()),
        }
    }

    /// Byte sizes of a variable-length dimension's bounds, without the bytes
    /// themselves.
    pub fn non_empty_domain_var_size<'a>(
        &self,
        index: usize,
        dim: impl Into<DimensionKey<'a>>,
    ) -> Result<(u64, u64)> {
        let (lo, hi) = self.non_empty_domain_var(index, dim)?;
        Ok((lo.len() as u64, hi.len() as u64))
    }

    fn domain_entry(
        &self,
        index: usize,
        key: DimensionKey<'_>,
    ) -> std::result::Result<(usize, &NonEmptyDomain), CatalogError> {
        let fragment = self.fragment(index)?;
        let dim = self.dim_index(key)?;
        let domain = fragment
            .non_empty
            .get(dim)
            .ok_or_else(|| CatalogError::DimensionNotFound {
                dim: self.dim_names[dim].clone(),
            })?;
        Ok((dim, domain))
    }
}

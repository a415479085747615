
use crate::framegraph::subresource::SubresourceMask;
use crate::vkbytes;

/// The portion of a resource actually touched by a usage.
#[derive(Debug, Clone)]
pub enum ActiveRange {
    /// the entire resource, buffer or texture.
    FullResource,
    /// a byte range of a buffer.
    Buffer { offset: vkbytes, size: vkbytes },
    /// a subresource mask of a texture.
    Texture(SubresourceMask),
    /// not touched at all (used as a neutral element in folds).
    Inactive,
}

impl ActiveRange {

    pub fn is_empty(&self) -> bool {
        match self {
            | ActiveRange::Inactive => true,
            | ActiveRange::Buffer { size, .. } => *size == 0,
            | ActiveRange::Texture(mask) => mask.is_empty(),
            | ActiveRange::FullResource => false,
        }
    }

    pub fn union(&self, other: &ActiveRange) -> ActiveRange {

        match (self, other) {
            | (ActiveRange::Inactive, other) => other.clone(),
            | (this, ActiveRange::Inactive) => this.clone(),
            | (ActiveRange::FullResource, _) | (_, ActiveRange::FullResource) => ActiveRange::FullResource,
            | (ActiveRange::Texture(a), ActiveRange::Texture(b)) => ActiveRange::Texture(a.union(b)),
            | (ActiveRange::Buffer { offset: o1, size: s1 }, ActiveRange::Buffer { offset: o2, size: s2 }) => {
                let start = (*o1).min(*o2);
                let end = (*o1 + *s1).max(*o2 + *s2);
                ActiveRange::Buffer { offset: start, size: end - start }
            },
            | _ => unreachable!("mismatched active-range kinds"),
        }
    }

    pub fn intersects(&self, other: &ActiveRange) -> bool {

        match (self, other) {
            | (ActiveRange::Inactive, _) | (_, ActiveRange::Inactive) => false,
            | (ActiveRange::FullResource, _) | (_, ActiveRange::FullResource) => true,
            | (ActiveRange::Texture(a), ActiveRange::Texture(b)) => a.intersects(b),
            | (ActiveRange::Buffer { offset: o1, size: s1 }, ActiveRange::Buffer { offset: o2, size: s2 }) => {
                *o1 < *o2 + *s2 && *o2 < *o1 + *s1
            },
            | _ => unreachable!("mismatched active-range kinds"),
        }
    }
}

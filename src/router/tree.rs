//! Segment tree holding registered filters, and the matcher that walks it.
//!
//! Each node is reached by one [`Segment`] and owns an ordered list of filters
//! and an ordered list of children. Registration order is the only order the
//! tree knows: children are appended, never sorted or keyed.
//!
//! ## Sibling reuse
//!
//! Inserting a segment descends into the **last** child when that child has an
//! equal segment, and appends a new sibling otherwise. Registering `/a`, `/b`,
//! then `/a` again therefore yields two sibling `a` nodes, each tried in turn.
//! Merging all equal siblings would reorder interleaved registrations, so the
//! tree deliberately does not.
//!
//! ## Matching
//!
//! Matching never stops at the first hit. It returns every way the path can
//! satisfy the tree, in child order, each as a [`MatchedRoute`] carrying its
//! captures and the filter list of the node where it ended.

use super::segment::Segment;
use crate::filter::Filter;
use smallvec::SmallVec;
use std::fmt::Write as _;

/// Captures kept inline before spilling to the heap.
pub const MAX_INLINE_CAPTURES: usize = 8;

/// Ordered `(name, value)` pairs. An empty name marks a positional capture.
///
/// Names borrow from the tree and values borrow from the request path, so a
/// match allocates nothing for routes with few captures.
pub type Captures<'r, 'p> = SmallVec<[(&'r str, &'p str); MAX_INLINE_CAPTURES]>;

/// One way a request path satisfies the tree.
#[derive(Debug, Clone)]
pub struct MatchedRoute<'r, 'p> {
    /// Captures in path order
    pub captures: Captures<'r, 'p>,
    /// Filters of the node where the match terminated, in registration order
    pub filters: &'r [Filter],
}

impl<'r, 'p> MatchedRoute<'r, 'p> {
    fn new(filters: &'r [Filter]) -> Self {
        Self {
            captures: Captures::new(),
            filters,
        }
    }

    /// Look up a named capture. Later captures win on duplicate names.
    #[must_use]
    pub fn capture(&self, name: &str) -> Option<&'p str> {
        self.captures
            .iter()
            .rfind(|(k, _)| *k == name)
            .map(|(_, v)| *v)
    }

    /// Values of positional (unnamed) captures, in order.
    pub fn positional(&self) -> impl Iterator<Item = &'p str> + '_ {
        self.captures
            .iter()
            .filter(|(k, _)| k.is_empty())
            .map(|(_, v)| *v)
    }
}

/// A node of the routing tree. The root has no segment.
#[derive(Debug, Clone, Default)]
pub struct RoutingNode {
    segment: Option<Segment>,
    filters: Vec<Filter>,
    children: Vec<RoutingNode>,
}

impl RoutingNode {
    /// An empty root.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    fn with_segment(segment: Segment) -> Self {
        Self {
            segment: Some(segment),
            filters: Vec::new(),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn segment(&self) -> Option<&Segment> {
        self.segment.as_ref()
    }

    #[must_use]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    #[must_use]
    pub fn children(&self) -> &[RoutingNode] {
        &self.children
    }

    /// Attach `filter` at the end of the `segments` chain.
    ///
    /// A trailing wildcard also attaches `filter` to its parent, so `/files/*`
    /// answers the bare `/files` as well.
    pub fn insert(&mut self, segments: &[Segment], filter: Filter) {
        let Some((first, rest)) = segments.split_first() else {
            self.filters.push(filter);
            return;
        };

        if rest.is_empty() && *first == Segment::Wildcard {
            self.filters.push(filter.clone());
        }

        let reuse_last = self
            .children
            .last()
            .is_some_and(|last| last.segment.as_ref() == Some(first));
        if !reuse_last {
            self.children.push(RoutingNode::with_segment(first.clone()));
        }
        if let Some(node) = self.children.last_mut() {
            node.insert(rest, filter);
        }
    }

    /// Every route `path` matches below this node, in registration order.
    ///
    /// `path` holds already normalized (lower-cased, non-empty) segments.
    /// Matching is a pure read: the same tree and path always give the same list.
    pub fn match_path<'r, 'p, S: AsRef<str>>(&'r self, path: &'p [S]) -> Vec<MatchedRoute<'r, 'p>> {
        let mut routes = Vec::new();
        self.collect(path, &mut routes);
        routes
    }

    fn collect<'r, 'p, S: AsRef<str>>(&'r self, path: &'p [S], out: &mut Vec<MatchedRoute<'r, 'p>>) {
        let Some((head, rest)) = path.split_first() else {
            self.collect_terminal(out);
            return;
        };
        let segment = head.as_ref();

        for child in &self.children {
            let Some(kind) = &child.segment else {
                continue;
            };
            match kind {
                Segment::Literal(text) => {
                    if text == segment {
                        child.collect(rest, out);
                    }
                }
                Segment::Wildcard if child.children.is_empty() => {
                    let mut route = MatchedRoute::new(&child.filters);
                    route
                        .captures
                        .extend(path.iter().map(|value| ("", value.as_ref())));
                    out.push(route);
                }
                Segment::Wildcard => child.collect_shrinking(path, out),
                Segment::Named { name, constraint } => {
                    if constraint.as_ref().is_none_or(|c| c.is_match(segment)) {
                        let start = out.len();
                        child.collect(rest, out);
                        prepend_capture(&mut out[start..], name, segment);
                    }
                }
                Segment::OptionalNamed { name, constraint } => {
                    if constraint.as_ref().is_none_or(|c| c.is_match(segment)) {
                        let start = out.len();
                        child.collect(rest, out);
                        prepend_capture(&mut out[start..], name, segment);
                    }
                    // Absent: the optional consumes nothing.
                    child.collect(path, out);
                }
                Segment::Regex(constraint) => {
                    if constraint.is_match(segment) {
                        let start = out.len();
                        child.collect(rest, out);
                        prepend_capture(&mut out[start..], "", segment);
                    }
                }
            }
        }
    }

    /// Path exhausted at this node: its own filters, then any optional child
    /// that can be satisfied by absence.
    fn collect_terminal<'r, 'p>(&'r self, out: &mut Vec<MatchedRoute<'r, 'p>>) {
        if !self.filters.is_empty() {
            out.push(MatchedRoute::new(&self.filters));
        }
        for child in &self.children {
            if child.segment.as_ref().is_some_and(Segment::is_optional) && !child.filters.is_empty() {
                out.push(MatchedRoute::new(&child.filters));
            }
        }
    }

    /// Wildcard with children: give the wildcard the shortest prefix of `path`
    /// that lets the rest of the pattern match.
    ///
    /// Once every element has been peeled off, the wildcard's own filters get
    /// their chance with the whole path captured, the same as a trailing `*`.
    fn collect_shrinking<'r, 'p, S: AsRef<str>>(
        &'r self,
        path: &'p [S],
        out: &mut Vec<MatchedRoute<'r, 'p>>,
    ) {
        for consumed in 0..=path.len() {
            let start = out.len();
            self.collect(&path[consumed..], out);
            if out.len() == start {
                continue;
            }
            for route in &mut out[start..] {
                let mut captures: Captures<'r, 'p> = path[..consumed]
                    .iter()
                    .map(|value| ("", value.as_ref()))
                    .collect();
                captures.extend(route.captures.drain(..));
                route.captures = captures;
            }
            return;
        }
    }

    /// Render the subtree, one node per line, indented by depth.
    pub(crate) fn render(&self, depth: usize, buf: &mut String) {
        for child in &self.children {
            let label = child
                .segment
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            let _ = write!(buf, "{:indent$}/{label}", "", indent = depth * 2);
            for filter in &child.filters {
                let _ = write!(buf, "  {filter:?}");
            }
            buf.push('\n');
            child.render(depth + 1, buf);
        }
    }
}

fn prepend_capture<'r, 'p>(routes: &mut [MatchedRoute<'r, 'p>], name: &'r str, value: &'p str) {
    for route in routes {
        route.captures.insert(0, (name, value));
    }
}

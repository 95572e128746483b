//! Link surgery and red-black fix-ups for [`OrderedIndex`].
//!
//! Every helper takes `Option<Handle>` where the classical algorithm would
//! touch the nil sentinel: reading the color of `None` yields Black and
//! painting `None` does nothing.

use super::OrderedIndex;
use super::node::Color;
use crate::raw::Handle;

impl OrderedIndex {
    #[inline]
    pub(super) fn color(&self, handle: Option<Handle>) -> Color {
        handle.map_or(Color::Black, |h| self.nodes.get(h).color)
    }

    #[inline]
    pub(super) fn paint(&mut self, handle: Option<Handle>, color: Color) {
        if let Some(h) = handle {
            self.nodes.get_mut(h).color = color;
        }
    }

    #[inline]
    pub(super) fn parent(&self, handle: Handle) -> Option<Handle> {
        self.nodes.get(handle).parent
    }

    #[inline]
    pub(super) fn left(&self, handle: Option<Handle>) -> Option<Handle> {
        handle.and_then(|h| self.nodes.get(h).left)
    }

    #[inline]
    pub(super) fn right(&self, handle: Option<Handle>) -> Option<Handle> {
        handle.and_then(|h| self.nodes.get(h).right)
    }

    #[inline]
    fn set_parent(&mut self, handle: Option<Handle>, parent: Option<Handle>) {
        if let Some(h) = handle {
            self.nodes.get_mut(h).parent = parent;
        }
    }

    /// Returns the leftmost node of the subtree rooted at `handle`.
    pub(super) fn minimum(&self, mut handle: Handle) -> Handle {
        while let Some(left) = self.nodes.get(handle).left {
            handle = left;
        }
        handle
    }

    /// Puts `replacement` where `old` hangs under its parent (or at the root).
    pub(super) fn transplant(&mut self, old: Handle, replacement: Option<Handle>) {
        let parent = self.parent(old);
        match parent {
            None => self.root = replacement,
            Some(p) if self.nodes.get(p).left == Some(old) => self.nodes.get_mut(p).left = replacement,
            Some(p) => self.nodes.get_mut(p).right = replacement,
        }
        self.set_parent(replacement, parent);
    }

    fn rotate_left(&mut self, pivot: Handle) {
        let Some(riser) = self.nodes.get(pivot).right else {
            return;
        };
        let inner = self.nodes.get(riser).left;

        self.nodes.get_mut(pivot).right = inner;
        self.set_parent(inner, Some(pivot));

        self.transplant(pivot, Some(riser));
        self.nodes.get_mut(riser).left = Some(pivot);
        self.nodes.get_mut(pivot).parent = Some(riser);
    }

    fn rotate_right(&mut self, pivot: Handle) {
        let Some(riser) = self.nodes.get(pivot).left else {
            return;
        };
        let inner = self.nodes.get(riser).right;

        self.nodes.get_mut(pivot).left = inner;
        self.set_parent(inner, Some(pivot));

        self.transplant(pivot, Some(riser));
        self.nodes.get_mut(riser).right = Some(pivot);
        self.nodes.get_mut(pivot).parent = Some(riser);
    }

    /// Restores the red-black rules after `node` was linked in as a red leaf.
    pub(super) fn insert_fixup(&mut self, mut node: Handle) {
        while let Some(parent) = self.parent(node) {
            if self.color(Some(parent)) == Color::Black {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let Some(grand) = self.parent(parent) else {
                break;
            };

            if self.nodes.get(grand).left == Some(parent) {
                let uncle = self.nodes.get(grand).right;
                if self.color(uncle) == Color::Red {
                    self.paint(Some(parent), Color::Black);
                    self.paint(uncle, Color::Black);
                    self.paint(Some(grand), Color::Red);
                    node = grand;
                    continue;
                }

                // Near nephew: turn it into the far case first.
                let top = if self.nodes.get(parent).right == Some(node) {
                    self.rotate_left(parent);
                    let top = node;
                    node = parent;
                    top
                } else {
                    parent
                };
                self.paint(Some(top), Color::Black);
                self.paint(Some(grand), Color::Red);
                self.rotate_right(grand);
            } else {
                let uncle = self.nodes.get(grand).left;
                if self.color(uncle) == Color::Red {
                    self.paint(Some(parent), Color::Black);
                    self.paint(uncle, Color::Black);
                    self.paint(Some(grand), Color::Red);
                    node = grand;
                    continue;
                }

                let top = if self.nodes.get(parent).left == Some(node) {
                    self.rotate_right(parent);
                    let top = node;
                    node = parent;
                    top
                } else {
                    parent
                };
                self.paint(Some(top), Color::Black);
                self.paint(Some(grand), Color::Red);
                self.rotate_left(grand);
            }
        }

        let root = self.root;
        self.paint(root, Color::Black);
    }

    /// Resolves the extra black carried by `node` (which may be `None`) below `parent`.
    pub(super) fn delete_fixup(&mut self, mut node: Option<Handle>, mut parent: Option<Handle>) {
        while node != self.root && self.color(node) == Color::Black {
            let Some(p) = parent else {
                break;
            };

            if self.nodes.get(p).left == node {
                let mut sibling = self.nodes.get(p).right;
                if self.color(sibling) == Color::Red {
                    self.paint(sibling, Color::Black);
                    self.paint(Some(p), Color::Red);
                    self.rotate_left(p);
                    sibling = self.nodes.get(p).right;
                }

                if self.color(self.left(sibling)) == Color::Black && self.color(self.right(sibling)) == Color::Black {
                    self.paint(sibling, Color::Red);
                    node = Some(p);
                    parent = self.parent(p);
                    continue;
                }

                if self.color(self.right(sibling)) == Color::Black {
                    let near = self.left(sibling);
                    self.paint(near, Color::Black);
                    self.paint(sibling, Color::Red);
                    if let Some(s) = sibling {
                        self.rotate_right(s);
                    }
                    sibling = self.nodes.get(p).right;
                }

                let parent_color = self.color(Some(p));
                self.paint(sibling, parent_color);
                self.paint(Some(p), Color::Black);
                let far = self.right(sibling);
                self.paint(far, Color::Black);
                self.rotate_left(p);
            } else {
                let mut sibling = self.nodes.get(p).left;
                if self.color(sibling) == Color::Red {
                    self.paint(sibling, Color::Black);
                    self.paint(Some(p), Color::Red);
                    self.rotate_right(p);
                    sibling = self.nodes.get(p).left;
                }

                if self.color(self.right(sibling)) == Color::Black && self.color(self.left(sibling)) == Color::Black {
                    self.paint(sibling, Color::Red);
                    node = Some(p);
                    parent = self.parent(p);
                    continue;
                }

                if self.color(self.left(sibling)) == Color::Black {
                    let near = self.right(sibling);
                    self.paint(near, Color::Black);
                    self.paint(sibling, Color::Red);
                    if let Some(s) = sibling {
                        self.rotate_left(s);
                    }
                    sibling = self.nodes.get(p).left;
                }

                let parent_color = self.color(Some(p));
                self.paint(sibling, parent_color);
                self.paint(Some(p), Color::Black);
                let far = self.left(sibling);
                self.paint(far, Color::Black);
                self.rotate_right(p);
            }

            node = self.root;
            parent = None;
        }

        self.paint(node, Color::Black);
    }
}

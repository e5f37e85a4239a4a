//! Minimal in-memory host.
//!
//! [`Document`] plays the role of the UI framework: it owns containers, builds
//! the [`MountContext`] for each mount, commits the returned tree and binds
//! in-page anchor links. Re-mounting a page whose static content is already
//! committed is a no-op, since static subtrees are compared by pointer.

use std::collections::HashMap;

use crate::content::ContentTree;
use crate::module::Render;
use crate::mount::{MountContext, NodeId};

/// Handle to a committed mount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MountHandle {
    container: NodeId,
    generation: u64,
}

impl MountHandle {
    #[must_use]
    pub fn container(&self) -> NodeId {
        self.container
    }
}

/// Result of [`Document::mount`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MountOutcome {
    pub handle: MountHandle,
    /// The container already held equivalent content; nothing was committed.
    pub reused: bool,
}

/// Host-side mount failure.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum MountError {
    /// Target container does not exist.
    #[error("Container {0} does not exist")]
    MissingContainer(NodeId),
    /// Handle refers to content that was replaced or unmounted.
    #[error("Mount handle for container {0} is stale")]
    StaleHandle(NodeId),
}

struct Mounted {
    generation: u64,
    tree: ContentTree,
    anchors: Vec<String>,
}

#[derive(Default)]
struct Container {
    mounted: Option<Mounted>,
}

/// In-memory document holding mount containers.
#[derive(Default)]
pub struct Document {
    containers: HashMap<NodeId, Container>,
    next_id: u32,
    next_generation: u64,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty container and return its id.
    pub fn create_container(&mut self) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.containers.insert(id, Container::default());
        id
    }

    /// Remove a container and whatever is mounted in it.
    pub fn remove_container(&mut self, id: NodeId) -> bool {
        self.containers.remove(&id).is_some()
    }

    /// Render `page` into `container` and commit the result.
    ///
    /// # Errors
    ///
    /// Returns [`MountError::MissingContainer`] if the container does not
    /// exist. The page is not rendered in that case.
    pub fn mount<R: Render + ?Sized>(
        &mut self,
        container: NodeId,
        page: &R,
    ) -> Result<MountOutcome, MountError> {
        let slot = self
            .containers
            .get_mut(&container)
            .ok_or(MountError::MissingContainer(container))?;

        let ctx = MountContext::new(container);
        let tree = page.render(&ctx);

        if let Some(current) = &slot.mounted
            && current.tree == tree
            && current.tree.shares_static_with(&tree)
        {
            tracing::debug!(container = %container, "Static content unchanged, skipping commit");
            return Ok(MountOutcome {
                handle: MountHandle {
                    container,
                    generation: current.generation,
                },
                reused: true,
            });
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        let anchors = tree
            .static_fragments()
            .iter()
            .flat_map(|fragment| fragment.anchor_targets())
            .collect();

        slot.mounted = Some(Mounted {
            generation,
            tree,
            anchors,
        });
        tracing::debug!(container = %container, generation, "Committed content tree");

        Ok(MountOutcome {
            handle: MountHandle {
                container,
                generation,
            },
            reused: false,
        })
    }

    /// Remove mounted content, returning the tree that was committed.
    ///
    /// # Errors
    ///
    /// Returns [`MountError::MissingContainer`] if the container was removed
    /// and [`MountError::StaleHandle`] if the handle no longer matches.
    pub fn unmount(&mut self, handle: MountHandle) -> Result<ContentTree, MountError> {
        let slot = self
            .containers
            .get_mut(&handle.container)
            .ok_or(MountError::MissingContainer(handle.container))?;

        match slot.mounted.take() {
            Some(mounted) if mounted.generation == handle.generation => Ok(mounted.tree),
            other => {
                slot.mounted = other;
                Err(MountError::StaleHandle(handle.container))
            }
        }
    }

    /// Tree currently committed in a container.
    #[must_use]
    pub fn mounted(&self, container: NodeId) -> Option<&ContentTree> {
        Some(&self.containers.get(&container)?.mounted.as_ref()?.tree)
    }

    /// HTML of the content committed in a container.
    ///
    /// Returns `Some("")` for an empty container and `None` if it does not exist.
    #[must_use]
    pub fn inner_html(&self, container: NodeId) -> Option<String> {
        let slot = self.containers.get(&container)?;
        Some(
            slot.mounted
                .as_ref()
                .map(|m| m.tree.to_html())
                .unwrap_or_default(),
        )
    }

    /// Anchor targets bound for in-page navigation in a container.
    #[must_use]
    pub fn anchor_bindings(&self, container: NodeId) -> &[String] {
        self.containers
            .get(&container)
            .and_then(|slot| slot.mounted.as_ref())
            .map(|m| m.anchors.as_slice())
            .unwrap_or_default()
    }
}

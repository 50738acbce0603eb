//! Fixed-capacity store of the nodes hosted by one program.
//!
//! Several nodes may share a process (gateways, simulations); each keeps its
//! own link, address table and transport connection. The registry hands out
//! opaque [`NodeHandle`]s and never allocates.
use crate::core::Message;
use crate::error::{InitError, SendError};
use crate::protocol::node::config::NodeConfig;
use crate::protocol::node::Node;
use crate::protocol::transport::traits::link::J1939Link;
use crate::protocol::transport::traits::startup_delay::StartupDelay;

/// Opaque reference to a node stored in a [`NodeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NodeHandle(u8);

impl NodeHandle {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Up to `N` nodes sharing the same link type.
pub struct NodeRegistry<L: J1939Link, const N: usize> {
    nodes: [Option<Node<L>>; N],
    len: usize,
}

impl<L: J1939Link, const N: usize> Default for NodeRegistry<L, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: J1939Link, const N: usize> NodeRegistry<L, N> {
    /// `N` is capped at 256 slots by the handle width.
    pub fn new() -> Self {
        Self {
            nodes: core::array::from_fn(|_| None),
            len: 0,
        }
    }

    /// Register and start a node. Nothing is stored, claimed or sent when an
    /// error is returned.
    pub fn init(
        &mut self,
        config: NodeConfig,
        link: L,
        delay: &mut impl StartupDelay,
    ) -> Result<NodeHandle, InitError> {
        config.validate()?;
        if self.len >= N || self.len > u8::MAX as usize {
            return Err(InitError::RegistryFull);
        }

        let node = Node::init(config, link, delay)?;
        let handle = NodeHandle(self.len as u8);
        self.nodes[handle.index()] = Some(node);
        self.len += 1;
        Ok(handle)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn node(&self, handle: NodeHandle) -> Option<&Node<L>> {
        self.nodes.get(handle.index())?.as_ref()
    }

    pub fn node_mut(&mut self, handle: NodeHandle) -> Option<&mut Node<L>> {
        self.nodes.get_mut(handle.index())?.as_mut()
    }

    /// Run one tick of the given node. Returns `false` for an unknown handle.
    pub fn update(&mut self, handle: NodeHandle) -> bool {
        match self.node_mut(handle) {
            Some(node) => {
                node.update();
                true
            }
            None => false,
        }
    }

    /// Run one tick of every registered node, in registration order.
    pub fn update_all(&mut self) {
        self.nodes.iter_mut().flatten().for_each(Node::update);
    }

    pub fn send(
        &mut self,
        handle: NodeHandle,
        message: &Message<'_>,
    ) -> Result<(), SendError<L::Error>> {
        self.node_mut(handle)
            .ok_or(SendError::UnknownNode)?
            .send(message)
    }

    /// Current source address of a node (`254` once it could not claim).
    pub fn source_address(&self, handle: NodeHandle) -> Option<u8> {
        self.node(handle).map(Node::source_address)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &Node<L>)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.as_ref().map(|node| (NodeHandle(index as u8), node)))
    }
}

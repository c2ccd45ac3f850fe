//
// Copyright (c) The Eigrp Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::{BTreeMap, HashMap};
use std::net::IpAddr;

use generational_arena::{Arena, Index};

use crate::dual::Reply;
use crate::error::Error;
use crate::neighbor::Neighbor;

pub type NeighborId = usize;
pub type NeighborIndex = Index;
pub type ReplyIndex = Index;

// Neighbor registry of one routing instance. Neighbors are arena-allocated;
// candidate routes and reply records refer to them through handles, never
// owning pointers, so removing a neighbor is a single arena-slot
// invalidation.
#[derive(Debug, Default)]
pub struct Neighbors {
    // Neighbor arena.
    arena: Arena<Neighbor>,
    // Neighbor hash table keyed by ID (1:1).
    id_tree: HashMap<NeighborId, NeighborIndex>,
    // Neighbor binary tree keyed by address (1:1, remote neighbors only).
    addr_tree: BTreeMap<IpAddr, NeighborIndex>,
    // Next available ID.
    next_id: NeighborId,
}

// Outstanding reply records of one routing instance. Each record is owned by
// the arena alone; the destination node and the queried neighbor both hold
// handles into it.
#[derive(Debug, Default)]
pub struct Replies {
    arena: Arena<Reply>,
}

// ===== impl Neighbors =====

impl Neighbors {
    fn next_id(&mut self) -> NeighborId {
        self.next_id += 1;
        self.next_id
    }

    pub(crate) fn insert(
        &mut self,
        addr: Option<IpAddr>,
        mk_nbr: impl FnOnce(NeighborId) -> Neighbor,
    ) -> (NeighborIndex, &mut Neighbor) {
        let id = self.next_id();
        let nbr_idx = self.arena.insert(mk_nbr(id));
        let nbr = &mut self.arena[nbr_idx];
        self.id_tree.insert(nbr.id, nbr_idx);
        if let Some(addr) = addr {
            self.addr_tree.insert(addr, nbr_idx);
        }
        (nbr_idx, nbr)
    }

    pub(crate) fn delete(&mut self, nbr_idx: NeighborIndex) -> Neighbor {
        let nbr = self.arena.remove(nbr_idx).unwrap();
        self.id_tree.remove(&nbr.id);
        self.addr_tree.remove(&nbr.addr);
        nbr
    }

    pub(crate) fn get_by_id(
        &self,
        id: NeighborId,
    ) -> Result<(NeighborIndex, &Neighbor), Error> {
        self.id_tree
            .get(&id)
            .copied()
            .map(|nbr_idx| (nbr_idx, &self.arena[nbr_idx]))
            .ok_or(Error::NbrIdNotFound(id))
    }

    pub(crate) fn get_mut_by_id(
        &mut self,
        id: NeighborId,
    ) -> Result<(NeighborIndex, &mut Neighbor), Error> {
        match self.id_tree.get(&id).copied() {
            Some(nbr_idx) => Ok((nbr_idx, &mut self.arena[nbr_idx])),
            None => Err(Error::NbrIdNotFound(id)),
        }
    }

    pub(crate) fn get_by_addr(
        &self,
        addr: &IpAddr,
    ) -> Option<(NeighborIndex, &Neighbor)> {
        self.addr_tree
            .get(addr)
            .copied()
            .map(|nbr_idx| (nbr_idx, &self.arena[nbr_idx]))
    }

    pub(crate) fn get_mut_by_addr(
        &mut self,
        addr: &IpAddr,
    ) -> Option<(NeighborIndex, &mut Neighbor)> {
        self.addr_tree
            .get(addr)
            .copied()
            .map(|nbr_idx| (nbr_idx, &mut self.arena[nbr_idx]))
    }

    pub(crate) fn iter(
        &self,
    ) -> impl Iterator<Item = (NeighborIndex, &Neighbor)> + '_ {
        self.arena.iter()
    }

    pub(crate) fn indexes(&self) -> Vec<NeighborIndex> {
        self.arena.iter().map(|(nbr_idx, _)| nbr_idx).collect()
    }
}

impl std::ops::Index<NeighborIndex> for Neighbors {
    type Output = Neighbor;

    fn index(&self, index: NeighborIndex) -> &Neighbor {
        &self.arena[index]
    }
}

impl std::ops::IndexMut<NeighborIndex> for Neighbors {
    fn index_mut(&mut self, index: NeighborIndex) -> &mut Neighbor {
        &mut self.arena[index]
    }
}

// ===== impl Replies =====

impl Replies {
    pub(crate) fn insert(&mut self, reply: Reply) -> ReplyIndex {
        self.arena.insert(reply)
    }

    // Removing the record drops its timer handles, canceling the timers
    // before any later event can observe them.
    pub(crate) fn delete(&mut self, reply_idx: ReplyIndex) -> Reply {
        self.arena.remove(reply_idx).unwrap()
    }

    pub(crate) fn get(&self, reply_idx: ReplyIndex) -> Option<&Reply> {
        self.arena.get(reply_idx)
    }

    pub(crate) fn get_mut(
        &mut self,
        reply_idx: ReplyIndex,
    ) -> Option<&mut Reply> {
        self.arena.get_mut(reply_idx)
    }
}

impl std::ops::Index<ReplyIndex> for Replies {
    type Output = Reply;

    fn index(&self, index: ReplyIndex) -> &Reply {
        &self.arena[index]
    }
}

impl std::ops::IndexMut<ReplyIndex> for Replies {
    fn index_mut(&mut self, index: ReplyIndex) -> &mut Reply {
        &mut self.arena[index]
    }
}

//! Pairwise inhibition edges.

use bn_core::BehaviorId;

/// The inhibition relationship between two behaviors.
///
/// One edge covers an unordered pair.  Its two coefficients are independent:
///
/// - `inhibition_ft` — how strongly `from` inhibits `to`,
/// - `inhibition_tf` — how strongly `to` inhibits `from`.
///
/// Both lie in `[-1, 1]`; a negative coefficient excites instead of inhibits.
/// Only the mutual-inhibition mechanism reads edges.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub from:          BehaviorId,
    pub to:            BehaviorId,
    pub inhibition_ft: f64,
    pub inhibition_tf: f64,
    /// Editor hint; has no effect on arbitration.
    pub visible:       bool,
}

impl Edge {
    /// A zero-coefficient (inert) edge between `from` and `to`.
    pub fn new(from: BehaviorId, to: BehaviorId) -> Self {
        Self { from, to, inhibition_ft: 0.0, inhibition_tf: 0.0, visible: true }
    }

    /// Canonical map key of the unordered pair `{a, b}`: lower id first.
    #[inline]
    pub fn key(a: BehaviorId, b: BehaviorId) -> (BehaviorId, BehaviorId) {
        if a <= b { (a, b) } else { (b, a) }
    }

    /// `true` if `id` is one of the endpoints.
    #[inline]
    pub fn touches(&self, id: BehaviorId) -> bool {
        self.from == id || self.to == id
    }

    /// The endpoint that is not `id`.  Meaningless if `!self.touches(id)`.
    #[inline]
    pub fn other(&self, id: BehaviorId) -> BehaviorId {
        if self.from == id { self.to } else { self.from }
    }

    /// How strongly `src` inhibits `dst`.  Zero if the edge does not connect
    /// exactly these two behaviors.
    pub fn inhibition(&self, src: BehaviorId, dst: BehaviorId) -> f64 {
        if src == self.from && dst == self.to {
            self.inhibition_ft
        } else if src == self.to && dst == self.from {
            self.inhibition_tf
        } else {
            0.0
        }
    }

    /// Set the coefficients as seen from `src`'s side: `src_on_dst` is how much
    /// `src` inhibits the other endpoint, `dst_on_src` the reverse.
    pub(crate) fn set_from(&mut self, src: BehaviorId, src_on_dst: f64, dst_on_src: f64) {
        if src == self.from {
            self.inhibition_ft = src_on_dst;
            self.inhibition_tf = dst_on_src;
        } else {
            self.inhibition_ft = dst_on_src;
            self.inhibition_tf = src_on_dst;
        }
    }
}

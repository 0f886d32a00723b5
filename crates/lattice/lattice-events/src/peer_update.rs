// The update a peer publishes to its outbox. A single counter value is
// enough for the exchange protocol; anything larger must stay fixed-size
// POD so a slot copy can never tear across an allocation.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PeerUpdate {
    pub val: u64,
}

impl PeerUpdate {
    #[inline]
    pub fn new(val: u64) -> Self {
        Self { val }
    }
}

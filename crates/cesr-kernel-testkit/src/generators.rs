//! Proptest strategies for kernel types.

use cesr_kernel_core::{
    DigestAlg, Keypair, PublicKey, Said, Signature, StreamItem,
};
use proptest::prelude::*;

/// Either digest algorithm.
pub fn digest_alg() -> impl Strategy<Value = DigestAlg> {
    prop_oneof![Just(DigestAlg::Blake3_256), Just(DigestAlg::Sha2_256)]
}

/// A digest over arbitrary preimage bytes.
pub fn said() -> impl Strategy<Value = Said> {
    (digest_alg(), proptest::collection::vec(any::<u8>(), 0..64))
        .prop_map(|(alg, data)| Said::derive(alg, &data))
}

/// A keypair from an arbitrary seed.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// A valid Ed25519 public key, transferable or not.
pub fn public_key() -> impl Strategy<Value = PublicKey> {
    (keypair(), any::<bool>()).prop_map(|(kp, transferable)| {
        let raw = *kp.public_key().as_bytes();
        if transferable {
            PublicKey::transferable(raw)
        } else {
            PublicKey::non_transferable(raw)
        }
    })
}

/// A signature over arbitrary message bytes.
pub fn signature() -> impl Strategy<Value = Signature> {
    (keypair(), proptest::collection::vec(any::<u8>(), 0..64))
        .prop_map(|(kp, message)| kp.sign(&message))
}

/// Any primitive stream item.
pub fn primitive_item() -> impl Strategy<Value = StreamItem> {
    prop_oneof![
        said().prop_map(StreamItem::from),
        public_key().prop_map(StreamItem::from),
        signature().prop_map(StreamItem::from),
    ]
}

/// A short sequence of primitive stream items.
pub fn primitive_items(max: usize) -> impl Strategy<Value = Vec<StreamItem>> {
    proptest::collection::vec(primitive_item(), 0..max)
}

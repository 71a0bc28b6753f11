//! Proptest generators for property-based testing.

use proptest::prelude::*;

use folio_core::{encode, Address, BlobRef, ContentIdentity, Keypair, ObjectId, IDENTITY_LEN};
use folio_perms::BlobMetadata;
use folio_policy::Credential;

/// Generate a random keypair.
pub fn keypair() -> impl Strategy<Value = Keypair> {
    any::<[u8; 32]>().prop_map(|seed| Keypair::from_seed(&seed))
}

/// Generate a random ObjectId.
pub fn object_id() -> impl Strategy<Value = ObjectId> {
    any::<[u8; 32]>().prop_map(ObjectId::from_bytes)
}

/// Generate a random Address. Not necessarily a valid curve point.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 32]>().prop_map(Address::from_bytes)
}

/// Generate a content identity.
pub fn content_identity() -> impl Strategy<Value = ContentIdentity> {
    (object_id(), any::<u64>())
        .prop_map(|(container, nonce)| ContentIdentity::new(container, nonce))
}

/// Generate well-formed identity bytes.
pub fn identity_bytes() -> impl Strategy<Value = Vec<u8>> {
    (object_id(), any::<u64>()).prop_map(|(container, nonce)| encode(&container, nonce))
}

/// Generate byte strings of any length except the identity length.
pub fn wrong_length_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..128)
        .prop_filter("identity length", |b| b.len() != IDENTITY_LEN)
}

/// Generate a blob reference.
pub fn blob_ref() -> impl Strategy<Value = BlobRef> {
    prop::collection::vec(any::<u8>(), 1..=32).prop_map(BlobRef::new)
}

/// Generate blob metadata.
pub fn blob_metadata() -> impl Strategy<Value = BlobMetadata> {
    (
        0u64..=1 << 32,
        prop_oneof![Just("markdown"), Just("image/png"), Just("application/cbor")],
        0u64..=10_000,
        any::<bool>(),
    )
        .prop_map(|(size, encoding, expiry, encrypted)| {
            BlobMetadata::new(size, encoding, expiry, encrypted)
        })
}

/// Generate a credential reference of any kind.
pub fn credential() -> impl Strategy<Value = Credential> {
    prop_oneof![
        object_id().prop_map(|subscription_id| Credential::Subscription { subscription_id }),
        object_id().prop_map(|token_id| Credential::OwnedToken { token_id }),
        object_id().prop_map(|capability_id| Credential::Owner { capability_id }),
        object_id().prop_map(|container_id| Credential::Contributor { container_id }),
        object_id().prop_map(|container_id| Credential::Allowlist { container_id }),
    ]
}

/// Generate a credential bag of up to `max_len` entries.
pub fn credential_bag(max_len: usize) -> impl Strategy<Value = Vec<Credential>> {
    prop::collection::vec(credential(), 0..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::{decode, IdentityFormatError};
    use folio_policy::CredentialKind;
    use folio_resolve::ResolutionPlan;

    proptest! {
        #[test]
        fn test_identity_roundtrip(identity in content_identity()) {
            prop_assert_eq!(decode(&identity.to_bytes()), Ok(identity));
        }

        #[test]
        fn test_unknown_tag_rejected(mut bytes in identity_bytes(), tag in 1u8..) {
            prop_assert!(decode(&bytes).is_ok());
            bytes[0] = tag;
            prop_assert_eq!(decode(&bytes), Err(IdentityFormatError::UnknownTag(tag)));
        }

        #[test]
        fn test_wrong_length_always_rejected(bytes in wrong_length_bytes()) {
            let err = decode(&bytes).unwrap_err();
            let is_length_error = matches!(
                err,
                IdentityFormatError::Truncated { .. } | IdentityFormatError::TrailingBytes(_)
            );
            prop_assert!(is_length_error);
        }

        #[test]
        fn test_plan_is_sorted_and_complete(bag in credential_bag(12)) {
            let plan = ResolutionPlan::from_bag(&bag);
            prop_assert_eq!(plan.steps().len(), bag.len());

            let rank = |k: &CredentialKind| CredentialKind::PRIORITY.iter().position(|p| p == k);
            let ranks: Vec<_> = plan.kinds().iter().map(rank).collect();
            prop_assert!(ranks.windows(2).all(|w| w[0] <= w[1]));
        }
    }
}

//! End-to-end behavior of the mapper against the in-memory store.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use bson::{Bson, doc};

use crate::error::{DecodeError, FetchError};
use crate::id::ObjectId;
use crate::reference::{DeferredRef, Projection};
use crate::registry::TypeRegistryArc;
use crate::serde::DocumentEncoder;
use crate::store::MemoryStore;
use crate::stream::{DecoderConfig, DocumentDecoder, Value};
use crate::{Document, TypeRegistry};

// -----------------------------------------------------------------------------
// Fixtures

#[derive(Document, Debug, PartialEq)]
#[document(collection = "users")]
struct User {
    #[document(id, object_id)]
    id: String,
    name: String,
    email: Option<String>,
}

#[derive(Document, Debug)]
#[document(collection = "posts")]
struct Post {
    #[document(id, object_id)]
    id: Option<String>,
    #[document(rename = "t")]
    title: String,
    #[document(object_id)]
    author: DeferredRef<User, String>,
    #[document(object_id)]
    reviewer: Option<DeferredRef<User, String>>,
    #[document(skip)]
    dirty: bool,
}

#[derive(Document, Debug, PartialEq)]
struct Address {
    city: String,
    zip: Option<String>,
}

#[derive(Document, Debug, PartialEq)]
struct Profile {
    #[document(id)]
    handle: String,
    #[document(object_id)]
    friends: Vec<String>,
    #[document(object_id)]
    groups: BTreeMap<String, String>,
    #[document(object_id)]
    layers: Vec<Vec<String>>,
    home: Address,
    scores: HashMap<String, i32>,
    avatar: Vec<u8>,
}

#[derive(Document, Debug)]
#[document(collection = "teams")]
struct Team {
    #[document(id)]
    name: String,
    #[document(object_id)]
    members: Vec<DeferredRef<User, String>>,
    #[document(object_id)]
    roles: HashMap<String, DeferredRef<User, String>>,
}

#[derive(Document, Debug)]
struct Checkpoint {
    at: ObjectId,
    label: Option<String>,
}

fn user(store: &MemoryStore, name: &str) -> ObjectId {
    let oid = ObjectId::new();
    store
        .insert("users", doc! { "_id": oid, "name": name, "email": format!("{name}@x") })
        .unwrap();
    oid
}

fn post_document(author: ObjectId) -> bson::Document {
    doc! {
        "_id": ObjectId::new(),
        "t": "hello",
        "author": { "$ref": "users", "$id": author },
    }
}

fn post_decoder(store: &MemoryStore, registry: &TypeRegistryArc) -> DocumentDecoder<Post> {
    DocumentDecoder::new(registry.clone()).with_collection(store.collection("posts"))
}

// -----------------------------------------------------------------------------
// Identifiers

#[test]
fn identity_is_stored_as_native_id() {
    let registry = TypeRegistryArc::default();
    let oid = ObjectId::new();
    let user = User {
        id: oid.to_hex(),
        name: "ada".to_owned(),
        email: None,
    };

    let encoded = DocumentEncoder::new(&registry).encode(&user).unwrap();
    assert_eq!(encoded, doc! { "_id": oid, "name": "ada", "email": Bson::Null });

    let decoded = DocumentDecoder::<User>::new(registry)
        .decode_document(encoded)
        .unwrap();
    assert_eq!(decoded.object, user);
}

#[test]
fn invalid_identity_fails_to_encode() {
    let registry = TypeRegistryArc::default();
    let user = User {
        id: "not hex".to_owned(),
        name: "ada".to_owned(),
        email: None,
    };
    assert!(DocumentEncoder::new(&registry).encode(&user).is_err());
}

#[test]
fn binary_round_trip() {
    let registry = TypeRegistryArc::default();
    let user = User {
        id: ObjectId::new().to_hex(),
        name: "bob".to_owned(),
        email: Some("bob@x".to_owned()),
    };
    let encoder = DocumentEncoder::new(&registry);
    let bytes = encoder.encode_to_vec(&user).unwrap();

    let decoded = DocumentDecoder::<User>::new(registry.clone())
        .decode_slice(&bytes)
        .unwrap();
    assert_eq!(decoded.object, user);
}

// -----------------------------------------------------------------------------
// Containers

#[test]
fn container_members_convert_their_items() {
    let registry = TypeRegistryArc::default();
    let friend = ObjectId::new();
    let group = ObjectId::new();

    let decoded = DocumentDecoder::<Profile>::new(registry.clone())
        .decode_document(doc! {
            "_id": "ada",
            "friends": [friend],
            "groups": { "admins": group },
            "layers": [["a", "b"], []],
            "home": { "city": "Paris" },
            "scores": { "x": 1 },
            "avatar": Bson::Binary(bson::Binary {
                subtype: bson::spec::BinarySubtype::Generic,
                bytes: vec![1, 2, 3],
            }),
        })
        .unwrap()
        .object;

    assert_eq!(decoded.handle, "ada");
    assert_eq!(decoded.friends, vec![friend.to_hex()]);
    assert_eq!(decoded.groups.get("admins"), Some(&group.to_hex()));
    assert_eq!(decoded.layers, vec![vec!["a".to_owned(), "b".to_owned()], vec![]]);
    assert_eq!(
        decoded.home,
        Address {
            city: "Paris".to_owned(),
            zip: None
        }
    );
    assert_eq!(decoded.scores.get("x"), Some(&1));
    assert_eq!(decoded.avatar, vec![1, 2, 3]);

    let encoded = DocumentEncoder::new(&registry).encode(&decoded).unwrap();
    assert_eq!(encoded.get_array("friends").unwrap(), &vec![Bson::ObjectId(friend)]);
    assert_eq!(
        encoded.get_document("groups").unwrap(),
        &doc! { "admins": group }
    );
    assert_eq!(encoded.get_str("_id").unwrap(), "ada");
}

// -----------------------------------------------------------------------------
// References

#[test]
fn reference_reads_key_and_target_without_io() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();
    let author = ObjectId::new();

    let post = post_decoder(&store, &registry)
        .decode_document(post_document(author))
        .unwrap()
        .object;

    assert_eq!(post.title, "hello");
    assert!(!post.dirty);
    assert_eq!(post.author.id(), &author.to_hex());
    assert_eq!(post.author.collection_name(), "users");
    assert!(post.author.is_bound());
    assert!(!post.author.is_fetched());
    assert!(post.reviewer.is_none());
    assert_eq!(store.lookups(), 0);
}

#[test]
fn reference_round_trip() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();
    let author = user(&store, "ada");

    let post = Post {
        id: None,
        title: "draft".to_owned(),
        author: DeferredRef::unbound(author.to_hex(), "users"),
        reviewer: None,
        dirty: true,
    };
    let encoded = DocumentEncoder::new(&registry).encode(&post).unwrap();
    assert!(!encoded.contains_key("_id"));
    assert!(!encoded.contains_key("dirty"));
    assert_eq!(
        encoded.get_document("author").unwrap(),
        &doc! { "$ref": "users", "$id": author }
    );

    let decoded = post_decoder(&store, &registry)
        .decode_document(encoded)
        .unwrap()
        .object;
    assert_eq!(decoded.author, post.author);
    assert_eq!(decoded.author.fetch().unwrap().unwrap().name, "ada");
}

#[test]
fn object_form_reference_without_db_ref_decoding() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();
    let author = ObjectId::new();

    let config = DecoderConfig::default().with_decode_db_refs(false);
    let post = post_decoder(&store, &registry)
        .with_config(Arc::new(config))
        .decode_document(doc! {
            "t": "x",
            "author": { "$db": "blog", "$id": author, "$ref": "users" },
        })
        .unwrap()
        .object;

    assert_eq!(post.id, None);
    assert_eq!(post.author.id(), &author.to_hex());
    assert_eq!(post.author.collection_name(), "users");
}

#[test]
fn null_reference_is_absent() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();
    let mut document = post_document(ObjectId::new());
    document.insert("reviewer", Bson::Null);

    let post = post_decoder(&store, &registry)
        .decode_document(document)
        .unwrap()
        .object;
    assert!(post.reviewer.is_none());
}

#[test]
fn reference_without_id_is_absent() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();
    let mut document = post_document(ObjectId::new());
    document.insert("reviewer", doc! { "$ref": "users" });

    let post = post_decoder(&store, &registry)
        .decode_document(document)
        .unwrap()
        .object;
    assert!(post.reviewer.is_none());

    let mut document = post_document(ObjectId::new());
    document.insert("reviewer", doc! { "$id": Bson::Null });

    let post = post_decoder(&store, &registry)
        .decode_document(document)
        .unwrap()
        .object;
    assert!(post.reviewer.is_none());
}

#[test]
fn bare_reference_must_be_present() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();

    let err = post_decoder(&store, &registry)
        .decode_document(doc! { "t": "x", "author": Bson::Null })
        .unwrap_err();
    assert!(matches!(err, DecodeError::NullReference(_)));
}

#[test]
fn malformed_reference_fails() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();

    let err = post_decoder(&store, &registry)
        .decode_document(doc! { "t": "x", "author": "users/1" })
        .unwrap_err();
    assert!(matches!(err, DecodeError::MalformedReference(_)));

    let err = post_decoder(&store, &registry)
        .decode_document(doc! { "t": "x", "author": [1, 2] })
        .unwrap_err();
    assert!(matches!(err, DecodeError::MalformedReference(_)));
}

#[test]
fn reference_without_target_fails() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();

    let err = post_decoder(&store, &registry)
        .decode_document(doc! { "t": "x", "author": { "$id": ObjectId::new() } })
        .unwrap_err();
    assert!(matches!(err, DecodeError::MissingReferenceTarget));

    // Reported before the key is converted.
    let err = post_decoder(&store, &registry)
        .decode_document(doc! { "t": "x", "author": { "$id": "x" } })
        .unwrap_err();
    assert!(matches!(err, DecodeError::MissingReferenceTarget));
}

#[test]
fn reference_needs_a_collection() {
    let registry = TypeRegistryArc::default();

    let err = DocumentDecoder::<Post>::new(registry.clone())
        .decode_document(post_document(ObjectId::new()))
        .unwrap_err();
    assert!(matches!(err, DecodeError::UnsupportedReferenceContext));

    // Null needs no collection.
    let decoder = DocumentDecoder::<Post>::new(registry);
    let err = decoder
        .decode_document(doc! { "t": "x", "author": Bson::Null })
        .unwrap_err();
    assert!(matches!(err, DecodeError::NullReference(_)));
}

#[test]
fn mismatched_key_type_fails() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();

    let err = post_decoder(&store, &registry)
        .decode_document(doc! {
            "t": "x",
            "author": { "$ref": "users", "$id": Bson::Binary(bson::Binary {
                subtype: bson::spec::BinarySubtype::Generic,
                bytes: vec![0; 12],
            }) },
        })
        .unwrap_err();
    assert!(matches!(err, DecodeError::IdentifierTypeMismatch { .. }));
}

// -----------------------------------------------------------------------------
// Fetching

#[test]
fn fetch_is_cached() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();
    let author = user(&store, "ada");

    let post = post_decoder(&store, &registry)
        .decode_document(post_document(author))
        .unwrap()
        .object;

    let first = post.author.fetch().unwrap().unwrap();
    let second = post.author.fetch().unwrap().unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.id, author.to_hex());
    assert_eq!(first.email.as_deref(), Some("ada@x"));
    assert!(post.author.is_fetched());
    assert_eq!(store.lookups(), 1);
}

#[test]
fn absence_is_cached() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();

    let post = post_decoder(&store, &registry)
        .decode_document(post_document(ObjectId::new()))
        .unwrap()
        .object;

    assert!(post.author.fetch().unwrap().is_none());
    assert!(post.author.fetch().unwrap().is_none());
    assert!(post.author.is_fetched());
    assert_eq!(store.lookups(), 1);
}

#[test]
fn failures_are_not_cached() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();
    let author = user(&store, "ada");

    let post = post_decoder(&store, &registry)
        .decode_document(post_document(author))
        .unwrap()
        .object;

    store.set_unavailable(true);
    assert!(matches!(post.author.fetch(), Err(FetchError::Store(_))));
    assert!(!post.author.is_fetched());

    store.set_unavailable(false);
    assert!(post.author.fetch().unwrap().is_some());
    assert_eq!(store.lookups(), 2);
}

#[test]
fn projected_fetch_bypasses_cache() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();
    let author = user(&store, "ada");

    let post = post_decoder(&store, &registry)
        .decode_document(post_document(author))
        .unwrap()
        .object;

    let projection = Projection::new().include("name");
    let partial = post.author.fetch_with(&projection).unwrap().unwrap();
    assert_eq!(partial.name, "ada");
    assert_eq!(partial.email, None);

    post.author.fetch_with(&projection).unwrap();
    assert!(!post.author.is_fetched());
    assert_eq!(store.lookups(), 2);
}

#[test]
fn projected_fetch_fills_unprojected_members() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();
    let author = user(&store, "ada");

    let post = post_decoder(&store, &registry)
        .decode_document(post_document(author))
        .unwrap()
        .object;

    let partial = post
        .author
        .fetch_with(&Projection::new().include("email"))
        .unwrap()
        .unwrap();
    assert_eq!(partial.id, author.to_hex());
    assert_eq!(partial.name, "");
    assert_eq!(partial.email.as_deref(), Some("ada@x"));

    let partial = post
        .author
        .fetch_with(&Projection::new().exclude("name"))
        .unwrap()
        .unwrap();
    assert_eq!(partial.name, "");
    assert_eq!(partial.email.as_deref(), Some("ada@x"));
    assert!(!post.author.is_fetched());
}

#[test]
fn projected_lookup_leaves_unprojected_references_unbound() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();
    let author = user(&store, "ada");
    let document = post_document(author);
    let post_id = document.get_object_id("_id").unwrap();
    store.insert("posts", document).unwrap();

    let posts = store.typed::<Post, String>("posts", registry);
    let partial = posts
        .find_one_by_id_with(&post_id.to_hex(), &Projection::new().include("t"))
        .unwrap()
        .unwrap();

    assert_eq!(partial.title, "hello");
    assert!(partial.reviewer.is_none());
    assert!(!partial.author.is_bound());
    assert_eq!(partial.author.collection_name(), "users");
    assert!(matches!(partial.author.fetch(), Err(FetchError::Unbound(_))));
}

#[test]
fn fill_absent_members_uses_empty_values() {
    let registry = TypeRegistryArc::default();
    let config = Arc::new(DecoderConfig::default().with_fill_absent_members(true));

    let profile = DocumentDecoder::<Profile>::new(registry.clone())
        .with_config(config.clone())
        .decode_document(doc! { "_id": "ada" })
        .unwrap()
        .object;
    assert_eq!(
        profile,
        Profile {
            handle: "ada".to_owned(),
            friends: Vec::new(),
            groups: BTreeMap::new(),
            layers: Vec::new(),
            home: Address {
                city: String::new(),
                zip: None,
            },
            scores: HashMap::new(),
            avatar: Vec::new(),
        }
    );

    let err = DocumentDecoder::<Checkpoint>::new(registry)
        .with_config(config)
        .decode_document(doc! { "label": "x" })
        .unwrap_err();
    assert!(matches!(err, DecodeError::MissingField { field: "at", .. }));
}

#[test]
fn references_inside_sequences_and_mappings() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();
    let ada = user(&store, "ada");
    let bob = user(&store, "bob");
    let raw = doc! {
        "_id": "core",
        "members": [
            { "$ref": "users", "$id": ada },
            { "$ref": "users", "$id": bob },
        ],
        "roles": { "lead": { "$ref": "users", "$id": ada } },
    };

    let team = DocumentDecoder::<Team>::new(registry.clone())
        .with_collection(store.collection("teams"))
        .decode_document(raw.clone())
        .unwrap()
        .object;

    assert_eq!(team.members.len(), 2);
    assert_eq!(team.members[1].id(), &bob.to_hex());
    assert_eq!(team.members[0].fetch().unwrap().unwrap().name, "ada");
    assert_eq!(team.members[1].fetch().unwrap().unwrap().name, "bob");
    assert_eq!(team.roles["lead"].collection_name(), "users");
    assert_eq!(team.roles["lead"].fetch().unwrap().unwrap().name, "ada");

    let encoded = DocumentEncoder::new(&registry).encode(&team).unwrap();
    assert_eq!(encoded, raw);
}

#[test]
fn concurrent_first_fetch_hits_store_once() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();
    let author = user(&store, "ada");

    let post = post_decoder(&store, &registry)
        .decode_document(post_document(author))
        .unwrap()
        .object;

    std::thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                assert!(post.author.fetch().unwrap().is_some());
            });
        }
    });
    assert_eq!(store.lookups(), 1);
}

#[test]
fn unbound_reference_cannot_fetch() {
    let reference = DeferredRef::<User, String>::unbound(ObjectId::new().to_hex(), "users");
    assert!(matches!(reference.fetch(), Err(FetchError::Unbound(name)) if name == "users"));
}

#[test]
fn fetched_documents_resolve_their_own_references() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();
    let author = user(&store, "ada");
    let document = post_document(author);
    let post_id = document.get_object_id("_id").unwrap();
    store.insert("posts", document).unwrap();

    let posts = store.typed::<Post, String>("posts", registry.clone());
    let post = posts.find_one_by_id(&post_id.to_hex()).unwrap().unwrap();

    assert_eq!(post.id, Some(post_id.to_hex()));
    assert_eq!(post.author.fetch().unwrap().unwrap().name, "ada");
    assert_eq!(store.lookups(), 2);

    let users = posts.related::<User, String>("users");
    assert_eq!(users.name(), "users");
    assert!(users.find_one_by_id(&author.to_hex()).unwrap().is_some());
}

#[test]
fn invalid_lookup_key_fails_before_io() {
    let store = MemoryStore::new();
    let registry = TypeRegistryArc::default();
    let users = store.typed::<User, String>("users", registry);

    assert!(matches!(
        users.find_one_by_id(&"zz".to_owned()),
        Err(FetchError::Encode(_))
    ));
    assert_eq!(store.lookups(), 0);
}

// -----------------------------------------------------------------------------
// Side channel

#[test]
fn reserved_members_are_diverted() {
    let registry = TypeRegistryArc::default();
    let decoder = DocumentDecoder::<Address>::new(registry);

    let decoded = decoder
        .decode_document(doc! {
            "city": "Oslo",
            "ok": 1,
            "errmsg": Bson::Null,
            "$clusterTime": { "t": 5 },
            "note": "ignored",
        })
        .unwrap();

    assert_eq!(decoded.object.city, "Oslo");
    let side_channel = &decoded.side_channel;
    assert_eq!(side_channel.len(), 3);
    assert_eq!(side_channel.get("ok"), Some(Some(&Value::Int32(1))));
    assert_eq!(side_channel.get("errmsg"), Some(None));
    assert_eq!(side_channel.get("$clusterTime"), Some(None));
    assert_eq!(side_channel.get("note"), None);
}

#[test]
fn side_channels_are_per_decode() {
    let registry = TypeRegistryArc::default();
    let decoder = DocumentDecoder::<Address>::new(registry);

    let first = decoder
        .decode_document(doc! { "city": "Oslo", "ok": 1 })
        .unwrap();
    let second = decoder.decode_document(doc! { "city": "Rome" }).unwrap();

    assert!(first.side_channel.contains("ok"));
    assert!(second.side_channel.is_empty());
}

#[test]
fn nested_reserved_members_are_not_diverted() {
    let registry = TypeRegistryArc::default();
    let decoded = DocumentDecoder::<Profile>::new(registry)
        .decode_document(doc! {
            "_id": "ada",
            "friends": [],
            "groups": {},
            "layers": [],
            "home": { "city": "Oslo", "ok": 1 },
            "scores": {},
            "avatar": Bson::Binary(bson::Binary {
                subtype: bson::spec::BinarySubtype::Generic,
                bytes: vec![],
            }),
        })
        .unwrap();
    assert!(decoded.side_channel.is_empty());
}

#[test]
fn unknown_members_can_be_denied() {
    let registry = TypeRegistryArc::default();
    let config = Arc::new(DecoderConfig::default().with_deny_unknown_fields(true));
    let decoder = DocumentDecoder::<Address>::new(registry).with_config(config);

    let err = decoder
        .decode_document(doc! { "city": "Oslo", "note": "x" })
        .unwrap_err();
    assert!(matches!(err, DecodeError::UnknownField { ref field, .. } if field == "note"));

    // Reserved members are still diverted.
    let decoded = decoder
        .decode_document(doc! { "city": "Oslo", "ok": 1 })
        .unwrap();
    assert!(decoded.side_channel.contains("ok"));
}

#[test]
fn missing_required_member_fails() {
    let registry = TypeRegistryArc::default();
    let err = DocumentDecoder::<Address>::new(registry)
        .decode_document(doc! { "zip": "1" })
        .unwrap_err();
    assert!(matches!(err, DecodeError::MissingField { field: "city", .. }));
}

// -----------------------------------------------------------------------------
// Registration

#[derive(Document, Debug)]
struct BadMarker {
    #[document(object_id)]
    count: i32,
}

#[derive(Document, Debug)]
struct Clash {
    #[document(rename = "b")]
    a: i32,
    b: i32,
}

#[derive(Document, Debug)]
struct Holder {
    inner: Option<BadMarker>,
}

#[test]
fn unsupported_marker_fails_registration() {
    let registry = TypeRegistryArc::default();
    let err = DocumentDecoder::<BadMarker>::new(registry.clone())
        .decode_document(doc! { "count": 1 })
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::UnsupportedIdentifierType { field: "count", .. }
    ));
    assert!(registry.read().is_empty());
}

#[test]
fn registration_is_all_or_nothing() {
    let mut registry = TypeRegistry::new();
    assert!(registry.register::<Holder>().is_err());
    assert!(registry.is_empty());
}

#[test]
fn duplicate_wire_names_fail_registration() {
    let mut registry = TypeRegistry::new();
    let err = registry.register::<Clash>().unwrap_err();
    assert!(matches!(err, DecodeError::DuplicateWireName { name: "b", .. }));
}

#[test]
fn registration_reaches_reference_targets() {
    let mut registry = TypeRegistry::new();
    registry.register::<Post>().unwrap();
    assert_eq!(registry.len(), 2);
    assert!(registry.get_with_collection("users").is_some());
    assert!(registry.get_with_collection("posts").is_some());
}

#[cfg(feature = "auto_register")]
mod auto_register {
    use crate::{Document, TypeRegistry};
    use core::any::TypeId;

    #[derive(Document)]
    #[document(collection = "events", auto_register)]
    struct Event {
        #[document(id)]
        id: i64,
    }

    #[test]
    fn submitted_types_are_registered() {
        let mut registry = TypeRegistry::new();
        assert!(registry.auto_register().unwrap());
        assert!(registry.contains(TypeId::of::<Event>()));
        assert!(registry.get_with_collection("events").is_some());
    }
}

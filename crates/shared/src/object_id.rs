//! Document ids: 12-byte BSON object ids rendered as 24 lowercase hex
//! characters (timestamp, process randomness, counter).

pub use bson::oid::ObjectId;

/// Fresh id in the form stored under `_id`
pub fn new_id() -> String {
    ObjectId::new().to_hex()
}

/// Whether `id` is a well-formed object id
pub fn is_object_id(id: &str) -> bool {
    ObjectId::parse_str(id).is_ok()
}

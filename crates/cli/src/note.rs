//! Note entity and its owner-based access policy

use std::sync::Arc;

use rbac::AccessControl;
use serde::{Deserialize, Serialize};
use shared::{CrudOperation, DocumentCollection, Entity, EntityMeta, Filter, ValidationResult};

/// User allowed to read and write every note
pub const ADMIN_USER: &str = "admin";

const MAX_TITLE_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    #[serde(flatten)]
    pub meta: EntityMeta,
    pub title: String,
    #[serde(default)]
    pub body: String,
    pub owner: String,
}

impl Note {
    pub fn new(title: impl Into<String>, body: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            meta: EntityMeta::new(),
            title: title.into(),
            body: body.into(),
            owner: owner.into(),
        }
    }
}

impl Entity for Note {
    fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }

    fn validate(&self, operation: CrudOperation, allow_caller_supplied_id: bool) -> ValidationResult {
        let mut result = self.meta.validate(operation, allow_caller_supplied_id);

        if self.title.trim().is_empty() {
            result.add("title", "Title is required.");
        } else if self.title.chars().count() > MAX_TITLE_LEN {
            result.add("title", format!("Title must be at most {} characters.", MAX_TITLE_LEN));
        }
        if self.owner.is_empty() {
            result.add("owner", "Owner is required.");
        }

        result
    }
}

/// Anyone may create a note they own. Owners read and write their notes,
/// the admin reads and writes all of them.
pub struct NoteAcl {
    collection: Arc<dyn DocumentCollection>,
}

impl NoteAcl {
    pub fn new(collection: Arc<dyn DocumentCollection>) -> Self {
        Self { collection }
    }

    fn owner_of(&self, note_id: &str) -> Option<String> {
        let document = self.collection.find_one(&Filter::by_id(note_id)).ok()??;
        document.get("owner")?.as_str().map(str::to_string)
    }
}

impl AccessControl<Note> for NoteAcl {
    fn can_create(&self, entity: &Note, user_id: &str) -> bool {
        entity.owner == user_id
    }

    fn can_write(&self, entity_id: &str, user_id: &str) -> bool {
        user_id == ADMIN_USER || self.owner_of(entity_id).as_deref() == Some(user_id)
    }

    fn can_read(&self, entity: &Note, user_id: &str) -> bool {
        user_id == ADMIN_USER || entity.owner == user_id
    }

    fn can_read_id(&self, entity_id: &str, user_id: &str) -> bool {
        self.can_write(entity_id, user_id)
    }
}

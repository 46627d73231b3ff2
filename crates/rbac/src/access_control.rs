//! AccessControl - per-entity-type permission policy

use shared::Entity;
use std::sync::Arc;

/// Permission policy for one entity type.
///
/// There is no default policy: each entity type supplies its own and the
/// repository treats the answers as plain boolean gates. Write access is
/// keyed by id because a delete only has the id in hand.
pub trait AccessControl<T: Entity>: Send + Sync {
    /// Whether `user_id` may create `entity`
    fn can_create(&self, entity: &T, user_id: &str) -> bool;

    /// Whether `user_id` may update or delete the entity with `entity_id`
    fn can_write(&self, entity_id: &str, user_id: &str) -> bool;

    /// Whether `user_id` may see `entity`
    fn can_read(&self, entity: &T, user_id: &str) -> bool;

    /// Whether `user_id` may see the entity with `entity_id`, before it has
    /// been fetched
    fn can_read_id(&self, entity_id: &str, user_id: &str) -> bool;
}

impl<T: Entity, A: AccessControl<T> + ?Sized> AccessControl<T> for Arc<A> {
    fn can_create(&self, entity: &T, user_id: &str) -> bool {
        (**self).can_create(entity, user_id)
    }

    fn can_write(&self, entity_id: &str, user_id: &str) -> bool {
        (**self).can_write(entity_id, user_id)
    }

    fn can_read(&self, entity: &T, user_id: &str) -> bool {
        (**self).can_read(entity, user_id)
    }

    fn can_read_id(&self, entity_id: &str, user_id: &str) -> bool {
        (**self).can_read_id(entity_id, user_id)
    }
}

impl<T: Entity, A: AccessControl<T> + ?Sized> AccessControl<T> for Box<A> {
    fn can_create(&self, entity: &T, user_id: &str) -> bool {
        (**self).can_create(entity, user_id)
    }

    fn can_write(&self, entity_id: &str, user_id: &str) -> bool {
        (**self).can_write(entity_id, user_id)
    }

    fn can_read(&self, entity: &T, user_id: &str) -> bool {
        (**self).can_read(entity, user_id)
    }

    fn can_read_id(&self, entity_id: &str, user_id: &str) -> bool {
        (**self).can_read_id(entity_id, user_id)
    }
}

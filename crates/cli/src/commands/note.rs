//! docrepo note command

use chrono::{DateTime, Utc};
use clap::{Subcommand, ValueEnum};
use repository::ListQuery;
use serde_json::{json, Value};
use shared::Entity;

use crate::context::Context;
use crate::note::Note;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum NoteOrder {
    /// Alphabetical by title
    Title,
    /// Most recently written first
    Modified,
}

#[derive(Debug, Subcommand)]
pub enum NoteCommand {
    /// Create a note owned by the current user
    Create {
        #[arg(short, long)]
        title: String,
        #[arg(short, long, default_value = "")]
        body: String,
    },
    /// Show one note, deleted or not
    Get { id: String },
    /// List live notes visible to the current user
    List {
        /// Only notes whose title contains this text
        #[arg(long)]
        contains: Option<String>,
        #[arg(long, value_enum)]
        sort: Option<NoteOrder>,
    },
    /// Change a note's title or body
    Update {
        id: String,
        /// Concurrency token the change is based on (RFC 3339). Defaults
        /// to the stored one.
        #[arg(long)]
        token: Option<DateTime<Utc>>,
        #[arg(short, long)]
        title: Option<String>,
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Soft-delete a note
    Delete { id: String },
}

impl NoteCommand {
    /// Run against `ctx` as `user`. Mutations persist the store.
    pub fn run(&self, ctx: &Context, user: &str) -> anyhow::Result<Value> {
        let notes = ctx.notes();

        match self {
            NoteCommand::Create { title, body } => {
                let created = notes.create(Note::new(title, body, user), user)?;
                ctx.save()?;
                Ok(serde_json::to_value(created)?)
            }
            NoteCommand::Get { id } => Ok(serde_json::to_value(notes.get_by_id(id, user)?)?),
            NoteCommand::List { contains, sort } => {
                let mut query: ListQuery<'_, Note> = ListQuery::new();
                if let Some(needle) = contains {
                    let needle = needle.to_lowercase();
                    query = query.filter(move |note| note.title.to_lowercase().contains(&needle));
                }
                query = match sort {
                    Some(NoteOrder::Title) => query.order_by(|a, b| a.title.cmp(&b.title)),
                    Some(NoteOrder::Modified) => {
                        query.order_by(|a, b| b.concurrency_token().cmp(&a.concurrency_token()))
                    }
                    None => query,
                };
                Ok(serde_json::to_value(notes.list(user, &query)?)?)
            }
            NoteCommand::Update { id, token, title, body } => {
                let mut note = notes.get_by_id(id, user)?;
                if let Some(token) = token {
                    note.meta.concurrency_token = Some(*token);
                }
                if let Some(title) = title {
                    note.title = title.clone();
                }
                if let Some(body) = body {
                    note.body = body.clone();
                }

                let updated = notes.update(note, user)?;
                ctx.save()?;
                Ok(serde_json::to_value(updated)?)
            }
            NoteCommand::Delete { id } => {
                notes.delete(id, user)?;
                ctx.save()?;
                Ok(json!({ "deleted": id }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{ErrorKind, RepositoryError, StoreConfig};

    fn context(dir: &std::path::Path) -> Context {
        let mut config = StoreConfig::default();
        config.data_file = dir.join("data.json");
        Context::open(config).unwrap()
    }

    fn run(ctx: &Context, user: &str, command: NoteCommand) -> anyhow::Result<Value> {
        command.run(ctx, user)
    }

    fn create(ctx: &Context, user: &str, title: &str) -> String {
        let created = run(
            ctx,
            user,
            NoteCommand::Create {
                title: title.to_string(),
                body: String::new(),
            },
        )
        .unwrap();
        created["_id"].as_str().unwrap().to_string()
    }

    fn kind(err: anyhow::Error) -> ErrorKind {
        err.downcast::<RepositoryError>().unwrap().kind()
    }

    #[test]
    fn test_create_list_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        create(&ctx, "u1", "Zebra");
        create(&ctx, "u1", "apple pie");
        create(&ctx, "u2", "Apple tart");

        let listed = run(
            &ctx,
            "u1",
            NoteCommand::List {
                contains: None,
                sort: Some(NoteOrder::Title),
            },
        )
        .unwrap();
        let titles: Vec<_> = listed.as_array().unwrap().iter().map(|n| n["title"].clone()).collect();
        assert_eq!(titles, vec![json!("Zebra"), json!("apple pie")]);

        let filtered = run(
            &ctx,
            "admin",
            NoteCommand::List {
                contains: Some("APPLE".to_string()),
                sort: None,
            },
        )
        .unwrap();
        assert_eq!(filtered.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_update_with_stale_token_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let id = create(&ctx, "u1", "Draft");

        let stale = "2000-01-01T00:00:00Z".parse().unwrap();
        let err = run(
            &ctx,
            "u1",
            NoteCommand::Update {
                id: id.clone(),
                token: Some(stale),
                title: Some("Final".to_string()),
                body: None,
            },
        )
        .unwrap_err();
        assert_eq!(kind(err), ErrorKind::Conflict);

        let updated = run(
            &ctx,
            "u1",
            NoteCommand::Update {
                id,
                token: None,
                title: Some("Final".to_string()),
                body: None,
            },
        )
        .unwrap();
        assert_eq!(updated["title"], "Final");
    }

    #[test]
    fn test_delete_hides_from_list_but_not_get() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(dir.path());
        let id = create(&ctx, "u1", "Temp");

        let err = run(&ctx, "u2", NoteCommand::Delete { id: id.clone() }).unwrap_err();
        assert_eq!(kind(err), ErrorKind::Forbidden);

        run(&ctx, "u1", NoteCommand::Delete { id: id.clone() }).unwrap();

        let fetched = run(&ctx, "u1", NoteCommand::Get { id }).unwrap();
        assert_eq!(fetched["is_deleted"], true);
        let listed = run(
            &ctx,
            "u1",
            NoteCommand::List {
                contains: None,
                sort: None,
            },
        )
        .unwrap();
        assert!(listed.as_array().unwrap().is_empty());
    }
}

//! docrepo audit command

use clap::Args;
use serde_json::{json, Value};

use crate::context::Context;

#[derive(Debug, Args)]
pub struct AuditCommand {
    /// Maximum number of records, newest first
    #[arg(short, long, default_value_t = 20)]
    pub limit: usize,

    /// History of one note, oldest first
    #[arg(long, conflicts_with = "by")]
    pub entity: Option<String>,

    /// Records made by one user, oldest first
    #[arg(long, value_name = "USER")]
    pub by: Option<String>,

    /// Only print counts per trace
    #[arg(long)]
    pub stats: bool,
}

impl AuditCommand {
    pub fn run(&self, ctx: &Context) -> anyhow::Result<Value> {
        let log = ctx.audit_log()?;

        if self.stats {
            let stats = log.stats();
            return Ok(json!({
                "total": stats.total_entries,
                "creates": stats.creates,
                "updates": stats.updates,
                "deletes": stats.deletes,
            }));
        }

        let records = match (&self.entity, &self.by) {
            (Some(entity_id), _) => log.for_entity(ctx.notes().entity_type(), entity_id),
            (None, Some(user_id)) => log.by_user(user_id),
            (None, None) => log.recent(self.limit),
        };
        Ok(serde_json::to_value(records)?)
    }
}

use std::path::Path;

use crate::types::CommentRecord;

pub const HEADER: [&str; 2] = ["Date Created", "Content"];

/// Writes one row per comment, after a `Date Created,Content` header.
pub fn write_to_csv(comments: &[CommentRecord], path: impl AsRef<Path>) -> anyhow::Result<()> {
    tracing::info!(rows = comments.len(), path = %path.as_ref().display(), "write to csv");

    let mut csv_writer = csv::Writer::from_path(path)?;

    csv_writer.write_record(HEADER)?;

    for comment in comments {
        csv_writer.write_record([comment.creation_time.as_str(), comment.content.as_str()])?;
    }

    csv_writer.flush()?;

    Ok(())
}

//! Which videos a principal may see.
//!
//! Ownership is always part of the condition; an id that exists but belongs
//! to someone else simply does not match, so callers report NotFound.

use sea_orm::sea_query::{Expr, Query, SelectStatement};
use sea_orm::{ColumnTrait, Condition};

use crate::entities::{playlist, playlist_video, video, video_transcoding};

/// Sub-select of the internal video ids in `owner_id`'s playlist `playlist_public_id`.
fn playlist_members(owner_id: i32, playlist_public_id: &str) -> SelectStatement {
    Query::select()
        .column((playlist_video::Entity, playlist_video::Column::VideoId))
        .from(playlist_video::Entity)
        .inner_join(
            playlist::Entity,
            Expr::col((playlist::Entity, playlist::Column::Id))
                .equals((playlist_video::Entity, playlist_video::Column::PlaylistId)),
        )
        .and_where(Expr::col((playlist::Entity, playlist::Column::PublicId)).eq(playlist_public_id))
        .and_where(Expr::col((playlist::Entity, playlist::Column::OwnerId)).eq(owner_id))
        .to_owned()
}

/// Condition for list results. Expects `video_transcoding` to be left-joined.
///
/// Failed videos are hidden. An unknown or foreign playlist matches nothing.
pub fn list_condition(owner_id: i32, playlist_public_id: Option<&str>) -> Condition {
    let mut condition = Condition::all()
        .add(video::Column::OwnerId.eq(owner_id))
        .add(
            Condition::any()
                .add(video_transcoding::Column::Status.is_null())
                .add(video_transcoding::Column::Status.ne(video_transcoding::Status::Failed)),
        );

    if let Some(playlist_id) = playlist_public_id {
        condition = condition.add(video::Column::Id.in_subquery(playlist_members(owner_id, playlist_id)));
    }

    condition
}

/// Condition for a detail lookup. Failed videos stay visible here.
pub fn detail_condition(owner_id: i32, public_id: &str) -> Condition {
    Condition::all()
        .add(video::Column::OwnerId.eq(owner_id))
        .add(video::Column::PublicId.eq(public_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    fn list_sql(playlist: Option<&str>) -> String {
        video::Entity::find()
            .find_also_related(video_transcoding::Entity)
            .filter(list_condition(3, playlist))
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn list_scopes_to_owner_and_hides_failed() {
        let sql = list_sql(None);
        assert!(sql.contains(r#""videos"."owner_id" = 3"#), "{sql}");
        assert!(sql.contains(r#""video_transcodings"."status" IS NULL"#), "{sql}");
        assert!(sql.contains(r#""video_transcodings"."status" <> 'failed'"#), "{sql}");
        assert!(!sql.contains("playlist"), "{sql}");
    }

    #[test]
    fn playlist_filter_is_a_subquery_scoped_to_owner() {
        let sql = list_sql(Some("pl1"));
        assert!(sql.contains(r#""videos"."id" IN (SELECT"#), "{sql}");
        assert!(sql.contains(r#""playlists"."public_id" = 'pl1'"#), "{sql}");
        assert!(sql.contains(r#""playlists"."owner_id" = 3"#), "{sql}");
    }

    #[test]
    fn detail_matches_owner_and_public_id_only() {
        let sql = video::Entity::find()
            .filter(detail_condition(3, "videoid"))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(r#""videos"."public_id" = 'videoid'"#), "{sql}");
        assert!(!sql.contains("status"), "{sql}");
    }
}

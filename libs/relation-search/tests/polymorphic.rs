//! Polymorphic (morph-to) relation search
//!
//! Target types are discovered from the comments table at search time.
//! Comments pointing at other comments are skipped: the owning model's own
//! type is never searched as a related type.

#[allow(unused)]
mod support;

use relation_search::{
    Error, ResourceSearch, SearchConfig, SearchContext, SearchDescriptor, SelectQuery,
};
use support::*;

fn comments() -> ResourceSearch {
    ResourceSearch::new("comments", "Comment").with_relations(
        SearchConfig::new().with("commentable", SearchDescriptor::polymorphic(["title"])),
    )
}

async fn search(db: &TestDb, resource: &ResourceSearch, term: &str) -> anyhow::Result<Vec<i64>> {
    let mut query = SelectQuery::new("comments");
    db.engine
        .apply_search(resource, &mut query, term, SearchContext::Scoped)
        .await?;
    db.fetch_ids(&query).await
}

#[tokio::test]
async fn each_discovered_type_is_searched() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    // Video 1 "Rust conference talk"; post 1 "Rust tips" has no comments.
    assert_eq!(search(&db, &comments(), "rust").await?, vec![3]);
    assert_eq!(search(&db, &comments(), "garden").await?, vec![1]);
    assert_eq!(search(&db, &comments(), "travel").await?, vec![2]);
    Ok(())
}

#[tokio::test]
async fn owner_type_is_excluded() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    // Comment 4 points at comment 3. The comments table has no title
    // column, so searching it as a target would fail outright.
    assert_eq!(search(&db, &comments(), "a").await?, vec![1, 2, 3]);
    Ok(())
}

#[tokio::test]
async fn no_discovered_types_matches_nothing() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    db.execute("UPDATE comments SET commentable_type = NULL, commentable_id = NULL")
        .await?;
    assert!(search(&db, &comments(), "rust").await?.is_empty());

    // Own columns still match.
    let with_body = comments().with_search_columns(["body"]);
    assert_eq!(search(&db, &with_body, "agreed").await?, vec![4]);
    Ok(())
}

#[tokio::test]
async fn unknown_type_in_data_is_an_error() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    db.execute(
        "INSERT INTO comments (id, user_id, body, commentable_type, commentable_id) \
         VALUES (5, 2, 'Nice shot', 'Photo', 1)",
    )
    .await?;

    let mut query = SelectQuery::new("comments");
    let err = db
        .engine
        .apply_search(&comments(), &mut query, "rust", SearchContext::Scoped)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UnknownMorphType { ref resource, ref relation, ref morph_type }
            if resource == "comments" && relation == "commentable" && morph_type == "Photo"
    ));
    assert!(query.conditions().is_empty());
    Ok(())
}

#[tokio::test]
async fn polymorphic_relation_nested_under_a_regular_one() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    let posts = ResourceSearch::new("posts", "Post").with_relations(SearchConfig::new().with(
        "comments",
        SearchDescriptor::nested(
            SearchConfig::new().with("commentable", SearchDescriptor::polymorphic(["title"])),
        ),
    ));
    let mut query = SelectQuery::new("posts");
    db.engine
        .apply_search(&posts, &mut query, "garden", SearchContext::Scoped)
        .await?;
    assert_eq!(db.fetch_ids(&query).await?, vec![3]);
    Ok(())
}

#[tokio::test]
async fn replies_are_searched_through_their_parent_comment() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    let replies = SearchConfig::new().with(
        "comments",
        SearchDescriptor::nested(
            SearchConfig::new().with("replies", SearchDescriptor::columns(["body"])),
        ),
    );

    let posts = ResourceSearch::new("posts", "Post").with_relations(replies.clone());
    let mut query = SelectQuery::new("posts");
    db.engine
        .apply_search(&posts, &mut query, "agreed", SearchContext::Scoped)
        .await?;
    // Comment 4 replies to comment 3, which sits on a video.
    assert!(db.fetch_ids(&query).await?.is_empty());

    let videos = ResourceSearch::new("videos", "Video").with_relations(replies);
    let mut query = SelectQuery::new("videos");
    db.engine
        .apply_search(&videos, &mut query, "agreed", SearchContext::Scoped)
        .await?;
    assert_eq!(db.fetch_ids(&query).await?, vec![1]);
    Ok(())
}

#[tokio::test]
async fn polymorphic_descriptor_on_fixed_relation_is_rejected() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    let resource = ResourceSearch::new("comments", "Comment").with_relations(
        SearchConfig::new().with("author", SearchDescriptor::polymorphic(["name"])),
    );
    let mut query = SelectQuery::new("comments");
    let err = db
        .engine
        .apply_search(&resource, &mut query, "alice", SearchContext::Scoped)
        .await
        .unwrap_err();
    assert!(err.is_configuration_error());
    assert!(matches!(
        err,
        Error::InvalidDescriptor { ref relation, .. } if relation == "author"
    ));
    Ok(())
}

#[tokio::test]
async fn store_errors_during_discovery_propagate() -> anyhow::Result<()> {
    let db = TestDb::new().await?;
    db.execute("DROP TABLE comments").await?;

    let mut query = SelectQuery::new("comments");
    let err = db
        .engine
        .apply_search(&comments(), &mut query, "rust", SearchContext::Scoped)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Database(_)));
    assert!(!err.is_configuration_error());
    assert!(query.conditions().is_empty());
    Ok(())
}
